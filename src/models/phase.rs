use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phase {
    pub id: i32,
    pub project_id: i32,
    pub phase_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// One entry of the phase upsert list; `phase_id` is set for rows that already exist.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhasePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase_id: Option<i32>,
    pub project_id: i32,
    pub phase_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}
