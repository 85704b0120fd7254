use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i32,
    pub phase_id: i32,
    pub title: String,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub due_date: NaiveDate,
    pub budget: i64,
    pub status: String,
    #[serde(default)]
    pub actual_spend: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTask {
    pub phase_id: i32,
    pub title: String,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub due_date: NaiveDate,
    pub status: String,
    pub budget: i64,
}
