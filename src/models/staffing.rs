use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaffingRow {
    pub id: i32,
    pub project_id: i32,
    pub user_id: i32,
    pub role_name: String,
    pub hourly_rate: i64,
    #[serde(default)]
    pub forecast_hours_initial: Option<i64>,
    pub forecast_hours_remaining: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StaffingPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staffing_id: Option<i32>,
    pub project_id: i32,
    pub user_id: i32,
    pub role_name: String,
    pub hourly_rate: i64,
    pub forecast_hours_initial: i64,
    pub forecast_hours_remaining: i64,
}
