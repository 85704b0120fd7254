use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeLogEntry {
    pub id: i32,
    pub task_id: i32,
    pub user_id: i32,
    pub work_date: NaiveDate,
    pub hours: f64,
    pub is_billable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTimeEntry {
    pub task_id: i32,
    pub user_id: i32,
    pub work_date: NaiveDate,
    pub hours: f64,
    pub is_billable: bool,
}
