use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentRow {
    pub id: i32,
    pub task_id: i32,
    pub user_id: i32,
    pub hourly_rate: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssignmentPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignment_id: Option<i32>,
    pub task_id: i32,
    pub user_id: i32,
    pub hourly_rate: i64,
}
