use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub name: String,
    pub role: String,
}

/// Body returned by a successful sign-in.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoginResponse {
    pub user_id: i32,
    pub role: String,
}
