use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: i32,
    pub name: String,
    pub client_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub started: bool,
}

/// Body for creating or replacing a project.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewProject {
    pub name: String,
    pub client_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub started: bool,
}

impl Project {
    /// The replacement body that flips `started` on. The flag never goes back.
    pub fn started_payload(&self) -> NewProject {
        NewProject {
            name: self.name.clone(),
            client_name: self.client_name.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
            started: true,
        }
    }
}
