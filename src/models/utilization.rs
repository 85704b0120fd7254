use chrono::NaiveDate;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UtilizationRow {
    /// Monday of the week this row covers.
    pub week_start: NaiveDate,
    pub user_id: i32,
    pub user_name: String,
    pub project_id: i32,
    pub staffed_hours: f64,
    pub actual_hours: f64,
    /// Fraction of staffed hours actually logged; absent when nothing was staffed.
    pub utilization_pct: Option<f64>,
}
