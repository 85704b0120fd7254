use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: i32,
    pub project_id: i32,
    pub client_name: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub total_amount: i64,
}

/// Body of the generate call. The server computes the total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceRequest {
    pub client_name: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
}

/// One billed (task, contributor) pair in the invoice preview.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InvoiceLine {
    pub task: String,
    pub phase: String,
    pub task_contributor: String,
    pub hours: f64,
    pub rate: f64,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InvoiceTable {
    pub rows: Vec<InvoiceLine>,
    pub total_amount: f64,
}
