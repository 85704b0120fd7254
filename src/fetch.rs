//! Background requests whose answers may arrive after the screen moved on.
//!
//! A screen holds a [`RequestGate`]. Every request it starts carries the
//! [`Ticket`] issued at that moment; when the answer comes back it is applied
//! only if the ticket is still the newest one. Leaving the screen invalidates
//! the gate so late answers are dropped.

use std::collections::HashMap;

use futures::future::join_all;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use crate::api::{ApiClient, ApiResult};
use crate::models::{InvoiceTable, Task};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

#[derive(Debug, Default)]
pub struct RequestGate {
    current: u64,
}

impl RequestGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new request; any earlier ticket becomes stale.
    pub fn issue(&mut self) -> Ticket {
        self.current += 1;
        Ticket(self.current)
    }

    pub fn accepts(&self, ticket: Ticket) -> bool {
        ticket.0 == self.current
    }

    /// Drops every outstanding ticket without starting a new request.
    pub fn invalidate(&mut self) {
        self.current += 1;
    }
}

/// A response tagged with the ticket of the request that produced it.
#[derive(Debug)]
pub struct Stamped<T> {
    pub ticket: Ticket,
    pub value: T,
}

/// Completions delivered to the UI loop.
#[derive(Debug)]
pub enum Completion {
    InvoicePreview(Stamped<ApiResult<InvoiceTable>>),
    ActualSpend(Stamped<HashMap<i32, f64>>),
}

/// Fetches the invoice preview off the UI loop.
pub fn spawn_invoice_preview(
    client: &ApiClient,
    tx: &UnboundedSender<Completion>,
    ticket: Ticket,
    project_id: i32,
    start: chrono::NaiveDate,
    end: chrono::NaiveDate,
) {
    let client = client.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let value = client.invoice_table(project_id, start, end).await;
        // The receiver is gone once the app is shutting down.
        let _ = tx.send(Completion::InvoicePreview(Stamped { ticket, value }));
    });
}

/// Recomputes actual spend for every task at once and waits for all of them.
/// Results are keyed by task id; a task whose call failed is left out.
pub async fn refresh_actual_spend(client: &ApiClient, task_ids: &[i32]) -> HashMap<i32, f64> {
    let results = join_all(
        task_ids
            .iter()
            .map(|&task_id| async move { (task_id, client.refresh_actual_spend(task_id).await) }),
    )
    .await;

    let mut spend = HashMap::new();
    for (task_id, result) in results {
        match result {
            Ok(value) => {
                debug!(task_id, value, "Actual spend refreshed");
                spend.insert(task_id, value);
            }
            Err(e) => warn!(task_id, error = %e, "Failed to refresh actual spend"),
        }
    }
    spend
}

/// Runs [`refresh_actual_spend`] in the background and reports back by ticket.
pub fn spawn_actual_spend(
    client: &ApiClient,
    tx: &UnboundedSender<Completion>,
    ticket: Ticket,
    task_ids: Vec<i32>,
) {
    let client = client.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let value = refresh_actual_spend(&client, &task_ids).await;
        let _ = tx.send(Completion::ActualSpend(Stamped { ticket, value }));
    });
}

/// Writes refreshed spend onto the matching tasks; others keep their value.
pub fn apply_actual_spend(tasks: &mut [Task], spend: &HashMap<i32, f64>) {
    for task in tasks {
        if let Some(value) = spend.get(&task.id) {
            task.actual_spend = Some(*value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn only_newest_ticket_is_accepted() {
        let mut gate = RequestGate::new();
        let first = gate.issue();
        assert!(gate.accepts(first));

        let second = gate.issue();
        assert!(!gate.accepts(first));
        assert!(gate.accepts(second));
    }

    #[test]
    fn invalidate_drops_outstanding_requests() {
        let mut gate = RequestGate::new();
        let ticket = gate.issue();
        gate.invalidate();
        assert!(!gate.accepts(ticket));
    }

    #[test]
    fn spend_is_applied_by_task_id() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let task = |id| Task {
            id,
            phase_id: 1,
            title: format!("Task {}", id),
            description: String::new(),
            start_date: day,
            end_date: day,
            due_date: day,
            budget: 100,
            status: "Not Started".to_string(),
            actual_spend: Some(1.0),
        };
        let mut tasks = vec![task(1), task(2), task(3)];
        let spend = HashMap::from([(3, 30.0), (1, 10.0)]);

        apply_actual_spend(&mut tasks, &spend);

        assert_eq!(tasks[0].actual_spend, Some(10.0));
        assert_eq!(tasks[1].actual_spend, Some(1.0));
        assert_eq!(tasks[2].actual_spend, Some(30.0));
    }
}
