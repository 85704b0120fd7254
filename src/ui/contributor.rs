use crossterm::event::KeyCode;
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, Cell, List, ListItem, ListState, Paragraph, Row, Table, Wrap},
    Frame,
};

use crate::models::{Task, TimeLogEntry};
use crate::ui::components::{next_index, previous_index, render_help};
use crate::validation::date_window::format_iso_day;

/// Contributor home: assigned tasks on the left, own time entries on the right.
pub struct ContributorState {
    pub user_id: i32,
    tasks: Vec<Task>,
    list_state: ListState,
    entries: Vec<TimeLogEntry>,
    entries_task: Option<i32>,
    pub status: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum ContributorAction {
    SignOut,
    Refresh,
    LoadEntries(i32),
    LogHours(Task),
}

impl ContributorState {
    pub fn new(user_id: i32, tasks: Vec<Task>) -> Self {
        let mut list_state = ListState::default();
        if !tasks.is_empty() {
            list_state.select(Some(0));
        }
        Self {
            user_id,
            tasks,
            list_state,
            entries: Vec::new(),
            entries_task: None,
            status: None,
        }
    }

    pub fn selected_task(&self) -> Option<&Task> {
        self.list_state.selected().and_then(|i| self.tasks.get(i))
    }

    /// Task whose entries should be loaded for the current selection.
    pub fn needs_entries(&self) -> Option<i32> {
        self.selected_task()
            .map(|t| t.id)
            .filter(|&id| self.entries_task != Some(id))
    }

    pub fn set_entries(&mut self, task_id: i32, entries: Vec<TimeLogEntry>) {
        self.entries_task = Some(task_id);
        self.entries = entries;
    }

    pub fn entries(&self) -> &[TimeLogEntry] {
        &self.entries
    }

    /// Total hours the user logged on the selected task.
    pub fn logged_hours(&self) -> f64 {
        self.entries.iter().map(|e| e.hours).sum()
    }
}

pub fn render_contributor<B: Backend>(f: &mut Frame<B>, state: &mut ContributorState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(4)].as_ref())
        .split(f.size());
    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)].as_ref())
        .split(chunks[0]);

    let items: Vec<ListItem> = state
        .tasks
        .iter()
        .map(|task| {
            ListItem::new(vec![
                Spans::from(Span::styled(
                    task.title.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Spans::from(format!("  due {} | {}", format_iso_day(task.due_date), task.status)),
            ])
        })
        .collect();
    let title = if state.tasks.is_empty() {
        "My Tasks (none assigned)"
    } else {
        "My Tasks"
    };
    let list = List::new(items)
        .block(Block::default().title(title).borders(Borders::ALL))
        .highlight_style(Style::default().bg(Color::Blue).fg(Color::White));
    f.render_stateful_widget(list, panes[0], &mut state.list_state);

    render_task_detail(f, state, panes[1]);

    let help = if state.selected_task().is_some() {
        "<L> Log hours | Up/Down - Select task | <R> Refresh | <Esc> Sign out"
    } else {
        "<R> Refresh | <Esc> Sign out"
    };
    render_help(f, chunks[1], help, state.status.as_deref());
}

fn render_task_detail<B: Backend>(f: &mut Frame<B>, state: &ContributorState, area: Rect) {
    let Some(task) = state.selected_task() else {
        let empty = Paragraph::new("Select a task").block(Block::default().borders(Borders::ALL));
        f.render_widget(empty, area);
        return;
    };

    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Min(3)].as_ref())
        .split(area);

    let detail = Paragraph::new(vec![
        Spans::from(task.description.clone()),
        Spans::from(""),
        Spans::from(format!(
            "Start {} | End {} | Due {}",
            format_iso_day(task.start_date),
            format_iso_day(task.end_date),
            format_iso_day(task.due_date)
        )),
        Spans::from(format!("Logged: {:.2}h", state.logged_hours())),
    ])
    .wrap(Wrap { trim: true })
    .block(Block::default().title(task.title.clone()).borders(Borders::ALL));
    f.render_widget(detail, parts[0]);

    let rows: Vec<Row> = state
        .entries
        .iter()
        .map(|entry| {
            Row::new(vec![
                Cell::from(format_iso_day(entry.work_date)),
                Cell::from(format!("{:.2}", entry.hours)),
                Cell::from(if entry.is_billable { "yes" } else { "no" }),
            ])
        })
        .collect();
    let table = Table::new(rows)
        .header(
            Row::new(vec!["Date", "Hours", "Billable"])
                .style(Style::default().add_modifier(Modifier::BOLD))
                .bottom_margin(1),
        )
        .block(Block::default().title("Time Entries").borders(Borders::ALL))
        .widths(&[
            Constraint::Percentage(40),
            Constraint::Percentage(30),
            Constraint::Percentage(30),
        ]);
    f.render_widget(table, parts[1]);
}

pub fn handle_input(state: &mut ContributorState, key: KeyCode) -> Option<ContributorAction> {
    state.status = None;
    match key {
        KeyCode::Esc | KeyCode::Char('q') => Some(ContributorAction::SignOut),
        KeyCode::Char('r') => Some(ContributorAction::Refresh),
        KeyCode::Char('l') => state.selected_task().cloned().map(ContributorAction::LogHours),
        KeyCode::Down | KeyCode::Up => {
            let len = state.tasks.len();
            let i = if key == KeyCode::Down {
                next_index(state.list_state.selected(), len)
            } else {
                previous_index(state.list_state.selected(), len)
            };
            state.list_state.select(i);
            state.needs_entries().map(ContributorAction::LoadEntries)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn task(id: i32) -> Task {
        Task {
            id,
            phase_id: 3,
            title: format!("Task {}", id),
            description: String::new(),
            start_date: day(10),
            end_date: day(20),
            due_date: day(15),
            budget: 100,
            status: "In Progress".to_string(),
            actual_spend: None,
        }
    }

    #[test]
    fn moving_selection_loads_entries_once() {
        let mut state = ContributorState::new(5, vec![task(1), task(2)]);
        assert_eq!(state.needs_entries(), Some(1));
        state.set_entries(1, vec![]);
        assert_eq!(state.needs_entries(), None);

        assert_eq!(handle_input(&mut state, KeyCode::Down), Some(ContributorAction::LoadEntries(2)));
        state.set_entries(2, vec![]);
        assert_eq!(handle_input(&mut state, KeyCode::Down), Some(ContributorAction::LoadEntries(1)));
    }

    #[test]
    fn logged_hours_sum_entries() {
        let mut state = ContributorState::new(5, vec![task(1)]);
        let entry = |id, hours| TimeLogEntry {
            id,
            task_id: 1,
            user_id: 5,
            work_date: day(12),
            hours,
            is_billable: true,
        };
        state.set_entries(1, vec![entry(1, 2.5), entry(2, 4.0)]);
        assert_eq!(state.logged_hours(), 6.5);
        assert_eq!(state.entries().len(), 2);
    }

    #[test]
    fn log_hours_carries_selected_task() {
        let mut state = ContributorState::new(5, vec![task(7)]);
        assert_eq!(
            handle_input(&mut state, KeyCode::Char('l')),
            Some(ContributorAction::LogHours(task(7)))
        );
    }
}
