use crossterm::event::KeyCode;
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Clear, Row, Table, TableState},
    Frame,
};

use crate::models::{AssignmentPayload, AssignmentRow, StaffingRow, Task, User};
use crate::ui::components::{centered_rect, next_index, previous_index, render_help};
use crate::validation::rows::{
    assignment_gate, assignment_payloads, can_add_assignment, duplicate_assignment,
    AssignmentDraft,
};
use crate::validation::DirtyTracker;

#[derive(Debug, PartialEq)]
pub enum AssignmentAction {
    Close,
    Confirm(i32, Vec<AssignmentPayload>),
}

/// Contributors on one task. Only people staffed on the project can be picked.
pub struct AssignmentsState {
    pub task: Task,
    pub rows: Vec<AssignmentDraft>,
    tracker: DirtyTracker<AssignmentDraft>,
    staffing: Vec<StaffingRow>,
    users: Vec<User>,
    table_state: TableState,
    picking: bool,
    pub status: Option<String>,
}

impl AssignmentsState {
    pub fn new(task: Task, rows: &[AssignmentRow], staffing: Vec<StaffingRow>, users: Vec<User>) -> Self {
        let drafts: Vec<AssignmentDraft> = rows.iter().map(AssignmentDraft::from).collect();
        let mut table_state = TableState::default();
        if !drafts.is_empty() {
            table_state.select(Some(0));
        }
        Self {
            task,
            tracker: DirtyTracker::new(&drafts),
            rows: drafts,
            staffing,
            users,
            table_state,
            picking: false,
            status: None,
        }
    }

    pub fn saved(&mut self, rows: &[AssignmentRow]) {
        self.rows = rows.iter().map(AssignmentDraft::from).collect();
        self.tracker.rebase(&self.rows);
        self.table_state.select(if self.rows.is_empty() { None } else { Some(0) });
        self.status = Some("Contributors saved".to_string());
    }

    pub fn can_confirm(&self) -> bool {
        assignment_gate(&self.rows, &self.tracker).can_save()
    }

    fn add_row(&mut self) {
        if !can_add_assignment(&self.rows) {
            self.status = Some("Pick a contributor for the blank row first".to_string());
            return;
        }
        self.rows.push(AssignmentDraft::default());
        self.table_state.select(Some(self.rows.len() - 1));
        self.picking = true;
    }

    // Only rows not yet on the server can go; saving never deletes assignments.
    fn remove_row(&mut self) {
        let Some(i) = self.table_state.selected() else {
            return;
        };
        match self.rows.get(i) {
            Some(row) if row.id.is_none() => {
                self.rows.remove(i);
            }
            Some(_) => {
                self.status = Some("Saved contributors cannot be removed".to_string());
                return;
            }
            None => {}
        }
        let next = if self.rows.is_empty() {
            None
        } else {
            Some(i.min(self.rows.len() - 1))
        };
        self.table_state.select(next);
    }

    fn cycle_user(&mut self, forward: bool) {
        let Some(i) = self.table_state.selected() else {
            return;
        };
        let staffed: Vec<i32> = self.staffing.iter().map(|s| s.user_id).collect();
        let Some(row) = self.rows.get_mut(i) else {
            return;
        };
        let current = row.user_id.and_then(|id| staffed.iter().position(|&u| u == id));
        let next = if forward {
            next_index(current, staffed.len())
        } else {
            previous_index(current, staffed.len())
        };
        if let Some(n) = next {
            row.select_user(staffed[n], &self.staffing);
        }
    }

    fn user_name(&self, user_id: Option<i32>) -> String {
        match user_id {
            Some(id) => self
                .users
                .iter()
                .find(|u| u.id == id)
                .map(|u| u.name.clone())
                .unwrap_or_else(|| format!("User {}", id)),
            None => "Select...".to_string(),
        }
    }
}

pub fn render_assignments<B: Backend>(f: &mut Frame<B>, state: &mut AssignmentsState) {
    let area = centered_rect(70, 70, f.size());
    f.render_widget(Clear, area);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(4)].as_ref())
        .split(area);

    let duplicate = duplicate_assignment(&state.rows);
    let selected = state.table_state.selected();
    let rows: Vec<Row> = state
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let style = if !row.is_valid() || (row.user_id.is_some() && row.user_id == duplicate) {
                Style::default().fg(Color::Red)
            } else if state.picking && selected == Some(i) {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(state.user_name(row.user_id)),
                Cell::from(format!("${}", row.hourly_rate)),
            ])
            .style(style)
        })
        .collect();

    let table = Table::new(rows)
        .header(
            Row::new(vec!["Contributor", "Rate"])
                .style(Style::default().add_modifier(Modifier::BOLD))
                .bottom_margin(1),
        )
        .block(
            Block::default()
                .title(format!("Contributors: {}", state.task.title))
                .borders(Borders::ALL),
        )
        .highlight_style(Style::default().bg(Color::Blue).fg(Color::White))
        .widths(&[Constraint::Percentage(70), Constraint::Percentage(30)]);
    f.render_stateful_widget(table, chunks[0], &mut state.table_state);

    let help = if state.picking {
        "Left/Right - Pick staffed contributor | Enter/Esc - Done"
    } else {
        "<A> Add | <Enter> Change | <D> Remove unsaved | <S> Confirm | <Esc> Close"
    };
    let message = state.status.clone().or_else(|| {
        assignment_gate(&state.rows, &state.tracker)
            .blocked_reason()
            .map(|r| format!("Confirm disabled: {}", r))
    });
    render_help(f, chunks[1], help, message.as_deref());
}

pub fn handle_input(state: &mut AssignmentsState, key: KeyCode) -> Option<AssignmentAction> {
    if state.picking {
        match key {
            KeyCode::Enter | KeyCode::Esc => state.picking = false,
            KeyCode::Right | KeyCode::Char(' ') => state.cycle_user(true),
            KeyCode::Left => state.cycle_user(false),
            _ => {}
        }
        return None;
    }

    state.status = None;
    match key {
        KeyCode::Esc => return Some(AssignmentAction::Close),
        KeyCode::Char('a') => state.add_row(),
        KeyCode::Char('d') => state.remove_row(),
        KeyCode::Enter => {
            if state.table_state.selected().is_some() {
                state.picking = true;
            }
        }
        KeyCode::Down => {
            let i = next_index(state.table_state.selected(), state.rows.len());
            state.table_state.select(i);
        }
        KeyCode::Up => {
            let i = previous_index(state.table_state.selected(), state.rows.len());
            state.table_state.select(i);
        }
        KeyCode::Char('s') if state.can_confirm() => {
            match assignment_payloads(&state.rows, state.task.id) {
                Ok(rows) => return Some(AssignmentAction::Confirm(state.task.id, rows)),
                Err(e) => state.status = Some(e.to_string()),
            }
        }
        _ => {}
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn task() -> Task {
        let day = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        Task {
            id: 12,
            phase_id: 3,
            title: "Wireframes".to_string(),
            description: String::new(),
            start_date: day,
            end_date: day,
            due_date: day,
            budget: 100,
            status: "Not Started".to_string(),
            actual_spend: None,
        }
    }

    fn staffed(user_id: i32, rate: i64) -> StaffingRow {
        StaffingRow {
            id: user_id,
            project_id: 8,
            user_id,
            role_name: "Dev".to_string(),
            hourly_rate: rate,
            forecast_hours_initial: None,
            forecast_hours_remaining: 10,
        }
    }

    #[test]
    fn picking_a_contributor_copies_rate() {
        let mut state = AssignmentsState::new(task(), &[], vec![staffed(7, 55), staffed(8, 60)], vec![]);
        handle_input(&mut state, KeyCode::Char('a'));
        handle_input(&mut state, KeyCode::Right);
        handle_input(&mut state, KeyCode::Right);
        handle_input(&mut state, KeyCode::Enter);

        assert_eq!(state.rows[0].user_id, Some(8));
        assert_eq!(state.rows[0].hourly_rate, 60);
        assert_eq!(
            handle_input(&mut state, KeyCode::Char('s')),
            Some(AssignmentAction::Confirm(
                12,
                vec![AssignmentPayload {
                    assignment_id: None,
                    task_id: 12,
                    user_id: 8,
                    hourly_rate: 60,
                }]
            ))
        );
    }

    #[test]
    fn second_blank_row_is_refused() {
        let mut state = AssignmentsState::new(task(), &[], vec![staffed(7, 55)], vec![]);
        handle_input(&mut state, KeyCode::Char('a'));
        handle_input(&mut state, KeyCode::Esc);
        handle_input(&mut state, KeyCode::Char('a'));
        assert_eq!(state.rows.len(), 1);
        assert!(state.status.is_some());
    }

    #[test]
    fn saved_rows_cannot_be_removed() {
        let rows = [
            AssignmentRow { id: 1, task_id: 12, user_id: 7, hourly_rate: 55 },
            AssignmentRow { id: 2, task_id: 12, user_id: 8, hourly_rate: 60 },
        ];
        let mut state =
            AssignmentsState::new(task(), &rows, vec![staffed(7, 55), staffed(8, 60)], vec![]);
        handle_input(&mut state, KeyCode::Char('d'));

        assert_eq!(state.rows.len(), 2);
        assert_eq!(state.status.as_deref(), Some("Saved contributors cannot be removed"));
        assert!(!state.can_confirm());
        assert_eq!(handle_input(&mut state, KeyCode::Char('s')), None);
    }

    #[test]
    fn unsaved_row_can_be_removed() {
        let existing = AssignmentRow { id: 1, task_id: 12, user_id: 7, hourly_rate: 55 };
        let mut state = AssignmentsState::new(task(), &[existing], vec![staffed(7, 55)], vec![]);
        handle_input(&mut state, KeyCode::Char('a'));
        handle_input(&mut state, KeyCode::Esc);
        assert_eq!(state.rows.len(), 2);

        handle_input(&mut state, KeyCode::Char('d'));
        assert_eq!(state.rows.len(), 1);
        assert_eq!(state.rows[0].id, Some(1));
        assert!(!state.can_confirm());
    }

    #[test]
    fn same_person_twice_blocks_confirm() {
        let existing = AssignmentRow { id: 1, task_id: 12, user_id: 7, hourly_rate: 55 };
        let mut state = AssignmentsState::new(task(), &[existing], vec![staffed(7, 55)], vec![]);
        handle_input(&mut state, KeyCode::Char('a'));
        handle_input(&mut state, KeyCode::Right);
        handle_input(&mut state, KeyCode::Enter);

        assert!(!state.can_confirm());
        assert_eq!(handle_input(&mut state, KeyCode::Char('s')), None);
    }
}
