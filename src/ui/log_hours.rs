use chrono::NaiveDate;
use crossterm::event::KeyCode;
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, Clear, List, ListItem},
    Frame,
};

use crate::models::{NewTimeEntry, Task};
use crate::ui::components::date_input::{describe_bounds, DateInputState};
use crate::ui::components::{centered_rect, field_style, render_help};
use crate::validation::rows::{log_bounds, TimeLogDraft};

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum LogField {
    WorkDate,
    Hours,
    Billable,
}

#[derive(Debug, PartialEq)]
pub enum LogHoursAction {
    Cancel,
    Submit(NewTimeEntry),
}

pub struct LogHoursState {
    pub task: Task,
    user_id: i32,
    pub draft: TimeLogDraft,
    date_state: DateInputState,
    field: LogField,
    pub submitting: bool,
    pub error: Option<String>,
}

impl LogHoursState {
    pub fn new(task: Task, user_id: i32, today: NaiveDate) -> Self {
        let draft = TimeLogDraft::for_task(&task, today);
        let date_state = DateInputState::new(Some(draft.work_date)).with_bounds(log_bounds(&task));
        Self {
            task,
            user_id,
            draft,
            date_state,
            field: LogField::WorkDate,
            submitting: false,
            error: None,
        }
    }

    pub fn failed(&mut self, message: String) {
        self.submitting = false;
        self.error = Some(message);
    }

    fn next_field(&mut self) {
        self.field = match self.field {
            LogField::WorkDate => LogField::Hours,
            LogField::Hours => LogField::Billable,
            LogField::Billable => LogField::WorkDate,
        };
    }

    fn previous_field(&mut self) {
        self.field = match self.field {
            LogField::WorkDate => LogField::Billable,
            LogField::Hours => LogField::WorkDate,
            LogField::Billable => LogField::Hours,
        };
    }
}

pub fn render_log_hours<B: Backend>(f: &mut Frame<B>, state: &LogHoursState) {
    let area = centered_rect(60, 50, f.size());
    f.render_widget(Clear, area);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(4)].as_ref())
        .split(area);

    let hours = if state.field == LogField::Hours {
        format!("{}|", state.draft.hours)
    } else {
        state.draft.hours.clone()
    };
    let billable = if state.draft.billable { "[x] Billable" } else { "[ ] Billable" };
    let rows = [
        (LogField::WorkDate, "Work Date", state.date_state.get_display_string()),
        (LogField::Hours, "Hours", hours),
        (LogField::Billable, "", billable.to_string()),
    ];

    let items: Vec<ListItem> = rows
        .into_iter()
        .map(|(field, name, value)| {
            let selected = field == state.field;
            let label = if name.is_empty() {
                String::new()
            } else {
                format!("{}: ", name)
            };
            let value_style = match (selected, state.date_state.editing) {
                (true, true) => field_style(true).add_modifier(Modifier::BOLD),
                (true, false) => field_style(true),
                (false, _) => Style::default(),
            };
            ListItem::new(Spans::from(vec![
                Span::styled(label, field_style(selected)),
                Span::styled(value, value_style),
            ]))
        })
        .collect();

    let title = format!(
        "Log Hours: {} ({})",
        state.task.title,
        describe_bounds(log_bounds(&state.task))
    );
    let form = List::new(items).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .style(Style::default().bg(Color::Black)),
    );
    f.render_widget(form, chunks[0]);

    let help = if state.date_state.editing {
        "Digits - Date part | Left/Right - Part | +/- - Day | Enter - Save date | Esc - Cancel"
    } else if state.submitting {
        "Saving..."
    } else {
        "Up/Down - Field | Enter - Pick date | Space - Billable | S - Save | Esc - Close"
    };
    render_help(f, chunks[1], help, state.error.as_deref());
}

pub fn handle_input(state: &mut LogHoursState, key: KeyCode) -> Option<LogHoursAction> {
    if state.submitting {
        return None;
    }

    if state.date_state.editing {
        match key {
            KeyCode::Esc => state.date_state.cancel(),
            KeyCode::Enter => {
                if let Some(date) = state.date_state.commit() {
                    state.draft.work_date = date;
                }
            }
            _ => state.date_state.handle_input(key),
        }
        return None;
    }

    match key {
        KeyCode::Esc => return Some(LogHoursAction::Cancel),
        KeyCode::Up | KeyCode::BackTab => state.previous_field(),
        KeyCode::Down | KeyCode::Tab => state.next_field(),
        KeyCode::Enter if state.field == LogField::WorkDate => {
            state.date_state.begin_editing(state.draft.work_date);
        }
        KeyCode::Char(' ') if state.field == LogField::Billable => {
            state.draft.billable = !state.draft.billable;
        }
        KeyCode::Char(c) if state.field == LogField::Hours && (c.is_ascii_digit() || c == '.') => {
            state.draft.hours.push(c);
        }
        KeyCode::Backspace if state.field == LogField::Hours => {
            state.draft.hours.pop();
        }
        KeyCode::Char('s') | KeyCode::Enter => {
            match state.draft.to_payload(&state.task, state.user_id) {
                Ok(entry) => {
                    state.error = None;
                    state.submitting = true;
                    return Some(LogHoursAction::Submit(entry));
                }
                Err(e) => state.error = Some(e.to_string()),
            }
        }
        _ => {}
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn task() -> Task {
        Task {
            id: 12,
            phase_id: 3,
            title: "Wireframes".to_string(),
            description: String::new(),
            start_date: day(2024, 1, 10),
            end_date: day(2024, 1, 20),
            due_date: day(2024, 1, 15),
            budget: 4000,
            status: "In Progress".to_string(),
            actual_spend: None,
        }
    }

    #[test]
    fn opens_clamped_and_submits_entry() {
        let mut state = LogHoursState::new(task(), 5, day(2024, 2, 1));
        assert_eq!(state.draft.work_date, day(2024, 1, 15));

        handle_input(&mut state, KeyCode::Down);
        for c in "2a.5".chars() {
            handle_input(&mut state, KeyCode::Char(c));
        }
        handle_input(&mut state, KeyCode::Down);
        handle_input(&mut state, KeyCode::Char(' '));

        assert_eq!(
            handle_input(&mut state, KeyCode::Char('s')),
            Some(LogHoursAction::Submit(NewTimeEntry {
                task_id: 12,
                user_id: 5,
                work_date: day(2024, 1, 15),
                hours: 2.5,
                is_billable: false,
            }))
        );
        assert_eq!(handle_input(&mut state, KeyCode::Esc), None);
    }

    #[test]
    fn date_after_due_is_refused() {
        let mut state = LogHoursState::new(task(), 5, day(2024, 1, 12));
        handle_input(&mut state, KeyCode::Enter);
        handle_input(&mut state, KeyCode::Right);
        handle_input(&mut state, KeyCode::Right);
        for c in "16".chars() {
            handle_input(&mut state, KeyCode::Char(c));
        }
        handle_input(&mut state, KeyCode::Enter);
        assert_eq!(state.draft.work_date, day(2024, 1, 12));
        assert!(state.date_state.rejected);
    }

    #[test]
    fn missing_hours_shows_error() {
        let mut state = LogHoursState::new(task(), 5, day(2024, 1, 12));
        state.field = LogField::Billable;
        assert_eq!(handle_input(&mut state, KeyCode::Char('s')), None);
        assert_eq!(state.error.as_deref(), Some("hours is required"));
    }
}
