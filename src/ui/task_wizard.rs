use crossterm::event::KeyCode;
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::models::NewTask;
use crate::ui::components::date_input::DateInputState;
use crate::ui::components::render_help;
use crate::validation::date_window::today;
use crate::validation::rows::{TaskDraft, TaskField};

const FIELDS: [TaskField; 6] = [
    TaskField::Title,
    TaskField::Description,
    TaskField::StartDate,
    TaskField::EndDate,
    TaskField::DueDate,
    TaskField::Budget,
];

#[derive(Debug, PartialEq)]
pub enum TaskWizardAction {
    Cancel,
    Save(NewTask),
}

pub struct TaskWizardState {
    pub phase_id: i32,
    pub draft: TaskDraft,
    current: usize,
    editing: bool,
    date_state: DateInputState,
    show_errors: bool,
    pub error: Option<String>,
}

impl TaskWizardState {
    pub fn new(phase_id: i32) -> Self {
        Self {
            phase_id,
            draft: TaskDraft::default(),
            current: 0,
            editing: false,
            date_state: DateInputState::new(None),
            show_errors: false,
            error: None,
        }
    }

    pub fn current_field(&self) -> TaskField {
        FIELDS[self.current]
    }

    fn is_date_field(field: TaskField) -> bool {
        matches!(
            field,
            TaskField::StartDate | TaskField::EndDate | TaskField::DueDate
        )
    }

    fn begin_editing(&mut self) {
        self.editing = true;
        let (value, bounds) = match self.current_field() {
            TaskField::StartDate => (self.draft.start_date, self.draft.start_bounds()),
            TaskField::EndDate => (self.draft.end_date, self.draft.end_bounds()),
            TaskField::DueDate => (self.draft.due_date, self.draft.due_bounds()),
            _ => return,
        };
        self.date_state = DateInputState::new(value).with_bounds(bounds);
        self.date_state.begin_editing(today());
    }

    fn finish_editing(&mut self) {
        let field = self.current_field();
        if Self::is_date_field(field) {
            let Some(date) = self.date_state.commit() else {
                return;
            };
            match field {
                TaskField::StartDate => self.draft.set_start(date),
                TaskField::EndDate => self.draft.end_date = Some(date),
                _ => self.draft.due_date = Some(date),
            }
        }
        self.editing = false;
    }

    fn cancel_editing(&mut self) {
        self.date_state.cancel();
        self.editing = false;
    }

    fn edit_current_field(&mut self, key: KeyCode) {
        let field = self.current_field();
        if Self::is_date_field(field) {
            self.date_state.handle_input(key);
            return;
        }
        let (text, digits_only) = match field {
            TaskField::Title => (&mut self.draft.title, false),
            TaskField::Description => (&mut self.draft.description, false),
            _ => (&mut self.draft.budget, true),
        };
        match key {
            KeyCode::Char(c) if !digits_only || c.is_ascii_digit() => text.push(c),
            KeyCode::Backspace => {
                text.pop();
            }
            _ => {}
        }
    }

    fn field_value(&self, field: TaskField) -> String {
        let open = self.editing && field == self.current_field();
        match field {
            _ if open && Self::is_date_field(field) => self.date_state.get_display_string(),
            TaskField::Title => self.draft.title.clone(),
            TaskField::Description => self.draft.description.clone(),
            TaskField::StartDate => DateInputState::new(self.draft.start_date).get_display_string(),
            TaskField::EndDate => DateInputState::new(self.draft.end_date).get_display_string(),
            TaskField::DueDate => DateInputState::new(self.draft.due_date).get_display_string(),
            TaskField::Budget => self.draft.budget.clone(),
        }
    }
}

fn label(field: TaskField) -> &'static str {
    match field {
        TaskField::Title => "Title",
        TaskField::Description => "Description",
        TaskField::StartDate => "Start Date",
        TaskField::EndDate => "End Date",
        TaskField::DueDate => "Due Date",
        TaskField::Budget => "Budget ($)",
    }
}

pub fn render_task_wizard<B: Backend>(f: &mut Frame<B>, state: &TaskWizardState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(4),
            ]
            .as_ref(),
        )
        .split(f.size());

    let title = Paragraph::new("Create Task")
        .style(Style::default().fg(Color::Cyan))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, chunks[0]);

    render_form(f, state, chunks[1]);

    let help = if state.editing {
        if TaskWizardState::is_date_field(state.current_field()) {
            "Enter - Save field | Left/Right - Switch date part | +/- - Day | Esc - Cancel editing"
        } else {
            "Enter - Save field | Esc - Cancel editing"
        }
    } else {
        "Enter - Edit field | Up/Down - Navigate fields | S - Create task | Esc - Cancel"
    };
    render_help(f, chunks[2], help, state.error.as_deref());
}

fn render_form<B: Backend>(f: &mut Frame<B>, state: &TaskWizardState, area: Rect) {
    let errors = if state.show_errors {
        state.draft.field_errors()
    } else {
        Vec::new()
    };

    let items: Vec<ListItem> = FIELDS
        .iter()
        .map(|&field| {
            let selected = field == state.current_field();
            let mut value = state.field_value(field);
            if selected && state.editing && !TaskWizardState::is_date_field(field) {
                value.push('|');
            }
            let name_style = if selected {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            };
            let value_style = if selected && state.editing {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };

            let mut spans = vec![
                Span::styled(format!("{}: ", label(field)), name_style),
                Span::styled(value, value_style),
            ];
            if let Some((_, error)) = errors.iter().find(|(f, _)| *f == field) {
                spans.push(Span::styled(
                    format!("  ({})", error),
                    Style::default().fg(Color::Red),
                ));
            }
            ListItem::new(Spans::from(spans))
        })
        .collect();

    let form = List::new(items).block(Block::default().borders(Borders::ALL).title("Task Details"));
    f.render_widget(form, area);
}

pub fn handle_input(state: &mut TaskWizardState, key: KeyCode) -> Option<TaskWizardAction> {
    if state.editing {
        match key {
            KeyCode::Esc => state.cancel_editing(),
            KeyCode::Enter => state.finish_editing(),
            _ => state.edit_current_field(key),
        }
        return None;
    }

    match key {
        KeyCode::Esc => return Some(TaskWizardAction::Cancel),
        KeyCode::Enter => state.begin_editing(),
        KeyCode::Up => state.current = (state.current + FIELDS.len() - 1) % FIELDS.len(),
        KeyCode::Down => state.current = (state.current + 1) % FIELDS.len(),
        KeyCode::Char('s') => {
            state.show_errors = true;
            match state.draft.to_payload(state.phase_id) {
                Ok(task) => {
                    state.error = None;
                    return Some(TaskWizardAction::Save(task));
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
    use chrono::NaiveDate;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn empty_form_reports_first_error() {
        let mut state = TaskWizardState::new(3);
        assert_eq!(handle_input(&mut state, KeyCode::Char('s')), None);
        assert_eq!(state.error.as_deref(), Some("title is required"));
    }

    #[test]
    fn due_picker_is_limited_to_start_and_end() {
        let mut state = TaskWizardState::new(3);
        state.draft.start_date = Some(day(2024, 1, 10));
        state.draft.end_date = Some(day(2024, 1, 15));
        state.current = 4;

        handle_input(&mut state, KeyCode::Enter);
        handle_input(&mut state, KeyCode::Right);
        handle_input(&mut state, KeyCode::Right);
        for c in "09".chars() {
            handle_input(&mut state, KeyCode::Char(c));
        }
        handle_input(&mut state, KeyCode::Enter);
        assert_eq!(state.draft.due_date, None);

        handle_input(&mut state, KeyCode::Right);
        handle_input(&mut state, KeyCode::Right);
        for c in "10".chars() {
            handle_input(&mut state, KeyCode::Char(c));
        }
        handle_input(&mut state, KeyCode::Enter);
        assert_eq!(state.draft.due_date, Some(day(2024, 1, 10)));
    }

    #[test]
    fn start_picker_stops_before_end() {
        let mut state = TaskWizardState::new(3);
        state.draft.start_date = Some(day(2024, 1, 10));
        state.draft.end_date = Some(day(2024, 1, 15));
        state.current = 2;

        handle_input(&mut state, KeyCode::Enter);
        assert_eq!(state.date_state.bounds().max, Some(day(2024, 1, 14)));
        handle_input(&mut state, KeyCode::Right);
        handle_input(&mut state, KeyCode::Right);
        for c in "20".chars() {
            handle_input(&mut state, KeyCode::Char(c));
        }
        handle_input(&mut state, KeyCode::Enter);
        assert!(state.editing);
        assert_eq!(state.draft.start_date, Some(day(2024, 1, 10)));
        assert_eq!(state.draft.end_date, Some(day(2024, 1, 15)));

        handle_input(&mut state, KeyCode::Right);
        handle_input(&mut state, KeyCode::Right);
        for c in "14".chars() {
            handle_input(&mut state, KeyCode::Char(c));
        }
        handle_input(&mut state, KeyCode::Enter);
        assert!(!state.editing);
        assert_eq!(state.draft.start_date, Some(day(2024, 1, 14)));
        assert_eq!(state.draft.end_date, Some(day(2024, 1, 15)));
    }

    #[test]
    fn budget_accepts_digits_only() {
        let mut state = TaskWizardState::new(3);
        state.current = 5;
        handle_input(&mut state, KeyCode::Enter);
        for c in "12a0".chars() {
            handle_input(&mut state, KeyCode::Char(c));
        }
        handle_input(&mut state, KeyCode::Enter);
        assert_eq!(state.draft.budget, "120");
    }

    #[test]
    fn complete_task_is_created_not_started() {
        let mut state = TaskWizardState::new(3);
        state.draft = TaskDraft {
            title: "Build".to_string(),
            description: "API".to_string(),
            start_date: Some(day(2024, 1, 10)),
            end_date: Some(day(2024, 1, 15)),
            due_date: Some(day(2024, 1, 12)),
            budget: "1200".to_string(),
        };
        match handle_input(&mut state, KeyCode::Char('s')) {
            Some(TaskWizardAction::Save(task)) => {
                assert_eq!(task.phase_id, 3);
                assert_eq!(task.status, "Not Started");
            }
            other => panic!("expected save, got {:?}", other),
        }
    }
}
