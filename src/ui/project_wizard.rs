use crossterm::event::KeyCode;
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::models::NewProject;
use crate::ui::components::date_input::DateInputState;
use crate::ui::components::render_help;
use crate::validation::date_window::today;
use crate::validation::rows::ProjectDraft;

#[derive(Debug, PartialEq)]
pub enum ProjectWizardAction {
    Cancel,
    Save(NewProject),
}

#[derive(Clone, PartialEq, Copy, Debug)]
pub enum ProjectField {
    Name,
    Client,
    StartDate,
    EndDate,
}

pub struct ProjectWizardState {
    pub draft: ProjectDraft,
    pub current_field: ProjectField,
    pub editing: bool,
    pub start_date_state: DateInputState,
    pub end_date_state: DateInputState,
    pub error: Option<String>,
}

impl ProjectWizardState {
    pub fn new() -> Self {
        Self {
            draft: ProjectDraft::default(),
            current_field: ProjectField::Name,
            editing: false,
            start_date_state: DateInputState::new(None),
            end_date_state: DateInputState::new(None),
            error: None,
        }
    }

    pub fn toggle_editing(&mut self) {
        if self.editing {
            self.finish_editing();
            return;
        }
        self.editing = true;
        match self.current_field {
            ProjectField::StartDate => {
                self.start_date_state.set_bounds(self.draft.start_bounds());
                self.start_date_state.begin_editing(today());
            }
            ProjectField::EndDate => {
                self.end_date_state.set_bounds(self.draft.end_bounds());
                self.end_date_state.begin_editing(today());
            }
            _ => {}
        }
    }

    // Enter on an open field; a refused date keeps the field open
    fn finish_editing(&mut self) {
        match self.current_field {
            ProjectField::StartDate => match self.start_date_state.commit() {
                Some(date) => {
                    self.draft.set_start(date);
                    self.end_date_state.set_date(self.draft.end_date);
                }
                None => return,
            },
            ProjectField::EndDate => match self.end_date_state.commit() {
                Some(date) => self.draft.end_date = Some(date),
                None => return,
            },
            _ => {}
        }
        self.editing = false;
    }

    pub fn cancel_editing(&mut self) {
        self.editing = false;
        self.start_date_state.cancel();
        self.end_date_state.cancel();
    }

    pub fn next_field(&mut self) {
        self.current_field = match self.current_field {
            ProjectField::Name => ProjectField::Client,
            ProjectField::Client => ProjectField::StartDate,
            ProjectField::StartDate => ProjectField::EndDate,
            ProjectField::EndDate => ProjectField::Name,
        };
    }

    pub fn previous_field(&mut self) {
        self.current_field = match self.current_field {
            ProjectField::Name => ProjectField::EndDate,
            ProjectField::Client => ProjectField::Name,
            ProjectField::StartDate => ProjectField::Client,
            ProjectField::EndDate => ProjectField::StartDate,
        };
    }

    pub fn edit_current_field(&mut self, key: KeyCode) {
        if !self.editing {
            return;
        }

        let text = match self.current_field {
            ProjectField::Name => &mut self.draft.name,
            ProjectField::Client => &mut self.draft.client_name,
            ProjectField::StartDate => {
                self.start_date_state.handle_input(key);
                return;
            }
            ProjectField::EndDate => {
                self.end_date_state.handle_input(key);
                return;
            }
        };
        match key {
            KeyCode::Char(c) => text.push(c),
            KeyCode::Backspace => {
                text.pop();
            }
            _ => {}
        }
    }
}

impl Default for ProjectWizardState {
    fn default() -> Self {
        Self::new()
    }
}

pub fn render_project_wizard<B: Backend>(f: &mut Frame<B>, state: &mut ProjectWizardState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Min(6),
                Constraint::Length(4),
            ]
            .as_ref(),
        )
        .split(f.size());

    let title = Paragraph::new("New Project")
        .style(Style::default().fg(Color::Cyan))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, chunks[0]);

    render_form(f, state, chunks[1]);

    let help_text = if state.editing {
        match state.current_field {
            ProjectField::Name | ProjectField::Client => "Enter - Save field | Esc - Cancel editing",
            ProjectField::StartDate | ProjectField::EndDate => {
                "Enter - Save field | Left/Right - Switch date part | +/- - Day | Esc - Cancel editing"
            }
        }
    } else {
        "Enter - Edit field | Up/Down - Navigate fields | S - Create project | Esc - Cancel"
    };
    render_help(f, chunks[2], help_text, state.error.as_deref());
}

fn render_form<B: Backend>(f: &mut Frame<B>, state: &ProjectWizardState, area: Rect) {
    let fields = [
        (ProjectField::Name, "Name", state.draft.name.clone()),
        (ProjectField::Client, "Client", state.draft.client_name.clone()),
        (
            ProjectField::StartDate,
            "Start Date",
            state.start_date_state.get_display_string(),
        ),
        (
            ProjectField::EndDate,
            "End Date",
            state.end_date_state.get_display_string(),
        ),
    ];

    let items: Vec<ListItem> = fields
        .into_iter()
        .map(|(field, name, value)| {
            let selected = field == state.current_field;
            let content = if selected && state.editing {
                let shown = match field {
                    ProjectField::Name | ProjectField::Client => format!("{}|", value),
                    _ => value,
                };
                Spans::from(vec![
                    Span::styled(format!("{}: ", name), Style::default().fg(Color::Yellow)),
                    Span::styled(shown, Style::default().add_modifier(Modifier::BOLD)),
                ])
            } else {
                let style = if selected {
                    Style::default().fg(Color::Yellow)
                } else {
                    Style::default()
                };
                Spans::from(vec![Span::styled(format!("{}: ", name), style), Span::raw(value)])
            };
            ListItem::new(content)
        })
        .collect();

    let form_list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Project Details"));
    f.render_widget(form_list, area);
}

pub fn handle_input(state: &mut ProjectWizardState, key: KeyCode) -> Option<ProjectWizardAction> {
    match key {
        KeyCode::Esc => {
            if state.editing {
                state.cancel_editing();
            } else {
                return Some(ProjectWizardAction::Cancel);
            }
        }
        KeyCode::Enter => state.toggle_editing(),
        KeyCode::Up if !state.editing => state.previous_field(),
        KeyCode::Down if !state.editing => state.next_field(),
        KeyCode::Char('s') if !state.editing => match state.draft.to_payload() {
            Ok(project) => {
                state.error = None;
                return Some(ProjectWizardAction::Save(project));
            }
            Err(e) => state.error = Some(e.to_string()),
        },
        _ if state.editing => state.edit_current_field(key),
        _ => {}
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn type_text(state: &mut ProjectWizardState, text: &str) {
        for c in text.chars() {
            handle_input(state, KeyCode::Char(c));
        }
    }

    #[test]
    fn incomplete_project_is_not_saved() {
        let mut state = ProjectWizardState::new();
        assert_eq!(handle_input(&mut state, KeyCode::Char('s')), None);
        assert_eq!(state.error.as_deref(), Some("project name is required"));
    }

    #[test]
    fn start_picker_refuses_dates_from_end_on() {
        let mut state = ProjectWizardState::new();
        state.draft.start_date = NaiveDate::from_ymd_opt(2024, 3, 1);
        state.draft.end_date = NaiveDate::from_ymd_opt(2024, 3, 5);
        state.end_date_state.set_date(state.draft.end_date);
        state.start_date_state.set_date(state.draft.start_date);

        state.current_field = ProjectField::StartDate;
        handle_input(&mut state, KeyCode::Enter);
        handle_input(&mut state, KeyCode::Right);
        handle_input(&mut state, KeyCode::Right);
        type_text(&mut state, "05");
        handle_input(&mut state, KeyCode::Enter);

        assert!(state.editing);
        assert!(state.start_date_state.rejected);
        assert_eq!(state.draft.start_date, NaiveDate::from_ymd_opt(2024, 3, 1));

        handle_input(&mut state, KeyCode::Right);
        handle_input(&mut state, KeyCode::Right);
        type_text(&mut state, "04");
        handle_input(&mut state, KeyCode::Enter);

        assert!(!state.editing);
        assert_eq!(state.draft.start_date, NaiveDate::from_ymd_opt(2024, 3, 4));
        assert_eq!(state.draft.end_date, NaiveDate::from_ymd_opt(2024, 3, 5));
    }

    #[test]
    fn filled_form_saves() {
        let mut state = ProjectWizardState::new();
        handle_input(&mut state, KeyCode::Enter);
        type_text(&mut state, "Atlas");
        handle_input(&mut state, KeyCode::Enter);
        handle_input(&mut state, KeyCode::Down);
        handle_input(&mut state, KeyCode::Enter);
        type_text(&mut state, "Acme");
        handle_input(&mut state, KeyCode::Enter);
        state.draft.start_date = NaiveDate::from_ymd_opt(2024, 3, 1);
        state.draft.end_date = NaiveDate::from_ymd_opt(2024, 6, 30);

        match handle_input(&mut state, KeyCode::Char('s')) {
            Some(ProjectWizardAction::Save(project)) => {
                assert_eq!(project.name, "Atlas");
                assert_eq!(project.client_name, "Acme");
                assert!(!project.started);
            }
            other => panic!("expected save, got {:?}", other),
        }
    }
}
