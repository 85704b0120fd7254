use crossterm::event::KeyCode;
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};

use crate::models::Project;
use crate::ui::components::{next_index, previous_index, render_confirmation, render_help};
use crate::validation::date_window::format_iso_day;

// Manager home: the list of projects
pub struct ProjectsState {
    projects: Vec<Project>,
    list_state: ListState,
    show_delete_confirmation: bool,
    pub error: Option<String>,
}

impl ProjectsState {
    pub fn new(projects: Vec<Project>) -> Self {
        let mut list_state = ListState::default();
        if !projects.is_empty() {
            list_state.select(Some(0));
        }

        Self {
            projects,
            list_state,
            show_delete_confirmation: false,
            error: None,
        }
    }

    pub fn next(&mut self) {
        let i = next_index(self.list_state.selected(), self.projects.len());
        self.list_state.select(i);
    }

    pub fn previous(&mut self) {
        let i = previous_index(self.list_state.selected(), self.projects.len());
        self.list_state.select(i);
    }

    pub fn toggle_delete_confirmation(&mut self) {
        self.show_delete_confirmation = !self.show_delete_confirmation;
    }

    pub fn selected_project(&self) -> Option<&Project> {
        self.list_state.selected().and_then(|i| self.projects.get(i))
    }

    pub fn selected_project_id(&self) -> Option<i32> {
        self.selected_project().map(|p| p.id)
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }
}

#[derive(Debug, PartialEq)]
pub enum ProjectAction {
    SignOut,
    Refresh,
    NewProject,
    DeleteProject(i32),
    OpenProject(i32),
}

pub fn render_projects<B: Backend>(frame: &mut Frame<B>, state: &mut ProjectsState) {
    let size = frame.size();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(4)].as_ref())
        .split(size);

    let items: Vec<ListItem> = state
        .projects
        .iter()
        .map(|project| {
            let status = if project.started {
                Span::styled(" [started]", Style::default().fg(Color::Green))
            } else {
                Span::styled(" [planning]", Style::default().fg(Color::DarkGray))
            };

            ListItem::new(Spans::from(vec![
                Span::styled(project.name.clone(), Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(format!(
                    "  {}  ({} to {})",
                    project.client_name,
                    format_iso_day(project.start_date),
                    format_iso_day(project.end_date)
                )),
                status,
            ]))
        })
        .collect();

    let title = if state.projects.is_empty() {
        "Projects (none yet)"
    } else {
        "Projects"
    };
    let projects_list = List::new(items)
        .block(Block::default().title(title).borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        );

    frame.render_stateful_widget(projects_list, chunks[0], &mut state.list_state);

    let buttons_text = if state.selected_project().is_some() {
        "<N> New Project | <D> Delete Project | <Enter> Open | <R> Refresh | <Esc> Sign out"
    } else {
        "<N> New Project | <R> Refresh | <Esc> Sign out"
    };
    render_help(frame, chunks[1], buttons_text, state.error.as_deref());

    if state.show_delete_confirmation {
        let name = state
            .selected_project()
            .map(|p| p.name.clone())
            .unwrap_or_default();
        render_confirmation(
            frame,
            "Confirm Delete",
            vec![
                Spans::from(""),
                Spans::from(format!("Delete project \"{}\"?", name)),
                Spans::from(""),
                Spans::from("Its staffing, phases and tasks go with it."),
                Spans::from(""),
                Spans::from("<Y> Yes  <N> No"),
            ],
        );
    }
}

pub fn handle_input(state: &mut ProjectsState, key: KeyCode) -> Option<ProjectAction> {
    if state.show_delete_confirmation {
        match key {
            KeyCode::Char('y') => {
                state.toggle_delete_confirmation();
                return state.selected_project_id().map(ProjectAction::DeleteProject);
            }
            KeyCode::Char('n') | KeyCode::Char('q') | KeyCode::Esc => {
                state.toggle_delete_confirmation();
            }
            _ => {}
        }
        return None;
    }

    match key {
        KeyCode::Char('q') | KeyCode::Esc => return Some(ProjectAction::SignOut),
        KeyCode::Char('n') => return Some(ProjectAction::NewProject),
        KeyCode::Char('r') => return Some(ProjectAction::Refresh),
        KeyCode::Char('d') => {
            if state.selected_project().is_some() {
                state.toggle_delete_confirmation();
            }
        }
        KeyCode::Down => state.next(),
        KeyCode::Up => state.previous(),
        KeyCode::Enter => return state.selected_project_id().map(ProjectAction::OpenProject),
        _ => {}
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn project(id: i32) -> Project {
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        Project {
            id,
            name: format!("Project {}", id),
            client_name: "Acme".to_string(),
            start_date: day,
            end_date: day,
            started: false,
        }
    }

    #[test]
    fn delete_needs_confirmation() {
        let mut state = ProjectsState::new(vec![project(4), project(9)]);
        handle_input(&mut state, KeyCode::Down);
        assert_eq!(handle_input(&mut state, KeyCode::Char('d')), None);
        assert_eq!(handle_input(&mut state, KeyCode::Enter), None);
        assert_eq!(
            handle_input(&mut state, KeyCode::Char('y')),
            Some(ProjectAction::DeleteProject(9))
        );
    }

    #[test]
    fn declining_delete_returns_to_list() {
        let mut state = ProjectsState::new(vec![project(4)]);
        handle_input(&mut state, KeyCode::Char('d'));
        handle_input(&mut state, KeyCode::Char('n'));
        assert_eq!(handle_input(&mut state, KeyCode::Enter), Some(ProjectAction::OpenProject(4)));
    }
}
