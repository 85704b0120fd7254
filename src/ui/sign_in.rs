use crossterm::event::KeyCode;
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::ui::components::{centered_rect, field_style, render_help};

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum SignInField {
    Email,
    Password,
}

pub struct SignInState {
    pub email: String,
    pub password: String,
    pub current_field: SignInField,
    pub error: Option<String>,
}

impl SignInState {
    pub fn new() -> Self {
        Self {
            email: String::new(),
            password: String::new(),
            current_field: SignInField::Email,
            error: None,
        }
    }

    /// Back on the form after a failed login; the password is cleared.
    pub fn failed(&mut self, message: String) {
        self.password.clear();
        self.current_field = SignInField::Password;
        self.error = Some(message);
    }

    fn toggle_field(&mut self) {
        self.current_field = match self.current_field {
            SignInField::Email => SignInField::Password,
            SignInField::Password => SignInField::Email,
        };
    }

    fn active_input(&mut self) -> &mut String {
        match self.current_field {
            SignInField::Email => &mut self.email,
            SignInField::Password => &mut self.password,
        }
    }
}

impl Default for SignInState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, PartialEq)]
pub enum SignInAction {
    Quit,
    Submit { email: String, password: String },
}

pub fn render_sign_in<B: Backend>(f: &mut Frame<B>, state: &SignInState) {
    let area = centered_rect(60, 60, f.size());
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(4),
            ]
            .as_ref(),
        )
        .split(area);

    let title = Paragraph::new("Sign in")
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, chunks[0]);

    let email_selected = state.current_field == SignInField::Email;
    let email = Paragraph::new(Spans::from(vec![
        Span::styled("Email: ", field_style(email_selected)),
        Span::raw(format!("{}{}", state.email, if email_selected { "|" } else { "" })),
    ]))
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(email, chunks[1]);

    let password_selected = state.current_field == SignInField::Password;
    let masked = "*".repeat(state.password.chars().count());
    let password = Paragraph::new(Spans::from(vec![
        Span::styled("Password: ", field_style(password_selected)),
        Span::raw(format!("{}{}", masked, if password_selected { "|" } else { "" })),
    ]))
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(password, chunks[2]);

    render_help(
        f,
        chunks[3],
        "Tab - Switch field | Enter - Sign in | Esc - Quit",
        state.error.as_deref(),
    );
}

pub fn handle_input(state: &mut SignInState, key: KeyCode) -> Option<SignInAction> {
    match key {
        KeyCode::Esc => return Some(SignInAction::Quit),
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => state.toggle_field(),
        KeyCode::Enter => {
            if state.email.trim().is_empty() || state.password.is_empty() {
                state.error = Some("Email and password are required".to_string());
            } else {
                state.error = None;
                return Some(SignInAction::Submit {
                    email: state.email.trim().to_string(),
                    password: state.password.clone(),
                });
            }
        }
        KeyCode::Char(c) => state.active_input().push(c),
        KeyCode::Backspace => {
            state.active_input().pop();
        }
        _ => {}
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submit_requires_both_fields() {
        let mut state = SignInState::new();
        for c in "pm@example.com".chars() {
            handle_input(&mut state, KeyCode::Char(c));
        }
        assert_eq!(handle_input(&mut state, KeyCode::Enter), None);
        assert!(state.error.is_some());

        handle_input(&mut state, KeyCode::Tab);
        handle_input(&mut state, KeyCode::Char('x'));
        assert_eq!(
            handle_input(&mut state, KeyCode::Enter),
            Some(SignInAction::Submit {
                email: "pm@example.com".to_string(),
                password: "x".to_string(),
            })
        );
    }

    #[test]
    fn failure_clears_password() {
        let mut state = SignInState::new();
        state.password = "secret".to_string();
        state.failed("Invalid credentials".to_string());
        assert!(state.password.is_empty());
        assert_eq!(state.error.as_deref(), Some("Invalid credentials"));
    }
}
