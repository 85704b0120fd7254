use crossterm::event::KeyCode;
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Row, Table, TableState},
    Frame,
};

use crate::models::{StaffingPayload, StaffingRow, User};
use crate::ui::components::{next_index, previous_index, render_help};
use crate::validation::rows::{staffing_gate, StaffingDraft};
use crate::validation::{DirtyTracker, ValidationError};

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum StaffingColumn {
    Contributor,
    Role,
    Rate,
    Hours,
}

impl StaffingColumn {
    fn next(self) -> Self {
        match self {
            StaffingColumn::Contributor => StaffingColumn::Role,
            StaffingColumn::Role => StaffingColumn::Rate,
            StaffingColumn::Rate => StaffingColumn::Hours,
            StaffingColumn::Hours => StaffingColumn::Contributor,
        }
    }

    fn previous(self) -> Self {
        match self {
            StaffingColumn::Contributor => StaffingColumn::Hours,
            StaffingColumn::Role => StaffingColumn::Contributor,
            StaffingColumn::Rate => StaffingColumn::Role,
            StaffingColumn::Hours => StaffingColumn::Rate,
        }
    }
}

pub struct StaffingState {
    project_id: i32,
    pub rows: Vec<StaffingDraft>,
    tracker: DirtyTracker<StaffingDraft>,
    contributors: Vec<User>,
    table_state: TableState,
    column: StaffingColumn,
    editing: bool,
    pub status: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum StaffingAction {
    Apply(Vec<StaffingPayload>),
}

impl StaffingState {
    pub fn new(project_id: i32, rows: &[StaffingRow], contributors: Vec<User>) -> Self {
        let drafts: Vec<StaffingDraft> = rows.iter().map(StaffingDraft::from).collect();
        let mut table_state = TableState::default();
        if !drafts.is_empty() {
            table_state.select(Some(0));
        }
        Self {
            project_id,
            tracker: DirtyTracker::new(&drafts),
            rows: drafts,
            contributors,
            table_state,
            column: StaffingColumn::Contributor,
            editing: false,
            status: None,
        }
    }

    /// Server rows after a successful apply become the new baseline.
    pub fn saved(&mut self, rows: &[StaffingRow]) {
        self.rows = rows.iter().map(StaffingDraft::from).collect();
        self.tracker.rebase(&self.rows);
        self.table_state.select(if self.rows.is_empty() { None } else { Some(0) });
        self.editing = false;
        self.status = Some("Staffing saved".to_string());
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn can_apply(&self) -> bool {
        staffing_gate(&self.rows, &self.tracker).can_save()
    }

    pub fn add_row(&mut self) {
        self.rows.push(StaffingDraft::default());
        self.table_state.select(Some(self.rows.len() - 1));
        self.column = StaffingColumn::Contributor;
        self.editing = true;
    }

    fn selected_row(&mut self) -> Option<&mut StaffingDraft> {
        let i = self.table_state.selected()?;
        self.rows.get_mut(i)
    }

    fn user_name(&self, user_id: Option<i32>) -> String {
        match user_id {
            Some(id) => self
                .contributors
                .iter()
                .find(|u| u.id == id)
                .map(|u| u.name.clone())
                .unwrap_or_else(|| format!("User {}", id)),
            None => "Select...".to_string(),
        }
    }

    // Cycles the contributor picker on the selected row
    fn cycle_contributor(&mut self, forward: bool) {
        let ids: Vec<i32> = self.contributors.iter().map(|u| u.id).collect();
        let Some(row) = self.selected_row() else {
            return;
        };
        let current = row.user_id.and_then(|id| ids.iter().position(|&u| u == id));
        let next = if forward {
            next_index(current, ids.len())
        } else {
            previous_index(current, ids.len())
        };
        if let Some(i) = next {
            row.user_id = Some(ids[i]);
        }
    }

    fn edit_cell(&mut self, key: KeyCode) {
        let column = self.column;
        if column == StaffingColumn::Contributor {
            match key {
                KeyCode::Right | KeyCode::Char(' ') => self.cycle_contributor(true),
                KeyCode::Left => self.cycle_contributor(false),
                _ => {}
            }
            return;
        }

        let Some(row) = self.selected_row() else {
            return;
        };
        let (text, digits_only) = match column {
            StaffingColumn::Role => (&mut row.role_name, false),
            StaffingColumn::Rate => (&mut row.hourly_rate, true),
            StaffingColumn::Hours => (&mut row.forecast_hours_remaining, true),
            StaffingColumn::Contributor => return,
        };
        match key {
            KeyCode::Char(c) if !digits_only || c.is_ascii_digit() => text.push(c),
            KeyCode::Backspace => {
                text.pop();
            }
            _ => {}
        }
    }

    fn payloads(&self) -> Result<Vec<StaffingPayload>, ValidationError> {
        self.rows
            .iter()
            .map(|row| row.to_payload(self.project_id))
            .collect()
    }
}

pub fn render_staffing<B: Backend>(f: &mut Frame<B>, state: &mut StaffingState, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(4)].as_ref())
        .split(area);

    let header = Row::new(vec!["Name", "Role", "Rate", "Forecast Hours", "Forecast Budget"])
        .style(Style::default().add_modifier(Modifier::BOLD))
        .bottom_margin(1);

    let selected = state.table_state.selected();
    let rows: Vec<Row> = state
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let editing_here = state.editing && selected == Some(i);
            let cell = |column: StaffingColumn, text: String| {
                let style = if editing_here && state.column == column {
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                Cell::from(text).style(style)
            };
            let budget = row
                .forecast_budget()
                .map(|b| format!("${}", b))
                .unwrap_or_else(|| "-".to_string());

            let style = if row.is_valid() {
                Style::default()
            } else {
                Style::default().fg(Color::Red)
            };
            Row::new(vec![
                cell(StaffingColumn::Contributor, state.user_name(row.user_id)),
                cell(StaffingColumn::Role, row.role_name.clone()),
                cell(StaffingColumn::Rate, row.hourly_rate.clone()),
                cell(StaffingColumn::Hours, row.forecast_hours_remaining.clone()),
                Cell::from(budget),
            ])
            .style(style)
        })
        .collect();

    let table = Table::new(rows)
        .header(header)
        .block(Block::default().title("Project Staffing").borders(Borders::ALL))
        .highlight_style(Style::default().bg(Color::Blue).fg(Color::White))
        .widths(&[
            Constraint::Percentage(25),
            Constraint::Percentage(20),
            Constraint::Percentage(15),
            Constraint::Percentage(20),
            Constraint::Percentage(20),
        ]);
    f.render_stateful_widget(table, chunks[0], &mut state.table_state);

    let help = if state.editing {
        if state.column == StaffingColumn::Contributor {
            "Left/Right - Pick contributor | Tab - Next cell | Enter/Esc - Done"
        } else {
            "Type to edit | Tab - Next cell | Enter/Esc - Done"
        }
    } else {
        "<A> Add row | <Enter> Edit row | Up/Down - Select | <S> Apply changes"
    };
    let gate = staffing_gate(&state.rows, &state.tracker);
    let message = state
        .status
        .clone()
        .or_else(|| gate.blocked_reason().map(|r| format!("Apply disabled: {}", r)));
    render_help(f, chunks[1], help, message.as_deref());
}

pub fn handle_input(state: &mut StaffingState, key: KeyCode) -> Option<StaffingAction> {
    if state.editing {
        match key {
            KeyCode::Enter | KeyCode::Esc => state.editing = false,
            KeyCode::Tab => state.column = state.column.next(),
            KeyCode::BackTab => state.column = state.column.previous(),
            _ => state.edit_cell(key),
        }
        return None;
    }

    state.status = None;
    match key {
        KeyCode::Char('a') => state.add_row(),
        KeyCode::Enter => {
            if state.table_state.selected().is_some() {
                state.column = StaffingColumn::Contributor;
                state.editing = true;
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
        KeyCode::Char('s') => {
            if !state.can_apply() {
                return None;
            }
            match state.payloads() {
                Ok(rows) => return Some(StaffingAction::Apply(rows)),
                Err(e) => state.status = Some(e.to_string()),
            }
        }
        _ => {}
    }
    None
}
