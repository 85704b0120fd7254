use std::collections::HashMap;

use crossterm::event::KeyCode;
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, Cell, List, ListItem, ListState, Row, Table, TableState},
    Frame,
};

use crate::fetch::{apply_actual_spend, RequestGate, Stamped, Ticket};
use crate::models::{Phase, PhasePayload, Task};
use crate::ui::components::date_input::{describe_bounds, DateInputState};
use crate::ui::components::{next_index, previous_index, render_help};
use crate::validation::date_window::{format_iso_day, format_optional_day, today};
use crate::validation::rows::{phase_gate, PhaseDraft};
use crate::validation::{DirtyTracker, ValidationError};

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum PhaseField {
    Name,
    StartDate,
    EndDate,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum PhaseFocus {
    Phases,
    Tasks,
}

#[derive(Debug, PartialEq)]
pub enum PhaseAction {
    SavePhases(Vec<PhasePayload>),
    LoadTasks(i32),
    NewTask(i32),
    EditAssignments(Task),
    RefreshSpend,
}

pub struct PhasesState {
    project_id: i32,
    started: bool,
    pub rows: Vec<PhaseDraft>,
    tracker: DirtyTracker<PhaseDraft>,
    phase_state: TableState,
    field: PhaseField,
    editing: bool,
    start_input: DateInputState,
    end_input: DateInputState,
    tasks: Vec<Task>,
    tasks_phase: Option<i32>,
    task_state: ListState,
    focus: PhaseFocus,
    spend_gate: RequestGate,
    refreshing_spend: bool,
    pub status: Option<String>,
}

impl PhasesState {
    pub fn new(project_id: i32, started: bool, phases: &[Phase]) -> Self {
        let rows: Vec<PhaseDraft> = phases.iter().map(PhaseDraft::from).collect();
        let mut phase_state = TableState::default();
        if !rows.is_empty() {
            phase_state.select(Some(0));
        }
        Self {
            project_id,
            started,
            tracker: DirtyTracker::new(&rows),
            rows,
            phase_state,
            field: PhaseField::Name,
            editing: false,
            start_input: DateInputState::new(None),
            end_input: DateInputState::new(None),
            tasks: Vec::new(),
            tasks_phase: None,
            task_state: ListState::default(),
            focus: PhaseFocus::Phases,
            spend_gate: RequestGate::new(),
            refreshing_spend: false,
            status: None,
        }
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn set_started(&mut self, started: bool) {
        self.started = started;
        if started {
            self.editing = false;
        }
    }

    /// Replaces the phase list with what the server now holds.
    pub fn saved(&mut self, phases: &[Phase]) {
        self.rows = phases.iter().map(PhaseDraft::from).collect();
        self.tracker.rebase(&self.rows);
        let selected = self.phase_state.selected().filter(|&i| i < self.rows.len());
        self.phase_state
            .select(selected.or(if self.rows.is_empty() { None } else { Some(0) }));
        self.status = Some("Phases saved".to_string());
    }

    pub fn can_confirm(&self) -> bool {
        !self.started && phase_gate(&self.rows, &self.tracker).can_save()
    }

    /// Phase id whose tasks should be showing, if the selection has one.
    pub fn selected_phase_id(&self) -> Option<i32> {
        self.phase_state
            .selected()
            .and_then(|i| self.rows.get(i))
            .and_then(|row| row.id)
    }

    /// Whether the task pane is out of date for the current selection.
    pub fn needs_tasks(&self) -> Option<i32> {
        self.selected_phase_id().filter(|&id| self.tasks_phase != Some(id))
    }

    /// Shows a phase's tasks and starts a spend refresh for them. The
    /// returned ticket must accompany the refresh request.
    pub fn set_tasks(&mut self, phase_id: i32, tasks: Vec<Task>) -> (Ticket, Vec<i32>) {
        self.tasks_phase = Some(phase_id);
        self.task_state
            .select(if tasks.is_empty() { None } else { Some(0) });
        self.tasks = tasks;
        self.begin_spend_refresh()
    }

    pub fn begin_spend_refresh(&mut self) -> (Ticket, Vec<i32>) {
        self.refreshing_spend = !self.tasks.is_empty();
        let ticket = self.spend_gate.issue();
        (ticket, self.tasks.iter().map(|t| t.id).collect())
    }

    /// Applies a finished spend refresh unless a newer one superseded it.
    pub fn apply_spend(&mut self, done: Stamped<HashMap<i32, f64>>) -> bool {
        if !self.spend_gate.accepts(done.ticket) {
            return false;
        }
        apply_actual_spend(&mut self.tasks, &done.value);
        self.refreshing_spend = false;
        true
    }

    /// Drops in-flight refreshes when the tab goes away.
    pub fn detach(&mut self) {
        self.spend_gate.invalidate();
        self.refreshing_spend = false;
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    fn selected_row(&mut self) -> Option<&mut PhaseDraft> {
        let i = self.phase_state.selected()?;
        self.rows.get_mut(i)
    }

    fn selected_task(&self) -> Option<&Task> {
        self.task_state.selected().and_then(|i| self.tasks.get(i))
    }

    fn add_phase(&mut self) {
        self.rows.push(PhaseDraft::default());
        self.phase_state.select(Some(self.rows.len() - 1));
        self.begin_editing();
    }

    fn begin_editing(&mut self) {
        if self.phase_state.selected().is_none() {
            return;
        }
        self.editing = true;
        self.field = PhaseField::Name;
    }

    // Opens the date picker for the field the cursor moved onto
    fn enter_field(&mut self) {
        let Some(row) = self.selected_row().cloned() else {
            return;
        };
        match self.field {
            PhaseField::Name => {}
            PhaseField::StartDate => {
                self.start_input = DateInputState::new(row.start_date).with_bounds(row.start_bounds());
                self.start_input.begin_editing(today());
            }
            PhaseField::EndDate => {
                self.end_input = DateInputState::new(row.end_date).with_bounds(row.end_bounds());
                self.end_input.begin_editing(today());
            }
        }
    }

    // Commits the open picker; false when the date was refused
    fn leave_field(&mut self) -> bool {
        match self.field {
            PhaseField::Name => true,
            PhaseField::StartDate => match self.start_input.commit() {
                Some(date) => {
                    if let Some(row) = self.selected_row() {
                        row.set_start(date);
                    }
                    true
                }
                None => false,
            },
            PhaseField::EndDate => match self.end_input.commit() {
                Some(date) => {
                    if let Some(row) = self.selected_row() {
                        row.end_date = Some(date);
                    }
                    true
                }
                None => false,
            },
        }
    }

    fn move_field(&mut self, forward: bool) {
        if !self.leave_field() {
            return;
        }
        self.field = match (self.field, forward) {
            (PhaseField::Name, true) | (PhaseField::EndDate, false) => PhaseField::StartDate,
            (PhaseField::StartDate, true) | (PhaseField::Name, false) => PhaseField::EndDate,
            (PhaseField::EndDate, true) | (PhaseField::StartDate, false) => PhaseField::Name,
        };
        self.enter_field();
    }

    fn cancel_editing(&mut self) {
        self.start_input.cancel();
        self.end_input.cancel();
        self.editing = false;
    }

    fn edit_current_field(&mut self, key: KeyCode) {
        match self.field {
            PhaseField::Name => {
                if let Some(row) = self.selected_row() {
                    match key {
                        KeyCode::Char(c) => row.phase_name.push(c),
                        KeyCode::Backspace => {
                            row.phase_name.pop();
                        }
                        _ => {}
                    }
                }
            }
            PhaseField::StartDate => self.start_input.handle_input(key),
            PhaseField::EndDate => self.end_input.handle_input(key),
        }
    }

    fn payloads(&self) -> Result<Vec<PhasePayload>, ValidationError> {
        self.rows
            .iter()
            .map(|row| row.to_payload(self.project_id))
            .collect()
    }

    fn cell_text(&self, index: usize, field: PhaseField) -> String {
        let row = &self.rows[index];
        let open = self.editing && self.phase_state.selected() == Some(index) && self.field == field;
        match field {
            PhaseField::Name if open => format!("{}|", row.phase_name),
            PhaseField::Name => row.phase_name.clone(),
            PhaseField::StartDate if open => self.start_input.get_display_string(),
            PhaseField::StartDate => format_optional_day(row.start_date),
            PhaseField::EndDate if open => self.end_input.get_display_string(),
            PhaseField::EndDate => format_optional_day(row.end_date),
        }
    }
}

pub fn render_phases<B: Backend>(f: &mut Frame<B>, state: &mut PhasesState, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(4)].as_ref())
        .split(area);
    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)].as_ref())
        .split(chunks[0]);

    render_phase_table(f, state, panes[0]);
    render_task_list(f, state, panes[1]);

    let help = match (state.focus, state.editing) {
        (PhaseFocus::Phases, true) => match state.field {
            PhaseField::Name => "Type name | Tab - Next field | Enter - Done | Esc - Cancel",
            _ => "Digits - Date part | Left/Right - Part | +/- - Day | Tab - Next field | Enter - Done",
        },
        (PhaseFocus::Phases, false) if state.started => "Up/Down - Select phase | Tab - Tasks",
        (PhaseFocus::Phases, false) => {
            "<A> Add phase | <Enter> Edit | <S> Confirm phases | Up/Down - Select | Tab - Tasks"
        }
        (PhaseFocus::Tasks, _) => {
            "<N> New task | <C> Contributors | <R> Refresh spend | Up/Down - Select | Tab - Phases"
        }
    };

    let message = if let Some(status) = &state.status {
        Some(status.clone())
    } else if state.started {
        Some("Project started: phases are read-only".to_string())
    } else if state.editing && state.field == PhaseField::EndDate {
        Some(format!("End date window: {}", describe_bounds(state.end_input.bounds())))
    } else if state.editing && state.field == PhaseField::StartDate {
        Some(format!("Start date window: {}", describe_bounds(state.start_input.bounds())))
    } else {
        phase_gate(&state.rows, &state.tracker)
            .blocked_reason()
            .map(|r| format!("Confirm disabled: {}", r))
    };
    render_help(f, chunks[1], help, message.as_deref());
}

fn render_phase_table<B: Backend>(f: &mut Frame<B>, state: &mut PhasesState, area: Rect) {
    let header = Row::new(vec!["Phase", "Start", "End"])
        .style(Style::default().add_modifier(Modifier::BOLD))
        .bottom_margin(1);

    let rows: Vec<Row> = (0..state.rows.len())
        .map(|i| {
            let style = if state.rows[i].is_valid() {
                Style::default()
            } else {
                Style::default().fg(Color::Red)
            };
            Row::new(vec![
                Cell::from(state.cell_text(i, PhaseField::Name)),
                Cell::from(state.cell_text(i, PhaseField::StartDate)),
                Cell::from(state.cell_text(i, PhaseField::EndDate)),
            ])
            .style(style)
        })
        .collect();

    let border = if state.focus == PhaseFocus::Phases {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let table = Table::new(rows)
        .header(header)
        .block(
            Block::default()
                .title("Phases")
                .borders(Borders::ALL)
                .border_style(border),
        )
        .highlight_style(Style::default().bg(Color::Blue).fg(Color::White))
        .widths(&[
            Constraint::Percentage(40),
            Constraint::Percentage(30),
            Constraint::Percentage(30),
        ]);
    f.render_stateful_widget(table, area, &mut state.phase_state);
}

fn render_task_list<B: Backend>(f: &mut Frame<B>, state: &mut PhasesState, area: Rect) {
    let refreshing = state.refreshing_spend;
    let items: Vec<ListItem> = state
        .tasks
        .iter()
        .map(|task| {
            let spend = match (task.actual_spend, refreshing) {
                (_, true) => "...".to_string(),
                (Some(spend), false) => format!("${:.2}", spend),
                (None, false) => "-".to_string(),
            };
            let over = task.actual_spend.is_some_and(|s| s > task.budget as f64);
            ListItem::new(vec![
                Spans::from(Span::styled(
                    task.title.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Spans::from(vec![
                    Span::raw(format!(
                        "  due {} | {} | budget ${} | spent ",
                        format_iso_day(task.due_date),
                        task.status,
                        task.budget
                    )),
                    Span::styled(
                        spend,
                        if over {
                            Style::default().fg(Color::Red)
                        } else {
                            Style::default()
                        },
                    ),
                ]),
            ])
        })
        .collect();

    let title = match (state.selected_phase_id(), state.tasks_phase) {
        (None, _) => "Tasks (save the phase first)".to_string(),
        (Some(_), _) if state.tasks.is_empty() => "Tasks (none)".to_string(),
        _ => "Tasks".to_string(),
    };
    let border = if state.focus == PhaseFocus::Tasks {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let list = List::new(items)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(border),
        )
        .highlight_style(Style::default().bg(Color::Blue).fg(Color::White));
    f.render_stateful_widget(list, area, &mut state.task_state);
}

pub fn handle_input(state: &mut PhasesState, key: KeyCode) -> Option<PhaseAction> {
    if state.editing {
        match key {
            KeyCode::Esc => state.cancel_editing(),
            KeyCode::Enter => {
                if state.leave_field() {
                    state.editing = false;
                }
            }
            KeyCode::Tab => state.move_field(true),
            KeyCode::BackTab => state.move_field(false),
            _ => state.edit_current_field(key),
        }
        return None;
    }

    state.status = None;
    if key == KeyCode::Tab || key == KeyCode::BackTab {
        state.focus = match state.focus {
            PhaseFocus::Phases => PhaseFocus::Tasks,
            PhaseFocus::Tasks => PhaseFocus::Phases,
        };
        return None;
    }

    match state.focus {
        PhaseFocus::Phases => handle_phase_keys(state, key),
        PhaseFocus::Tasks => handle_task_keys(state, key),
    }
}

fn handle_phase_keys(state: &mut PhasesState, key: KeyCode) -> Option<PhaseAction> {
    match key {
        KeyCode::Down | KeyCode::Up => {
            let len = state.rows.len();
            let i = if key == KeyCode::Down {
                next_index(state.phase_state.selected(), len)
            } else {
                previous_index(state.phase_state.selected(), len)
            };
            state.phase_state.select(i);
            return state.needs_tasks().map(PhaseAction::LoadTasks);
        }
        KeyCode::Char('a') if !state.started => state.add_phase(),
        KeyCode::Enter if !state.started => state.begin_editing(),
        KeyCode::Char('s') if state.can_confirm() => match state.payloads() {
            Ok(rows) => return Some(PhaseAction::SavePhases(rows)),
            Err(e) => state.status = Some(e.to_string()),
        },
        _ => {}
    }
    None
}

fn handle_task_keys(state: &mut PhasesState, key: KeyCode) -> Option<PhaseAction> {
    match key {
        KeyCode::Down => {
            let i = next_index(state.task_state.selected(), state.tasks.len());
            state.task_state.select(i);
        }
        KeyCode::Up => {
            let i = previous_index(state.task_state.selected(), state.tasks.len());
            state.task_state.select(i);
        }
        KeyCode::Char('n') => match state.selected_phase_id() {
            Some(phase_id) => return Some(PhaseAction::NewTask(phase_id)),
            None => state.status = Some("Save the phase before adding tasks".to_string()),
        },
        KeyCode::Char('c') => {
            if let Some(task) = state.selected_task() {
                return Some(PhaseAction::EditAssignments(task.clone()));
            }
        }
        KeyCode::Char('r') if !state.tasks.is_empty() => return Some(PhaseAction::RefreshSpend),
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

    fn phase(id: i32, name: &str) -> Phase {
        Phase {
            id,
            project_id: 8,
            phase_name: name.to_string(),
            start_date: day(2024, 2, 1),
            end_date: day(2024, 2, 10),
        }
    }

    fn task(id: i32) -> Task {
        Task {
            id,
            phase_id: 4,
            title: format!("Task {}", id),
            description: String::new(),
            start_date: day(2024, 2, 1),
            end_date: day(2024, 2, 5),
            due_date: day(2024, 2, 5),
            budget: 100,
            status: "Not Started".to_string(),
            actual_spend: None,
        }
    }

    fn type_text(state: &mut PhasesState, text: &str) {
        for c in text.chars() {
            handle_input(state, KeyCode::Char(c));
        }
    }

    #[test]
    fn started_project_locks_phases() {
        let mut state = PhasesState::new(8, true, &[phase(4, "Design")]);
        handle_input(&mut state, KeyCode::Char('a'));
        handle_input(&mut state, KeyCode::Enter);
        assert_eq!(state.rows.len(), 1);
        assert!(!state.is_editing());
        assert!(!state.can_confirm());
    }

    #[test]
    fn new_phase_needs_all_fields_before_confirm() {
        let mut state = PhasesState::new(8, false, &[phase(4, "Design")]);
        handle_input(&mut state, KeyCode::Char('a'));
        type_text(&mut state, "Build");
        handle_input(&mut state, KeyCode::Enter);
        assert!(!state.can_confirm());
        assert_eq!(handle_input(&mut state, KeyCode::Char('s')), None);

        let row = state.rows.last_mut().unwrap();
        row.start_date = Some(day(2024, 2, 11));
        row.end_date = Some(day(2024, 2, 20));
        match handle_input(&mut state, KeyCode::Char('s')) {
            Some(PhaseAction::SavePhases(rows)) => {
                assert_eq!(rows.len(), 2);
                assert_eq!(rows[0].phase_id, Some(4));
                assert_eq!(rows[1].phase_id, None);
                assert_eq!(rows[1].phase_name, "Build");
            }
            other => panic!("expected save, got {:?}", other),
        }
    }

    #[test]
    fn end_before_start_is_refused_by_picker() {
        let mut state = PhasesState::new(8, false, &[phase(4, "Design")]);
        handle_input(&mut state, KeyCode::Enter);
        handle_input(&mut state, KeyCode::Tab);
        handle_input(&mut state, KeyCode::Tab);
        // Day part: type the start day itself, which the end window excludes.
        handle_input(&mut state, KeyCode::Right);
        handle_input(&mut state, KeyCode::Right);
        type_text(&mut state, "01");
        handle_input(&mut state, KeyCode::Enter);

        assert!(state.is_editing());
        assert_eq!(state.rows[0].end_date, Some(day(2024, 2, 10)));
    }

    #[test]
    fn start_picker_stops_before_end() {
        let mut state = PhasesState::new(8, false, &[phase(4, "Design")]);
        handle_input(&mut state, KeyCode::Enter);
        handle_input(&mut state, KeyCode::Tab);
        assert_eq!(state.start_input.bounds().max, Some(day(2024, 2, 9)));

        handle_input(&mut state, KeyCode::Right);
        handle_input(&mut state, KeyCode::Right);
        type_text(&mut state, "10");
        handle_input(&mut state, KeyCode::Enter);
        assert!(state.is_editing());
        assert_eq!(state.rows[0].start_date, Some(day(2024, 2, 1)));

        handle_input(&mut state, KeyCode::Right);
        handle_input(&mut state, KeyCode::Right);
        type_text(&mut state, "09");
        handle_input(&mut state, KeyCode::Enter);
        assert_eq!(state.rows[0].start_date, Some(day(2024, 2, 9)));
        assert_eq!(state.rows[0].end_date, Some(day(2024, 2, 10)));
    }

    #[test]
    fn stale_spend_refresh_is_ignored() {
        let mut state = PhasesState::new(8, false, &[phase(4, "Design")]);
        let (first, _) = state.set_tasks(4, vec![task(1)]);
        let (second, ids) = state.begin_spend_refresh();
        assert_eq!(ids, vec![1]);

        assert!(!state.apply_spend(Stamped { ticket: first, value: HashMap::from([(1, 5.0)]) }));
        assert_eq!(state.tasks()[0].actual_spend, None);

        assert!(state.apply_spend(Stamped { ticket: second, value: HashMap::from([(1, 7.5)]) }));
        assert_eq!(state.tasks()[0].actual_spend, Some(7.5));
    }

    #[test]
    fn task_needs_saved_phase() {
        let mut state = PhasesState::new(8, false, &[]);
        handle_input(&mut state, KeyCode::Char('a'));
        handle_input(&mut state, KeyCode::Esc);
        handle_input(&mut state, KeyCode::Tab);
        assert_eq!(handle_input(&mut state, KeyCode::Char('n')), None);
        assert!(state.status.is_some());
    }
}
