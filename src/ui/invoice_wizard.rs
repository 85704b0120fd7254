use chrono::NaiveDate;
use crossterm::event::KeyCode;
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, Cell, List, ListItem, Row, Table},
    Frame,
};

use crate::api::ApiResult;
use crate::fetch::{RequestGate, Stamped, Ticket};
use crate::models::{Invoice, InvoiceRequest, InvoiceTable, Project};
use crate::ui::components::date_input::DateInputState;
use crate::ui::components::{next_index, previous_index, render_help};
use crate::validation::date_window::{format_iso_day, today};
use crate::validation::rows::InvoiceDraft;
use crate::validation::Bounds;

// Represents a field in the invoice form
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum InvoiceField {
    Project,
    Client,
    PeriodStart,
    PeriodEnd,
}

#[derive(Debug, PartialEq)]
pub enum InvoiceWizardAction {
    /// Fetch the preview for this period; the answer must carry the ticket.
    Preview {
        ticket: Ticket,
        project_id: i32,
        start: NaiveDate,
        end: NaiveDate,
    },
    Generate(i32, InvoiceRequest),
}

pub struct InvoiceWizardState {
    projects: Vec<Project>,
    pub draft: InvoiceDraft,
    current_field: InvoiceField,
    editing: bool,
    start_state: DateInputState,
    end_state: DateInputState,
    preview: Option<InvoiceTable>,
    loading_preview: bool,
    submitting: bool,
    gate: RequestGate,
    pub error: Option<String>,
    pub success: Option<String>,
}

impl InvoiceWizardState {
    /// Opens on `initial_project` (or the first project) and the current week.
    pub fn new(today: NaiveDate, projects: Vec<Project>, initial_project: Option<i32>) -> Self {
        let mut draft = InvoiceDraft::new(today);
        let chosen = initial_project
            .and_then(|id| projects.iter().find(|p| p.id == id))
            .or_else(|| projects.first());
        if let Some(project) = chosen {
            draft.project_id = Some(project.id);
            draft.client_name = project.client_name.clone();
        }

        Self {
            start_state: DateInputState::new(draft.period_start),
            end_state: DateInputState::new(draft.period_end),
            projects,
            draft,
            current_field: InvoiceField::Project,
            editing: false,
            preview: None,
            loading_preview: false,
            submitting: false,
            gate: RequestGate::new(),
            error: None,
            success: None,
        }
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn preview(&self) -> Option<&InvoiceTable> {
        self.preview.as_ref()
    }

    pub fn can_submit(&self) -> bool {
        self.draft.to_request().is_ok() && !self.loading_preview && !self.submitting
    }

    /// Called after every input change. Returns the fetch to start, or
    /// clears the preview when the inputs cannot produce one.
    pub fn refresh_preview(&mut self) -> Option<InvoiceWizardAction> {
        match self.draft.preview_period() {
            Some((project_id, start, end)) => {
                self.loading_preview = true;
                self.error = None;
                self.success = None;
                Some(InvoiceWizardAction::Preview {
                    ticket: self.gate.issue(),
                    project_id,
                    start,
                    end,
                })
            }
            None => {
                self.gate.invalidate();
                self.loading_preview = false;
                self.preview = None;
                None
            }
        }
    }

    /// Applies a preview answer if it belongs to the newest request.
    pub fn apply_preview(&mut self, done: Stamped<ApiResult<InvoiceTable>>) -> bool {
        if !self.gate.accepts(done.ticket) {
            return false;
        }
        self.loading_preview = false;
        match done.value {
            Ok(table) => self.preview = Some(table),
            Err(e) => {
                self.preview = None;
                self.error = Some(format!("Failed to compute invoice preview: {}", e.user_message()));
            }
        }
        true
    }

    pub fn generated(&mut self, invoice: &Invoice) {
        self.submitting = false;
        self.success = Some(format!(
            "Invoice #{} created for {} (${})",
            invoice.id, invoice.client_name, invoice.total_amount
        ));
    }

    pub fn generate_failed(&mut self, message: String) {
        self.submitting = false;
        self.error = Some(format!("Failed to create invoice: {}", message));
    }

    /// Stops accepting preview answers once the tab is gone.
    pub fn detach(&mut self) {
        self.gate.invalidate();
        self.loading_preview = false;
    }

    fn selected_project(&self) -> Option<&Project> {
        self.draft
            .project_id
            .and_then(|id| self.projects.iter().find(|p| p.id == id))
    }

    fn cycle_project(&mut self, forward: bool) -> Option<InvoiceWizardAction> {
        let current = self
            .draft
            .project_id
            .and_then(|id| self.projects.iter().position(|p| p.id == id));
        let next = if forward {
            next_index(current, self.projects.len())
        } else {
            previous_index(current, self.projects.len())
        }?;
        let project = &self.projects[next];
        self.draft.project_id = Some(project.id);
        if self.draft.client_name.trim().is_empty() {
            self.draft.client_name = project.client_name.clone();
        }
        self.refresh_preview()
    }

    fn begin_editing(&mut self) {
        self.editing = true;
        let today = today();
        match self.current_field {
            InvoiceField::PeriodStart => {
                self.start_state.set_date(self.draft.period_start);
                self.start_state
                    .set_bounds(Bounds::inclusive(None, self.draft.period_end));
                self.start_state.begin_editing(today);
            }
            InvoiceField::PeriodEnd => {
                self.end_state.set_date(self.draft.period_end);
                self.end_state
                    .set_bounds(Bounds::inclusive(self.draft.period_start, None));
                self.end_state.begin_editing(today);
            }
            _ => {}
        }
    }

    fn finish_editing(&mut self) -> Option<InvoiceWizardAction> {
        match self.current_field {
            InvoiceField::PeriodStart => {
                self.draft.period_start = Some(self.start_state.commit()?);
            }
            InvoiceField::PeriodEnd => {
                self.draft.period_end = Some(self.end_state.commit()?);
            }
            _ => {}
        }
        self.editing = false;
        match self.current_field {
            InvoiceField::PeriodStart | InvoiceField::PeriodEnd => self.refresh_preview(),
            _ => None,
        }
    }

    fn cancel_editing(&mut self) {
        self.start_state.cancel();
        self.end_state.cancel();
        self.editing = false;
    }

    fn edit_current_field(&mut self, key: KeyCode) -> Option<InvoiceWizardAction> {
        match self.current_field {
            InvoiceField::Project => match key {
                KeyCode::Right | KeyCode::Char(' ') => self.cycle_project(true),
                KeyCode::Left => self.cycle_project(false),
                _ => None,
            },
            // The preview does not depend on the client name.
            InvoiceField::Client => {
                match key {
                    KeyCode::Char(c) => self.draft.client_name.push(c),
                    KeyCode::Backspace => {
                        self.draft.client_name.pop();
                    }
                    _ => {}
                }
                None
            }
            InvoiceField::PeriodStart => {
                self.start_state.handle_input(key);
                None
            }
            InvoiceField::PeriodEnd => {
                self.end_state.handle_input(key);
                None
            }
        }
    }

    fn next_field(&mut self) {
        self.current_field = match self.current_field {
            InvoiceField::Project => InvoiceField::Client,
            InvoiceField::Client => InvoiceField::PeriodStart,
            InvoiceField::PeriodStart => InvoiceField::PeriodEnd,
            InvoiceField::PeriodEnd => InvoiceField::Project,
        };
    }

    fn previous_field(&mut self) {
        self.current_field = match self.current_field {
            InvoiceField::Project => InvoiceField::PeriodEnd,
            InvoiceField::Client => InvoiceField::Project,
            InvoiceField::PeriodStart => InvoiceField::Client,
            InvoiceField::PeriodEnd => InvoiceField::PeriodStart,
        };
    }
}

pub fn render_invoice_wizard<B: Backend>(frame: &mut Frame<B>, state: &InvoiceWizardState, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(6),
                Constraint::Min(6),
                Constraint::Length(4),
            ]
            .as_ref(),
        )
        .split(area);

    render_form(frame, state, chunks[0]);
    render_preview(frame, state, chunks[1]);

    let help_text = match (state.editing, state.current_field) {
        (false, _) => "Enter - Edit field | Up/Down - Navigate fields | G - Generate invoice",
        (true, InvoiceField::Project) => "Left/Right - Choose project | Enter/Esc - Done",
        (true, InvoiceField::Client) => "Type client name | Enter/Esc - Done",
        (true, _) => "Enter - Save field | Left/Right - Switch date part | +/- - Day | Esc - Cancel",
    };
    let message = state.error.clone().or_else(|| state.success.clone());
    render_help(frame, chunks[2], help_text, message.as_deref());
}

fn render_form<B: Backend>(frame: &mut Frame<B>, state: &InvoiceWizardState, area: Rect) {
    let project_name = state
        .selected_project()
        .map(|p| p.name.clone())
        .unwrap_or_else(|| "Select...".to_string());
    let start = if state.editing && state.current_field == InvoiceField::PeriodStart {
        state.start_state.get_display_string()
    } else {
        DateInputState::new(state.draft.period_start).get_display_string()
    };
    let end = if state.editing && state.current_field == InvoiceField::PeriodEnd {
        state.end_state.get_display_string()
    } else {
        DateInputState::new(state.draft.period_end).get_display_string()
    };
    let client = if state.editing && state.current_field == InvoiceField::Client {
        format!("{}|", state.draft.client_name)
    } else {
        state.draft.client_name.clone()
    };

    let fields = [
        (InvoiceField::Project, "Project", project_name),
        (InvoiceField::Client, "Client", client),
        (InvoiceField::PeriodStart, "Period Start", start),
        (InvoiceField::PeriodEnd, "Period End", end),
    ];
    let items: Vec<ListItem> = fields
        .into_iter()
        .map(|(field, name, value)| {
            let selected = field == state.current_field;
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
            ListItem::new(Spans::from(vec![
                Span::styled(format!("{}: ", name), name_style),
                Span::styled(value, value_style),
            ]))
        })
        .collect();

    let form = List::new(items).block(Block::default().borders(Borders::ALL).title("Create Invoice"));
    frame.render_widget(form, area);
}

fn render_preview<B: Backend>(frame: &mut Frame<B>, state: &InvoiceWizardState, area: Rect) {
    let (rows, total) = match &state.preview {
        Some(table) => (
            table
                .rows
                .iter()
                .map(|line| {
                    Row::new(vec![
                        Cell::from(line.task.clone()),
                        Cell::from(line.phase.clone()),
                        Cell::from(line.task_contributor.clone()),
                        Cell::from(format!("{:.2}", line.hours)),
                        Cell::from(format!("${:.2}", line.rate)),
                        Cell::from(format!("${:.2}", line.amount)),
                    ])
                })
                .collect::<Vec<_>>(),
            table.total_amount,
        ),
        None => (Vec::new(), 0.0),
    };

    let title = match (&state.preview, state.loading_preview, state.draft.period_start, state.draft.period_end) {
        (_, true, _, _) => "Preview (loading...)".to_string(),
        (Some(_), false, Some(start), Some(end)) => format!(
            "Preview {} to {}  Total: ${:.2}",
            format_iso_day(start),
            format_iso_day(end),
            total
        ),
        _ => "Preview".to_string(),
    };

    let table = Table::new(rows)
        .header(
            Row::new(vec!["Task", "Phase", "Contributor", "Hours", "Rate", "Amount"])
                .style(Style::default().add_modifier(Modifier::BOLD))
                .bottom_margin(1),
        )
        .block(Block::default().title(title).borders(Borders::ALL))
        .widths(&[
            Constraint::Percentage(22),
            Constraint::Percentage(18),
            Constraint::Percentage(20),
            Constraint::Percentage(10),
            Constraint::Percentage(14),
            Constraint::Percentage(16),
        ]);
    frame.render_widget(table, area);
}

pub fn handle_input(state: &mut InvoiceWizardState, key: KeyCode) -> Option<InvoiceWizardAction> {
    if state.editing {
        return match (key, state.current_field) {
            (KeyCode::Esc, InvoiceField::PeriodStart | InvoiceField::PeriodEnd) => {
                state.cancel_editing();
                None
            }
            (KeyCode::Esc, _) => {
                state.editing = false;
                None
            }
            (KeyCode::Enter, _) => state.finish_editing(),
            _ => state.edit_current_field(key),
        };
    }

    match key {
        KeyCode::Enter => state.begin_editing(),
        KeyCode::Up => state.previous_field(),
        KeyCode::Down => state.next_field(),
        KeyCode::Char('g') => {
            if !state.can_submit() {
                if let Err(e) = state.draft.to_request() {
                    state.error = Some(e.to_string());
                }
                return None;
            }
            if let Ok((project_id, request)) = state.draft.to_request() {
                state.submitting = true;
                state.error = None;
                state.success = None;
                return Some(InvoiceWizardAction::Generate(project_id, request));
            }
        }
        _ => {}
    }
    None
}
