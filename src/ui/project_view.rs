use chrono::NaiveDate;
use crossterm::event::KeyCode;
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, Paragraph, Tabs, Wrap},
    Frame,
};

use crate::models::{AssignmentPayload, AssignmentRow, NewTask, Project, StaffingRow, Task, User};
use crate::ui::assignments::{self, AssignmentAction, AssignmentsState};
use crate::ui::components::{render_confirmation, render_help};
use crate::ui::invoice_wizard::{self, InvoiceWizardAction, InvoiceWizardState};
use crate::ui::phases::{self, PhaseAction, PhasesState};
use crate::ui::staffing::{self, StaffingAction, StaffingState};
use crate::ui::task_wizard::{self, TaskWizardAction, TaskWizardState};
use crate::ui::utilization::{self, UtilizationAction, UtilizationState};
use crate::validation::date_window::format_iso_day;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectTab {
    Staffing,
    Phases,
    Start,
    Utilization,
    Invoice,
}

impl ProjectTab {
    pub const ALL: [ProjectTab; 5] = [
        ProjectTab::Staffing,
        ProjectTab::Phases,
        ProjectTab::Start,
        ProjectTab::Utilization,
        ProjectTab::Invoice,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            ProjectTab::Staffing => "1 Staffing",
            ProjectTab::Phases => "2 Phases & Tasks",
            ProjectTab::Start => "3 Start Project",
            ProjectTab::Utilization => "4 Utilization",
            ProjectTab::Invoice => "5 Invoice",
        }
    }

    fn from_digit(c: char) -> Option<Self> {
        let i = c.to_digit(10)? as usize;
        Self::ALL.get(i.checked_sub(1)?).copied()
    }

    fn index(&self) -> usize {
        Self::ALL.iter().position(|t| t == self).unwrap_or(0)
    }
}

#[derive(Debug, PartialEq)]
pub enum ProjectViewAction {
    Back,
    /// The tab became visible; load whatever it is missing.
    Opened(ProjectTab),
    Staffing(StaffingAction),
    Phases(PhaseAction),
    SaveTask(NewTask),
    SaveAssignments(i32, Vec<AssignmentPayload>),
    Utilization(UtilizationAction),
    Invoice(InvoiceWizardAction),
    StartProject,
}

/// One project with its tabs. Tab states are filled in lazily as their data
/// arrives.
pub struct ProjectViewState {
    pub project: Project,
    pub tab: ProjectTab,
    pub total_spend: Option<f64>,
    pub forecast: Option<f64>,
    pub staffing: Option<StaffingState>,
    pub phases: Option<PhasesState>,
    pub utilization: UtilizationState,
    pub invoice: Option<InvoiceWizardState>,
    task_wizard: Option<TaskWizardState>,
    assignments: Option<AssignmentsState>,
    confirm_start: bool,
    pub status: Option<String>,
}

impl ProjectViewState {
    pub fn new(project: Project, today: NaiveDate) -> Self {
        Self {
            project,
            tab: ProjectTab::Staffing,
            total_spend: None,
            forecast: None,
            staffing: None,
            phases: None,
            utilization: UtilizationState::new(today),
            invoice: None,
            task_wizard: None,
            assignments: None,
            confirm_start: false,
            status: None,
        }
    }

    pub fn project_id(&self) -> i32 {
        self.project.id
    }

    /// The server flipped `started`; phases become read-only.
    pub fn started(&mut self, project: Project) {
        if let Some(phases) = self.phases.as_mut() {
            phases.set_started(project.started);
        }
        self.project = project;
        self.status = Some("Project started".to_string());
    }

    pub fn open_assignments(
        &mut self,
        task: Task,
        rows: &[AssignmentRow],
        staffing: Vec<StaffingRow>,
        users: Vec<User>,
    ) {
        self.assignments = Some(AssignmentsState::new(task, rows, staffing, users));
    }

    pub fn assignments_mut(&mut self) -> Option<&mut AssignmentsState> {
        self.assignments.as_mut()
    }

    pub fn task_wizard_mut(&mut self) -> Option<&mut TaskWizardState> {
        self.task_wizard.as_mut()
    }

    pub fn close_task_wizard(&mut self) {
        self.task_wizard = None;
    }

    fn tab_is_editing(&self) -> bool {
        match self.tab {
            ProjectTab::Staffing => self.staffing.as_ref().is_some_and(|s| s.is_editing()),
            ProjectTab::Phases => self.phases.as_ref().is_some_and(|p| p.is_editing()),
            ProjectTab::Invoice => self.invoice.as_ref().is_some_and(|i| i.is_editing()),
            ProjectTab::Start | ProjectTab::Utilization => false,
        }
    }

    fn leave_tab(&mut self) {
        match self.tab {
            ProjectTab::Phases => {
                if let Some(phases) = self.phases.as_mut() {
                    phases.detach();
                }
            }
            ProjectTab::Invoice => {
                if let Some(invoice) = self.invoice.as_mut() {
                    invoice.detach();
                }
            }
            _ => {}
        }
    }

    /// Stops every background answer addressed to this view.
    pub fn detach(&mut self) {
        if let Some(phases) = self.phases.as_mut() {
            phases.detach();
        }
        if let Some(invoice) = self.invoice.as_mut() {
            invoice.detach();
        }
    }
}

fn money(value: Option<f64>) -> String {
    value
        .map(|v| format!("${:.2}", v))
        .unwrap_or_else(|| "-".to_string())
}

pub fn render_project_view<B: Backend>(f: &mut Frame<B>, state: &mut ProjectViewState) {
    if let Some(wizard) = state.task_wizard.as_ref() {
        task_wizard::render_task_wizard(f, wizard);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(4),
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(4),
            ]
            .as_ref(),
        )
        .split(f.size());

    let project = &state.project;
    let header = Paragraph::new(vec![
        Spans::from(vec![
            Span::styled(project.name.clone(), Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(format!(" | {}", project.client_name)),
            Span::raw(format!(
                " | {} to {}",
                format_iso_day(project.start_date),
                format_iso_day(project.end_date)
            )),
        ]),
        Spans::from(format!(
            "Spent {} of forecast {}{}",
            money(state.total_spend),
            money(state.forecast),
            if project.started { " | started" } else { "" }
        )),
    ])
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(header, chunks[0]);

    let titles: Vec<Spans> = ProjectTab::ALL
        .iter()
        .map(|t| Spans::from(t.title()))
        .collect();
    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL))
        .select(state.tab.index())
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
    f.render_widget(tabs, chunks[1]);

    let body = chunks[2];
    match state.tab {
        ProjectTab::Staffing => match state.staffing.as_mut() {
            Some(s) => staffing::render_staffing(f, s, body),
            None => render_loading(f, body),
        },
        ProjectTab::Phases => match state.phases.as_mut() {
            Some(p) => phases::render_phases(f, p, body),
            None => render_loading(f, body),
        },
        ProjectTab::Start => render_start_tab(f, &state.project, body),
        ProjectTab::Utilization => utilization::render_utilization(f, &state.utilization, body),
        ProjectTab::Invoice => match state.invoice.as_ref() {
            Some(i) => invoice_wizard::render_invoice_wizard(f, i, body),
            None => render_loading(f, body),
        },
    }

    render_help(
        f,
        chunks[3],
        "1-5 - Switch tab | <Esc> Back to projects",
        state.status.as_deref(),
    );

    if let Some(assignments) = state.assignments.as_mut() {
        assignments::render_assignments(f, assignments);
    }

    if state.confirm_start {
        render_confirmation(
            f,
            "Start Project",
            vec![
                Spans::from(format!("Start {}?", state.project.name)),
                Spans::from("Phases can no longer be changed afterwards."),
                Spans::from(""),
                Spans::from("Press 'y' to confirm or 'n' to cancel"),
            ],
        );
    }
}

fn render_loading<B: Backend>(f: &mut Frame<B>, area: Rect) {
    let loading = Paragraph::new("Loading...").block(Block::default().borders(Borders::ALL));
    f.render_widget(loading, area);
}

fn render_start_tab<B: Backend>(f: &mut Frame<B>, project: &Project, area: Rect) {
    let lines = if project.started {
        vec![
            Spans::from(Span::styled(
                "This project has started.",
                Style::default().fg(Color::Green),
            )),
            Spans::from("Phases are read-only."),
        ]
    } else {
        vec![
            Spans::from("Starting a project locks its phases."),
            Spans::from("This cannot be undone."),
            Spans::from(""),
            Spans::from("Press <Enter> to start."),
        ]
    };
    let start = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().title("Start Project").borders(Borders::ALL));
    f.render_widget(start, area);
}

pub fn handle_input(
    state: &mut ProjectViewState,
    key: KeyCode,
    today: NaiveDate,
) -> Option<ProjectViewAction> {
    if let Some(wizard) = state.task_wizard.as_mut() {
        return match task_wizard::handle_input(wizard, key)? {
            TaskWizardAction::Cancel => {
                state.task_wizard = None;
                None
            }
            TaskWizardAction::Save(task) => Some(ProjectViewAction::SaveTask(task)),
        };
    }

    if let Some(editor) = state.assignments.as_mut() {
        return match assignments::handle_input(editor, key)? {
            AssignmentAction::Close => {
                state.assignments = None;
                None
            }
            AssignmentAction::Confirm(task_id, rows) => {
                Some(ProjectViewAction::SaveAssignments(task_id, rows))
            }
        };
    }

    if state.confirm_start {
        match key {
            KeyCode::Char('y') => {
                state.confirm_start = false;
                return Some(ProjectViewAction::StartProject);
            }
            KeyCode::Char('n') | KeyCode::Esc => state.confirm_start = false,
            _ => {}
        }
        return None;
    }

    if !state.tab_is_editing() {
        match key {
            KeyCode::Esc => {
                state.detach();
                return Some(ProjectViewAction::Back);
            }
            KeyCode::Char(c) => {
                if let Some(tab) = ProjectTab::from_digit(c) {
                    if tab != state.tab {
                        state.leave_tab();
                        state.tab = tab;
                        state.status = None;
                        return Some(ProjectViewAction::Opened(tab));
                    }
                    return None;
                }
            }
            _ => {}
        }
    }

    match state.tab {
        ProjectTab::Staffing => state
            .staffing
            .as_mut()
            .and_then(|s| staffing::handle_input(s, key))
            .map(ProjectViewAction::Staffing),
        ProjectTab::Phases => match phases::handle_input(state.phases.as_mut()?, key)? {
            PhaseAction::NewTask(phase_id) => {
                state.task_wizard = Some(TaskWizardState::new(phase_id));
                None
            }
            action => Some(ProjectViewAction::Phases(action)),
        },
        ProjectTab::Start => {
            if key == KeyCode::Enter && !state.project.started {
                state.confirm_start = true;
            }
            None
        }
        ProjectTab::Utilization => {
            utilization::handle_input(&mut state.utilization, key, today)
                .map(ProjectViewAction::Utilization)
        }
        ProjectTab::Invoice => state
            .invoice
            .as_mut()
            .and_then(|i| invoice_wizard::handle_input(i, key))
            .map(ProjectViewAction::Invoice),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Phase;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn project(started: bool) -> Project {
        Project {
            id: 8,
            name: "Website".to_string(),
            client_name: "Acme".to_string(),
            start_date: day(2024, 1, 1),
            end_date: day(2024, 6, 30),
            started,
        }
    }

    #[test]
    fn digits_switch_tabs() {
        let today = day(2024, 3, 6);
        let mut state = ProjectViewState::new(project(false), today);
        assert_eq!(
            handle_input(&mut state, KeyCode::Char('4'), today),
            Some(ProjectViewAction::Opened(ProjectTab::Utilization))
        );
        assert_eq!(state.tab, ProjectTab::Utilization);
        assert_eq!(handle_input(&mut state, KeyCode::Char('4'), today), None);
        assert_eq!(handle_input(&mut state, KeyCode::Char('9'), today), None);
        assert_eq!(handle_input(&mut state, KeyCode::Esc, today), Some(ProjectViewAction::Back));
    }

    #[test]
    fn starting_needs_confirmation() {
        let today = day(2024, 3, 6);
        let mut state = ProjectViewState::new(project(false), today);
        handle_input(&mut state, KeyCode::Char('3'), today);

        assert_eq!(handle_input(&mut state, KeyCode::Enter, today), None);
        assert_eq!(handle_input(&mut state, KeyCode::Char('n'), today), None);
        handle_input(&mut state, KeyCode::Enter, today);
        assert_eq!(
            handle_input(&mut state, KeyCode::Char('y'), today),
            Some(ProjectViewAction::StartProject)
        );
    }

    #[test]
    fn started_project_cannot_start_again() {
        let today = day(2024, 3, 6);
        let mut state = ProjectViewState::new(project(true), today);
        handle_input(&mut state, KeyCode::Char('3'), today);
        handle_input(&mut state, KeyCode::Enter, today);
        assert_eq!(handle_input(&mut state, KeyCode::Char('y'), today), None);
    }

    #[test]
    fn new_task_opens_wizard_for_phase() {
        let today = day(2024, 3, 6);
        let mut state = ProjectViewState::new(project(false), today);
        let phase = Phase {
            id: 3,
            project_id: 8,
            phase_name: "Design".to_string(),
            start_date: day(2024, 1, 1),
            end_date: day(2024, 2, 1),
        };
        state.phases = Some(PhasesState::new(8, false, &[phase]));
        handle_input(&mut state, KeyCode::Char('2'), today);
        handle_input(&mut state, KeyCode::Tab, today);

        assert_eq!(handle_input(&mut state, KeyCode::Char('n'), today), None);
        assert_eq!(state.task_wizard_mut().map(|w| w.phase_id), Some(3));

        // Esc belongs to the wizard while it is open.
        assert_eq!(handle_input(&mut state, KeyCode::Esc, today), None);
        assert!(state.task_wizard_mut().is_none());
    }
}
