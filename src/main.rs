use std::fs::OpenOptions;
use std::io;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use chrono::NaiveDate;
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use tui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};

use task_manager::api::ApiClient;
use task_manager::config::{self, Cli, Config};
use task_manager::fetch::{self, Completion};
use task_manager::models::Project;
use task_manager::session::{Access, Role, SessionContext};
use task_manager::ui::{
    contributor::{render_contributor, handle_input as handle_contributor_input, ContributorAction, ContributorState},
    invoice_wizard::{InvoiceWizardAction, InvoiceWizardState},
    log_hours::{render_log_hours, handle_input as handle_log_hours_input, LogHoursAction, LogHoursState},
    phases::{PhaseAction, PhasesState},
    project_view::{render_project_view, handle_input as handle_project_view_input, ProjectTab, ProjectViewAction, ProjectViewState},
    project_wizard::{render_project_wizard, handle_input as handle_project_wizard_input, ProjectWizardAction, ProjectWizardState},
    projects::{render_projects, handle_input as handle_projects_input, ProjectAction, ProjectsState},
    sign_in::{render_sign_in, handle_input as handle_sign_in_input, SignInAction, SignInState},
    staffing::{StaffingAction, StaffingState},
    utilization::UtilizationAction,
};
use task_manager::validation::date_window::today;

// Represents the current screen in the app
#[derive(Debug, Clone, Copy, PartialEq)]
enum AppScreen {
    SignIn,
    Projects,
    ProjectWizard,
    ProjectView,
    Contributor,
    LogHours,
}

impl AppScreen {
    fn required_role(&self) -> Option<Role> {
        match self {
            AppScreen::SignIn => None,
            AppScreen::Projects | AppScreen::ProjectWizard | AppScreen::ProjectView => {
                Some(Role::Manager)
            }
            AppScreen::Contributor | AppScreen::LogHours => Some(Role::Contributor),
        }
    }
}

// Main application state
struct AppState {
    api: ApiClient,
    session: SessionContext,
    tx: UnboundedSender<Completion>,
    screen: AppScreen,
    sign_in_state: SignInState,
    projects_state: Option<ProjectsState>,
    project_wizard_state: Option<ProjectWizardState>,
    project_view_state: Option<ProjectViewState>,
    contributor_state: Option<ContributorState>,
    log_hours_state: Option<LogHoursState>,
}

impl AppState {
    fn new(api: ApiClient, session: SessionContext, tx: UnboundedSender<Completion>) -> Self {
        Self {
            api,
            session,
            tx,
            screen: AppScreen::SignIn,
            sign_in_state: SignInState::new(),
            projects_state: None,
            project_wizard_state: None,
            project_view_state: None,
            contributor_state: None,
            log_hours_state: None,
        }
    }

    fn sign_out(&mut self) {
        if let Some(view) = self.project_view_state.as_mut() {
            view.detach();
        }
        self.session.clear();
        self.sign_in_state = SignInState::new();
        self.projects_state = None;
        self.project_wizard_state = None;
        self.project_view_state = None;
        self.contributor_state = None;
        self.log_hours_state = None;
        self.screen = AppScreen::SignIn;
    }
}

fn init_logging(config: &Config) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = config::init(Cli::parse())?;
    init_logging(&config)?;
    info!(api_url = config.api_url(), "Starting task manager");

    let api = ApiClient::new(&config)?;

    // Authentication never survives a restart
    let mut session = SessionContext::new();
    session.clear();

    let (tx, mut rx) = mpsc::unbounded_channel();

    // Setup terminal
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app_state = AppState::new(api, session, tx);

    // Run the main app loop
    let result = run_app(&mut terminal, &mut app_state, &mut rx).await;

    // Restore terminal
    terminal::disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    // Show any error message
    if let Err(err) = result {
        error!(error = %err, "Task manager stopped with an error");
        println!("Error: {}", err);
    }

    info!("Task manager stopped");
    println!("Thanks for using Task Manager!");

    Ok(())
}

async fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app_state: &mut AppState,
    rx: &mut UnboundedReceiver<Completion>,
) -> Result<()> {
    loop {
        if let Some(role) = app_state.screen.required_role() {
            if app_state.session.gate(role) == Access::RedirectToSignIn {
                warn!(screen = ?app_state.screen, %role, "Access denied, returning to sign-in");
                app_state.sign_out();
            }
        }

        // Render current screen
        terminal.draw(|f| match app_state.screen {
            AppScreen::SignIn => render_sign_in(f, &app_state.sign_in_state),
            AppScreen::Projects => {
                if let Some(state) = &mut app_state.projects_state {
                    render_projects(f, state);
                }
            }
            AppScreen::ProjectWizard => {
                if let Some(state) = &mut app_state.project_wizard_state {
                    render_project_wizard(f, state);
                }
            }
            AppScreen::ProjectView => {
                if let Some(state) = &mut app_state.project_view_state {
                    render_project_view(f, state);
                }
            }
            AppScreen::Contributor => {
                if let Some(state) = &mut app_state.contributor_state {
                    render_contributor(f, state);
                }
            }
            AppScreen::LogHours => {
                if let Some(state) = &mut app_state.contributor_state {
                    render_contributor(f, state);
                }
                if let Some(state) = &app_state.log_hours_state {
                    render_log_hours(f, state);
                }
            }
        })?;

        // Background answers
        while let Ok(done) = rx.try_recv() {
            apply_completion(app_state, done);
        }

        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        // Handle input for current screen
        let should_quit = match app_state.screen {
            AppScreen::SignIn => handle_sign_in_screen(app_state, key.code).await?,
            AppScreen::Projects => handle_projects_screen(app_state, key.code).await?,
            AppScreen::ProjectWizard => handle_project_wizard_screen(app_state, key.code).await?,
            AppScreen::ProjectView => handle_project_view_screen(app_state, key.code).await?,
            AppScreen::Contributor => handle_contributor_screen(app_state, key.code).await?,
            AppScreen::LogHours => handle_log_hours_screen(app_state, key.code).await?,
        };

        if should_quit {
            break;
        }
    }

    Ok(())
}

fn apply_completion(app_state: &mut AppState, done: Completion) {
    let view = app_state.project_view_state.as_mut();
    match done {
        Completion::ActualSpend(done) => {
            let applied = view
                .and_then(|v| v.phases.as_mut())
                .is_some_and(|phases| phases.apply_spend(done));
            if !applied {
                debug!("Dropped stale actual spend refresh");
            }
        }
        Completion::InvoicePreview(done) => {
            let applied = view
                .and_then(|v| v.invoice.as_mut())
                .is_some_and(|invoice| invoice.apply_preview(done));
            if !applied {
                debug!("Dropped stale invoice preview");
            }
        }
    }
}

async fn handle_sign_in_screen(app_state: &mut AppState, key: KeyCode) -> Result<bool> {
    match handle_sign_in_input(&mut app_state.sign_in_state, key) {
        Some(SignInAction::Quit) => return Ok(true),
        Some(SignInAction::Submit { email, password }) => {
            match app_state.api.login(&email, &password).await {
                Ok(login) => {
                    app_state.session.set(&login.role, login.user_id);
                    match app_state.session.landing_role() {
                        Some(Role::Manager) => load_projects_screen(app_state).await,
                        Some(Role::Contributor) => load_contributor_screen(app_state).await,
                        None => {
                            warn!(role = %login.role, "Signed in with a role that has no home screen");
                            app_state.session.clear();
                            app_state
                                .sign_in_state
                                .failed(format!("Unsupported role: {}", login.role));
                        }
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Sign-in failed");
                    app_state.sign_in_state.failed(e.user_message());
                }
            }
        }
        None => {}
    }

    Ok(false)
}

async fn load_projects_screen(app_state: &mut AppState) {
    let state = match app_state.api.list_projects().await {
        Ok(projects) => {
            info!(count = projects.len(), "Loaded projects");
            ProjectsState::new(projects)
        }
        Err(e) => {
            let mut state = ProjectsState::new(Vec::new());
            state.error = Some(format!("Failed to load projects: {}", e.user_message()));
            state
        }
    };
    app_state.projects_state = Some(state);
    app_state.screen = AppScreen::Projects;
}

async fn handle_projects_screen(app_state: &mut AppState, key: KeyCode) -> Result<bool> {
    let Some(state) = &mut app_state.projects_state else {
        return Ok(false);
    };

    match handle_projects_input(state, key) {
        Some(ProjectAction::SignOut) => app_state.sign_out(),
        Some(ProjectAction::Refresh) => load_projects_screen(app_state).await,
        Some(ProjectAction::NewProject) => {
            app_state.project_wizard_state = Some(ProjectWizardState::new());
            app_state.screen = AppScreen::ProjectWizard;
        }
        Some(ProjectAction::DeleteProject(project_id)) => {
            match app_state.api.delete_project(project_id).await {
                Ok(()) => {
                    info!(project_id, "Deleted project");
                    load_projects_screen(app_state).await;
                }
                Err(e) => {
                    state.error = Some(format!("Failed to delete project: {}", e.user_message()));
                }
            }
        }
        Some(ProjectAction::OpenProject(project_id)) => {
            let project = state.projects().iter().find(|p| p.id == project_id).cloned();
            open_project_view(app_state, project_id, project).await;
        }
        None => {}
    }

    Ok(false)
}

async fn handle_project_wizard_screen(app_state: &mut AppState, key: KeyCode) -> Result<bool> {
    let Some(state) = &mut app_state.project_wizard_state else {
        return Ok(false);
    };

    match handle_project_wizard_input(state, key) {
        Some(ProjectWizardAction::Cancel) => {
            app_state.project_wizard_state = None;
            load_projects_screen(app_state).await;
        }
        Some(ProjectWizardAction::Save(project)) => {
            match app_state.api.create_project(&project).await {
                Ok(created) => {
                    info!(project_id = created.id, name = %created.name, "Created project");
                    app_state.project_wizard_state = None;
                    load_projects_screen(app_state).await;
                }
                Err(e) => {
                    state.error = Some(format!("Failed to create project: {}", e.user_message()));
                }
            }
        }
        None => {}
    }

    Ok(false)
}

async fn open_project_view(app_state: &mut AppState, project_id: i32, known: Option<Project>) {
    let project = match known {
        Some(project) => project,
        None => match app_state.api.get_project(project_id).await {
            Ok(project) => project,
            Err(e) => {
                if let Some(state) = app_state.projects_state.as_mut() {
                    state.error = Some(format!("Failed to open project: {}", e.user_message()));
                }
                return;
            }
        },
    };

    info!(project_id, "Opening project");
    let mut view = ProjectViewState::new(project, today());
    load_totals(&app_state.api, &mut view).await;
    let projects = app_state
        .projects_state
        .as_ref()
        .map(|s| s.projects().to_vec())
        .unwrap_or_default();
    load_tab(&app_state.api, &app_state.tx, &mut view, ProjectTab::Staffing, &projects).await;

    app_state.project_view_state = Some(view);
    app_state.screen = AppScreen::ProjectView;
}

async fn load_totals(api: &ApiClient, view: &mut ProjectViewState) {
    let project_id = view.project_id();
    match api.total_spend(project_id).await {
        Ok(spend) => view.total_spend = Some(spend),
        Err(e) => warn!(project_id, error = %e, "Failed to load total spend"),
    }
    match api.forecast_cost(project_id).await {
        Ok(forecast) => view.forecast = Some(forecast),
        Err(e) => warn!(project_id, error = %e, "Failed to load forecast cost"),
    }
}

/// Fills in whatever the newly visible tab has not loaded yet.
async fn load_tab(
    api: &ApiClient,
    tx: &UnboundedSender<Completion>,
    view: &mut ProjectViewState,
    tab: ProjectTab,
    projects: &[Project],
) {
    let project_id = view.project_id();
    match tab {
        ProjectTab::Staffing => {
            if view.staffing.is_some() {
                return;
            }
            let rows = api.list_staffing(project_id).await;
            let users = api.list_users(Some(Role::Contributor)).await;
            match (rows, users) {
                (Ok(rows), Ok(users)) => {
                    view.staffing = Some(StaffingState::new(project_id, &rows, users));
                }
                (Err(e), _) | (_, Err(e)) => {
                    view.status = Some(format!("Failed to load staffing: {}", e.user_message()));
                }
            }
        }
        ProjectTab::Phases => match view.phases.as_mut() {
            Some(phases) => {
                // The refresh was dropped when the tab was left; start over.
                let (ticket, task_ids) = phases.begin_spend_refresh();
                if !task_ids.is_empty() {
                    fetch::spawn_actual_spend(api, tx, ticket, task_ids);
                }
            }
            None => match api.list_phases(project_id).await {
                Ok(list) => {
                    let mut phases = PhasesState::new(project_id, view.project.started, &list);
                    if let Some(phase_id) = phases.needs_tasks() {
                        load_phase_tasks(api, tx, &mut phases, phase_id).await;
                    }
                    view.phases = Some(phases);
                }
                Err(e) => {
                    view.status = Some(format!("Failed to load phases: {}", e.user_message()));
                }
            },
        },
        ProjectTab::Start => {}
        ProjectTab::Utilization => {
            if let Some((start, end)) = view.utilization.range() {
                view.utilization.loading = true;
                load_utilization(api, view, start, end).await;
            }
        }
        ProjectTab::Invoice => {
            if view.invoice.is_none() {
                let projects = if projects.is_empty() {
                    vec![view.project.clone()]
                } else {
                    projects.to_vec()
                };
                view.invoice = Some(InvoiceWizardState::new(today(), projects, Some(project_id)));
            }
            let preview = view.invoice.as_mut().and_then(|i| i.refresh_preview());
            if let Some(InvoiceWizardAction::Preview { ticket, project_id, start, end }) = preview {
                fetch::spawn_invoice_preview(api, tx, ticket, project_id, start, end);
            }
        }
    }
}

async fn load_phase_tasks(
    api: &ApiClient,
    tx: &UnboundedSender<Completion>,
    phases: &mut PhasesState,
    phase_id: i32,
) {
    match api.list_tasks_for_phase(phase_id).await {
        Ok(tasks) => {
            debug!(phase_id, count = tasks.len(), "Loaded tasks");
            let (ticket, task_ids) = phases.set_tasks(phase_id, tasks);
            if !task_ids.is_empty() {
                fetch::spawn_actual_spend(api, tx, ticket, task_ids);
            }
        }
        Err(e) => phases.status = Some(format!("Failed to load tasks: {}", e.user_message())),
    }
}

async fn load_utilization(
    api: &ApiClient,
    view: &mut ProjectViewState,
    start: NaiveDate,
    end: NaiveDate,
) {
    match api.utilization(view.project_id(), start, end).await {
        Ok(rows) => view.utilization.loaded(&rows),
        Err(e) => view
            .utilization
            .failed(format!("Failed to load utilization: {}", e.user_message())),
    }
}

async fn handle_project_view_screen(app_state: &mut AppState, key: KeyCode) -> Result<bool> {
    let Some(view) = &mut app_state.project_view_state else {
        return Ok(false);
    };

    let Some(action) = handle_project_view_input(view, key, today()) else {
        return Ok(false);
    };

    if matches!(action, ProjectViewAction::Back) {
        app_state.project_view_state = None;
        load_projects_screen(app_state).await;
        return Ok(false);
    }

    let projects = app_state
        .projects_state
        .as_ref()
        .map(|s| s.projects())
        .unwrap_or_default();
    apply_project_action(&app_state.api, &app_state.tx, view, projects, action).await;

    Ok(false)
}

async fn apply_project_action(
    api: &ApiClient,
    tx: &UnboundedSender<Completion>,
    view: &mut ProjectViewState,
    projects: &[Project],
    action: ProjectViewAction,
) {
    let project_id = view.project_id();
    match action {
        ProjectViewAction::Back => {}
        ProjectViewAction::Opened(tab) => load_tab(api, tx, view, tab, projects).await,
        ProjectViewAction::Staffing(StaffingAction::Apply(rows)) => {
            let Some(staffing) = view.staffing.as_mut() else {
                return;
            };
            let result = match api.replace_staffing(project_id, &rows).await {
                Ok(()) => api.list_staffing(project_id).await,
                Err(e) => Err(e),
            };
            match result {
                Ok(saved) => {
                    info!(project_id, rows = saved.len(), "Saved staffing");
                    staffing.saved(&saved);
                    load_totals(api, view).await;
                }
                Err(e) => {
                    staffing.status = Some(format!("Failed to save staffing: {}", e.user_message()));
                }
            }
        }
        ProjectViewAction::Phases(action) => {
            apply_phase_action(api, tx, view, action).await;
        }
        ProjectViewAction::SaveTask(task) => match api.create_task(&task).await {
            Ok(task_id) => {
                info!(task_id, phase_id = task.phase_id, "Created task");
                view.close_task_wizard();
                if let Some(phases) = view.phases.as_mut() {
                    load_phase_tasks(api, tx, phases, task.phase_id).await;
                    phases.status = Some(format!("Created task {}", task.title));
                }
            }
            Err(e) => {
                if let Some(wizard) = view.task_wizard_mut() {
                    wizard.error = Some(format!("Failed to create task: {}", e.user_message()));
                }
            }
        },
        ProjectViewAction::SaveAssignments(task_id, rows) => {
            let result = match api.replace_assignments(task_id, &rows).await {
                Ok(()) => api.list_assignments(task_id).await,
                Err(e) => Err(e),
            };
            let Some(editor) = view.assignments_mut() else {
                return;
            };
            match result {
                Ok(saved) => {
                    info!(task_id, rows = saved.len(), "Saved task contributors");
                    editor.saved(&saved);
                }
                Err(e) => {
                    editor.status = Some(format!("Failed to save contributors: {}", e.user_message()));
                }
            }
        }
        ProjectViewAction::Utilization(UtilizationAction::Load(start, end)) => {
            load_utilization(api, view, start, end).await;
        }
        ProjectViewAction::Invoice(InvoiceWizardAction::Preview { ticket, project_id, start, end }) => {
            fetch::spawn_invoice_preview(api, tx, ticket, project_id, start, end);
        }
        ProjectViewAction::Invoice(InvoiceWizardAction::Generate(invoice_project, request)) => {
            let result = api.generate_invoice(invoice_project, &request).await;
            let Some(invoice) = view.invoice.as_mut() else {
                return;
            };
            match result {
                Ok(created) => {
                    info!(invoice_id = created.id, project_id = invoice_project, "Generated invoice");
                    invoice.generated(&created);
                }
                Err(e) => invoice.generate_failed(e.user_message()),
            }
        }
        ProjectViewAction::StartProject => match api.start_project(&view.project).await {
            Ok(project) => {
                info!(project_id, "Project started");
                view.started(project);
            }
            Err(e) => view.status = Some(format!("Failed to start project: {}", e.user_message())),
        },
    }
}

async fn apply_phase_action(
    api: &ApiClient,
    tx: &UnboundedSender<Completion>,
    view: &mut ProjectViewState,
    action: PhaseAction,
) {
    let project_id = view.project_id();
    match action {
        PhaseAction::SavePhases(rows) => {
            let result = match api.save_phases(project_id, &rows).await {
                Ok(()) => api.list_phases(project_id).await,
                Err(e) => Err(e),
            };
            let Some(phases) = view.phases.as_mut() else {
                return;
            };
            match result {
                Ok(saved) => {
                    info!(project_id, phases = saved.len(), "Saved phases");
                    phases.saved(&saved);
                    if let Some(phase_id) = phases.needs_tasks() {
                        load_phase_tasks(api, tx, phases, phase_id).await;
                    }
                }
                Err(e) => phases.status = Some(format!("Failed to save phases: {}", e.user_message())),
            }
        }
        PhaseAction::LoadTasks(phase_id) => {
            if let Some(phases) = view.phases.as_mut() {
                load_phase_tasks(api, tx, phases, phase_id).await;
            }
        }
        PhaseAction::RefreshSpend => {
            if let Some(phases) = view.phases.as_mut() {
                let (ticket, task_ids) = phases.begin_spend_refresh();
                fetch::spawn_actual_spend(api, tx, ticket, task_ids);
            }
        }
        PhaseAction::EditAssignments(task) => {
            let rows = api.list_assignments(task.id).await;
            let staffing = api.list_staffing(project_id).await;
            let users = api.list_users(None).await;
            match (rows, staffing, users) {
                (Ok(rows), Ok(staffing), Ok(users)) => {
                    view.open_assignments(task, &rows, staffing, users);
                }
                (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => {
                    if let Some(phases) = view.phases.as_mut() {
                        phases.status =
                            Some(format!("Failed to load contributors: {}", e.user_message()));
                    }
                }
            }
        }
        // The project view opens the task wizard itself.
        PhaseAction::NewTask(_) => {}
    }
}

async fn load_contributor_screen(app_state: &mut AppState) {
    let Some(user_id) = app_state.session.user_id() else {
        app_state.sign_out();
        return;
    };

    let mut state = match app_state.api.list_tasks_for_user(user_id).await {
        Ok(tasks) => {
            info!(user_id, count = tasks.len(), "Loaded assigned tasks");
            ContributorState::new(user_id, tasks)
        }
        Err(e) => {
            let mut state = ContributorState::new(user_id, Vec::new());
            state.status = Some(format!("Failed to load tasks: {}", e.user_message()));
            state
        }
    };
    if let Some(task_id) = state.needs_entries() {
        load_entries(&app_state.api, &mut state, task_id).await;
    }

    app_state.contributor_state = Some(state);
    app_state.screen = AppScreen::Contributor;
}

async fn load_entries(api: &ApiClient, state: &mut ContributorState, task_id: i32) {
    match api.list_time_entries(task_id, state.user_id).await {
        Ok(entries) => state.set_entries(task_id, entries),
        Err(e) => state.status = Some(format!("Failed to load time entries: {}", e.user_message())),
    }
}

async fn handle_contributor_screen(app_state: &mut AppState, key: KeyCode) -> Result<bool> {
    let Some(state) = &mut app_state.contributor_state else {
        return Ok(false);
    };

    match handle_contributor_input(state, key) {
        Some(ContributorAction::SignOut) => app_state.sign_out(),
        Some(ContributorAction::Refresh) => load_contributor_screen(app_state).await,
        Some(ContributorAction::LoadEntries(task_id)) => {
            load_entries(&app_state.api, state, task_id).await;
        }
        Some(ContributorAction::LogHours(task)) => {
            app_state.log_hours_state = Some(LogHoursState::new(task, state.user_id, today()));
            app_state.screen = AppScreen::LogHours;
        }
        None => {}
    }

    Ok(false)
}

async fn handle_log_hours_screen(app_state: &mut AppState, key: KeyCode) -> Result<bool> {
    let Some(state) = &mut app_state.log_hours_state else {
        return Ok(false);
    };

    match handle_log_hours_input(state, key) {
        Some(LogHoursAction::Cancel) => {
            app_state.log_hours_state = None;
            app_state.screen = AppScreen::Contributor;
        }
        Some(LogHoursAction::Submit(entry)) => {
            if let Err(e) = app_state.api.create_time_entry(&entry).await {
                state.failed(format!("Failed to log hours: {}", e.user_message()));
                return Ok(false);
            }
            info!(task_id = entry.task_id, hours = entry.hours, "Logged hours");

            // Remaining forecast first, then spend, both derived from the new entry.
            if let Err(e) = app_state
                .api
                .refresh_total_hours(entry.task_id, entry.user_id)
                .await
            {
                warn!(task_id = entry.task_id, error = %e, "Failed to refresh total hours");
            }
            fetch::refresh_actual_spend(&app_state.api, &[entry.task_id]).await;

            app_state.log_hours_state = None;
            app_state.screen = AppScreen::Contributor;
            if let Some(contributor) = app_state.contributor_state.as_mut() {
                load_entries(&app_state.api, contributor, entry.task_id).await;
                contributor.status = Some(format!("Logged {}h", entry.hours));
            }
        }
        None => {}
    }

    Ok(false)
}
