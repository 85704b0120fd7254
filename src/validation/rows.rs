//! Draft rows held by the editing screens, and the rules that decide when a
//! draft may be sent to the server.

use chrono::{Datelike, Duration, NaiveDate};

use super::date_window::{self, Bounds};
use super::dirty::{self, Canonical, DirtyTracker, SaveGate};
use super::ValidationError;
use crate::models::{
    AssignmentPayload, AssignmentRow, InvoiceRequest, NewProject, NewTask, NewTimeEntry, Phase,
    PhasePayload, StaffingPayload, StaffingRow, Task,
};

/// Status every newly created task starts in.
pub const NEW_TASK_STATUS: &str = "Not Started";

/// True for a non-empty run of ASCII digits.
pub fn is_whole_number(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

fn parse_whole(value: &str, field: &'static str) -> Result<i64, ValidationError> {
    if !is_whole_number(value) {
        return Err(ValidationError::NotAnInteger(field));
    }
    value
        .parse::<i64>()
        .map_err(|_| ValidationError::NotAnInteger(field))
}

fn require_text(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Missing(field));
    }
    Ok(())
}

fn require_date(value: Option<NaiveDate>, field: &'static str) -> Result<NaiveDate, ValidationError> {
    value.ok_or(ValidationError::Missing(field))
}

// Staffing

/// A staffing table row as edited. Numbers stay text until save.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StaffingDraft {
    pub id: Option<i32>,
    pub user_id: Option<i32>,
    pub role_name: String,
    pub hourly_rate: String,
    pub forecast_hours_remaining: String,
}

impl From<&StaffingRow> for StaffingDraft {
    fn from(row: &StaffingRow) -> Self {
        Self {
            id: Some(row.id),
            user_id: Some(row.user_id),
            role_name: row.role_name.clone(),
            hourly_rate: row.hourly_rate.to_string(),
            forecast_hours_remaining: row.forecast_hours_remaining.to_string(),
        }
    }
}

impl StaffingDraft {
    pub fn is_valid(&self) -> bool {
        self.user_id.is_some()
            && !self.role_name.is_empty()
            && parse_whole(&self.hourly_rate, "hourly rate").is_ok()
            && parse_whole(&self.forecast_hours_remaining, "forecast hours").is_ok()
    }

    /// Rate times remaining hours, when both parse.
    pub fn forecast_budget(&self) -> Option<i64> {
        let rate = parse_whole(&self.hourly_rate, "hourly rate").ok()?;
        let hours = parse_whole(&self.forecast_hours_remaining, "forecast hours").ok()?;
        rate.checked_mul(hours)
    }

    /// Saving resets the initial forecast to the hours entered.
    pub fn to_payload(&self, project_id: i32) -> Result<StaffingPayload, ValidationError> {
        let user_id = self.user_id.ok_or(ValidationError::Missing("contributor"))?;
        if self.role_name.is_empty() {
            return Err(ValidationError::Missing("role"));
        }
        let hourly_rate = parse_whole(&self.hourly_rate, "hourly rate")?;
        let hours = parse_whole(&self.forecast_hours_remaining, "forecast hours")?;

        Ok(StaffingPayload {
            staffing_id: self.id,
            project_id,
            user_id,
            role_name: self.role_name.clone(),
            hourly_rate,
            forecast_hours_initial: hours,
            forecast_hours_remaining: hours,
        })
    }
}

impl Canonical for StaffingDraft {
    type Key = (Option<i32>, String, String, String);

    fn canonical(&self) -> Self::Key {
        (
            self.user_id,
            self.role_name.clone(),
            self.hourly_rate.clone(),
            self.forecast_hours_remaining.clone(),
        )
    }
}

pub fn staffing_gate(rows: &[StaffingDraft], tracker: &DirtyTracker<StaffingDraft>) -> SaveGate {
    SaveGate {
        all_valid: rows.iter().all(StaffingDraft::is_valid),
        dirty: tracker.is_dirty(rows),
        duplicate_free: true,
    }
}

// Assignments

/// A contributor assigned to a task. The rate follows the project staffing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssignmentDraft {
    pub id: Option<i32>,
    pub user_id: Option<i32>,
    pub hourly_rate: i64,
}

impl From<&AssignmentRow> for AssignmentDraft {
    fn from(row: &AssignmentRow) -> Self {
        Self {
            id: Some(row.id),
            user_id: Some(row.user_id),
            hourly_rate: row.hourly_rate,
        }
    }
}

impl AssignmentDraft {
    /// Picks a contributor and copies their staffed rate. Without a staffing
    /// row the previous rate is kept.
    pub fn select_user(&mut self, user_id: i32, staffing: &[StaffingRow]) {
        self.user_id = Some(user_id);
        if let Some(row) = staffing.iter().find(|s| s.user_id == user_id) {
            self.hourly_rate = row.hourly_rate;
        }
    }

    pub fn is_valid(&self) -> bool {
        self.user_id.is_some()
    }
}

impl Canonical for AssignmentDraft {
    type Key = (Option<i32>, i64);

    fn canonical(&self) -> Self::Key {
        (self.user_id, self.hourly_rate)
    }
}

/// Only one blank row may be pending at a time.
pub fn can_add_assignment(rows: &[AssignmentDraft]) -> bool {
    rows.iter().all(AssignmentDraft::is_valid)
}

pub fn duplicate_assignment(rows: &[AssignmentDraft]) -> Option<i32> {
    dirty::first_duplicate(rows, |r| r.user_id)
}

pub fn assignment_gate(
    rows: &[AssignmentDraft],
    tracker: &DirtyTracker<AssignmentDraft>,
) -> SaveGate {
    SaveGate {
        all_valid: !rows.is_empty() && rows.iter().all(AssignmentDraft::is_valid),
        dirty: tracker.is_dirty(rows),
        duplicate_free: duplicate_assignment(rows).is_none(),
    }
}

pub fn assignment_payloads(
    rows: &[AssignmentDraft],
    task_id: i32,
) -> Result<Vec<AssignmentPayload>, ValidationError> {
    if let Some(user_id) = duplicate_assignment(rows) {
        return Err(ValidationError::DuplicateUser(user_id));
    }
    Ok(rows
        .iter()
        .filter_map(|row| {
            row.user_id.map(|user_id| AssignmentPayload {
                assignment_id: row.id,
                task_id,
                user_id,
                hourly_rate: row.hourly_rate,
            })
        })
        .collect())
}

// Phases

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhaseDraft {
    pub id: Option<i32>,
    pub phase_name: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl From<&Phase> for PhaseDraft {
    fn from(phase: &Phase) -> Self {
        Self {
            id: Some(phase.id),
            phase_name: phase.phase_name.clone(),
            start_date: Some(phase.start_date),
            end_date: Some(phase.end_date),
        }
    }
}

impl PhaseDraft {
    pub fn set_start(&mut self, date: NaiveDate) {
        self.start_date = Some(date);
        self.end_date = date_window::reconcile_on_start_change(self.start_date, self.end_date);
    }

    pub fn start_bounds(&self) -> Bounds {
        date_window::bounds_for_start(self.end_date)
    }

    pub fn end_bounds(&self) -> Bounds {
        date_window::bounds_for_end(self.start_date)
    }

    pub fn is_valid(&self) -> bool {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => {
                !self.phase_name.is_empty() && date_window::validate_range(start, end).is_ok()
            }
            _ => false,
        }
    }

    pub fn to_payload(&self, project_id: i32) -> Result<PhasePayload, ValidationError> {
        if self.phase_name.is_empty() {
            return Err(ValidationError::Missing("phase name"));
        }
        let start_date = require_date(self.start_date, "start date")?;
        let end_date = require_date(self.end_date, "end date")?;
        date_window::validate_range(start_date, end_date)?;

        Ok(PhasePayload {
            phase_id: self.id,
            project_id,
            phase_name: self.phase_name.clone(),
            start_date,
            end_date,
        })
    }
}

impl Canonical for PhaseDraft {
    type Key = (String, Option<NaiveDate>, Option<NaiveDate>);

    fn canonical(&self) -> Self::Key {
        (self.phase_name.clone(), self.start_date, self.end_date)
    }
}

pub fn phase_gate(rows: &[PhaseDraft], tracker: &DirtyTracker<PhaseDraft>) -> SaveGate {
    SaveGate {
        all_valid: rows.iter().all(PhaseDraft::is_valid),
        dirty: tracker.is_dirty(rows),
        duplicate_free: true,
    }
}

// Tasks

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskField {
    Title,
    Description,
    StartDate,
    EndDate,
    DueDate,
    Budget,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub budget: String,
}

impl TaskDraft {
    pub fn set_start(&mut self, date: NaiveDate) {
        self.start_date = Some(date);
        self.end_date = date_window::reconcile_on_start_change(self.start_date, self.end_date);
    }

    pub fn start_bounds(&self) -> Bounds {
        date_window::bounds_for_start(self.end_date)
    }

    pub fn end_bounds(&self) -> Bounds {
        date_window::bounds_for_end(self.start_date)
    }

    pub fn due_bounds(&self) -> Bounds {
        date_window::bounds_for_due(self.start_date, self.end_date)
    }

    /// Every failing field, in form order.
    pub fn field_errors(&self) -> Vec<(TaskField, ValidationError)> {
        let mut errors = Vec::new();

        if let Err(e) = require_text(&self.title, "title") {
            errors.push((TaskField::Title, e));
        }
        if let Err(e) = require_text(&self.description, "description") {
            errors.push((TaskField::Description, e));
        }
        if self.start_date.is_none() {
            errors.push((TaskField::StartDate, ValidationError::Missing("start date")));
        }
        match (self.start_date, self.end_date) {
            (_, None) => errors.push((TaskField::EndDate, ValidationError::Missing("end date"))),
            (Some(start), Some(end)) => {
                if let Err(e) = date_window::validate_range(start, end) {
                    errors.push((TaskField::EndDate, e));
                }
            }
            (None, Some(_)) => {}
        }
        match self.due_date {
            None => errors.push((TaskField::DueDate, ValidationError::Missing("due date"))),
            Some(due) if !self.due_bounds().admits(due) => {
                errors.push((TaskField::DueDate, ValidationError::OutsideWindow("due date")));
            }
            Some(_) => {}
        }
        let budget = self.budget.trim();
        if budget.is_empty() {
            errors.push((TaskField::Budget, ValidationError::Missing("budget")));
        } else if let Err(e) = parse_whole(budget, "budget") {
            errors.push((TaskField::Budget, e));
        }

        errors
    }

    pub fn is_valid(&self) -> bool {
        self.field_errors().is_empty()
    }

    pub fn to_payload(&self, phase_id: i32) -> Result<NewTask, ValidationError> {
        if let Some((_, error)) = self.field_errors().into_iter().next() {
            return Err(error);
        }

        Ok(NewTask {
            phase_id,
            title: self.title.clone(),
            description: self.description.clone(),
            start_date: require_date(self.start_date, "start date")?,
            end_date: require_date(self.end_date, "end date")?,
            due_date: require_date(self.due_date, "due date")?,
            status: NEW_TASK_STATUS.to_string(),
            budget: parse_whole(self.budget.trim(), "budget")?,
        })
    }
}

// Projects

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectDraft {
    pub name: String,
    pub client_name: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl ProjectDraft {
    pub fn set_start(&mut self, date: NaiveDate) {
        self.start_date = Some(date);
        self.end_date = date_window::reconcile_on_start_change(self.start_date, self.end_date);
    }

    pub fn start_bounds(&self) -> Bounds {
        date_window::bounds_for_start(self.end_date)
    }

    pub fn end_bounds(&self) -> Bounds {
        date_window::bounds_for_end(self.start_date)
    }

    pub fn to_payload(&self) -> Result<NewProject, ValidationError> {
        require_text(&self.name, "project name")?;
        require_text(&self.client_name, "client name")?;
        let start_date = require_date(self.start_date, "start date")?;
        let end_date = require_date(self.end_date, "end date")?;
        date_window::validate_range(start_date, end_date)?;

        Ok(NewProject {
            name: self.name.clone(),
            client_name: self.client_name.clone(),
            start_date,
            end_date,
            started: false,
        })
    }

    pub fn is_valid(&self) -> bool {
        self.to_payload().is_ok()
    }
}

// Time logs

/// Work dates are limited to the task's start through due date.
pub fn log_bounds(task: &Task) -> Bounds {
    Bounds::inclusive(Some(task.start_date), Some(task.due_date))
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimeLogDraft {
    pub work_date: NaiveDate,
    pub hours: String,
    pub billable: bool,
}

impl TimeLogDraft {
    /// Opens on `today`, pulled into the task's window.
    pub fn for_task(task: &Task, today: NaiveDate) -> Self {
        Self {
            work_date: log_bounds(task).clamp(today),
            hours: String::new(),
            billable: true,
        }
    }

    pub fn parsed_hours(&self) -> Result<f64, ValidationError> {
        let hours = self.hours.trim();
        if hours.is_empty() {
            return Err(ValidationError::Missing("hours"));
        }
        match hours.parse::<f64>() {
            Ok(h) if h.is_finite() && h >= 0.0 => Ok(h),
            _ => Err(ValidationError::NotANumber("hours")),
        }
    }

    pub fn to_payload(&self, task: &Task, user_id: i32) -> Result<NewTimeEntry, ValidationError> {
        if !date_window::is_within_inclusive(self.work_date, task.start_date, task.due_date) {
            return Err(ValidationError::OutsideWindow("work date"));
        }
        let hours = self.parsed_hours()?;

        Ok(NewTimeEntry {
            task_id: task.id,
            user_id,
            work_date: self.work_date,
            hours,
            is_billable: self.billable,
        })
    }
}

// Invoices

/// Monday through Sunday of the week containing `day`.
pub fn week_containing(day: NaiveDate) -> (NaiveDate, NaiveDate) {
    let monday = day - Duration::days(i64::from(day.weekday().num_days_from_monday()));
    (monday, monday + Duration::days(6))
}

#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceDraft {
    pub project_id: Option<i32>,
    pub client_name: String,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
}

impl InvoiceDraft {
    /// Defaults the period to the current week.
    pub fn new(today: NaiveDate) -> Self {
        let (monday, sunday) = week_containing(today);
        Self {
            project_id: None,
            client_name: String::new(),
            period_start: Some(monday),
            period_end: Some(sunday),
        }
    }

    /// A preview needs a project and a period whose end is not before its start.
    pub fn preview_period(&self) -> Option<(i32, NaiveDate, NaiveDate)> {
        let project_id = self.project_id?;
        let start = self.period_start?;
        let end = self.period_end?;
        date_window::validate_period(start, end).ok()?;
        Some((project_id, start, end))
    }

    pub fn to_request(&self) -> Result<(i32, InvoiceRequest), ValidationError> {
        let project_id = self.project_id.ok_or(ValidationError::Missing("project"))?;
        require_text(&self.client_name, "client name")?;
        let period_start = require_date(self.period_start, "period start")?;
        let period_end = require_date(self.period_end, "period end")?;
        date_window::validate_period(period_start, period_end)?;

        Ok((
            project_id,
            InvoiceRequest {
                client_name: self.client_name.clone(),
                period_start,
                period_end,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::date_window::parse_iso_day;

    fn day(s: &str) -> NaiveDate {
        parse_iso_day(s).unwrap()
    }

    fn staffing(user_id: i32, role: &str, rate: &str, hours: &str) -> StaffingDraft {
        StaffingDraft {
            id: None,
            user_id: Some(user_id),
            role_name: role.to_string(),
            hourly_rate: rate.to_string(),
            forecast_hours_remaining: hours.to_string(),
        }
    }

    fn task() -> Task {
        Task {
            id: 12,
            phase_id: 3,
            title: "Wireframes".to_string(),
            description: "Landing page".to_string(),
            start_date: day("2024-01-10"),
            end_date: day("2024-01-20"),
            due_date: day("2024-01-15"),
            budget: 4000,
            status: NEW_TASK_STATUS.to_string(),
            actual_spend: None,
        }
    }

    #[test]
    fn staffing_row_with_digits_is_valid() {
        let row = staffing(3, "Dev", "50", "40");
        assert!(row.is_valid());
        assert_eq!(row.forecast_budget(), Some(2000));

        let payload = row.to_payload(8).unwrap();
        assert_eq!(payload.forecast_hours_initial, 40);
        assert_eq!(payload.forecast_hours_remaining, 40);
        assert_eq!(payload.staffing_id, None);
    }

    #[test]
    fn bad_rate_blocks_save_even_when_dirty() {
        let baseline = vec![staffing(3, "Dev", "50", "40")];
        let tracker = DirtyTracker::new(&baseline);

        let edited = vec![staffing(3, "Dev", "abc", "40")];
        assert!(!edited[0].is_valid());
        assert_eq!(edited[0].forecast_budget(), None);

        let gate = staffing_gate(&edited, &tracker);
        assert!(gate.dirty);
        assert!(!gate.can_save());
    }

    #[test]
    fn staffing_rejects_signs_and_blanks() {
        assert!(!staffing(3, "Dev", "-5", "40").is_valid());
        assert!(!staffing(3, "Dev", "5.5", "40").is_valid());
        assert!(!staffing(3, "", "50", "40").is_valid());
        assert!(!StaffingDraft { user_id: None, ..staffing(3, "Dev", "50", "40") }.is_valid());
    }

    #[test]
    fn unchanged_staffing_cannot_be_saved() {
        let rows = vec![staffing(3, "Dev", "50", "40"), staffing(4, "QA", "45", "10")];
        let tracker = DirtyTracker::new(&rows);
        let mut reordered = rows.clone();
        reordered.reverse();

        assert!(!staffing_gate(&reordered, &tracker).can_save());
    }

    #[test]
    fn duplicate_assignment_disables_save() {
        let baseline = vec![AssignmentDraft { id: Some(1), user_id: Some(2), hourly_rate: 40 }];
        let tracker = DirtyTracker::new(&baseline);
        let rows = vec![
            AssignmentDraft { id: None, user_id: Some(7), hourly_rate: 55 },
            AssignmentDraft { id: None, user_id: Some(7), hourly_rate: 55 },
        ];

        let gate = assignment_gate(&rows, &tracker);
        assert!(gate.all_valid);
        assert!(gate.dirty);
        assert!(!gate.duplicate_free);
        assert!(!gate.can_save());
        assert_eq!(assignment_payloads(&rows, 12), Err(ValidationError::DuplicateUser(7)));
    }

    #[test]
    fn selecting_a_user_copies_the_staffed_rate() {
        let staffing = vec![StaffingRow {
            id: 1,
            project_id: 8,
            user_id: 7,
            role_name: "Dev".to_string(),
            hourly_rate: 85,
            forecast_hours_initial: Some(100),
            forecast_hours_remaining: 60,
        }];

        let mut row = AssignmentDraft { hourly_rate: 10, ..Default::default() };
        row.select_user(7, &staffing);
        assert_eq!(row.hourly_rate, 85);

        row.select_user(99, &staffing);
        assert_eq!(row.user_id, Some(99));
        assert_eq!(row.hourly_rate, 85);
    }

    #[test]
    fn only_one_blank_assignment_at_a_time() {
        let mut rows = vec![AssignmentDraft { user_id: Some(1), ..Default::default() }];
        assert!(can_add_assignment(&rows));
        rows.push(AssignmentDraft::default());
        assert!(!can_add_assignment(&rows));
    }

    #[test]
    fn empty_assignment_list_cannot_be_confirmed() {
        let baseline = vec![AssignmentDraft { id: Some(1), user_id: Some(2), hourly_rate: 40 }];
        let tracker = DirtyTracker::new(&baseline);
        assert!(!assignment_gate(&[], &tracker).can_save());
    }

    #[test]
    fn moving_phase_start_past_end_clears_end() {
        let mut phase = PhaseDraft {
            id: Some(4),
            phase_name: "Design".to_string(),
            start_date: Some(day("2024-02-01")),
            end_date: Some(day("2024-02-10")),
        };
        assert!(phase.is_valid());

        phase.set_start(day("2024-02-05"));
        assert_eq!(phase.end_date, Some(day("2024-02-10")));

        phase.set_start(day("2024-02-10"));
        assert_eq!(phase.end_date, None);
        assert!(!phase.is_valid());
        assert_eq!(phase.to_payload(1).unwrap_err(), ValidationError::Missing("end date"));
    }

    #[test]
    fn phase_end_bounds_follow_start() {
        let phase = PhaseDraft {
            start_date: Some(day("2024-02-01")),
            ..Default::default()
        };
        assert_eq!(phase.end_bounds().min, Some(day("2024-02-02")));
        assert_eq!(phase.start_bounds(), Bounds::UNBOUNDED);
    }

    #[test]
    fn task_due_date_window_is_inclusive() {
        let mut draft = TaskDraft {
            title: "Build".to_string(),
            description: "API".to_string(),
            start_date: Some(day("2024-01-10")),
            end_date: Some(day("2024-01-15")),
            due_date: Some(day("2024-01-09")),
            budget: "1200".to_string(),
        };
        assert_eq!(draft.due_bounds().min, Some(day("2024-01-10")));
        assert_eq!(draft.due_bounds().max, Some(day("2024-01-15")));
        assert_eq!(
            draft.field_errors(),
            vec![(TaskField::DueDate, ValidationError::OutsideWindow("due date"))]
        );

        draft.due_date = Some(day("2024-01-10"));
        assert!(draft.is_valid());

        draft.due_date = Some(day("2024-01-15"));
        let payload = draft.to_payload(3).unwrap();
        assert_eq!(payload.status, NEW_TASK_STATUS);
        assert_eq!(payload.budget, 1200);
    }

    #[test]
    fn task_requires_every_field() {
        let errors = TaskDraft::default().field_errors();
        let fields: Vec<TaskField> = errors.iter().map(|(f, _)| *f).collect();
        assert_eq!(
            fields,
            vec![
                TaskField::Title,
                TaskField::Description,
                TaskField::StartDate,
                TaskField::EndDate,
                TaskField::DueDate,
                TaskField::Budget,
            ]
        );
    }

    #[test]
    fn task_end_equal_to_start_is_rejected() {
        let draft = TaskDraft {
            title: "Build".to_string(),
            description: "API".to_string(),
            start_date: Some(day("2024-01-10")),
            end_date: Some(day("2024-01-10")),
            due_date: Some(day("2024-01-10")),
            budget: "10".to_string(),
        };
        assert_eq!(
            draft.field_errors(),
            vec![(TaskField::EndDate, ValidationError::EndNotAfterStart)]
        );
    }

    #[test]
    fn project_draft_builds_unstarted_project() {
        let mut draft = ProjectDraft {
            name: "Atlas".to_string(),
            client_name: "Acme".to_string(),
            start_date: Some(day("2024-03-01")),
            end_date: Some(day("2024-06-30")),
        };
        let payload = draft.to_payload().unwrap();
        assert!(!payload.started);

        draft.set_start(day("2024-07-01"));
        assert_eq!(draft.end_date, None);
        assert!(!draft.is_valid());
    }

    #[test]
    fn log_opens_inside_task_window() {
        let task = task();
        assert_eq!(TimeLogDraft::for_task(&task, day("2024-01-01")).work_date, day("2024-01-10"));
        assert_eq!(TimeLogDraft::for_task(&task, day("2024-03-01")).work_date, day("2024-01-15"));
        assert_eq!(TimeLogDraft::for_task(&task, day("2024-01-12")).work_date, day("2024-01-12"));
    }

    #[test]
    fn log_date_and_hours_are_checked() {
        let task = task();
        let mut draft = TimeLogDraft::for_task(&task, day("2024-01-12"));
        assert_eq!(draft.to_payload(&task, 5), Err(ValidationError::Missing("hours")));

        draft.hours = "2.5".to_string();
        let entry = draft.to_payload(&task, 5).unwrap();
        assert_eq!(entry.hours, 2.5);
        assert!(entry.is_billable);

        draft.work_date = day("2024-01-16");
        assert_eq!(draft.to_payload(&task, 5), Err(ValidationError::OutsideWindow("work date")));

        draft.work_date = day("2024-01-15");
        draft.hours = "abc".to_string();
        assert_eq!(draft.to_payload(&task, 5), Err(ValidationError::NotANumber("hours")));
    }

    #[test]
    fn invoice_period_defaults_to_current_week() {
        // 2024-05-16 is a Thursday.
        let draft = InvoiceDraft::new(day("2024-05-16"));
        assert_eq!(draft.period_start, Some(day("2024-05-13")));
        assert_eq!(draft.period_end, Some(day("2024-05-19")));
        assert_eq!(draft.preview_period(), None);
    }

    #[test]
    fn invoice_needs_client_and_ordered_period() {
        let mut draft = InvoiceDraft::new(day("2024-05-16"));
        draft.project_id = Some(2);
        assert!(draft.preview_period().is_some());
        assert_eq!(draft.to_request().unwrap_err(), ValidationError::Missing("client name"));

        draft.client_name = "Acme".to_string();
        draft.period_end = Some(day("2024-05-12"));
        assert_eq!(draft.preview_period(), None);
        assert_eq!(draft.to_request().unwrap_err(), ValidationError::EndBeforeStart);

        draft.period_end = draft.period_start;
        let (project_id, request) = draft.to_request().unwrap();
        assert_eq!(project_id, 2);
        assert_eq!(request.period_start, request.period_end);
    }
}
