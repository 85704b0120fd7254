//! Typed client for the project-management REST API.
//!
//! Each endpoint has exactly one response schema. A body that does not match
//! it is reported as [`ApiError::Parse`]; nothing is retried.

mod error;

use std::time::Duration;

use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::Config;
use crate::models::{
    AssignmentPayload, AssignmentRow, Invoice, InvoiceRequest, InvoiceTable, LoginResponse,
    NewProject, NewTask, NewTimeEntry, Phase, PhasePayload, Project, StaffingPayload, StaffingRow,
    Task, TimeLogEntry, UtilizationRow, User,
};
use crate::session::Role;
use crate::validation::date_window::format_iso_day;

pub use error::ApiError;

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct CreatedTask {
    task_id: i32,
}

#[derive(Deserialize)]
struct TotalHours {
    total_hours: f64,
}

#[derive(Deserialize)]
struct ActualSpend {
    actual_spend: f64,
}

#[derive(Deserialize)]
struct TotalSpend {
    total_project_spent: f64,
}

#[derive(Deserialize)]
struct ForecastCost {
    total_project_forecast: f64,
}

/// Handle to the API. Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &Config) -> ApiResult<Self> {
        Self::with_base_url(config.api_url(), config.request_timeout())
    }

    pub fn with_base_url(base_url: &str, timeout: Duration) -> ApiResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ApiError::Build)?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn execute(&self, path: &str, request: RequestBuilder) -> ApiResult<String> {
        debug!(path, "API request");

        let response = request.send().await.map_err(|source| {
            warn!(path, error = %source, "API request failed");
            ApiError::Transport {
                path: path.to_string(),
                source,
            }
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|source| ApiError::Transport {
            path: path.to_string(),
            source,
        })?;

        if !status.is_success() {
            warn!(path, %status, "API returned an error status");
            return Err(ApiError::Status {
                path: path.to_string(),
                status,
                body: body.chars().take(200).collect(),
            });
        }

        Ok(body)
    }

    async fn fetch<T: DeserializeOwned>(&self, path: &str, request: RequestBuilder) -> ApiResult<T> {
        let body = self.execute(path, request).await?;
        serde_json::from_str(&body).map_err(|source| {
            warn!(path, error = %source, "API response did not match the expected schema");
            ApiError::Parse {
                path: path.to_string(),
                source,
            }
        })
    }

    // Session

    pub async fn login(&self, email: &str, password: &str) -> ApiResult<LoginResponse> {
        let path = "/login/";
        let request = self.http.post(self.url(path)).json(&LoginRequest { email, password });
        self.fetch(path, request).await
    }

    // Users

    pub async fn list_users(&self, role: Option<Role>) -> ApiResult<Vec<User>> {
        let path = "/users/";
        let mut request = self.http.get(self.url(path));
        if let Some(role) = role {
            request = request.query(&[("role", role.as_str())]);
        }
        self.fetch(path, request).await
    }

    // Projects

    pub async fn list_projects(&self) -> ApiResult<Vec<Project>> {
        let path = "/projects/";
        self.fetch(path, self.http.get(self.url(path))).await
    }

    pub async fn get_project(&self, project_id: i32) -> ApiResult<Project> {
        let path = format!("/projects/{}/", project_id);
        self.fetch(&path, self.http.get(self.url(&path))).await
    }

    pub async fn create_project(&self, project: &NewProject) -> ApiResult<Project> {
        let path = "/projects/";
        self.fetch(path, self.http.post(self.url(path)).json(project)).await
    }

    /// Flips the project's `started` flag on.
    pub async fn start_project(&self, project: &Project) -> ApiResult<Project> {
        let path = format!("/projects/{}/", project.id);
        let request = self.http.put(self.url(&path)).json(&project.started_payload());
        self.fetch(&path, request).await
    }

    pub async fn delete_project(&self, project_id: i32) -> ApiResult<()> {
        let path = format!("/projects/{}", project_id);
        self.execute(&path, self.http.delete(self.url(&path))).await?;
        Ok(())
    }

    pub async fn total_spend(&self, project_id: i32) -> ApiResult<f64> {
        let path = format!("/projects/{}/total-spend/", project_id);
        let body: TotalSpend = self.fetch(&path, self.http.get(self.url(&path))).await?;
        Ok(body.total_project_spent)
    }

    pub async fn forecast_cost(&self, project_id: i32) -> ApiResult<f64> {
        let path = format!("/projects/{}/forecast-cost/", project_id);
        let body: ForecastCost = self.fetch(&path, self.http.get(self.url(&path))).await?;
        Ok(body.total_project_forecast)
    }

    // Staffing

    pub async fn list_staffing(&self, project_id: i32) -> ApiResult<Vec<StaffingRow>> {
        let path = format!("/projects/{}/staffing/", project_id);
        self.fetch(&path, self.http.get(self.url(&path))).await
    }

    pub async fn replace_staffing(&self, project_id: i32, rows: &[StaffingPayload]) -> ApiResult<()> {
        let path = format!("/projects/{}/staffing/", project_id);
        self.execute(&path, self.http.put(self.url(&path)).json(rows)).await?;
        Ok(())
    }

    // Phases

    pub async fn list_phases(&self, project_id: i32) -> ApiResult<Vec<Phase>> {
        let path = format!("/projects/{}/phases/", project_id);
        self.fetch(&path, self.http.get(self.url(&path))).await
    }

    pub async fn save_phases(&self, project_id: i32, phases: &[PhasePayload]) -> ApiResult<()> {
        let path = format!("/projects/{}/phases/", project_id);
        self.execute(&path, self.http.post(self.url(&path)).json(phases)).await?;
        Ok(())
    }

    // Tasks

    pub async fn list_tasks_for_phase(&self, phase_id: i32) -> ApiResult<Vec<Task>> {
        let path = "/tasks/";
        let request = self.http.get(self.url(path)).query(&[("phase_id", phase_id)]);
        self.fetch(path, request).await
    }

    /// Tasks the user is assigned to.
    pub async fn list_tasks_for_user(&self, user_id: i32) -> ApiResult<Vec<Task>> {
        let path = "/tasks/";
        let request = self.http.get(self.url(path)).query(&[("user_id", user_id)]);
        self.fetch(path, request).await
    }

    /// Returns the id the server gave the new task.
    pub async fn create_task(&self, task: &NewTask) -> ApiResult<i32> {
        let path = "/tasks/";
        let body: CreatedTask = self.fetch(path, self.http.post(self.url(path)).json(task)).await?;
        Ok(body.task_id)
    }

    /// Recomputes and stores the task's spend from logged hours.
    pub async fn refresh_actual_spend(&self, task_id: i32) -> ApiResult<f64> {
        let path = format!("/tasks/{}/actual-spend/", task_id);
        let request = self.http.patch(self.url(&path)).json(&serde_json::json!({}));
        let body: ActualSpend = self.fetch(&path, request).await?;
        Ok(body.actual_spend)
    }

    /// Recomputes the user's remaining forecast hours on the task's project.
    pub async fn refresh_total_hours(&self, task_id: i32, user_id: i32) -> ApiResult<f64> {
        let path = format!("/tasks/{}/users/{}/total-hours/", task_id, user_id);
        let request = self.http.patch(self.url(&path)).json(&serde_json::json!({}));
        let body: TotalHours = self.fetch(&path, request).await?;
        Ok(body.total_hours)
    }

    // Assignments

    pub async fn list_assignments(&self, task_id: i32) -> ApiResult<Vec<AssignmentRow>> {
        let path = "/projects/tasks/assignments";
        let request = self.http.get(self.url(path)).query(&[("task_id", task_id)]);
        self.fetch(path, request).await
    }

    pub async fn replace_assignments(
        &self,
        task_id: i32,
        rows: &[AssignmentPayload],
    ) -> ApiResult<()> {
        let path = format!("/projects/tasks/{}/assignments", task_id);
        self.execute(&path, self.http.put(self.url(&path)).json(rows)).await?;
        Ok(())
    }

    // Time entries

    pub async fn list_time_entries(&self, task_id: i32, user_id: i32) -> ApiResult<Vec<TimeLogEntry>> {
        let path = "/tasks/timeentries/";
        let request = self
            .http
            .get(self.url(path))
            .query(&[("task_id", task_id), ("user_id", user_id)]);
        self.fetch(path, request).await
    }

    pub async fn create_time_entry(&self, entry: &NewTimeEntry) -> ApiResult<()> {
        let path = "/tasks/timeentries/";
        self.execute(path, self.http.post(self.url(path)).json(entry)).await?;
        Ok(())
    }

    // Reporting

    /// One row per (week, contributor) between the two Mondays.
    pub async fn utilization(
        &self,
        project_id: i32,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ApiResult<Vec<UtilizationRow>> {
        let path = format!("/projects/{}/utilization", project_id);
        let request = self
            .http
            .get(self.url(&path))
            .query(&[("start", format_iso_day(start)), ("end", format_iso_day(end))]);
        self.fetch(&path, request).await
    }

    pub async fn invoice_table(
        &self,
        project_id: i32,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ApiResult<InvoiceTable> {
        let path = format!("/projects/{}/invoice-table/", project_id);
        let request = self.http.get(self.url(&path)).query(&[
            ("start_date", format_iso_day(start)),
            ("end_date", format_iso_day(end)),
        ]);
        self.fetch(&path, request).await
    }

    pub async fn generate_invoice(
        &self,
        project_id: i32,
        request: &InvoiceRequest,
    ) -> ApiResult<Invoice> {
        let path = format!("/projects/{}/invoices/generate", project_id);
        self.fetch(&path, self.http.post(self.url(&path)).json(request)).await
    }
}
