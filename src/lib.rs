//! Terminal client for the project-management API: staffing, phases and
//! tasks, utilization and invoicing for managers, time logging for
//! contributors.

pub mod api;
pub mod config;
pub mod fetch;
pub mod models;
pub mod session;
pub mod ui;
pub mod validation;
