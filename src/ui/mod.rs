pub mod components;
pub mod sign_in;
pub mod projects;
pub mod project_wizard;
pub mod project_view;
pub mod staffing;
pub mod phases;
pub mod task_wizard;
pub mod assignments;
pub mod utilization;
pub mod invoice_wizard;
pub mod contributor;
pub mod log_hours;
