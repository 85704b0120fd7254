mod user;
mod project;
mod phase;
mod task;
mod staffing;
mod assignment;
mod time_entry;
mod invoice;
mod utilization;

pub use user::{LoginResponse, User};
pub use project::{NewProject, Project};
pub use phase::{Phase, PhasePayload};
pub use task::{NewTask, Task};
pub use staffing::{StaffingPayload, StaffingRow};
pub use assignment::{AssignmentPayload, AssignmentRow};
pub use time_entry::{NewTimeEntry, TimeLogEntry};
pub use invoice::{Invoice, InvoiceLine, InvoiceRequest, InvoiceTable};
pub use utilization::UtilizationRow;
