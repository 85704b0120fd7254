//! Client-side validation: date windows for dependent pickers, dirty
//! detection for editable tables, and per-row form rules.
//!
//! Nothing here performs I/O. Failures are values attached to a field and
//! the screens gate their submit action on them.

pub mod date_window;
pub mod dirty;
pub mod rows;

use thiserror::Error;

pub use date_window::Bounds;
pub use dirty::{Canonical, DirtyTracker, SaveGate};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{0} must be a whole number")]
    NotAnInteger(&'static str),

    #[error("{0} must be a non-negative number")]
    NotANumber(&'static str),

    #[error("invalid date `{0}`, expected YYYY-MM-DD")]
    BadDate(String),

    #[error("end date must be after the start date")]
    EndNotAfterStart,

    #[error("end date cannot be before the start date")]
    EndBeforeStart,

    #[error("{0} is outside the allowed dates")]
    OutsideWindow(&'static str),

    #[error("user {0} is assigned more than once")]
    DuplicateUser(i32),
}
