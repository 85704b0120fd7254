//! Date bounds for dependent start/end/due pickers.
//!
//! All comparisons are on local calendar days. An end date must be strictly
//! after its start; a due or work date may sit on either edge of its window.

use chrono::{Local, NaiveDate};

use super::ValidationError;

/// Wire and display format for every date the client handles.
pub const ISO_DAY: &str = "%Y-%m-%d";

/// Inclusive selectable range for a date picker. `None` leaves that side open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Bounds {
    pub min: Option<NaiveDate>,
    pub max: Option<NaiveDate>,
}

impl Bounds {
    pub const UNBOUNDED: Bounds = Bounds { min: None, max: None };

    pub fn inclusive(lower: Option<NaiveDate>, upper: Option<NaiveDate>) -> Self {
        Self { min: lower, max: upper }
    }

    pub fn admits(&self, date: NaiveDate) -> bool {
        self.min.map_or(true, |min| date >= min) && self.max.map_or(true, |max| date <= max)
    }

    /// Pull `date` into the window. A window whose min exceeds its max clamps to min.
    pub fn clamp(&self, date: NaiveDate) -> NaiveDate {
        if let Some(min) = self.min {
            if date < min {
                return min;
            }
        }
        if let Some(max) = self.max {
            if date > max {
                return self.min.map_or(max, |min| min.max(max));
            }
        }
        date
    }
}

/// Earliest selectable end date: the day after `start`.
pub fn bounds_for_end(start: Option<NaiveDate>) -> Bounds {
    Bounds {
        min: start.and_then(|s| s.succ_opt()),
        max: None,
    }
}

/// Latest selectable start date: the day before `end`.
pub fn bounds_for_start(end: Option<NaiveDate>) -> Bounds {
    Bounds {
        min: None,
        max: end.and_then(|e| e.pred_opt()),
    }
}

/// Due dates may land anywhere in `[start, end]`.
pub fn bounds_for_due(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Bounds {
    Bounds::inclusive(start, end)
}

pub fn is_within_inclusive(date: NaiveDate, lower: NaiveDate, upper: NaiveDate) -> bool {
    lower <= date && date <= upper
}

/// Applies a new start date to an existing end date. An end that is no longer
/// strictly after the start is cleared so the user has to pick it again.
pub fn reconcile_on_start_change(
    new_start: Option<NaiveDate>,
    current_end: Option<NaiveDate>,
) -> Option<NaiveDate> {
    match (new_start, current_end) {
        (Some(start), Some(end)) if end <= start => None,
        _ => current_end,
    }
}

/// Strict range check used by projects, phases and tasks.
pub fn validate_range(start: NaiveDate, end: NaiveDate) -> Result<(), ValidationError> {
    if end <= start {
        return Err(ValidationError::EndNotAfterStart);
    }
    Ok(())
}

/// Invoice periods only reject an end before the start; a one-day period is fine.
pub fn validate_period(start: NaiveDate, end: NaiveDate) -> Result<(), ValidationError> {
    if end < start {
        return Err(ValidationError::EndBeforeStart);
    }
    Ok(())
}

pub fn parse_iso_day(value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value.trim(), ISO_DAY)
        .map_err(|_| ValidationError::BadDate(value.to_string()))
}

pub fn format_iso_day(date: NaiveDate) -> String {
    date.format(ISO_DAY).to_string()
}

pub fn format_optional_day(date: Option<NaiveDate>) -> String {
    date.map(format_iso_day).unwrap_or_else(|| "Not set".to_string())
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}
