use chrono::{Datelike, Duration, NaiveDate};
use crossterm::event::KeyCode;

use crate::validation::date_window::{format_iso_day, format_optional_day};
use crate::validation::Bounds;

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum DatePart {
    Year,
    Month,
    Day,
}

/// A date field typed one part at a time. The committed value is only
/// replaced when the candidate falls inside the field's bounds.
#[derive(Debug, Clone)]
pub struct DateInputState {
    pub date: Option<NaiveDate>,
    pub editing: bool,
    pub date_part: DatePart,
    pub rejected: bool,
    current_date_input: String,
    candidate: NaiveDate,
    bounds: Bounds,
}

impl DateInputState {
    pub fn new(date: Option<NaiveDate>) -> Self {
        Self {
            date,
            editing: false,
            date_part: DatePart::Year,
            rejected: false,
            current_date_input: String::new(),
            candidate: date.unwrap_or_default(),
            bounds: Bounds::UNBOUNDED,
        }
    }

    pub fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn set_bounds(&mut self, bounds: Bounds) {
        self.bounds = bounds;
    }

    /// Replaces the committed value from outside, e.g. after a dependent
    /// field cleared it.
    pub fn set_date(&mut self, date: Option<NaiveDate>) {
        self.date = date;
    }

    /// Opens the field on its value, or on `today` pulled into the window.
    pub fn begin_editing(&mut self, today: NaiveDate) {
        self.editing = true;
        self.rejected = false;
        self.date_part = DatePart::Year;
        self.current_date_input.clear();
        self.candidate = self.bounds.clamp(self.date.unwrap_or(today));
    }

    pub fn cancel(&mut self) {
        self.editing = false;
        self.rejected = false;
        self.current_date_input.clear();
    }

    /// Accepts the candidate if the window admits it. A refused candidate
    /// leaves the field open with the old value intact.
    pub fn commit(&mut self) -> Option<NaiveDate> {
        if !self.bounds.admits(self.candidate) {
            self.rejected = true;
            return None;
        }
        self.date = Some(self.candidate);
        self.cancel();
        Some(self.candidate)
    }

    pub fn next_date_part(&mut self) {
        self.date_part = match self.date_part {
            DatePart::Year => DatePart::Month,
            DatePart::Month => DatePart::Day,
            DatePart::Day => DatePart::Year,
        };
        self.current_date_input.clear();
    }

    pub fn previous_date_part(&mut self) {
        self.date_part = match self.date_part {
            DatePart::Year => DatePart::Day,
            DatePart::Month => DatePart::Year,
            DatePart::Day => DatePart::Month,
        };
        self.current_date_input.clear();
    }

    pub fn handle_input(&mut self, key: KeyCode) {
        if !self.editing {
            return;
        }
        self.rejected = false;

        match key {
            KeyCode::Char(c) if c.is_ascii_digit() => {
                self.current_date_input.push(c);
                let (year, month, day) = (self.candidate.year(), self.candidate.month(), self.candidate.day());
                let wanted = match self.date_part {
                    DatePart::Year => 4,
                    DatePart::Month | DatePart::Day => 2,
                };
                if self.current_date_input.len() < wanted {
                    return;
                }

                let typed = self.current_date_input.parse::<u32>().ok();
                self.current_date_input.clear();
                let updated = typed.and_then(|value| match self.date_part {
                    DatePart::Year if (1900..=2100).contains(&value) => {
                        clamped_ymd(value as i32, month, day)
                    }
                    DatePart::Month if (1..=12).contains(&value) => clamped_ymd(year, value, day),
                    DatePart::Day => NaiveDate::from_ymd_opt(year, month, value),
                    _ => None,
                });
                if let Some(date) = updated {
                    self.candidate = date;
                    self.next_date_part();
                }
            }
            KeyCode::Char('+') => self.step(1),
            KeyCode::Char('-') => self.step(-1),
            KeyCode::Backspace => {
                self.current_date_input.pop();
            }
            KeyCode::Right => self.next_date_part(),
            KeyCode::Left => self.previous_date_part(),
            _ => {}
        }
    }

    fn step(&mut self, days: i64) {
        if let Some(date) = self.candidate.checked_add_signed(Duration::days(days)) {
            self.candidate = date;
        }
    }

    pub fn get_display_string(&self) -> String {
        if !self.editing {
            return format_optional_day(self.date);
        }

        let year = format!("{:04}", self.candidate.year());
        let month = format!("{:02}", self.candidate.month());
        let day = format!("{:02}", self.candidate.day());
        let current_input = if !self.current_date_input.is_empty() {
            format!("[{}]", self.current_date_input)
        } else {
            match self.date_part {
                DatePart::Year => "[YYYY]".to_string(),
                DatePart::Month => "[MM]".to_string(),
                DatePart::Day => "[DD]".to_string(),
            }
        };

        let shown = match self.date_part {
            DatePart::Year => format!("{}{}-{}-{}", year, current_input, month, day),
            DatePart::Month => format!("{}-{}{}-{}", year, month, current_input, day),
            DatePart::Day => format!("{}-{}-{}{}", year, month, day, current_input),
        };
        if self.rejected {
            format!("{}  outside {}", shown, describe_bounds(self.bounds))
        } else {
            shown
        }
    }
}

/// Human form of a window, e.g. `2024-01-10 .. 2024-01-15`.
pub fn describe_bounds(bounds: Bounds) -> String {
    let side = |d: Option<NaiveDate>| d.map(format_iso_day).unwrap_or_else(|| "any".to_string());
    format!("{} .. {}", side(bounds.min), side(bounds.max))
}

// Keeps the day inside the target month, so Jan 31 -> Feb becomes Feb 28/29.
fn clamped_ymd(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    (1..=day).rev().find_map(|d| NaiveDate::from_ymd_opt(year, month, d))
}
