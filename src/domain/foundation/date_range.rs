//! Inclusive calendar date ranges with relative-period helpers.
//!
//! Extractors must hand services absolute, unambiguous ranges; these helpers
//! turn "this week" / "last month" style periods into concrete dates relative
//! to a caller-supplied reference day, which keeps the core deterministic.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error constructing a date range.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DateRangeError {
    #[error("Range start {start} is after end {end}")]
    StartAfterEnd { start: NaiveDate, end: NaiveDate },
}

/// Inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Creates a range; `start` must not be after `end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DateRangeError> {
        if start > end {
            return Err(DateRangeError::StartAfterEnd { start, end });
        }
        Ok(Self { start, end })
    }

    /// Creates a single-day range.
    pub fn single(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    /// First day of the range.
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last day of the range.
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of days covered, counting both endpoints.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Whether the given day falls inside the range.
    pub fn contains(&self, day: NaiveDate) -> bool {
        day >= self.start && day <= self.end
    }

    /// Monday through Sunday of the week containing `reference`.
    pub fn this_week(reference: NaiveDate) -> Self {
        let monday = reference
            - Duration::days(i64::from(reference.weekday().num_days_from_monday()));
        Self {
            start: monday,
            end: monday + Duration::days(6),
        }
    }

    /// Monday through Sunday of the week before the one containing `reference`.
    pub fn last_week(reference: NaiveDate) -> Self {
        let this = Self::this_week(reference);
        Self {
            start: this.start - Duration::days(7),
            end: this.end - Duration::days(7),
        }
    }

    /// First through last day of the month containing `reference`.
    pub fn this_month(reference: NaiveDate) -> Self {
        let start = reference.with_day(1).expect("day 1 is always valid");
        Self {
            start,
            end: end_of_month(start),
        }
    }

    /// First through last day of the month before the one containing `reference`.
    pub fn last_month(reference: NaiveDate) -> Self {
        let this_start = reference.with_day(1).expect("day 1 is always valid");
        let prev_start = if this_start.month() == 1 {
            NaiveDate::from_ymd_opt(this_start.year() - 1, 12, 1)
        } else {
            NaiveDate::from_ymd_opt(this_start.year(), this_start.month() - 1, 1)
        }
        .expect("first of previous month is always valid");
        Self {
            start: prev_start,
            end: end_of_month(prev_start),
        }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Last day of the month containing `first` (which must be a first-of-month).
fn end_of_month(first: NaiveDate) -> NaiveDate {
    let next = if first.month() == 12 {
        NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
    }
    .expect("first of next month is always valid");
    next - Duration::days(1)
}
