//! Same-day time windows on a plain calendar date.

use std::fmt;

use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::core::SchedulingError;

/// Minutes in a calendar day; the exclusive upper bound of every window.
pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// A half-open `[start, end)` interval on one calendar date.
///
/// Windows never wrap past midnight: a duration that would run into the next
/// day is clamped so the window ends at `24:00` of its own date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Calendar date with no timezone component.
    pub date: NaiveDate,
    /// Start time of day.
    pub start: NaiveTime,
    /// Positive length in minutes.
    pub duration_minutes: u32,
}

impl TimeWindow {
    /// Build a window, rejecting zero durations and clamping at midnight.
    pub fn new(
        date: NaiveDate,
        start: NaiveTime,
        duration_minutes: u32,
    ) -> Result<Self, SchedulingError> {
        if duration_minutes == 0 {
            return Err(SchedulingError::Validation(
                "duration must be at least one minute".into(),
            ));
        }
        let start = truncate_to_minute(start);
        let start_minute = minute_of_day(start);
        let available = MINUTES_PER_DAY - start_minute;
        let duration_minutes = if duration_minutes > available {
            tracing::debug!(
                %date,
                %start,
                requested = duration_minutes,
                clamped = available,
                "window clamped at midnight"
            );
            available
        } else {
            duration_minutes
        };
        Ok(Self {
            date,
            start,
            duration_minutes,
        })
    }

    /// Build a window from a start and end time of day.
    ///
    /// An end at or before the start is read as "past midnight" and clamped
    /// to the end of `date`; identical start and end is rejected.
    pub fn between(
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
    ) -> Result<Self, SchedulingError> {
        let start_minute = minute_of_day(start);
        let end_minute = minute_of_day(end);
        if start_minute == end_minute {
            return Err(SchedulingError::Validation(format!(
                "window {start}-{end} has zero duration"
            )));
        }
        let duration = if end_minute > start_minute {
            end_minute - start_minute
        } else {
            MINUTES_PER_DAY - start_minute
        };
        Self::new(date, start, duration)
    }

    /// Start as minutes since midnight.
    pub fn start_minute(&self) -> u32 {
        minute_of_day(self.start)
    }

    /// Exclusive end as minutes since midnight (at most 1440).
    pub fn end_minute(&self) -> u32 {
        self.start_minute() + self.duration_minutes
    }

    /// Half-open overlap test; touching endpoints do not overlap.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.date == other.date
            && self.start_minute() < other.end_minute()
            && other.start_minute() < self.end_minute()
    }

    /// The same time of day moved to another date.
    pub const fn on(&self, date: NaiveDate) -> Self {
        Self {
            date,
            start: self.start,
            duration_minutes: self.duration_minutes,
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let end = self.end_minute();
        write!(
            f,
            "{} {}-{:02}:{:02}",
            self.date,
            self.start.format("%H:%M"),
            end / 60,
            end % 60
        )
    }
}

fn minute_of_day(time: NaiveTime) -> u32 {
    time.num_seconds_from_midnight() / 60
}

fn truncate_to_minute(time: NaiveTime) -> NaiveTime {
    time.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(time)
}
