//! Recurrence rules and their expansion into concrete occurrence dates.
//!
//! Expansion is a pure function of the base date and the rule: the same
//! inputs always produce the same finite, ascending sequence of plain
//! calendar dates. No timezone is involved at any point, so an occurrence can
//! never shift by a day through instant conversion.

use chrono::{Datelike, Days, Months, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::core::SchedulingError;

/// Default upper bound on how far a weekly walk may run (two years).
pub const DEFAULT_WEEKLY_SAFETY_BOUND_DAYS: u32 = 730;

/// Largest occurrence count a rule may request.
pub const MAX_OCCURRENCES: u32 = 1_000;

/// How often a rule repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    /// Every day from the base date.
    Daily,
    /// On the listed weekdays.
    Weekly,
    /// Same day of month, clamped to the month's last day.
    Monthly,
}

/// A finite recurrence rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceRule {
    /// Repetition frequency.
    pub frequency: Frequency,
    /// Weekdays to emit; only read for weekly rules.
    #[serde(default)]
    pub days_of_week: Vec<Weekday>,
    /// Maximum number of dates to produce.
    pub occurrence_count: u32,
    /// Last date that may be produced, inclusive.
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

impl RecurrenceRule {
    /// A daily rule producing `count` dates.
    pub const fn daily(count: u32) -> Self {
        Self {
            frequency: Frequency::Daily,
            days_of_week: Vec::new(),
            occurrence_count: count,
            end_date: None,
        }
    }

    /// A weekly rule on `days` producing `count` dates.
    pub fn weekly(days: impl IntoIterator<Item = Weekday>, count: u32) -> Self {
        Self {
            frequency: Frequency::Weekly,
            days_of_week: days.into_iter().collect(),
            occurrence_count: count,
            end_date: None,
        }
    }

    /// A monthly rule producing `count` dates.
    pub const fn monthly(count: u32) -> Self {
        Self {
            frequency: Frequency::Monthly,
            days_of_week: Vec::new(),
            occurrence_count: count,
            end_date: None,
        }
    }

    /// Stop producing dates after `end`.
    #[must_use]
    pub fn until(mut self, end: NaiveDate) -> Self {
        self.end_date = Some(end);
        self
    }

    /// Reject rules that cannot describe a finite series.
    ///
    /// A weekly rule with no weekdays is valid and expands to nothing.
    pub fn validate(&self) -> Result<(), SchedulingError> {
        if self.occurrence_count == 0 {
            return Err(SchedulingError::Validation(
                "occurrence_count must be positive".into(),
            ));
        }
        if self.occurrence_count > MAX_OCCURRENCES {
            return Err(SchedulingError::Validation(format!(
                "occurrence_count {} exceeds limit of {MAX_OCCURRENCES}",
                self.occurrence_count
            )));
        }
        Ok(())
    }
}

/// Expands recurrence rules with a configurable weekly safety bound.
#[derive(Debug, Clone, Copy)]
pub struct RecurrenceExpander {
    weekly_safety_bound_days: u32,
}

impl Default for RecurrenceExpander {
    fn default() -> Self {
        Self::new(DEFAULT_WEEKLY_SAFETY_BOUND_DAYS)
    }
}

impl RecurrenceExpander {
    /// Create an expander whose weekly walk stops after `bound_days` days.
    pub const fn new(weekly_safety_bound_days: u32) -> Self {
        Self {
            weekly_safety_bound_days,
        }
    }

    /// Produce the ordered occurrence dates for `rule` starting at `base`.
    pub fn expand(&self, base: NaiveDate, rule: &RecurrenceRule) -> Vec<NaiveDate> {
        let limit = rule.occurrence_count as usize;
        let within_end = |d: &NaiveDate| rule.end_date.is_none_or(|end| *d <= end);
        match rule.frequency {
            Frequency::Daily => (0..u64::from(rule.occurrence_count))
                .map_while(|i| base.checked_add_days(Days::new(i)))
                .take_while(within_end)
                .collect(),
            Frequency::Monthly => (0..rule.occurrence_count)
                .map_while(|i| base.checked_add_months(Months::new(i)))
                .take_while(within_end)
                .collect(),
            Frequency::Weekly => {
                if rule.days_of_week.is_empty() {
                    return Vec::new();
                }
                let mut dates = Vec::with_capacity(limit);
                let mut day = base;
                for _ in 0..=self.weekly_safety_bound_days {
                    if dates.len() >= limit || !within_end(&day) {
                        break;
                    }
                    if rule.days_of_week.contains(&day.weekday()) {
                        dates.push(day);
                    }
                    match day.succ_opt() {
                        Some(next) => day = next,
                        None => break,
                    }
                }
                if dates.len() < limit && rule.end_date.is_none() {
                    tracing::debug!(
                        %base,
                        produced = dates.len(),
                        requested = limit,
                        "weekly expansion hit safety bound"
                    );
                }
                dates
            }
        }
    }
}

/// Expand `rule` from `base` with the default safety bound.
pub fn expand(base: NaiveDate, rule: &RecurrenceRule) -> Vec<NaiveDate> {
    RecurrenceExpander::default().expand(base, rule)
}
