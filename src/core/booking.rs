//! Booking and planning-event records.

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::core::{RecurrenceExpander, RecurrenceRule, SchedulingError, TimeWindow};
use crate::util::serde::{BookingId, CoachId, EventId, ResourceId};

/// Where a booking came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingKind {
    /// Booked directly through the scheduling API.
    AdHoc,
    /// Implied by a planning event and owned by its synchronizer.
    Derived,
}

/// One resource reserved for one time window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    /// Booking identifier.
    pub id: BookingId,
    /// Reserved resource.
    pub resource: ResourceId,
    /// Reserved window.
    pub window: TimeWindow,
    /// Planning event that owns a derived booking.
    pub owner_event_id: Option<EventId>,
    /// Origin of the booking.
    pub kind: BookingKind,
    /// Coach confirmed through outreach.
    #[serde(default)]
    pub assigned_coach: Option<CoachId>,
}

impl Booking {
    /// Short human-readable description.
    pub fn describe(&self) -> String {
        format!("{} {}", self.resource, self.window)
    }
}

/// Coach staffing requested for every booking of a planning event.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CoachRequest {
    /// Roster ids that may be contacted.
    pub candidates: Vec<CoachId>,
    /// Specialties the session calls for.
    #[serde(default)]
    pub specialties: Vec<String>,
}

/// Client-supplied description of a planning event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanningEventDraft {
    /// Display name.
    pub name: String,
    /// First (or only) date of the event.
    pub base_date: NaiveDate,
    /// Daily start time.
    pub start_time: NaiveTime,
    /// Daily end time; before `start_time` means "until midnight".
    pub end_time: NaiveTime,
    /// Courts to book for every occurrence.
    pub resources: Vec<ResourceId>,
    /// Optional repetition.
    #[serde(default)]
    pub recurrence: Option<RecurrenceRule>,
    /// Fee charged per participant, in cents.
    #[serde(default)]
    pub fee_cents: Option<u64>,
    /// Budget allotted to the event, in cents.
    #[serde(default)]
    pub budget_cents: Option<u64>,
    /// Coach staffing, if the event needs one.
    #[serde(default)]
    pub coach_request: Option<CoachRequest>,
}

/// A logical event implying bookings across resources and dates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanningEvent {
    /// Event identifier.
    pub id: EventId,
    /// Display name.
    pub name: String,
    /// Date the recurrence is expanded from.
    pub base_date: NaiveDate,
    /// Ascending, de-duplicated occurrence dates.
    pub occurrence_dates: Vec<NaiveDate>,
    /// Daily start time.
    pub start_time: NaiveTime,
    /// Daily end time.
    pub end_time: NaiveTime,
    /// Courts booked for every occurrence.
    pub assigned_resources: BTreeSet<ResourceId>,
    /// Repetition the dates were expanded from.
    pub recurrence_rule: Option<RecurrenceRule>,
    /// Fee charged per participant, in cents.
    pub fee_cents: Option<u64>,
    /// Budget allotted to the event, in cents.
    pub budget_cents: Option<u64>,
    /// Coach staffing, if the event needs one.
    pub coach_request: Option<CoachRequest>,
}

impl PlanningEvent {
    /// Validate `draft` and expand its occurrence dates.
    ///
    /// Fails before anything is persisted when the name or resource set is
    /// empty, the window has no duration, or the recurrence rule is malformed.
    pub fn from_draft(
        id: EventId,
        draft: PlanningEventDraft,
        expander: &RecurrenceExpander,
    ) -> Result<Self, SchedulingError> {
        if draft.name.trim().is_empty() {
            return Err(SchedulingError::Validation("event name is empty".into()));
        }
        if draft.resources.is_empty() {
            return Err(SchedulingError::Validation(
                "event must assign at least one resource".into(),
            ));
        }
        TimeWindow::between(draft.base_date, draft.start_time, draft.end_time)?;

        let mut occurrence_dates = match &draft.recurrence {
            Some(rule) => {
                rule.validate()?;
                expander.expand(draft.base_date, rule)
            }
            None => vec![draft.base_date],
        };
        occurrence_dates.sort_unstable();
        occurrence_dates.dedup();

        Ok(Self {
            id,
            name: draft.name,
            base_date: draft.base_date,
            occurrence_dates,
            start_time: draft.start_time,
            end_time: draft.end_time,
            assigned_resources: draft.resources.into_iter().collect(),
            recurrence_rule: draft.recurrence,
            fee_cents: draft.fee_cents,
            budget_cents: draft.budget_cents,
            coach_request: draft.coach_request,
        })
    }

    /// Window of the occurrence on `date`.
    pub fn window_on(&self, date: NaiveDate) -> Result<TimeWindow, SchedulingError> {
        TimeWindow::between(date, self.start_time, self.end_time)
    }

    /// Every `(resource, window)` pair the event implies.
    pub fn desired_slots(&self) -> Result<Vec<(ResourceId, TimeWindow)>, SchedulingError> {
        let mut slots =
            Vec::with_capacity(self.assigned_resources.len() * self.occurrence_dates.len());
        for date in &self.occurrence_dates {
            let window = self.window_on(*date)?;
            for resource in &self.assigned_resources {
                slots.push((resource.clone(), window));
            }
        }
        Ok(slots)
    }
}
