//! Scheduling engine: the facade the API layer talks to.
//!
//! Ties the booking ledger, the planning-event synchronizer and the outreach
//! coordinator together. Planning-event writes (persist, reconcile, start or
//! stop outreach) run under the event's lock so concurrent edits of one event
//! apply in order.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::core::outreach::{
    CoachResponse, OutreachCoordinator, OutreachRecord, RecoveryReport, ResponseOutcome,
};
use crate::core::{
    AttemptState, Booking, BookingKind, BookingLedger, CoachRequest, PlanningEvent,
    PlanningEventDraft, RecurrenceExpander, ScheduleSynchronizer, SchedulingError, StateStore,
    SyncReport, TimeWindow,
};
use crate::util::serde::{new_event_id, BookingId, EventId};

/// What [`SchedulingEngine::recover`] restored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineRecovery {
    /// Planning events loaded.
    pub events: usize,
    /// Bookings re-indexed.
    pub bookings: usize,
    /// Persisted bookings that were skipped (unknown resource or overlap).
    pub skipped: Vec<BookingId>,
    /// Outreach records restored.
    pub outreach_restored: usize,
    /// Outreach timers re-armed.
    pub timers_rearmed: usize,
    /// Outreach timers that were overdue and fired at once.
    pub timers_fired: usize,
}

/// Result of handling a coach's answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseResult {
    /// How the coordinator treated the response.
    pub outcome: ResponseOutcome,
    /// The booking after a successful accept.
    pub booking: Option<Booking>,
}

/// Court-scheduling facade.
pub struct SchedulingEngine {
    ledger: Arc<BookingLedger>,
    synchronizer: ScheduleSynchronizer,
    coordinator: Arc<OutreachCoordinator>,
    events: RwLock<HashMap<EventId, PlanningEvent>>,
    store: Arc<dyn StateStore>,
    expander: RecurrenceExpander,
}

impl SchedulingEngine {
    /// Assemble an engine from its parts. See `EngineBuilder` for the usual
    /// way in.
    pub fn new(
        ledger: Arc<BookingLedger>,
        coordinator: Arc<OutreachCoordinator>,
        store: Arc<dyn StateStore>,
        expander: RecurrenceExpander,
    ) -> Self {
        Self {
            synchronizer: ScheduleSynchronizer::new(Arc::clone(&ledger)),
            ledger,
            coordinator,
            events: RwLock::new(HashMap::new()),
            store,
            expander,
        }
    }

    /// Booking ledger.
    pub fn ledger(&self) -> &Arc<BookingLedger> {
        &self.ledger
    }

    /// Outreach coordinator.
    pub fn coordinator(&self) -> &Arc<OutreachCoordinator> {
        &self.coordinator
    }

    /// Create a planning event and book its occurrences.
    ///
    /// Validation errors abort before anything is stored. Conflicting pairs
    /// do not abort; they come back in the report's `rejected` list.
    pub fn create_planning_event(
        &self,
        draft: PlanningEventDraft,
    ) -> Result<(PlanningEvent, SyncReport), SchedulingError> {
        let event = PlanningEvent::from_draft(new_event_id(), draft, &self.expander)?;
        let report = self.synchronizer.with_event_lock(&event.id, || {
            self.store.put_event(&event)?;
            self.events.write().insert(event.id.clone(), event.clone());
            let report = self.synchronizer.reconcile(&event)?;
            self.apply_outreach(&event, None, &report);
            Ok::<_, SchedulingError>(report)
        })?;
        tracing::info!(
            event = %event.id,
            occurrences = event.occurrence_dates.len(),
            resources = event.assigned_resources.len(),
            "planning event created"
        );
        Ok((event, report))
    }

    /// Replace a planning event's definition and resynchronize its bookings.
    pub fn update_planning_event(
        &self,
        id: &str,
        draft: PlanningEventDraft,
    ) -> Result<(PlanningEvent, SyncReport), SchedulingError> {
        let event = PlanningEvent::from_draft(id.to_string(), draft, &self.expander)?;
        let report = self.synchronizer.with_event_lock(id, || {
            let previous = self
                .events
                .read()
                .get(id)
                .map(|e| e.coach_request.clone())
                .ok_or_else(|| SchedulingError::event_not_found(id))?;
            self.store.put_event(&event)?;
            self.events.write().insert(event.id.clone(), event.clone());
            let report = self.synchronizer.reconcile(&event)?;
            self.apply_outreach(&event, previous.as_ref(), &report);
            Ok::<_, SchedulingError>(report)
        })?;
        tracing::info!(event = %id, "planning event updated");
        Ok((event, report))
    }

    /// Delete a planning event together with its derived bookings.
    pub fn delete_planning_event(&self, id: &str) -> Result<Vec<Booking>, SchedulingError> {
        self.synchronizer.with_event_lock(id, || {
            if !self.events.read().contains_key(id) {
                return Err(SchedulingError::event_not_found(id));
            }
            self.store.delete_event(id)?;
            self.events.write().remove(id);
            Ok::<_, SchedulingError>(())
        })?;
        let removed = self.synchronizer.remove_event(id)?;
        for booking in &removed {
            self.coordinator.cancel(booking.id);
        }
        tracing::info!(event = %id, removed = removed.len(), "planning event deleted");
        Ok(removed)
    }

    /// Book an ad-hoc window.
    pub fn book(&self, resource: &str, window: TimeWindow) -> Result<Booking, SchedulingError> {
        self.ledger.book(resource, window, None, BookingKind::AdHoc)
    }

    /// Move a booking, excluding its own current reservation from the check.
    ///
    /// A derived booking stays owned by its event; the next sync of that
    /// event puts the occurrence back where the event says it belongs.
    pub fn reschedule_booking(
        &self,
        id: BookingId,
        resource: Option<&str>,
        window: TimeWindow,
    ) -> Result<Booking, SchedulingError> {
        let current = self
            .ledger
            .get(id)
            .ok_or_else(|| SchedulingError::booking_not_found(id))?;
        let resource = resource.unwrap_or(&current.resource);
        self.ledger.reschedule(id, resource, window)
    }

    /// Release a booking and stop any outreach for it.
    pub fn cancel_booking(&self, id: BookingId) -> Result<Booking, SchedulingError> {
        let booking = self.ledger.cancel(id)?;
        self.coordinator.cancel(id);
        Ok(booking)
    }

    /// Start coach outreach for an existing booking.
    pub fn request_coach(
        &self,
        id: BookingId,
        request: &CoachRequest,
    ) -> Result<OutreachRecord, SchedulingError> {
        let booking = self
            .ledger
            .get(id)
            .ok_or_else(|| SchedulingError::booking_not_found(id))?;
        self.coordinator
            .initiate(&booking, &request.candidates, &request.specialties)
    }

    /// Apply a coach's answer; an applied accept assigns the coach.
    pub fn respond_to_outreach(
        &self,
        booking_id: BookingId,
        coach_id: &str,
        response: CoachResponse,
    ) -> Result<ResponseResult, SchedulingError> {
        let outcome = self
            .coordinator
            .on_response(booking_id, coach_id, response)?;
        let booking = match outcome {
            ResponseOutcome::Applied(AttemptState::Accepted) => {
                Some(self.ledger.assign_coach(booking_id, coach_id)?)
            }
            _ => None,
        };
        Ok(ResponseResult { outcome, booking })
    }

    /// Hand a booking's outreach to operators now.
    pub fn escalate_outreach(&self, booking_id: BookingId) -> Result<bool, SchedulingError> {
        self.coordinator.escalate(booking_id)
    }

    /// Look up a planning event.
    pub fn planning_event(&self, id: &str) -> Option<PlanningEvent> {
        self.events.read().get(id).cloned()
    }

    /// Look up a booking.
    pub fn booking(&self, id: BookingId) -> Option<Booking> {
        self.ledger.get(id)
    }

    /// Outreach state of a booking.
    pub fn outreach(&self, booking_id: BookingId) -> Option<OutreachRecord> {
        self.coordinator.record(booking_id)
    }

    /// Number of planning events held.
    pub fn event_count(&self) -> usize {
        self.events.read().len()
    }

    /// Rebuild in-memory state from the state store.
    ///
    /// Call once at startup, before serving requests.
    pub fn recover(&self) -> Result<EngineRecovery, SchedulingError> {
        let events = self.store.load_events()?;
        let event_count = events.len();
        {
            let mut held = self.events.write();
            for event in events {
                held.insert(event.id.clone(), event);
            }
        }

        let rows = self.store.load_bookings()?;
        let total = rows.len();
        let skipped: Vec<BookingId> = self
            .ledger
            .restore(rows)
            .into_iter()
            .map(|b| b.id)
            .collect();

        let RecoveryReport {
            restored,
            rearmed,
            fired_overdue,
        } = self.coordinator.recover()?;

        let report = EngineRecovery {
            events: event_count,
            bookings: total - skipped.len(),
            skipped,
            outreach_restored: restored,
            timers_rearmed: rearmed,
            timers_fired: fired_overdue,
        };
        tracing::info!(
            events = report.events,
            bookings = report.bookings,
            skipped = report.skipped.len(),
            "engine state recovered"
        );
        Ok(report)
    }

    /// Bring outreach in line with the event after a sync; runs under the
    /// event lock.
    ///
    /// Removed bookings lose their outreach. With a coach request, every
    /// owned booking that has no coach and no outreach yet gets one, so a
    /// request added to an unchanged event staffs the existing bookings.
    /// Dropping the request stops outreach still running for the event.
    fn apply_outreach(
        &self,
        event: &PlanningEvent,
        previous: Option<&CoachRequest>,
        report: &SyncReport,
    ) {
        for booking in &report.removed {
            self.coordinator.cancel(booking.id);
        }
        let owned = self.ledger.bookings_for_event(&event.id);
        let Some(request) = &event.coach_request else {
            if previous.is_some() {
                let stopped = owned
                    .iter()
                    .filter(|b| self.coordinator.cancel(b.id))
                    .count();
                tracing::info!(event = %event.id, stopped, "coach request dropped; outreach stopped");
            }
            return;
        };
        for booking in owned
            .iter()
            .filter(|b| b.assigned_coach.is_none() && self.coordinator.record(b.id).is_none())
        {
            if let Err(err) =
                self.coordinator
                    .initiate(booking, &request.candidates, &request.specialties)
            {
                tracing::error!(booking = %booking.id, event = %event.id, "outreach not started: {err}");
            }
        }
    }
}
