//! Reconciliation of planning events against their derived bookings.
//!
//! A planning event implies one booking per assigned resource per occurrence
//! date. `sync` computes that desired set, compares it with the derived
//! bookings the ledger currently holds for the event, removes the stale ones
//! and conflict-checks the missing ones. Running it twice on unchanged state
//! is a no-op.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::NaiveDate;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::core::{
    Booking, BookingKind, BookingLedger, PlanningEvent, SchedulingError, TimeWindow,
};
use crate::util::serde::{BookingId, EventId, ResourceId};

/// A desired `(resource, date)` pair that could not be booked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedPair {
    /// Resource that was requested.
    pub resource: ResourceId,
    /// Occurrence date.
    pub date: NaiveDate,
    /// Window that was requested.
    pub window: TimeWindow,
    /// Bookings it collided with.
    pub conflicting: Vec<BookingId>,
}

/// Outcome of one synchronization pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    /// Bookings created by this pass.
    pub created: Vec<Booking>,
    /// Bookings removed as stale by this pass.
    pub removed: Vec<Booking>,
    /// Desired pairs rejected for conflict.
    pub rejected: Vec<RejectedPair>,
}

impl SyncReport {
    /// Whether the pass changed nothing and rejected nothing.
    pub fn is_noop(&self) -> bool {
        self.created.is_empty() && self.removed.is_empty() && self.rejected.is_empty()
    }
}

/// Identity of a derived booking inside one event.
type SlotIdentity = (ResourceId, TimeWindow);

/// Keeps derived bookings in line with their planning events.
pub struct ScheduleSynchronizer {
    ledger: Arc<BookingLedger>,
    event_locks: Mutex<HashMap<EventId, Arc<Mutex<()>>>>,
}

impl ScheduleSynchronizer {
    /// Create a synchronizer writing through `ledger`.
    pub fn new(ledger: Arc<BookingLedger>) -> Self {
        Self {
            ledger,
            event_locks: Mutex::new(HashMap::new()),
        }
    }

    fn event_lock(&self, event_id: &str) -> Arc<Mutex<()>> {
        Arc::clone(
            self.event_locks
                .lock()
                .entry(event_id.to_string())
                .or_default(),
        )
    }

    /// Drop the lock entry of `event_id` unless a caller still holds a clone.
    ///
    /// Clones are only handed out under the map lock, so a count of one seen
    /// under that lock means no thread is waiting on or holding the mutex.
    fn forget_event_lock(&self, event_id: &str) {
        let mut locks = self.event_locks.lock();
        if locks
            .get(event_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(event_id);
        }
    }

    /// Run `f` while holding the lock of `event_id`.
    ///
    /// Edits of the same event serialize; different events run in parallel.
    /// Use [`ScheduleSynchronizer::reconcile`] inside `f`, not `sync`.
    pub fn with_event_lock<R>(&self, event_id: &str, f: impl FnOnce() -> R) -> R {
        let lock = self.event_lock(event_id);
        let _guard = lock.lock();
        f()
    }

    /// Reconcile `event` under its event lock.
    pub fn sync(&self, event: &PlanningEvent) -> Result<SyncReport, SchedulingError> {
        self.with_event_lock(&event.id, || self.reconcile(event))
    }

    /// Reconcile `event`; the caller holds the event lock.
    pub fn reconcile(&self, event: &PlanningEvent) -> Result<SyncReport, SchedulingError> {
        let desired = event.desired_slots()?;
        let desired_keys: HashSet<SlotIdentity> = desired.iter().cloned().collect();

        let existing = self.ledger.bookings_for_event(&event.id);
        let mut existing_keys = HashSet::with_capacity(existing.len());
        let mut report = SyncReport::default();

        for booking in existing {
            let key = (booking.resource.clone(), booking.window);
            // Duplicates of a kept slot are stale too.
            if desired_keys.contains(&key) && existing_keys.insert(key) {
                continue;
            }
            match self.ledger.cancel(booking.id) {
                Ok(removed) => report.removed.push(removed),
                Err(SchedulingError::NotFound { .. }) => {
                    tracing::debug!(booking = %booking.id, "stale booking already gone");
                }
                Err(err) => return Err(err),
            }
        }

        for (resource, window) in desired {
            if existing_keys.contains(&(resource.clone(), window)) {
                continue;
            }
            match self.ledger.book(
                &resource,
                window,
                Some(event.id.clone()),
                BookingKind::Derived,
            ) {
                Ok(booking) => report.created.push(booking),
                Err(SchedulingError::Conflict { conflicting, .. }) => {
                    report.rejected.push(RejectedPair {
                        resource,
                        date: window.date,
                        window,
                        conflicting,
                    });
                }
                Err(err) => return Err(err),
            }
        }

        if report.is_noop() {
            tracing::debug!(event = %event.id, "sync: no changes");
        } else {
            tracing::info!(
                event = %event.id,
                created = report.created.len(),
                removed = report.removed.len(),
                rejected = report.rejected.len(),
                "planning event synchronized"
            );
        }
        Ok(report)
    }

    /// Remove every derived booking of `event_id`.
    pub fn remove_event(&self, event_id: &str) -> Result<Vec<Booking>, SchedulingError> {
        let removed = self.with_event_lock(event_id, || {
            let mut removed = Vec::new();
            for booking in self.ledger.bookings_for_event(event_id) {
                match self.ledger.cancel(booking.id) {
                    Ok(b) => removed.push(b),
                    Err(SchedulingError::NotFound { .. }) => {}
                    Err(err) => return Err(err),
                }
            }
            Ok(removed)
        })?;
        self.forget_event_lock(event_id);
        tracing::info!(event = %event_id, removed = removed.len(), "planning event bookings removed");
        Ok(removed)
    }
}
