//! Thread-safe booking ledger with atomic check-and-insert per resource.
//!
//! Each resource has its own lane: an [`IntervalStore`] behind a
//! `parking_lot::Mutex`. Every write holds the lane lock across the conflict
//! check and the insert, so two concurrent requests for the same court cannot
//! both observe a free window. Requests for different courts never contend.
//!
//! Lock order is fixed: lanes first (ascending resource id when two are
//! needed), then the booking map. The state store is written before the
//! in-memory index changes, so a failed write leaves no partial effect.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::NaiveDate;
use parking_lot::{Mutex, RwLock};

use crate::core::audit::{build_audit_event, record_to, SharedAudit};
use crate::core::conflict::{self, ConflictOutcome};
use crate::core::{
    Booking, BookingKind, IntervalStore, ResourceRegistry, SchedulingError, StateStore, TimeWindow,
};
use crate::util::serde::{new_booking_id, BookingId, EventId, ResourceId};

/// Booking state shared by the API, the synchronizer and recovery.
pub struct BookingLedger {
    lanes: HashMap<ResourceId, Mutex<IntervalStore>>,
    bookings: RwLock<HashMap<BookingId, Booking>>,
    store: Arc<dyn StateStore>,
    audit: Option<SharedAudit>,
}

impl BookingLedger {
    /// Create a ledger with one lane per resource.
    pub fn new(resources: BTreeSet<ResourceId>, store: Arc<dyn StateStore>) -> Self {
        let lanes = resources
            .into_iter()
            .map(|r| (r, Mutex::new(IntervalStore::new())))
            .collect();
        Self {
            lanes,
            bookings: RwLock::new(HashMap::new()),
            store,
            audit: None,
        }
    }

    /// Create a ledger for every resource the registry lists.
    pub fn from_registry(registry: &dyn ResourceRegistry, store: Arc<dyn StateStore>) -> Self {
        Self::new(registry.list(), store)
    }

    /// Attach an audit sink.
    #[must_use]
    pub fn with_audit(mut self, audit: SharedAudit) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Bookable resources, sorted.
    pub fn resources(&self) -> Vec<ResourceId> {
        let mut resources: Vec<_> = self.lanes.keys().cloned().collect();
        resources.sort();
        resources
    }

    fn lane(&self, resource: &str) -> Result<&Mutex<IntervalStore>, SchedulingError> {
        self.lanes
            .get(resource)
            .ok_or_else(|| SchedulingError::Validation(format!("unknown resource `{resource}`")))
    }

    fn current_resource(&self, id: BookingId) -> Result<ResourceId, SchedulingError> {
        self.bookings
            .read()
            .get(&id)
            .map(|b| b.resource.clone())
            .ok_or_else(|| SchedulingError::booking_not_found(id))
    }

    /// Advisory conflict check against the current state.
    ///
    /// The answer can be stale by the time the caller acts on it; use
    /// [`BookingLedger::book`] for an atomic check-and-insert.
    pub fn check(
        &self,
        resource: &str,
        window: &TimeWindow,
        exclude: Option<BookingId>,
    ) -> Result<ConflictOutcome, SchedulingError> {
        let index = self.lane(resource)?.lock();
        Ok(conflict::check(&index, resource, window, exclude))
    }

    /// Reserve `window` on `resource` if nothing overlaps it.
    pub fn book(
        &self,
        resource: &str,
        window: TimeWindow,
        owner_event_id: Option<EventId>,
        kind: BookingKind,
    ) -> Result<Booking, SchedulingError> {
        let mut index = self.lane(resource)?.lock();
        if let Err(err) = conflict::check(&index, resource, &window, None).into_result(resource) {
            tracing::warn!(resource, %window, "booking rejected: {err}");
            return Err(err);
        }
        let booking = Booking {
            id: new_booking_id(),
            resource: resource.to_string(),
            window,
            owner_event_id,
            kind,
            assigned_coach: None,
        };
        self.store.put_booking(&booking)?;
        index.insert(resource, window, booking.id);
        self.bookings.write().insert(booking.id, booking.clone());
        drop(index);

        tracing::info!(booking = %booking.id, resource, %window, "booking created");
        record_to(self.audit.as_ref(), || {
            build_audit_event(booking.id.to_string(), resource, "ledger", "book", None)
        });
        Ok(booking)
    }

    /// Move a booking to a new resource and/or window after a fresh check.
    ///
    /// The booking's own prior reservation is excluded from the check, so a
    /// window may be shifted within itself.
    pub fn reschedule(
        &self,
        id: BookingId,
        resource: &str,
        window: TimeWindow,
    ) -> Result<Booking, SchedulingError> {
        self.lane(resource)?;
        loop {
            let from = self.current_resource(id)?;
            let moved = if from == resource {
                let mut index = self.lane(resource)?.lock();
                self.apply_move(&mut index, None, id, &from, resource, window)?
            } else {
                let (first, second) = if from.as_str() < resource {
                    (from.as_str(), resource)
                } else {
                    (resource, from.as_str())
                };
                let mut a = self.lane(first)?.lock();
                let mut b = self.lane(second)?.lock();
                let (source, target) = if first == from {
                    (&mut *a, &mut *b)
                } else {
                    (&mut *b, &mut *a)
                };
                self.apply_move(target, Some(source), id, &from, resource, window)?
            };
            // None: the booking changed lanes between lookup and locking.
            if let Some(booking) = moved {
                tracing::info!(booking = %id, from = %from, to = resource, %window, "booking rescheduled");
                record_to(self.audit.as_ref(), || {
                    build_audit_event(
                        id.to_string(),
                        resource,
                        "ledger",
                        "reschedule",
                        Some(format!("from {from}")),
                    )
                });
                return Ok(booking);
            }
        }
    }

    fn apply_move(
        &self,
        target: &mut IntervalStore,
        source: Option<&mut IntervalStore>,
        id: BookingId,
        expected_resource: &str,
        resource: &str,
        window: TimeWindow,
    ) -> Result<Option<Booking>, SchedulingError> {
        let mut bookings = self.bookings.write();
        let Some(current) = bookings.get(&id) else {
            return Err(SchedulingError::booking_not_found(id));
        };
        if current.resource != expected_resource {
            return Ok(None);
        }
        conflict::check(target, resource, &window, Some(id)).into_result(resource)?;

        let mut updated = current.clone();
        updated.resource = resource.to_string();
        updated.window = window;
        self.store.put_booking(&updated)?;
        if let Some(source) = source {
            source.remove(id);
        }
        target.insert(resource, window, id);
        bookings.insert(id, updated.clone());
        Ok(Some(updated))
    }

    /// Release a booking.
    pub fn cancel(&self, id: BookingId) -> Result<Booking, SchedulingError> {
        loop {
            let resource = self.current_resource(id)?;
            let mut index = self.lane(&resource)?.lock();
            let mut bookings = self.bookings.write();
            let Some(current) = bookings.get(&id) else {
                return Err(SchedulingError::booking_not_found(id));
            };
            if current.resource != resource {
                continue;
            }
            self.store.delete_booking(id)?;
            index.remove(id);
            let Some(booking) = bookings.remove(&id) else {
                return Err(SchedulingError::booking_not_found(id));
            };
            drop(bookings);
            drop(index);

            tracing::info!(booking = %id, resource = %booking.resource, window = %booking.window, "booking cancelled");
            record_to(self.audit.as_ref(), || {
                build_audit_event(id.to_string(), booking.resource.clone(), "ledger", "cancel", None)
            });
            return Ok(booking);
        }
    }

    /// Record the coach confirmed for a booking.
    pub fn assign_coach(&self, id: BookingId, coach_id: &str) -> Result<Booking, SchedulingError> {
        let mut bookings = self.bookings.write();
        let booking = bookings
            .get_mut(&id)
            .ok_or_else(|| SchedulingError::booking_not_found(id))?;
        let mut updated = booking.clone();
        updated.assigned_coach = Some(coach_id.to_string());
        self.store.put_booking(&updated)?;
        *booking = updated.clone();
        drop(bookings);

        record_to(self.audit.as_ref(), || {
            build_audit_event(id.to_string(), updated.resource.clone(), coach_id, "assign", None)
        });
        Ok(updated)
    }

    /// Look up a booking.
    pub fn get(&self, id: BookingId) -> Option<Booking> {
        self.bookings.read().get(&id).cloned()
    }

    /// Derived bookings owned by `event_id`, ordered by date then resource.
    pub fn bookings_for_event(&self, event_id: &str) -> Vec<Booking> {
        let mut owned: Vec<Booking> = self
            .bookings
            .read()
            .values()
            .filter(|b| {
                b.kind == BookingKind::Derived && b.owner_event_id.as_deref() == Some(event_id)
            })
            .cloned()
            .collect();
        owned.sort_by(|a, b| {
            (a.window.date, &a.resource, a.window.start)
                .cmp(&(b.window.date, &b.resource, b.window.start))
        });
        owned
    }

    /// Bookings on `resource` for `date`, in start order.
    pub fn bookings_on(&self, resource: &str, date: NaiveDate) -> Result<Vec<Booking>, SchedulingError> {
        let ids = self.lane(resource)?.lock().day(resource, date);
        let bookings = self.bookings.read();
        Ok(ids
            .into_iter()
            .filter_map(|(id, _)| bookings.get(&id).cloned())
            .collect())
    }

    /// Number of live bookings.
    pub fn len(&self) -> usize {
        self.bookings.read().len()
    }

    /// Whether the ledger holds no bookings.
    pub fn is_empty(&self) -> bool {
        self.bookings.read().is_empty()
    }

    /// Re-index bookings loaded from the state store.
    ///
    /// Rows naming an unknown resource or overlapping an already restored
    /// booking are skipped and returned.
    pub fn restore(&self, mut rows: Vec<Booking>) -> Vec<Booking> {
        rows.sort_by(|a, b| (a.window.date, a.window.start, a.id).cmp(&(b.window.date, b.window.start, b.id)));
        let mut skipped = Vec::new();
        for booking in rows {
            let Ok(lane) = self.lane(&booking.resource) else {
                tracing::warn!(booking = %booking.id, resource = %booking.resource, "skipping booking on unknown resource");
                skipped.push(booking);
                continue;
            };
            let mut index = lane.lock();
            let outcome = conflict::check(&index, &booking.resource, &booking.window, Some(booking.id));
            if let ConflictOutcome::Conflict(ids) = outcome {
                tracing::error!(booking = %booking.id, conflicting = ?ids, "persisted booking violates overlap invariant");
                skipped.push(booking);
                continue;
            }
            index.insert(&booking.resource, booking.window, booking.id);
            self.bookings.write().insert(booking.id, booking);
        }
        skipped
    }
}
