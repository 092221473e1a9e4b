//! In-memory state store backend.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::core::{Booking, OutreachRecord, PlanningEvent, SchedulingError, StateStore};
use crate::util::serde::{BookingId, EventId};

#[derive(Default)]
struct Tables {
    bookings: HashMap<BookingId, Booking>,
    events: HashMap<EventId, PlanningEvent>,
    outreach: HashMap<BookingId, OutreachRecord>,
}

/// Simple in-memory store for development/testing.
///
/// Clones of the store are independent; share it through an `Arc` to
/// reload the same state into a second engine.
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored bookings.
    pub fn booking_count(&self) -> usize {
        self.tables.lock().bookings.len()
    }
}

impl StateStore for InMemoryStore {
    fn put_booking(&self, booking: &Booking) -> Result<(), SchedulingError> {
        self.tables
            .lock()
            .bookings
            .insert(booking.id, booking.clone());
        Ok(())
    }

    fn delete_booking(&self, id: BookingId) -> Result<(), SchedulingError> {
        self.tables.lock().bookings.remove(&id);
        Ok(())
    }

    fn load_bookings(&self) -> Result<Vec<Booking>, SchedulingError> {
        Ok(self.tables.lock().bookings.values().cloned().collect())
    }

    fn put_event(&self, event: &PlanningEvent) -> Result<(), SchedulingError> {
        self.tables
            .lock()
            .events
            .insert(event.id.clone(), event.clone());
        Ok(())
    }

    fn delete_event(&self, id: &str) -> Result<(), SchedulingError> {
        self.tables.lock().events.remove(id);
        Ok(())
    }

    fn load_events(&self) -> Result<Vec<PlanningEvent>, SchedulingError> {
        Ok(self.tables.lock().events.values().cloned().collect())
    }

    fn put_outreach(&self, record: &OutreachRecord) -> Result<(), SchedulingError> {
        self.tables
            .lock()
            .outreach
            .insert(record.booking_id, record.clone());
        Ok(())
    }

    fn delete_outreach(&self, booking_id: BookingId) -> Result<(), SchedulingError> {
        self.tables.lock().outreach.remove(&booking_id);
        Ok(())
    }

    fn load_outreach(&self) -> Result<Vec<OutreachRecord>, SchedulingError> {
        Ok(self.tables.lock().outreach.values().cloned().collect())
    }
}
