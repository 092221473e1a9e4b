//! Postgres-backed state store (schema and interface stubs).
//!
//! The schema makes the database a second enforcement point for the
//! no-overlap rule: an exclusion constraint over `(resource, slot)` rejects
//! any two bookings whose ranges intersect on the same court.

use crate::core::{Booking, OutreachRecord, PlanningEvent, SchedulingError, StateStore};
use crate::util::serde::BookingId;

/// Postgres store adapter placeholder.
pub struct PostgresStore {
    url: String,
}

fn not_wired() -> SchedulingError {
    SchedulingError::Backend("postgres store not wired to database client".into())
}

impl PostgresStore {
    /// Create a new adapter for `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Connection string.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Migration statements for scheduler storage.
    pub const fn migrations() -> &'static [&'static str] {
        &[
            r"
CREATE EXTENSION IF NOT EXISTS btree_gist;
CREATE TABLE IF NOT EXISTS cs_planning_events (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    body JSONB NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
",
            r"
CREATE TABLE IF NOT EXISTS cs_bookings (
    id UUID PRIMARY KEY,
    resource TEXT NOT NULL,
    slot TSRANGE NOT NULL,
    owner_event_id TEXT REFERENCES cs_planning_events (id) ON DELETE CASCADE,
    kind TEXT NOT NULL,
    assigned_coach TEXT,
    EXCLUDE USING gist (resource WITH =, slot WITH &&)
);
CREATE INDEX IF NOT EXISTS idx_cs_bookings_owner ON cs_bookings (owner_event_id);
",
            r"
CREATE TABLE IF NOT EXISTS cs_outreach (
    booking_id UUID PRIMARY KEY REFERENCES cs_bookings (id) ON DELETE CASCADE,
    status TEXT NOT NULL,
    body JSONB NOT NULL,
    next_deadline TIMESTAMPTZ
);
CREATE INDEX IF NOT EXISTS idx_cs_outreach_deadline ON cs_outreach (next_deadline)
    WHERE status = 'active';
",
        ]
    }
}

impl StateStore for PostgresStore {
    fn put_booking(&self, _booking: &Booking) -> Result<(), SchedulingError> {
        Err(not_wired())
    }

    fn delete_booking(&self, _id: BookingId) -> Result<(), SchedulingError> {
        Err(not_wired())
    }

    fn load_bookings(&self) -> Result<Vec<Booking>, SchedulingError> {
        Err(not_wired())
    }

    fn put_event(&self, _event: &PlanningEvent) -> Result<(), SchedulingError> {
        Err(not_wired())
    }

    fn delete_event(&self, _id: &str) -> Result<(), SchedulingError> {
        Err(not_wired())
    }

    fn load_events(&self) -> Result<Vec<PlanningEvent>, SchedulingError> {
        Err(not_wired())
    }

    fn put_outreach(&self, _record: &OutreachRecord) -> Result<(), SchedulingError> {
        Err(not_wired())
    }

    fn delete_outreach(&self, _booking_id: BookingId) -> Result<(), SchedulingError> {
        Err(not_wired())
    }

    fn load_outreach(&self) -> Result<Vec<OutreachRecord>, SchedulingError> {
        Err(not_wired())
    }
}
