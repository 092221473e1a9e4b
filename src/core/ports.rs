//! Capabilities the engine consumes from its surroundings.
//!
//! Everything outside the scheduling core (transport, persistence, wall
//! time, background execution, the court list, the coach roster) is reached
//! through the traits in this module so the core can run against in-memory
//! doubles in tests and real adapters in production.

use std::collections::BTreeSet;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::core::{
    Booking, CoachCandidate, DeliveryHandle, EscalationNotice, OutreachMessage, OutreachRecord,
    PlanningEvent, SchedulingError,
};
use crate::util::serde::{BookingId, Channel, ResourceId};

/// Source of the current instant.
pub trait ClockSource: Send + Sync {
    /// Current time in UTC.
    fn now(&self) -> DateTime<Utc>;
}

/// Boxed future handed to a [`Spawn`] implementation.
pub type BoxedTask = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Abstraction for running background work on a runtime.
pub trait Spawn: Send + Sync {
    /// Run `task` to completion in the background.
    fn spawn(&self, task: BoxedTask);
}

/// Callback run when a timer fires.
pub type TimerCallback = Box<dyn FnOnce() + Send + 'static>;

/// Cancellation handle for a scheduled timer.
///
/// Dropping the handle leaves the timer armed; call [`TimerHandle::cancel`]
/// to disarm it.
pub struct TimerHandle {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl TimerHandle {
    /// Wrap the cancellation action of a timer backend.
    pub fn new(cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A handle for a timer that cannot be cancelled.
    pub fn detached() -> Self {
        Self { cancel: None }
    }

    /// Disarm the timer. Firing that already started is not interrupted.
    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerHandle")
            .field("cancellable", &self.cancel.is_some())
            .finish()
    }
}

/// Timer primitive with cancellation.
///
/// Implementations must never run `callback` on the calling thread before
/// `after` returns; callers may hold locks while arming timers.
pub trait TimerScheduler: Send + Sync {
    /// Run `callback` once `delay` has elapsed.
    fn after(&self, delay: Duration, callback: TimerCallback) -> TimerHandle;
}

/// Supplies the fixed set of bookable resources.
pub trait ResourceRegistry: Send + Sync {
    /// Every bookable resource.
    fn list(&self) -> BTreeSet<ResourceId>;
}

/// Read-only view of the coach roster.
pub trait CoachRoster: Send + Sync {
    /// Look up a coach by id.
    fn candidate(&self, id: &str) -> Option<CoachCandidate>;
}

/// Outbound contact with a coach.
///
/// `send` resolves once the transport accepted or refused the message; the
/// coach's answer arrives later through the outreach response path.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `message` to `coach_id` over `channel`.
    async fn send(
        &self,
        coach_id: &str,
        channel: Channel,
        message: &OutreachMessage,
    ) -> Result<DeliveryHandle, SchedulingError>;
}

/// Operator-facing queue of bookings that need a human.
pub trait EscalationSink: Send + Sync {
    /// Hand an escalated booking to operators.
    fn deliver(&self, notice: EscalationNotice) -> Result<(), SchedulingError>;
}

/// Durable storage for bookings, planning events and outreach state.
pub trait StateStore: Send + Sync {
    /// Insert or replace a booking.
    fn put_booking(&self, booking: &Booking) -> Result<(), SchedulingError>;
    /// Delete a booking; deleting a missing id is not an error.
    fn delete_booking(&self, id: BookingId) -> Result<(), SchedulingError>;
    /// Every stored booking.
    fn load_bookings(&self) -> Result<Vec<Booking>, SchedulingError>;
    /// Insert or replace a planning event.
    fn put_event(&self, event: &PlanningEvent) -> Result<(), SchedulingError>;
    /// Delete a planning event.
    fn delete_event(&self, id: &str) -> Result<(), SchedulingError>;
    /// Every stored planning event.
    fn load_events(&self) -> Result<Vec<PlanningEvent>, SchedulingError>;
    /// Insert or replace the outreach record of a booking.
    fn put_outreach(&self, record: &OutreachRecord) -> Result<(), SchedulingError>;
    /// Delete the outreach record of a booking.
    fn delete_outreach(&self, booking_id: BookingId) -> Result<(), SchedulingError>;
    /// Every stored outreach record.
    fn load_outreach(&self) -> Result<Vec<OutreachRecord>, SchedulingError>;
}
