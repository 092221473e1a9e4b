//! Shared identifier and wire types used across the engine.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Name of a bookable physical unit (a court).
pub type ResourceId = String;

/// Identifier of a planning event.
pub type EventId = String;

/// Identifier of a coach in the external roster.
pub type CoachId = String;

/// Identifier of a booking.
pub type BookingId = uuid::Uuid;

/// Allocate a fresh booking identifier.
pub fn new_booking_id() -> BookingId {
    uuid::Uuid::new_v4()
}

/// Allocate a fresh planning event identifier.
pub fn new_event_id() -> EventId {
    format!("evt-{}", uuid::Uuid::new_v4().simple())
}

/// Delivery channel used to contact a coach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// Email message.
    Email,
    /// Text message.
    Sms,
    /// Mobile push notification.
    Push,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Email => "email",
            Self::Sms => "sms",
            Self::Push => "push",
        };
        f.write_str(name)
    }
}
