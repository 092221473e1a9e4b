//! Error types for scheduling operations.

use thiserror::Error;

use crate::util::serde::{BookingId, ResourceId};

/// Errors produced by scheduling components.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulingError {
    /// The requested window overlaps existing bookings on the resource.
    #[error("conflict on {resource}: overlaps {} booking(s)", conflicting.len())]
    Conflict {
        /// Resource the request targeted.
        resource: ResourceId,
        /// Bookings the request collided with.
        conflicting: Vec<BookingId>,
    },
    /// Input rejected before any state was touched.
    #[error("validation failed: {0}")]
    Validation(String),
    /// The referenced entity does not exist.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Entity kind (booking, planning event, outreach).
        kind: &'static str,
        /// Identifier that was looked up.
        id: String,
    },
    /// A notifier channel could not deliver a message.
    #[error("delivery failed: {0}")]
    Delivery(String),
    /// Backend-specific failure with context.
    #[error("backend error: {0}")]
    Backend(String),
}

impl SchedulingError {
    /// Shorthand for a missing booking.
    pub fn booking_not_found(id: BookingId) -> Self {
        Self::NotFound {
            kind: "booking",
            id: id.to_string(),
        }
    }

    /// Shorthand for a missing planning event.
    pub fn event_not_found(id: &str) -> Self {
        Self::NotFound {
            kind: "planning event",
            id: id.to_string(),
        }
    }

    /// HTTP-style status code for the API surface.
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Conflict { .. } => 409,
            Self::Validation(_) => 422,
            Self::NotFound { .. } => 404,
            Self::Delivery(_) => 502,
            Self::Backend(_) => 500,
        }
    }

    /// Whether the caller can fix the request and retry.
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Conflict { .. } | Self::Validation(_) | Self::NotFound { .. }
        )
    }
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
