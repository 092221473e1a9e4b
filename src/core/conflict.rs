//! Conflict checking for candidate bookings.

use crate::core::{IntervalStore, SchedulingError, TimeWindow};
use crate::util::serde::BookingId;

/// Result of checking a candidate window against the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictOutcome {
    /// No booking on the resource overlaps the window.
    Clear,
    /// Bookings that overlap the window, in id order.
    Conflict(Vec<BookingId>),
}

impl ConflictOutcome {
    /// Whether the window can be booked.
    pub const fn is_clear(&self) -> bool {
        matches!(self, Self::Clear)
    }

    /// Turn a conflict into a `SchedulingError` for `resource`.
    pub fn into_result(self, resource: &str) -> Result<(), SchedulingError> {
        match self {
            Self::Clear => Ok(()),
            Self::Conflict(conflicting) => Err(SchedulingError::Conflict {
                resource: resource.to_string(),
                conflicting,
            }),
        }
    }
}

/// Check `window` on `resource` against the current index.
///
/// `exclude` names a booking whose own reservation must not count, which is
/// how a reschedule avoids colliding with itself. The check is a pure read;
/// callers hold the resource lock across the check and the following insert.
pub fn check(
    store: &IntervalStore,
    resource: &str,
    window: &TimeWindow,
    exclude: Option<BookingId>,
) -> ConflictOutcome {
    let conflicting: Vec<BookingId> = store
        .overlapping(resource, window)
        .into_iter()
        .filter(|id| Some(*id) != exclude)
        .collect();
    if conflicting.is_empty() {
        ConflictOutcome::Clear
    } else {
        ConflictOutcome::Conflict(conflicting)
    }
}
