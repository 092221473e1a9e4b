//! In-memory operator queue for escalated bookings.

use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::core::{EscalationNotice, EscalationSink, SchedulingError};
use crate::util::serde::BookingId;

/// Operator queue kept in process memory.
#[derive(Default)]
pub struct InMemoryOperatorQueue {
    pending: Mutex<VecDeque<EscalationNotice>>,
}

impl InMemoryOperatorQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Notices waiting for an operator, oldest first.
    pub fn pending(&self) -> Vec<EscalationNotice> {
        self.pending.lock().iter().cloned().collect()
    }

    /// Number of waiting notices.
    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    /// Whether nothing is waiting.
    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }

    /// Take the notice for `booking_id` off the queue.
    pub fn acknowledge(&self, booking_id: BookingId) -> Option<EscalationNotice> {
        let mut pending = self.pending.lock();
        let idx = pending.iter().position(|n| n.booking_id == booking_id)?;
        pending.remove(idx)
    }
}

impl EscalationSink for InMemoryOperatorQueue {
    fn deliver(&self, notice: EscalationNotice) -> Result<(), SchedulingError> {
        tracing::info!(booking = %notice.booking_id, reason = ?notice.reason, "escalation queued for operators");
        self.pending.lock().push_back(notice);
        Ok(())
    }
}
