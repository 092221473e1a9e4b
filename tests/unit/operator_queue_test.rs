//! Tests for the in-memory operator queue

use chrono::Utc;
use court_scheduler::core::{EscalationNotice, EscalationReason, EscalationSink};
use court_scheduler::infra::InMemoryOperatorQueue;
use uuid::Uuid;

fn notice(booking_id: Uuid, reason: EscalationReason) -> EscalationNotice {
    EscalationNotice {
        booking_id,
        subject: "CourtA 2025-03-01 09:00-10:00".into(),
        reason,
        attempts: 2,
        escalated_at: Utc::now(),
    }
}

#[test]
fn test_notices_queue_in_order() {
    let queue = InMemoryOperatorQueue::new();
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    queue.deliver(notice(a, EscalationReason::Exhausted)).unwrap();
    queue.deliver(notice(b, EscalationReason::WindowElapsed)).unwrap();

    let pending = queue.pending();
    assert_eq!(pending.len(), 2);
    assert_eq!(pending[0].booking_id, a);
    assert_eq!(pending[1].reason, EscalationReason::WindowElapsed);
}

#[test]
fn test_acknowledge_removes_notice() {
    let queue = InMemoryOperatorQueue::new();
    let a = Uuid::new_v4();
    queue.deliver(notice(a, EscalationReason::Manual)).unwrap();

    let taken = queue.acknowledge(a).unwrap();
    assert_eq!(taken.booking_id, a);
    assert!(queue.is_empty());
    assert!(queue.acknowledge(a).is_none());
}
