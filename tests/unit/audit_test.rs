//! Tests for audit sink

use court_scheduler::core::{build_audit_event, AuditLog, AuditSink, InMemoryAuditSink};

#[test]
fn test_in_memory_audit_sink() {
    let mut sink = InMemoryAuditSink::new(10);

    let event = build_audit_event(
        "booking1",
        "CourtA",
        "ledger",
        "book",
        Some("payload".to_string()),
    );

    sink.record(event.clone());
    assert_eq!(sink.events().len(), 1);

    let events = sink.events();
    assert_eq!(events[0].event_id, event.event_id);
    assert_eq!(events[0].subject_id, "booking1");
    assert_eq!(events[0].action, "book");
}

#[test]
fn test_audit_sink_overflow() {
    let mut sink = InMemoryAuditSink::new(2);

    sink.record(build_audit_event("b1", "CourtA", "ledger", "book", None));
    sink.record(build_audit_event("b2", "CourtA", "ledger", "book", None));
    sink.record(build_audit_event("b3", "CourtA", "ledger", "book", None));

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].subject_id, "b2"); // First one popped
    assert_eq!(events[1].subject_id, "b3");
}

#[test]
fn test_zero_capacity_sink_drops_everything() {
    let mut sink = InMemoryAuditSink::new(0);
    sink.record(build_audit_event("b1", "CourtA", "ledger", "book", None));
    assert!(sink.events().is_empty());
}

#[test]
fn test_build_audit_event() {
    let event = build_audit_event(
        "b1",
        "CourtB",
        "coach-7",
        "assign",
        Some("accepted".to_string()),
    );

    assert_eq!(event.subject_id, "b1");
    assert_eq!(event.resource, "CourtB");
    assert_eq!(event.actor, "coach-7");
    assert_eq!(event.action, "assign");
    assert_eq!(event.payload, Some("accepted".to_string()));
    assert!(event.created_at_ms > 0);
    assert!(uuid::Uuid::parse_str(&event.event_id).is_ok());
}

#[test]
fn test_audit_log_filters_by_subject() {
    let mut log = AuditLog::new(16);
    let reader = log.clone();
    log.record(build_audit_event("b1", "CourtA", "ledger", "book", None));
    log.record(build_audit_event("b2", "CourtA", "ledger", "book", None));
    log.record(build_audit_event("b1", "CourtA", "ledger", "cancel", None));

    assert_eq!(reader.actions_for("b1"), vec!["book", "cancel"]);
    assert_eq!(reader.events().len(), 3);
}
