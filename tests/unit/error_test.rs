//! Tests for error types

use court_scheduler::core::SchedulingError;
use uuid::Uuid;

#[test]
fn test_conflict_error() {
    let err = SchedulingError::Conflict {
        resource: "CourtA".to_string(),
        conflicting: vec![Uuid::nil()],
    };
    assert_eq!(format!("{}", err), "conflict on CourtA: overlaps 1 booking(s)");
    assert_eq!(err.status_code(), 409);
    assert!(err.is_recoverable());
}

#[test]
fn test_validation_error() {
    let err = SchedulingError::Validation("duration must be at least one minute".to_string());
    assert_eq!(
        format!("{}", err),
        "validation failed: duration must be at least one minute"
    );
    assert_eq!(err.status_code(), 422);
}

#[test]
fn test_not_found_helpers() {
    let err = SchedulingError::event_not_found("evt-9");
    assert_eq!(format!("{}", err), "planning event not found: evt-9");
    assert_eq!(err.status_code(), 404);

    let err = SchedulingError::booking_not_found(Uuid::nil());
    assert!(format!("{}", err).starts_with("booking not found: 00000000"));
}

#[test]
fn test_delivery_error() {
    let err = SchedulingError::Delivery("sms gateway down".to_string());
    assert_eq!(format!("{}", err), "delivery failed: sms gateway down");
    assert_eq!(err.status_code(), 502);
    assert!(!err.is_recoverable());
}

#[test]
fn test_backend_error() {
    let err = SchedulingError::Backend("connection failed".to_string());
    assert_eq!(format!("{}", err), "backend error: connection failed");
    assert_eq!(err.status_code(), 500);
}
