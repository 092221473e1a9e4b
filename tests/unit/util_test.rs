//! Tests for utility functions

use chrono::{Duration, TimeZone, Utc};
use court_scheduler::core::ClockSource;
use court_scheduler::util::{new_booking_id, new_event_id, Channel, ManualClock, SystemClock};

#[test]
fn test_channel_serde_and_display() {
    assert_eq!(serde_json::to_string(&Channel::Sms).unwrap(), "\"sms\"");
    let parsed: Channel = serde_json::from_str("\"push\"").unwrap();
    assert_eq!(parsed, Channel::Push);
    assert_eq!(Channel::Email.to_string(), "email");
}

#[test]
fn test_ids_are_unique() {
    assert_ne!(new_booking_id(), new_booking_id());
    let event = new_event_id();
    assert!(event.starts_with("evt-"));
    assert_ne!(event, new_event_id());
}

#[test]
fn test_manual_clock() {
    let start = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
    let clock = ManualClock::new(start);
    assert_eq!(clock.now(), start);

    clock.advance(Duration::hours(25));
    assert_eq!(clock.now(), start + Duration::hours(25));

    clock.set(start);
    assert_eq!(clock.now(), start);
}

#[test]
fn test_system_clock_moves_forward() {
    let a = SystemClock.now();
    let b = SystemClock.now();
    assert!(b >= a);
}

#[test]
fn test_init_tracing_is_idempotent() {
    court_scheduler::util::init_tracing();
    court_scheduler::util::init_tracing();
    assert!(tracing::dispatcher::has_been_set());
    assert_eq!(court_scheduler::util::DEFAULT_FILTER, "court_scheduler=info");
}
