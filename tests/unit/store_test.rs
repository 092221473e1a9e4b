//! Tests for state store backends

use std::path::PathBuf;

use chrono::{NaiveDate, NaiveTime};
use court_scheduler::core::{Booking, BookingKind, StateStore, TimeWindow};
use court_scheduler::infra::{InMemoryStore, JsonlStore, PostgresStore};
use uuid::Uuid;

fn booking(resource: &str, hour: u32) -> Booking {
    Booking {
        id: Uuid::new_v4(),
        resource: resource.into(),
        window: TimeWindow::new(
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
            60,
        )
        .unwrap(),
        owner_event_id: None,
        kind: BookingKind::AdHoc,
        assigned_coach: None,
    }
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("court-scheduler-{name}-{}", Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn test_in_memory_store_round_trip() {
    let store = InMemoryStore::new();
    let a = booking("CourtA", 9);
    store.put_booking(&a).unwrap();
    assert_eq!(store.booking_count(), 1);

    store.delete_booking(a.id).unwrap();
    store.delete_booking(a.id).unwrap();
    assert!(store.load_bookings().unwrap().is_empty());
}

#[test]
fn test_jsonl_store_replays_last_write() {
    let dir = scratch_dir("replay");
    let store = JsonlStore::open(&dir).unwrap();
    let mut a = booking("CourtA", 9);
    let b = booking("CourtB", 10);
    store.put_booking(&a).unwrap();
    store.put_booking(&b).unwrap();
    a.assigned_coach = Some("c1".into());
    store.put_booking(&a).unwrap();
    store.delete_booking(b.id).unwrap();

    let reopened = JsonlStore::open(&dir).unwrap();
    let rows = reopened.load_bookings().unwrap();
    assert_eq!(rows, vec![a]);

    std::fs::remove_dir_all(dir).ok();
}

#[test]
fn test_jsonl_compaction_keeps_live_rows() {
    let dir = scratch_dir("compact");
    let store = JsonlStore::open(&dir).unwrap();
    let a = booking("CourtA", 9);
    let b = booking("CourtA", 11);
    store.put_booking(&a).unwrap();
    store.put_booking(&b).unwrap();
    store.delete_booking(a.id).unwrap();
    store.compact().unwrap();

    let journal = std::fs::read_to_string(dir.join("bookings.jsonl")).unwrap();
    assert_eq!(journal.lines().count(), 1);
    assert_eq!(store.load_bookings().unwrap(), vec![b]);

    std::fs::remove_dir_all(dir).ok();
}

#[test]
fn test_jsonl_reports_corrupt_lines() {
    let dir = scratch_dir("corrupt");
    std::fs::write(dir.join("bookings.jsonl"), "{\"op\":\"put\"\n").unwrap();
    let store = JsonlStore::open(&dir).unwrap();
    let err = store.load_bookings().unwrap_err();
    assert!(err.to_string().contains("line 1"));

    std::fs::remove_dir_all(dir).ok();
}

#[test]
fn test_postgres_migrations_enforce_no_overlap() {
    let migrations = PostgresStore::migrations();
    assert!(migrations.iter().any(|m| m.contains("btree_gist")));
    assert!(migrations
        .iter()
        .any(|m| m.contains("EXCLUDE USING gist (resource WITH =, slot WITH &&)")));

    let store = PostgresStore::new("postgres://localhost/courts");
    assert!(store.load_bookings().is_err());
}
