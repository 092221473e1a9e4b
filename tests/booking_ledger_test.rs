//! Booking ledger integration tests: overlap rules, atomic check-and-insert,
//! reschedule and cancel.

mod common;

use std::collections::BTreeSet;
use std::sync::Arc;

use common::{date, window};
use court_scheduler::core::{BookingKind, BookingLedger, SchedulingError, TimeWindow};
use court_scheduler::infra::InMemoryStore;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn ledger(resources: &[&str]) -> Arc<BookingLedger> {
    let resources: BTreeSet<String> = resources.iter().map(ToString::to_string).collect();
    Arc::new(BookingLedger::new(resources, Arc::new(InMemoryStore::new())))
}

#[test]
fn test_overlapping_request_is_rejected_touching_is_accepted() {
    let ledger = ledger(&["CourtA"]);
    let day = date(2025, 3, 1);

    let first = ledger
        .book("CourtA", window(day, 9, 0, 60), None, BookingKind::AdHoc)
        .unwrap();

    let err = ledger
        .book("CourtA", window(day, 9, 30, 60), None, BookingKind::AdHoc)
        .unwrap_err();
    match err {
        SchedulingError::Conflict {
            resource,
            conflicting,
        } => {
            assert_eq!(resource, "CourtA");
            assert_eq!(conflicting, vec![first.id]);
        }
        other => panic!("expected conflict, got {other:?}"),
    }

    let touching = ledger.book("CourtA", window(day, 10, 0, 60), None, BookingKind::AdHoc);
    assert!(touching.is_ok());
    assert_eq!(ledger.len(), 2);
}

#[test]
fn test_same_window_on_other_court_or_day_is_fine() {
    let ledger = ledger(&["CourtA", "CourtB"]);
    let day = date(2025, 3, 1);
    ledger
        .book("CourtA", window(day, 9, 0, 60), None, BookingKind::AdHoc)
        .unwrap();
    ledger
        .book("CourtB", window(day, 9, 0, 60), None, BookingKind::AdHoc)
        .unwrap();
    ledger
        .book("CourtA", window(date(2025, 3, 2), 9, 0, 60), None, BookingKind::AdHoc)
        .unwrap();
    assert_eq!(ledger.len(), 3);
}

#[test]
fn test_unknown_resource_is_a_validation_error() {
    let ledger = ledger(&["CourtA"]);
    let err = ledger
        .book("CourtZ", window(date(2025, 3, 1), 9, 0, 60), None, BookingKind::AdHoc)
        .unwrap_err();
    assert!(matches!(err, SchedulingError::Validation(_)));
}

#[test]
fn test_concurrent_requests_for_one_slot_admit_exactly_one() {
    let ledger = ledger(&["CourtA"]);
    let slot = window(date(2025, 3, 1), 18, 0, 90);

    let results: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let ledger = Arc::clone(&ledger);
                s.spawn(move || ledger.book("CourtA", slot, None, BookingKind::AdHoc))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, SchedulingError::Conflict { .. })));
    assert_eq!(ledger.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_fan_out_of_staggered_requests_keeps_lane_disjoint() {
    let ledger = ledger(&["CourtA"]);
    let day = date(2025, 3, 1);

    // 45-minute windows every 15 minutes: each overlaps its neighbours.
    let tasks = (0..24u32).map(|i| {
        let ledger = Arc::clone(&ledger);
        tokio::task::spawn_blocking(move || {
            let start = 8 * 60 + i * 15;
            let w = window(day, start / 60, start % 60, 45);
            ledger.book("CourtA", w, None, BookingKind::AdHoc).ok()
        })
    });
    let booked: Vec<_> = futures::future::join_all(tasks)
        .await
        .into_iter()
        .filter_map(|r| r.unwrap())
        .collect();

    assert!(!booked.is_empty());
    for (i, a) in booked.iter().enumerate() {
        for b in &booked[i + 1..] {
            assert!(!a.window.overlaps(&b.window), "{} overlaps {}", a.window, b.window);
        }
    }
}

#[test]
fn test_random_requests_never_double_book() {
    let ledger = ledger(&["CourtA", "CourtB"]);
    let mut rng = StdRng::seed_from_u64(0x0C0_u64);
    let mut accepted: Vec<(String, TimeWindow)> = Vec::new();

    for _ in 0..400 {
        let resource = if rng.random_bool(0.5) { "CourtA" } else { "CourtB" };
        let day = date(2025, 3, rng.random_range(1..=3));
        let start = rng.random_range(6 * 60..22 * 60);
        let duration = rng.random_range(15..=120);
        let w = window(day, start / 60, start % 60, duration);

        let collides = accepted
            .iter()
            .any(|(r, existing)| r == resource && existing.overlaps(&w));
        match ledger.book(resource, w, None, BookingKind::AdHoc) {
            Ok(_) => {
                assert!(!collides, "accepted {w} on {resource} despite overlap");
                accepted.push((resource.to_string(), w));
            }
            Err(SchedulingError::Conflict { .. }) => assert!(collides, "rejected free {w}"),
            Err(other) => panic!("unexpected error {other:?}"),
        }
    }
    assert_eq!(ledger.len(), accepted.len());
}

#[test]
fn test_reschedule_excludes_own_reservation() {
    let ledger = ledger(&["CourtA"]);
    let day = date(2025, 3, 1);
    let booking = ledger
        .book("CourtA", window(day, 9, 0, 60), None, BookingKind::AdHoc)
        .unwrap();

    let moved = ledger
        .reschedule(booking.id, "CourtA", window(day, 9, 30, 60))
        .unwrap();
    assert_eq!(moved.window.start, common::time(9, 30));

    // The old 09:00 slot is free again.
    assert!(ledger
        .check("CourtA", &window(day, 9, 0, 30), None)
        .unwrap()
        .is_clear());
}

#[test]
fn test_reschedule_to_other_court_checks_target() {
    let ledger = ledger(&["CourtA", "CourtB"]);
    let day = date(2025, 3, 1);
    let blocker = ledger
        .book("CourtB", window(day, 9, 0, 60), None, BookingKind::AdHoc)
        .unwrap();
    let booking = ledger
        .book("CourtA", window(day, 9, 0, 60), None, BookingKind::AdHoc)
        .unwrap();

    let err = ledger
        .reschedule(booking.id, "CourtB", window(day, 9, 0, 60))
        .unwrap_err();
    assert_eq!(
        err,
        SchedulingError::Conflict {
            resource: "CourtB".into(),
            conflicting: vec![blocker.id],
        }
    );
    assert_eq!(ledger.get(booking.id).unwrap().resource, "CourtA");

    let moved = ledger
        .reschedule(booking.id, "CourtB", window(day, 10, 0, 60))
        .unwrap();
    assert_eq!(moved.resource, "CourtB");
    assert!(ledger.bookings_on("CourtA", day).unwrap().is_empty());
    assert_eq!(ledger.bookings_on("CourtB", day).unwrap().len(), 2);
}

#[test]
fn test_cancel_frees_the_window_and_reports_missing_ids() {
    let ledger = ledger(&["CourtA"]);
    let day = date(2025, 3, 1);
    let booking = ledger
        .book("CourtA", window(day, 9, 0, 60), None, BookingKind::AdHoc)
        .unwrap();

    ledger.cancel(booking.id).unwrap();
    assert!(ledger.is_empty());
    assert!(matches!(
        ledger.cancel(booking.id),
        Err(SchedulingError::NotFound { kind: "booking", .. })
    ));
    assert!(ledger
        .book("CourtA", window(day, 9, 0, 60), None, BookingKind::AdHoc)
        .is_ok());
}

#[test]
fn test_window_running_past_midnight_is_clamped() {
    let ledger = ledger(&["CourtA"]);
    let day = date(2025, 3, 1);
    let late = ledger
        .book("CourtA", window(day, 23, 0, 180), None, BookingKind::AdHoc)
        .unwrap();
    assert_eq!(late.window.duration_minutes, 60);
    assert!(ledger
        .book("CourtA", window(date(2025, 3, 2), 0, 0, 60), None, BookingKind::AdHoc)
        .is_ok());
}
