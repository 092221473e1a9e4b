//! Restart recovery from durable stores: bookings, planning events and
//! outreach deadlines.

mod common;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use common::{coach, date, harness_with_clock, settle, time, window, DAY};
use court_scheduler::config::EngineConfig;
use court_scheduler::core::{
    AttemptState, Booking, BookingKind, CoachRequest, EscalationReason, OutreachStatus,
    PlanningEventDraft, SchedulingError, StateStore,
};
use court_scheduler::infra::{InMemoryStore, JsonlStore};
use court_scheduler::util::{Channel, ManualClock};

fn scratch_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("court-scheduler-recovery-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn config() -> EngineConfig {
    let mut cfg = EngineConfig::with_resources(["CourtA", "CourtB"]);
    cfg.outreach.response_timeout_secs = DAY;
    cfg
}

fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap(),
    ))
}

#[tokio::test(start_paused = true)]
async fn test_bookings_and_events_survive_restart() {
    let dir = scratch_dir();
    let coaches = vec![coach("C1", 5.0, Channel::Email)];
    let event_id;
    let adhoc;
    {
        let store = Arc::new(JsonlStore::open(&dir).unwrap());
        let h = harness_with_clock(config(), store, coaches.clone(), clock());
        adhoc = h
            .engine
            .book("CourtA", window(date(2025, 3, 1), 9, 0, 60))
            .unwrap();
        let (event, report) = h
            .engine
            .create_planning_event(PlanningEventDraft {
                name: "League night".into(),
                base_date: date(2025, 3, 3),
                start_time: time(19, 0),
                end_time: time(21, 0),
                resources: vec!["CourtA".into(), "CourtB".into()],
                recurrence: None,
                fee_cents: Some(2_000),
                budget_cents: None,
                coach_request: None,
            })
            .unwrap();
        assert_eq!(report.created.len(), 2);
        event_id = event.id;
    }

    let store = Arc::new(JsonlStore::open(&dir).unwrap());
    let h = harness_with_clock(config(), store, coaches, clock());
    let recovered = h.engine.recover().unwrap();
    assert_eq!(recovered.events, 1);
    assert_eq!(recovered.bookings, 3);
    assert!(recovered.skipped.is_empty());

    assert!(h.engine.planning_event(&event_id).is_some());
    assert_eq!(h.engine.ledger().bookings_for_event(&event_id).len(), 2);
    assert!(matches!(
        h.engine
            .book("CourtA", window(date(2025, 3, 1), 9, 30, 30)),
        Err(SchedulingError::Conflict { conflicting, .. }) if conflicting == vec![adhoc.id]
    ));

    // Sync after restart sees the persisted bookings as existing.
    let draft = PlanningEventDraft {
        name: "League night".into(),
        base_date: date(2025, 3, 3),
        start_time: time(19, 0),
        end_time: time(21, 0),
        resources: vec!["CourtA".into(), "CourtB".into()],
        recurrence: None,
        fee_cents: Some(2_000),
        budget_cents: None,
        coach_request: None,
    };
    let (_, report) = h.engine.update_planning_event(&event_id, draft).unwrap();
    assert!(report.is_noop());

    std::fs::remove_dir_all(dir).ok();
}

#[tokio::test(start_paused = true)]
async fn test_overdue_outreach_timer_fires_on_recovery() {
    let store = Arc::new(InMemoryStore::new());
    let clock = clock();
    let coaches = vec![
        coach("C1", 5.0, Channel::Email),
        coach("C2", 4.0, Channel::Email),
    ];
    let booking_id = {
        let h = harness_with_clock(config(), store.clone(), coaches.clone(), Arc::clone(&clock));
        let b = h
            .engine
            .book("CourtA", window(date(2025, 3, 1), 9, 0, 60))
            .unwrap();
        h.engine
            .request_coach(
                b.id,
                &CoachRequest {
                    candidates: vec!["C1".into(), "C2".into()],
                    specialties: Vec::new(),
                },
            )
            .unwrap();
        settle().await;
        assert_eq!(h.notifier.recipients(), vec!["C1"]);
        b.id
    };

    // Down for 25 hours: C1's deadline passed while nothing was running.
    clock.advance(ChronoDuration::hours(25));
    let h = harness_with_clock(config(), store, coaches, Arc::clone(&clock));
    let recovered = h.engine.recover().unwrap();
    assert_eq!(recovered.outreach_restored, 1);
    assert_eq!(recovered.timers_fired, 1);
    assert_eq!(recovered.timers_rearmed, 1);
    settle().await;

    let record = h.engine.outreach(booking_id).unwrap();
    assert_eq!(record.attempts[0].state, AttemptState::TimedOut);
    assert_eq!(record.attempts[1].coach_id, "C2");
    assert_eq!(record.status, OutreachStatus::Active);
    assert_eq!(h.notifier.recipients(), vec!["C2"]);
}

#[tokio::test(start_paused = true)]
async fn test_pending_outreach_timer_is_rearmed_with_remaining_time() {
    let store = Arc::new(InMemoryStore::new());
    let clock = clock();
    let coaches = vec![coach("C1", 5.0, Channel::Email)];
    let booking_id = {
        let h = harness_with_clock(config(), store.clone(), coaches.clone(), Arc::clone(&clock));
        let b = h
            .engine
            .book("CourtB", window(date(2025, 3, 1), 9, 0, 60))
            .unwrap();
        h.engine
            .request_coach(
                b.id,
                &CoachRequest {
                    candidates: vec!["C1".into()],
                    specialties: Vec::new(),
                },
            )
            .unwrap();
        b.id
    };

    clock.advance(ChronoDuration::hours(20));
    let h = harness_with_clock(config(), store, coaches, Arc::clone(&clock));
    let recovered = h.engine.recover().unwrap();
    assert_eq!(recovered.timers_fired, 0);
    assert_eq!(recovered.timers_rearmed, 2);
    assert!(h.notifier.recipients().is_empty(), "messages are not resent");

    tokio::time::sleep(std::time::Duration::from_secs(4 * 60 * 60 - 1)).await;
    settle().await;
    assert!(h.operators.is_empty());

    tokio::time::sleep(std::time::Duration::from_secs(2)).await;
    settle().await;
    assert_eq!(h.operators.len(), 1);
    assert_eq!(
        h.engine.outreach(booking_id).unwrap().status,
        OutreachStatus::Escalated
    );
}

#[tokio::test(start_paused = true)]
async fn test_overlapping_persisted_rows_are_skipped() {
    let store = Arc::new(InMemoryStore::new());
    let slot = window(date(2025, 3, 1), 9, 0, 60);
    let row = |resource: &str| Booking {
        id: uuid::Uuid::new_v4(),
        resource: resource.into(),
        window: slot,
        owner_event_id: None,
        kind: BookingKind::AdHoc,
        assigned_coach: None,
    };
    store.put_booking(&row("CourtA")).unwrap();
    store.put_booking(&row("CourtA")).unwrap();
    store.put_booking(&row("CourtZ")).unwrap();

    let h = harness_with_clock(config(), store, Vec::new(), clock());
    let recovered = h.engine.recover().unwrap();
    assert_eq!(recovered.bookings, 1);
    assert_eq!(recovered.skipped.len(), 2);
    assert_eq!(h.engine.ledger().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_elapsed_escalation_window_escalates_without_contacting_next_coach() {
    let store = Arc::new(InMemoryStore::new());
    let clock = clock();
    let coaches = vec![
        coach("C1", 5.0, Channel::Email),
        coach("C2", 4.0, Channel::Email),
    ];
    let mut cfg = config();
    cfg.outreach.escalation_window_secs = Some(2 * DAY);
    let booking_id = {
        let h = harness_with_clock(cfg.clone(), store.clone(), coaches.clone(), Arc::clone(&clock));
        let b = h
            .engine
            .book("CourtA", window(date(2025, 3, 1), 9, 0, 60))
            .unwrap();
        h.engine
            .request_coach(
                b.id,
                &CoachRequest {
                    candidates: vec!["C1".into(), "C2".into()],
                    specialties: Vec::new(),
                },
            )
            .unwrap();
        settle().await;
        b.id
    };

    // Down for three days: both C1's deadline and the window are behind us.
    clock.advance(ChronoDuration::days(3));
    let h = harness_with_clock(cfg, store, coaches, Arc::clone(&clock));
    let recovered = h.engine.recover().unwrap();
    assert_eq!(recovered.timers_fired, 1);
    assert_eq!(recovered.timers_rearmed, 0);
    settle().await;

    assert!(h.notifier.recipients().is_empty());
    let pending = h.operators.pending();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].reason, EscalationReason::WindowElapsed);

    let record = h.engine.outreach(booking_id).unwrap();
    assert_eq!(record.status, OutreachStatus::Escalated);
    assert_eq!(record.attempts.len(), 1);
    assert_eq!(record.attempts[0].coach_id, "C1");
    assert_eq!(record.attempts[0].state, AttemptState::Escalated);
}
