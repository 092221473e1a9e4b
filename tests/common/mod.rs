//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use court_scheduler::builders::EngineBuilder;
use court_scheduler::config::EngineConfig;
use court_scheduler::core::{
    shared_audit, AuditLog, CoachCandidate, SchedulingEngine, StateStore, TimeWindow,
};
use court_scheduler::infra::{InMemoryOperatorQueue, InMemoryRoster, RecordingNotifier};
use court_scheduler::util::{Channel, ManualClock};

pub const HOUR: u64 = 60 * 60;
pub const DAY: u64 = 24 * HOUR;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

pub fn window(d: NaiveDate, h: u32, m: u32, minutes: u32) -> TimeWindow {
    TimeWindow::new(d, time(h, m), minutes).unwrap()
}

pub fn coach(id: &str, rating: f64, channel: Channel) -> CoachCandidate {
    CoachCandidate {
        id: id.into(),
        name: id.to_uppercase(),
        contact_channels: vec![channel],
        specialties: Vec::new(),
        past_rating_average: rating,
        active: true,
    }
}

/// Engine plus handles on its in-memory collaborators.
pub struct Harness {
    pub engine: SchedulingEngine,
    pub notifier: Arc<RecordingNotifier>,
    pub operators: Arc<InMemoryOperatorQueue>,
    pub roster: Arc<InMemoryRoster>,
    pub clock: Arc<ManualClock>,
    pub audit: AuditLog,
}

/// Build an engine on the current tokio runtime.
pub fn harness(
    config: EngineConfig,
    store: Arc<dyn StateStore>,
    coaches: Vec<CoachCandidate>,
) -> Harness {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap(),
    ));
    harness_with_clock(config, store, coaches, clock)
}

pub fn harness_with_clock(
    config: EngineConfig,
    store: Arc<dyn StateStore>,
    coaches: Vec<CoachCandidate>,
    clock: Arc<ManualClock>,
) -> Harness {
    court_scheduler::util::init_tracing();
    let notifier = Arc::new(RecordingNotifier::new());
    let operators = Arc::new(InMemoryOperatorQueue::new());
    let roster = Arc::new(InMemoryRoster::new(coaches));
    let audit = AuditLog::new(1_024);
    let engine = EngineBuilder::new(config)
        .store(store)
        .roster(roster.clone())
        .notifier(notifier.clone())
        .operators(operators.clone())
        .clock(clock.clone())
        .audit(shared_audit(audit.clone()))
        .build()
        .unwrap();
    Harness {
        engine,
        notifier,
        operators,
        roster,
        clock,
        audit,
    }
}

/// Let spawned notifier sends and their failure callbacks run.
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}
