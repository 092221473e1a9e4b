//! Outreach coordinator: timers, responses and escalation per booking.
//!
//! All transitions of a booking's outreach happen under one
//! `parking_lot::Mutex`, so a timer firing and a response arriving for the
//! same attempt resolve to exactly one terminal state. Work that leaves the
//! process (notifier sends, operator hand-off) is collected while the lock is
//! held and dispatched after it is released; notifier calls run on the
//! spawner and never block the caller.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use super::{
    rank, AttemptState, CoachResponse, EscalationNotice, EscalationReason, IgnoredReason,
    LateResponse, OutreachAttempt, OutreachMessage, OutreachPolicy, OutreachRecord,
    OutreachStatus, ResponseOutcome,
};
use crate::core::audit::{build_audit_event, record_to, SharedAudit};
use crate::core::{
    Booking, ClockSource, CoachRoster, EscalationSink, Notifier, SchedulingError, Spawn,
    StateStore, TimerHandle, TimerScheduler,
};
use crate::util::serde::{BookingId, Channel, CoachId};

/// Collaborators the coordinator talks to.
pub struct OutreachDeps {
    /// Coach roster.
    pub roster: Arc<dyn CoachRoster>,
    /// Outbound transport.
    pub notifier: Arc<dyn Notifier>,
    /// Operator queue for escalations.
    pub operators: Arc<dyn EscalationSink>,
    /// Timer primitive.
    pub timers: Arc<dyn TimerScheduler>,
    /// Background executor for notifier calls.
    pub spawner: Arc<dyn Spawn>,
    /// Wall clock.
    pub clock: Arc<dyn ClockSource>,
    /// Durable outreach records.
    pub store: Arc<dyn StateStore>,
    /// Optional audit trail.
    pub audit: Option<SharedAudit>,
}

/// Counts from [`OutreachCoordinator::recover`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    /// Records loaded from the store.
    pub restored: usize,
    /// Timers re-armed with their remaining time.
    pub rearmed: usize,
    /// Timers whose deadline had passed and fired immediately.
    pub fired_overdue: usize,
}

struct Case {
    record: OutreachRecord,
    response_timer: Option<TimerHandle>,
    escalation_timer: Option<TimerHandle>,
}

impl Case {
    const fn new(record: OutreachRecord) -> Self {
        Self {
            record,
            response_timer: None,
            escalation_timer: None,
        }
    }

    fn cancel_response_timer(&mut self) {
        if let Some(timer) = self.response_timer.take() {
            timer.cancel();
        }
    }

    fn cancel_timers(&mut self) {
        self.cancel_response_timer();
        if let Some(timer) = self.escalation_timer.take() {
            timer.cancel();
        }
    }
}

enum Effect {
    Send {
        message: OutreachMessage,
        channel: Channel,
    },
    Escalate(EscalationNotice),
}

/// Drives outreach for every booking that needs a coach.
pub struct OutreachCoordinator {
    me: Weak<Self>,
    cases: Mutex<HashMap<BookingId, Case>>,
    policy: OutreachPolicy,
    deps: OutreachDeps,
}

fn to_chrono(duration: Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or_else(|_| chrono::Duration::days(36_500))
}

fn remaining(until: DateTime<Utc>, now: DateTime<Utc>) -> Option<Duration> {
    (until - now).to_std().ok().filter(|d| !d.is_zero())
}

impl OutreachCoordinator {
    /// Create a coordinator. Timer callbacks hold a weak reference, so
    /// dropping the last `Arc` disarms them in effect.
    pub fn new(policy: OutreachPolicy, deps: OutreachDeps) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            cases: Mutex::new(HashMap::new()),
            policy,
            deps,
        })
    }

    /// Timing and ranking policy in use.
    pub const fn policy(&self) -> &OutreachPolicy {
        &self.policy
    }

    /// Start outreach for `booking` over `candidates`.
    ///
    /// Candidates missing from the roster or without a contact channel are
    /// skipped. With nobody left to contact the booking escalates at once.
    /// Fails if outreach for the booking is already active or a coach has
    /// already accepted it.
    pub fn initiate(
        &self,
        booking: &Booking,
        candidates: &[CoachId],
        specialties: &[String],
    ) -> Result<OutreachRecord, SchedulingError> {
        if let Some(coach) = &booking.assigned_coach {
            return Err(SchedulingError::Validation(format!(
                "booking {} already has coach {coach}",
                booking.id
            )));
        }
        let now = self.deps.clock.now();
        let mut unique = HashSet::new();
        let roster_entries = candidates
            .iter()
            .filter(|id| unique.insert(id.as_str()))
            .filter_map(|id| {
                let found = self.deps.roster.candidate(id);
                if found.is_none() {
                    tracing::warn!(booking = %booking.id, coach = %id, "candidate not in roster; skipped");
                }
                found
            })
            .collect();
        let ranked = rank(roster_entries, specialties, &self.policy.weights);

        let mut cases = self.cases.lock();
        if let Some(existing) = cases.get_mut(&booking.id) {
            match &existing.record.status {
                OutreachStatus::Active => {
                    return Err(SchedulingError::Validation(format!(
                        "outreach already active for booking {}",
                        booking.id
                    )));
                }
                OutreachStatus::Assigned { coach_id } => {
                    return Err(SchedulingError::Validation(format!(
                        "booking {} already has coach {coach_id}",
                        booking.id
                    )));
                }
                OutreachStatus::Escalated => existing.cancel_timers(),
            }
        }

        let mut case = Case::new(OutreachRecord {
            booking_id: booking.id,
            subject: booking.describe(),
            ranked,
            attempts: Vec::new(),
            status: OutreachStatus::Active,
            first_attempt_at: None,
            escalate_by: self.policy.escalation_window.map(|w| now + to_chrono(w)),
            late_responses: Vec::new(),
        });
        if let Some(window) = self.policy.escalation_window {
            case.escalation_timer = Some(self.arm_escalation_timer(booking.id, window));
        }
        let effects = self.advance(&mut case, now);
        if let Err(err) = self.deps.store.put_outreach(&case.record) {
            case.cancel_timers();
            return Err(err);
        }
        let snapshot = case.record.clone();
        cases.insert(booking.id, case);
        drop(cases);

        tracing::info!(
            booking = %booking.id,
            candidates = snapshot.ranked.len(),
            "outreach started"
        );
        self.dispatch(effects);
        Ok(snapshot)
    }

    /// Apply a coach's answer.
    ///
    /// Only an open attempt transitions. The first accept assigns the coach;
    /// any later response is recorded on the case and ignored.
    pub fn on_response(
        &self,
        booking_id: BookingId,
        coach_id: &str,
        response: CoachResponse,
    ) -> Result<ResponseOutcome, SchedulingError> {
        let now = self.deps.clock.now();
        let mut cases = self.cases.lock();
        let case = cases.get_mut(&booking_id).ok_or_else(|| SchedulingError::NotFound {
            kind: "outreach",
            id: booking_id.to_string(),
        })?;

        let open = case
            .record
            .attempts
            .iter()
            .position(|a| a.coach_id == coach_id && a.state.is_open());
        let status = case.record.status.clone();
        let (outcome, effects) = match (status, open) {
            (OutreachStatus::Active, Some(idx)) => {
                case.cancel_response_timer();
                let attempt = &mut case.record.attempts[idx];
                attempt.responded_at = Some(now);
                match response {
                    CoachResponse::Accept => {
                        attempt.state = AttemptState::Accepted;
                        case.record.status = OutreachStatus::Assigned {
                            coach_id: coach_id.to_string(),
                        };
                        case.cancel_timers();
                        tracing::info!(booking = %booking_id, coach = coach_id, "coach accepted");
                        self.audit(&case.record, coach_id, "accepted");
                        (ResponseOutcome::Applied(AttemptState::Accepted), Vec::new())
                    }
                    CoachResponse::Decline => {
                        attempt.state = AttemptState::Declined;
                        tracing::info!(booking = %booking_id, coach = coach_id, "coach declined");
                        self.audit(&case.record, coach_id, "declined");
                        let effects = self.advance(case, now);
                        (ResponseOutcome::Applied(AttemptState::Declined), effects)
                    }
                }
            }
            (status, _) => {
                let reason = match &status {
                    OutreachStatus::Assigned { .. } => IgnoredReason::AlreadyAssigned,
                    OutreachStatus::Escalated => IgnoredReason::Escalated,
                    OutreachStatus::Active if case.record.contacted(coach_id) => {
                        IgnoredReason::AttemptClosed
                    }
                    OutreachStatus::Active => IgnoredReason::NotContacted,
                };
                case.record.late_responses.push(LateResponse {
                    coach_id: coach_id.to_string(),
                    response,
                    received_at: now,
                    reason,
                });
                tracing::info!(booking = %booking_id, coach = coach_id, ?response, ?reason, "late response recorded");
                (ResponseOutcome::Ignored(reason), Vec::new())
            }
        };
        self.persist(&case.record);
        drop(cases);

        self.dispatch(effects);
        Ok(outcome)
    }

    /// Close attempt `attempt_number` to `coach_id` as timed out and move on.
    ///
    /// Returns `false` when that attempt already closed, which is how a timer
    /// racing a response or a cancellation becomes a no-op.
    pub fn on_timeout(
        &self,
        booking_id: BookingId,
        coach_id: &str,
        attempt_number: u32,
    ) -> bool {
        let now = self.deps.clock.now();
        let mut cases = self.cases.lock();
        let Some(case) = cases.get_mut(&booking_id) else {
            tracing::debug!(booking = %booking_id, "timeout for unknown outreach ignored");
            return false;
        };
        if case.record.status != OutreachStatus::Active {
            return false;
        }
        let Some(attempt) = case.record.attempts.iter_mut().find(|a| {
            a.coach_id == coach_id && a.attempt_number == attempt_number && a.state.is_open()
        }) else {
            tracing::debug!(booking = %booking_id, coach = coach_id, attempt = attempt_number, "stale timeout ignored");
            return false;
        };
        attempt.state = AttemptState::TimedOut;
        case.response_timer = None;
        tracing::info!(booking = %booking_id, coach = coach_id, "outreach attempt timed out");
        self.audit(&case.record, "timer", "timed_out");

        let effects = self.advance(case, now);
        self.persist(&case.record);
        drop(cases);
        self.dispatch(effects);
        true
    }

    /// Notifier failure callback: treated like a decline, logged apart from one.
    pub fn on_delivery_failure(
        &self,
        booking_id: BookingId,
        coach_id: &str,
        attempt_number: u32,
        reason: &str,
    ) -> bool {
        let now = self.deps.clock.now();
        let mut cases = self.cases.lock();
        let Some(case) = cases.get_mut(&booking_id) else {
            return false;
        };
        if case.record.status != OutreachStatus::Active {
            return false;
        }
        let Some(attempt) = case.record.attempts.iter_mut().find(|a| {
            a.coach_id == coach_id && a.attempt_number == attempt_number && a.state.is_open()
        }) else {
            return false;
        };
        attempt.state = AttemptState::DeliveryFailed;
        attempt.responded_at = Some(now);
        let channel = attempt.channel;
        case.cancel_response_timer();
        tracing::warn!(
            booking = %booking_id,
            coach = coach_id,
            %channel,
            reason,
            "outreach delivery failed; advancing to next candidate"
        );
        self.audit(&case.record, coach_id, "delivery_failed");

        let effects = self.advance(case, now);
        self.persist(&case.record);
        drop(cases);
        self.dispatch(effects);
        true
    }

    /// Hand the booking to operators now.
    ///
    /// Returns `Ok(false)` if it was no longer active (assigned or already
    /// escalated); the operator queue sees each booking at most once.
    pub fn escalate(&self, booking_id: BookingId) -> Result<bool, SchedulingError> {
        self.escalate_with(booking_id, EscalationReason::Manual)
            .ok_or_else(|| SchedulingError::NotFound {
                kind: "outreach",
                id: booking_id.to_string(),
            })
    }

    fn on_escalation_window(&self, booking_id: BookingId) {
        self.escalate_with(booking_id, EscalationReason::WindowElapsed);
    }

    fn escalate_with(&self, booking_id: BookingId, reason: EscalationReason) -> Option<bool> {
        let now = self.deps.clock.now();
        let mut cases = self.cases.lock();
        let case = cases.get_mut(&booking_id)?;
        if reason == EscalationReason::WindowElapsed {
            case.escalation_timer = None;
        }
        let effect = self.escalate_case(case, reason, now);
        let escalated = effect.is_some();
        if escalated {
            self.persist(&case.record);
        }
        drop(cases);
        self.dispatch(effect.into_iter().collect());
        Some(escalated)
    }

    /// Stop outreach for a booking that no longer exists.
    ///
    /// Cancels every pending timer and forgets the case.
    pub fn cancel(&self, booking_id: BookingId) -> bool {
        let removed = self.cases.lock().remove(&booking_id);
        let Some(mut case) = removed else {
            return false;
        };
        case.cancel_timers();
        if let Err(err) = self.deps.store.delete_outreach(booking_id) {
            tracing::error!(booking = %booking_id, "failed to delete outreach record: {err}");
        }
        tracing::info!(booking = %booking_id, "outreach cancelled");
        true
    }

    /// Snapshot of a booking's outreach.
    pub fn record(&self, booking_id: BookingId) -> Option<OutreachRecord> {
        self.cases.lock().get(&booking_id).map(|c| c.record.clone())
    }

    /// Reload persisted outreach and re-arm its timers.
    ///
    /// Deadlines still ahead are re-armed with the time left; deadlines that
    /// passed while the process was down fire immediately. A case whose
    /// escalation window passed escalates without contacting anyone else.
    /// Messages are not sent again.
    pub fn recover(&self) -> Result<RecoveryReport, SchedulingError> {
        let records = self.deps.store.load_outreach()?;
        let now = self.deps.clock.now();
        let mut report = RecoveryReport {
            restored: records.len(),
            ..RecoveryReport::default()
        };
        let mut overdue_attempts = Vec::new();
        let mut overdue_windows = Vec::new();
        let mut effects = Vec::new();

        let mut cases = self.cases.lock();
        for record in records {
            let booking_id = record.booking_id;
            let mut case = Case::new(record);
            if case.record.status == OutreachStatus::Active {
                let window_left = case.record.escalate_by.map(|by| remaining(by, now));
                if window_left == Some(None) {
                    overdue_windows.push(booking_id);
                } else {
                    if let Some(Some(left)) = window_left {
                        case.escalation_timer = Some(self.arm_escalation_timer(booking_id, left));
                        report.rearmed += 1;
                    }
                    if let Some(open) = case.record.open_attempt() {
                        let coach_id = open.coach_id.clone();
                        let attempt_number = open.attempt_number;
                        match remaining(open.deadline, now) {
                            Some(left) => {
                                case.response_timer = Some(self.arm_response_timer(
                                    booking_id,
                                    coach_id,
                                    attempt_number,
                                    left,
                                ));
                                report.rearmed += 1;
                            }
                            None => overdue_attempts.push((booking_id, coach_id, attempt_number)),
                        }
                    } else {
                        effects.extend(self.advance(&mut case, now));
                    }
                }
            }
            if let Some(mut previous) = cases.insert(booking_id, case) {
                previous.cancel_timers();
            }
        }
        drop(cases);
        self.dispatch(effects);

        for booking_id in overdue_windows {
            if self.escalate_with(booking_id, EscalationReason::WindowElapsed) == Some(true) {
                report.fired_overdue += 1;
            }
        }
        for (booking_id, coach_id, attempt_number) in overdue_attempts {
            if self.on_timeout(booking_id, &coach_id, attempt_number) {
                report.fired_overdue += 1;
            }
        }
        tracing::info!(
            restored = report.restored,
            rearmed = report.rearmed,
            fired_overdue = report.fired_overdue,
            "outreach recovered"
        );
        Ok(report)
    }

    /// Contact the next candidate, or escalate when none is left.
    fn advance(&self, case: &mut Case, now: DateTime<Utc>) -> Vec<Effect> {
        if case.record.status != OutreachStatus::Active || case.record.open_attempt().is_some() {
            return Vec::new();
        }
        let Some(next) = case.record.next_candidate().cloned() else {
            return self
                .escalate_case(case, EscalationReason::Exhausted, now)
                .into_iter()
                .collect();
        };

        let booking_id = case.record.booking_id;
        let attempt_number = u32::try_from(case.record.attempts.len()).unwrap_or(u32::MAX - 1) + 1;
        let deadline = now + to_chrono(self.policy.response_timeout);
        case.record.attempts.push(OutreachAttempt {
            booking_id,
            coach_id: next.coach_id.clone(),
            attempt_number,
            channel: next.channel,
            sent_at: now,
            deadline,
            state: AttemptState::Sent,
            responded_at: None,
        });
        case.record.first_attempt_at.get_or_insert(now);
        case.response_timer = Some(self.arm_response_timer(
            booking_id,
            next.coach_id.clone(),
            attempt_number,
            self.policy.response_timeout,
        ));
        tracing::info!(
            booking = %booking_id,
            coach = %next.coach_id,
            channel = %next.channel,
            attempt = attempt_number,
            "outreach attempt sent"
        );
        self.audit(&case.record, &next.coach_id, "outreach_sent");

        vec![Effect::Send {
            message: OutreachMessage {
                booking_id,
                coach_id: next.coach_id,
                attempt_number,
                subject: case.record.subject.clone(),
                respond_by: deadline,
            },
            channel: next.channel,
        }]
    }

    fn escalate_case(
        &self,
        case: &mut Case,
        reason: EscalationReason,
        now: DateTime<Utc>,
    ) -> Option<Effect> {
        if case.record.status != OutreachStatus::Active {
            return None;
        }
        case.record.status = OutreachStatus::Escalated;
        if let Some(last) = case.record.attempts.last_mut() {
            if matches!(last.state, AttemptState::Sent | AttemptState::TimedOut) {
                last.state = AttemptState::Escalated;
            }
        }
        case.cancel_timers();
        tracing::warn!(
            booking = %case.record.booking_id,
            ?reason,
            attempts = case.record.attempts.len(),
            "outreach escalated to operators"
        );
        self.audit(&case.record, "coordinator", "escalated");
        Some(Effect::Escalate(EscalationNotice {
            booking_id: case.record.booking_id,
            subject: case.record.subject.clone(),
            reason,
            attempts: case.record.attempts.len(),
            escalated_at: now,
        }))
    }

    fn arm_response_timer(
        &self,
        booking_id: BookingId,
        coach_id: CoachId,
        attempt_number: u32,
        delay: Duration,
    ) -> TimerHandle {
        let me = self.me.clone();
        self.deps.timers.after(
            delay,
            Box::new(move || {
                if let Some(coordinator) = me.upgrade() {
                    coordinator.on_timeout(booking_id, &coach_id, attempt_number);
                }
            }),
        )
    }

    fn arm_escalation_timer(&self, booking_id: BookingId, delay: Duration) -> TimerHandle {
        let me = self.me.clone();
        self.deps.timers.after(
            delay,
            Box::new(move || {
                if let Some(coordinator) = me.upgrade() {
                    coordinator.on_escalation_window(booking_id);
                }
            }),
        )
    }

    fn dispatch(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Send { message, channel } => {
                    let notifier = Arc::clone(&self.deps.notifier);
                    let me = self.me.clone();
                    self.deps.spawner.spawn(Box::pin(async move {
                        match notifier.send(&message.coach_id, channel, &message).await {
                            Ok(handle) => tracing::debug!(
                                booking = %message.booking_id,
                                coach = %message.coach_id,
                                delivery = %handle.id,
                                "outreach handed to transport"
                            ),
                            Err(err) => {
                                if let Some(coordinator) = me.upgrade() {
                                    coordinator.on_delivery_failure(
                                        message.booking_id,
                                        &message.coach_id,
                                        message.attempt_number,
                                        &err.to_string(),
                                    );
                                }
                            }
                        }
                    }));
                }
                Effect::Escalate(notice) => {
                    let booking_id = notice.booking_id;
                    if let Err(err) = self.deps.operators.deliver(notice) {
                        tracing::error!(booking = %booking_id, "failed to enqueue escalation: {err}");
                    }
                }
            }
        }
    }

    fn persist(&self, record: &OutreachRecord) {
        if let Err(err) = self.deps.store.put_outreach(record) {
            tracing::error!(booking = %record.booking_id, "failed to persist outreach record: {err}");
        }
    }

    fn audit(&self, record: &OutreachRecord, actor: &str, action: &str) {
        record_to(self.deps.audit.as_ref(), || {
            build_audit_event(
                record.booking_id.to_string(),
                record.subject.clone(),
                actor,
                action,
                None,
            )
        });
    }
}
