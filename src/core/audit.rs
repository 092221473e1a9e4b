//! Audit trail of booking and outreach actions.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::util::clock::now_ms;

/// Audit event structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    /// Event identifier.
    pub event_id: String,
    /// Booking the action applied to.
    pub subject_id: String,
    /// Resource involved.
    pub resource: String,
    /// Who or what acted (ledger, coach id, timer, operator).
    pub actor: String,
    /// Action taken (book, reschedule, cancel, assign, outreach_sent, accepted, ...).
    pub action: String,
    /// Timestamp milliseconds.
    pub created_at_ms: u128,
    /// Additional context.
    pub payload: Option<String>,
}

/// Audit sink abstraction.
pub trait AuditSink: Send {
    /// Record an audit event.
    fn record(&mut self, event: AuditEvent);
}

/// Audit sink shared between the ledger and the outreach coordinator.
pub type SharedAudit = Arc<Mutex<Box<dyn AuditSink>>>;

/// Wrap a sink for sharing.
pub fn shared_audit(sink: impl AuditSink + 'static) -> SharedAudit {
    Arc::new(Mutex::new(Box::new(sink)))
}

/// In-memory audit sink for testing and dev.
pub struct InMemoryAuditSink {
    events: VecDeque<AuditEvent>,
    max_events: usize,
}

impl InMemoryAuditSink {
    /// Create a new in-memory sink with a bounded buffer.
    pub fn new(max_events: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(max_events),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.iter().cloned().collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&mut self, event: AuditEvent) {
        if self.max_events == 0 {
            return;
        }
        if self.events.len() >= self.max_events {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }
}

/// In-memory sink readable from outside after being handed to the engine.
#[derive(Clone)]
pub struct AuditLog {
    inner: Arc<Mutex<InMemoryAuditSink>>,
}

impl AuditLog {
    /// Create a log keeping at most `max_events` entries.
    pub fn new(max_events: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(InMemoryAuditSink::new(max_events))),
        }
    }

    /// Snapshot of recorded events.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.inner.lock().events()
    }

    /// Actions recorded for one subject, oldest first.
    pub fn actions_for(&self, subject_id: &str) -> Vec<String> {
        self.inner
            .lock()
            .events()
            .into_iter()
            .filter(|e| e.subject_id == subject_id)
            .map(|e| e.action)
            .collect()
    }
}

impl AuditSink for AuditLog {
    fn record(&mut self, event: AuditEvent) {
        self.inner.lock().record(event);
    }
}

/// Helper to build an audit event from context.
pub fn build_audit_event(
    subject_id: impl Into<String>,
    resource: impl Into<String>,
    actor: impl Into<String>,
    action: impl Into<String>,
    payload: Option<String>,
) -> AuditEvent {
    AuditEvent {
        event_id: uuid::Uuid::new_v4().to_string(),
        subject_id: subject_id.into(),
        resource: resource.into(),
        actor: actor.into(),
        action: action.into(),
        created_at_ms: now_ms(),
        payload,
    }
}

/// Record `event` on an optional shared sink.
pub fn record_to(audit: Option<&SharedAudit>, event: impl FnOnce() -> AuditEvent) {
    if let Some(sink) = audit {
        sink.lock().record(event());
    }
}
