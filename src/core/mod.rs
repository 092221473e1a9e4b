//! Core scheduling abstractions: windows, bookings, conflict detection,
//! recurrence, synchronization and coach outreach.

pub mod audit;
pub mod booking;
pub mod conflict;
pub mod engine;
pub mod error;
pub mod interval_store;
pub mod ledger;
pub mod outreach;
pub mod ports;
pub mod recurrence;
pub mod synchronizer;
pub mod window;

pub use audit::{
    build_audit_event, shared_audit, AuditEvent, AuditLog, AuditSink, InMemoryAuditSink,
    SharedAudit,
};
pub use booking::{Booking, BookingKind, CoachRequest, PlanningEvent, PlanningEventDraft};
pub use conflict::ConflictOutcome;
pub use engine::{EngineRecovery, ResponseResult, SchedulingEngine};
pub use error::{AppResult, SchedulingError};
pub use interval_store::IntervalStore;
pub use ledger::BookingLedger;
pub use outreach::{
    AttemptState, CoachCandidate, CoachResponse, DeliveryHandle, EscalationNotice,
    EscalationReason, IgnoredReason, LateResponse, MatchWeights, OutreachAttempt,
    OutreachCoordinator, OutreachDeps, OutreachMessage, OutreachPolicy, OutreachRecord,
    OutreachStatus, RankedCandidate, RecoveryReport, ResponseOutcome,
};
pub use ports::{
    BoxedTask, ClockSource, CoachRoster, EscalationSink, Notifier, ResourceRegistry, Spawn,
    StateStore, TimerCallback, TimerHandle, TimerScheduler,
};
pub use recurrence::{Frequency, RecurrenceExpander, RecurrenceRule};
pub use synchronizer::{RejectedPair, ScheduleSynchronizer, SyncReport};
pub use window::TimeWindow;
