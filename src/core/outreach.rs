//! Coach outreach: records, attempts and the coordinator state machine.
//!
//! Each booking that needs a coach gets one [`OutreachRecord`]. Candidates
//! are ranked once when outreach starts; the coordinator then contacts them
//! one at a time, each attempt moving `Sent → Accepted | Declined | TimedOut
//! | DeliveryFailed`. The first accept assigns the coach. When the ranked list
//! runs out, or the escalation window closes, the booking is escalated to the
//! operator queue exactly once.

pub mod coordinator;
pub mod matching;

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::util::serde::{BookingId, Channel, CoachId};

pub use coordinator::{OutreachCoordinator, OutreachDeps, RecoveryReport};
pub use matching::{rank, score, MatchWeights};

/// A coach from the external roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoachCandidate {
    /// Roster id.
    pub id: CoachId,
    /// Display name.
    pub name: String,
    /// Reachable channels, most preferred first.
    pub contact_channels: Vec<Channel>,
    /// Coaching specialties.
    #[serde(default)]
    pub specialties: Vec<String>,
    /// Average of past session ratings.
    #[serde(default)]
    pub past_rating_average: f64,
    /// Whether the coach currently takes sessions.
    #[serde(default = "default_active")]
    pub active: bool,
}

const fn default_active() -> bool {
    true
}

impl CoachCandidate {
    /// Channel to try first, if any.
    pub fn preferred_channel(&self) -> Option<Channel> {
        self.contact_channels.first().copied()
    }
}

/// A coach's answer to an outreach attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoachResponse {
    /// The coach takes the session.
    Accept,
    /// The coach turns the session down.
    Decline,
}

/// Lifecycle of a single attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptState {
    /// Message sent; waiting for an answer until the deadline.
    Sent,
    /// The coach accepted.
    Accepted,
    /// The coach declined.
    Declined,
    /// No answer before the deadline.
    TimedOut,
    /// The notifier could not deliver the message.
    DeliveryFailed,
    /// Handed to operators while this attempt was the last one.
    Escalated,
}

impl AttemptState {
    /// Whether the attempt still waits for an answer.
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Sent)
    }
}

/// One contact try to one coach for one booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutreachAttempt {
    /// Booking being staffed.
    pub booking_id: BookingId,
    /// Coach contacted.
    pub coach_id: CoachId,
    /// 1-based position in the booking's attempt sequence.
    pub attempt_number: u32,
    /// Channel used.
    pub channel: Channel,
    /// When the message was handed to the notifier.
    pub sent_at: DateTime<Utc>,
    /// When the attempt times out; the durable form of its timer.
    pub deadline: DateTime<Utc>,
    /// Current state.
    pub state: AttemptState,
    /// When an answer (or failure) closed the attempt.
    pub responded_at: Option<DateTime<Utc>>,
}

/// A candidate after ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCandidate {
    /// Roster id.
    pub coach_id: CoachId,
    /// Match score; higher is better.
    pub score: f64,
    /// Channel the coach will be contacted on.
    pub channel: Channel,
}

/// Overall state of a booking's outreach.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutreachStatus {
    /// Still contacting candidates.
    Active,
    /// A coach accepted.
    Assigned {
        /// Coach that accepted first.
        coach_id: CoachId,
    },
    /// Handed to operators.
    Escalated,
}

/// Why a response did not change state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoredReason {
    /// Another (or the same) coach already accepted.
    AlreadyAssigned,
    /// The coach's attempt had already closed.
    AttemptClosed,
    /// The coach was never contacted for this booking.
    NotContacted,
    /// The booking was escalated.
    Escalated,
}

/// A response recorded without being applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LateResponse {
    /// Responding coach.
    pub coach_id: CoachId,
    /// What they answered.
    pub response: CoachResponse,
    /// When it arrived.
    pub received_at: DateTime<Utc>,
    /// Why it was not applied.
    pub reason: IgnoredReason,
}

/// Effect of handling a coach response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum ResponseOutcome {
    /// The response closed the open attempt in this state.
    Applied(AttemptState),
    /// The response was recorded but changed nothing.
    Ignored(IgnoredReason),
}

/// Why a booking was escalated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationReason {
    /// Every ranked candidate was tried without an accept.
    Exhausted,
    /// The escalation window closed first.
    WindowElapsed,
    /// An operator asked for it.
    Manual,
}

/// A booking handed to the operator queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationNotice {
    /// Booking without a coach.
    pub booking_id: BookingId,
    /// What the booking is.
    pub subject: String,
    /// Why it was escalated.
    pub reason: EscalationReason,
    /// Attempts made before escalation.
    pub attempts: usize,
    /// When it was escalated.
    pub escalated_at: DateTime<Utc>,
}

/// Message handed to the notifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutreachMessage {
    /// Booking being staffed.
    pub booking_id: BookingId,
    /// Recipient.
    pub coach_id: CoachId,
    /// Attempt the message belongs to.
    pub attempt_number: u32,
    /// What the booking is.
    pub subject: String,
    /// Answer deadline.
    pub respond_by: DateTime<Utc>,
}

/// Receipt for a message accepted by a transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryHandle {
    /// Transport-side id.
    pub id: uuid::Uuid,
    /// Recipient.
    pub coach_id: CoachId,
    /// Channel used.
    pub channel: Channel,
}

/// Persistent outreach state of one booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutreachRecord {
    /// Booking being staffed.
    pub booking_id: BookingId,
    /// What the booking is.
    pub subject: String,
    /// Candidates in contact order.
    pub ranked: Vec<RankedCandidate>,
    /// Attempts made so far, oldest first.
    pub attempts: Vec<OutreachAttempt>,
    /// Overall state.
    pub status: OutreachStatus,
    /// When the first attempt was sent.
    pub first_attempt_at: Option<DateTime<Utc>>,
    /// When the escalation window closes.
    pub escalate_by: Option<DateTime<Utc>>,
    /// Responses recorded without effect.
    #[serde(default)]
    pub late_responses: Vec<LateResponse>,
}

impl OutreachRecord {
    /// The attempt still waiting for an answer.
    pub fn open_attempt(&self) -> Option<&OutreachAttempt> {
        self.attempts.iter().find(|a| a.state.is_open())
    }

    /// Whether `coach_id` has been contacted.
    pub fn contacted(&self, coach_id: &str) -> bool {
        self.attempts.iter().any(|a| a.coach_id == coach_id)
    }

    /// Highest-ranked candidate not contacted yet.
    pub fn next_candidate(&self) -> Option<&RankedCandidate> {
        self.ranked.iter().find(|c| !self.contacted(&c.coach_id))
    }

    /// Coach assigned by the first accept.
    pub fn assigned_coach(&self) -> Option<&str> {
        match &self.status {
            OutreachStatus::Assigned { coach_id } => Some(coach_id),
            _ => None,
        }
    }
}

/// Timing and ranking policy of the coordinator.
#[derive(Debug, Clone, PartialEq)]
pub struct OutreachPolicy {
    /// How long a coach has to answer.
    pub response_timeout: Duration,
    /// Escalate if nobody accepted this long after outreach started.
    pub escalation_window: Option<Duration>,
    /// Candidate scoring weights.
    pub weights: MatchWeights,
}

impl Default for OutreachPolicy {
    fn default() -> Self {
        Self {
            response_timeout: Duration::from_secs(24 * 60 * 60),
            escalation_window: Some(Duration::from_secs(7 * 24 * 60 * 60)),
            weights: MatchWeights::default(),
        }
    }
}
