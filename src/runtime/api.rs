//! API-facing request/response models.
//!
//! Each handler maps one endpoint onto the engine and turns a
//! [`SchedulingError`] into an [`ErrorBody`] carrying its status code.
//! Transport wiring (routing, JSON extraction) is left to the host service.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::core::{
    Booking, CoachResponse, PlanningEvent, PlanningEventDraft, RejectedPair, ResponseOutcome,
    SchedulingEngine, SchedulingError, SyncReport, TimeWindow,
};
use crate::util::serde::{BookingId, CoachId, ResourceId};

/// Body of `POST planning-event` and `PUT planning-event/:id`.
pub type PlanningEventRequest = PlanningEventDraft;

/// Planning event plus what its sync did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResponse {
    /// Stored planning event.
    pub event: PlanningEvent,
    /// Bookings created.
    pub created: Vec<Booking>,
    /// Bookings removed as stale.
    pub removed: Vec<Booking>,
    /// Desired pairs that conflicted.
    #[serde(rename = "rejectedPairs")]
    pub rejected_pairs: Vec<RejectedPair>,
}

impl SyncResponse {
    fn from_parts(event: PlanningEvent, report: SyncReport) -> Self {
        Self {
            event,
            created: report.created,
            removed: report.removed,
            rejected_pairs: report.rejected,
        }
    }
}

/// Result of `DELETE planning-event/:id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResponse {
    /// Bookings released with the event.
    pub removed: Vec<Booking>,
}

/// Body of `POST booking/:id/reschedule`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RescheduleRequest {
    /// Target court; the current one when omitted.
    #[serde(default)]
    pub resource: Option<ResourceId>,
    /// New date.
    pub date: NaiveDate,
    /// New start time.
    pub start: NaiveTime,
    /// New length in minutes.
    pub duration_minutes: u32,
}

/// Body of `POST outreach/:bookingId/respond`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutreachResponseRequest {
    /// Responding coach.
    pub coach_id: CoachId,
    /// Accept or decline.
    pub response: CoachResponse,
}

/// Result of `POST outreach/:bookingId/respond`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutreachResponseBody {
    /// How the response was treated.
    pub outcome: ResponseOutcome,
    /// Booking with its coach after an accept.
    pub booking: Option<Booking>,
}

/// Error payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// HTTP-style status code.
    pub status: u16,
    /// Human-readable message.
    pub message: String,
    /// Bookings a conflict collided with.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conflicting: Vec<BookingId>,
}

impl From<SchedulingError> for ErrorBody {
    fn from(err: SchedulingError) -> Self {
        let conflicting = match &err {
            SchedulingError::Conflict { conflicting, .. } => conflicting.clone(),
            _ => Vec::new(),
        };
        Self {
            status: err.status_code(),
            message: err.to_string(),
            conflicting,
        }
    }
}

/// Health response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    /// Healthy flag.
    pub ok: bool,
    /// Live bookings.
    pub bookings: usize,
    /// Planning events held.
    pub planning_events: usize,
}

/// `POST planning-event`.
pub fn create_planning_event(
    engine: &SchedulingEngine,
    req: PlanningEventRequest,
) -> Result<SyncResponse, ErrorBody> {
    let (event, report) = engine.create_planning_event(req)?;
    Ok(SyncResponse::from_parts(event, report))
}

/// `PUT planning-event/:id`.
pub fn update_planning_event(
    engine: &SchedulingEngine,
    id: &str,
    req: PlanningEventRequest,
) -> Result<SyncResponse, ErrorBody> {
    let (event, report) = engine.update_planning_event(id, req)?;
    Ok(SyncResponse::from_parts(event, report))
}

/// `DELETE planning-event/:id`.
pub fn delete_planning_event(
    engine: &SchedulingEngine,
    id: &str,
) -> Result<DeleteResponse, ErrorBody> {
    let removed = engine.delete_planning_event(id)?;
    Ok(DeleteResponse { removed })
}

/// `POST booking/:id/reschedule`.
pub fn reschedule_booking(
    engine: &SchedulingEngine,
    id: BookingId,
    req: RescheduleRequest,
) -> Result<Booking, ErrorBody> {
    let window = TimeWindow::new(req.date, req.start, req.duration_minutes)?;
    Ok(engine.reschedule_booking(id, req.resource.as_deref(), window)?)
}

/// `POST outreach/:bookingId/respond`.
pub fn respond_to_outreach(
    engine: &SchedulingEngine,
    booking_id: BookingId,
    req: OutreachResponseRequest,
) -> Result<OutreachResponseBody, ErrorBody> {
    let result = engine.respond_to_outreach(booking_id, &req.coach_id, req.response)?;
    Ok(OutreachResponseBody {
        outcome: result.outcome,
        booking: result.booking,
    })
}

/// Return a health payload.
pub fn health(engine: &SchedulingEngine) -> Health {
    Health {
        ok: true,
        bookings: engine.ledger().len(),
        planning_events: engine.event_count(),
    }
}
