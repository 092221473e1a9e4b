//! Runtime adapters (tokio spawner and timers) and API surface.

pub mod api;
#[cfg(feature = "tokio-runtime")]
pub mod tokio_spawner;
#[cfg(feature = "tokio-runtime")]
pub mod tokio_timer;

pub use api::{
    health, ErrorBody, Health, OutreachResponseRequest, PlanningEventRequest, RescheduleRequest,
    SyncResponse,
};
#[cfg(feature = "tokio-runtime")]
pub use tokio_spawner::TokioSpawner;
#[cfg(feature = "tokio-runtime")]
pub use tokio_timer::TokioTimerScheduler;
