//! Configuration models for resources, outreach, recurrence and storage.

pub mod engine;

pub use engine::{
    EngineConfig, OutreachConfig, RecurrenceConfig, StoreBackendConfig, CONFIG_PATH_ENV,
    RESPONSE_TIMEOUT_ENV,
};
