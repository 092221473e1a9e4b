//! Builders to construct a scheduling engine from configuration.

pub mod engine_builder;

pub use engine_builder::{store_from_config, EngineBuilder};
