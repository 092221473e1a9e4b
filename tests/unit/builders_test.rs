//! Tests for builder modules

use std::sync::Arc;

use court_scheduler::builders::{store_from_config, EngineBuilder};
use court_scheduler::config::{EngineConfig, StoreBackendConfig};
use court_scheduler::core::SchedulingError;
use court_scheduler::infra::InMemoryStore;

#[test]
fn test_postgres_backend_is_rejected() {
    let err = store_from_config(&StoreBackendConfig::Postgres {
        url: "postgres://localhost/courts".into(),
    })
    .err()
    .unwrap();
    assert!(matches!(err, SchedulingError::Backend(_)));
}

#[test]
fn test_invalid_config_is_rejected() {
    let err = EngineBuilder::new(EngineConfig::with_resources(Vec::<String>::new()))
        .store(Arc::new(InMemoryStore::new()))
        .build()
        .err()
        .unwrap();
    assert!(matches!(err, SchedulingError::Validation(_)));
}

#[test]
fn test_build_outside_runtime_needs_spawner() {
    let err = EngineBuilder::new(EngineConfig::with_resources(["CourtA"]))
        .build()
        .err()
        .unwrap();
    assert!(matches!(err, SchedulingError::Backend(_)));
}

#[tokio::test]
async fn test_build_inside_runtime_uses_tokio_defaults() {
    let engine = EngineBuilder::new(EngineConfig::with_resources(["CourtB", "CourtA"]))
        .build()
        .unwrap();
    assert_eq!(engine.ledger().resources(), vec!["CourtA", "CourtB"]);
    assert!(engine.ledger().is_empty());
}
