//! Tests for configuration validation

use std::path::PathBuf;
use std::time::Duration;

use court_scheduler::config::{EngineConfig, StoreBackendConfig};

#[test]
fn test_engine_config_defaults() {
    let cfg = EngineConfig::with_resources(["CourtA", "CourtB"]);
    assert!(cfg.validate().is_ok());
    assert_eq!(cfg.outreach.response_timeout_secs, 86_400);
    assert_eq!(cfg.outreach.escalation_window_secs, Some(604_800));
    assert_eq!(cfg.recurrence.weekly_safety_bound_days, 730);
    assert_eq!(cfg.store, StoreBackendConfig::InMemory);
}

#[test]
fn test_engine_config_requires_resources() {
    let cfg = EngineConfig::with_resources(Vec::<String>::new());
    assert!(cfg.validate().is_err());
}

#[test]
fn test_engine_config_rejects_duplicate_resources() {
    let cfg = EngineConfig::with_resources(["CourtA", "CourtA"]);
    let err = cfg.validate().unwrap_err();
    assert!(err.contains("CourtA"));
}

#[test]
fn test_engine_config_invalid_timeout() {
    let mut cfg = EngineConfig::with_resources(["CourtA"]);
    cfg.outreach.response_timeout_secs = 0;
    assert!(cfg.validate().is_err());
}

#[test]
fn test_escalation_window_must_exceed_timeout() {
    let mut cfg = EngineConfig::with_resources(["CourtA"]);
    cfg.outreach.response_timeout_secs = 3_600;
    cfg.outreach.escalation_window_secs = Some(3_600);
    assert!(cfg.validate().is_err());

    cfg.outreach.escalation_window_secs = None;
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_negative_weights_are_rejected() {
    let mut cfg = EngineConfig::with_resources(["CourtA"]);
    cfg.outreach.weights.rating_weight = -1.0;
    assert!(cfg.validate().is_err());
}

#[test]
fn test_config_from_json() {
    let json = r#"
    {
        "resources": ["CourtA", "CourtB", "CourtC"],
        "outreach": {
            "response_timeout_secs": 7200,
            "escalation_window_secs": 86400,
            "weights": { "active_bonus": 5.0, "specialty_weight": 3.0, "rating_weight": 1.0 }
        },
        "recurrence": { "weekly_safety_bound_days": 365 },
        "store": { "kind": "file", "path": "/var/lib/court-scheduler" }
    }
    "#;

    let cfg = EngineConfig::from_json_str(json).unwrap();
    assert_eq!(cfg.resources.len(), 3);
    assert_eq!(
        cfg.store,
        StoreBackendConfig::File {
            path: PathBuf::from("/var/lib/court-scheduler")
        }
    );

    let policy = cfg.outreach.policy();
    assert_eq!(policy.response_timeout, Duration::from_secs(7_200));
    assert_eq!(policy.escalation_window, Some(Duration::from_secs(86_400)));
    assert!((policy.weights.active_bonus - 5.0).abs() < f64::EPSILON);
}

#[test]
fn test_config_from_json_fills_defaults() {
    let cfg = EngineConfig::from_json_str(r#"{ "resources": ["CourtA"] }"#).unwrap();
    assert_eq!(cfg.outreach.response_timeout_secs, 86_400);
    assert_eq!(cfg.store, StoreBackendConfig::InMemory);
}

#[test]
fn test_config_from_json_invalid() {
    assert!(EngineConfig::from_json_str("{ not json").is_err());
    assert!(EngineConfig::from_json_str(r#"{ "resources": [] }"#).is_err());
}

#[test]
fn test_postgres_url_must_be_set() {
    let mut cfg = EngineConfig::with_resources(["CourtA"]);
    cfg.store = StoreBackendConfig::Postgres { url: " ".into() };
    assert!(cfg.validate().is_err());
}
