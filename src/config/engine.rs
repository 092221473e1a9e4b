//! Engine configuration structures.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::recurrence::DEFAULT_WEEKLY_SAFETY_BOUND_DAYS;
use crate::core::{AppResult, MatchWeights, OutreachPolicy};
use crate::util::serde::ResourceId;

/// Environment variable naming the JSON configuration file.
pub const CONFIG_PATH_ENV: &str = "COURT_SCHEDULER_CONFIG";
/// Environment override for the outreach response timeout.
pub const RESPONSE_TIMEOUT_ENV: &str = "COURT_SCHEDULER_RESPONSE_TIMEOUT_SECS";

/// State store backend selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreBackendConfig {
    /// Process-local maps; state is lost on restart.
    #[default]
    InMemory,
    /// JSON-lines journals under a directory.
    File {
        /// Directory holding the journals.
        path: PathBuf,
    },
    /// Postgres (schema only).
    Postgres {
        /// Connection string.
        url: String,
    },
}

/// Outreach timing and ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutreachConfig {
    /// Seconds a coach has to answer.
    #[serde(default = "default_response_timeout_secs")]
    pub response_timeout_secs: u64,
    /// Seconds after the first attempt before escalating regardless.
    #[serde(default = "default_escalation_window_secs")]
    pub escalation_window_secs: Option<u64>,
    /// Candidate scoring weights.
    #[serde(default)]
    pub weights: MatchWeights,
}

const fn default_response_timeout_secs() -> u64 {
    24 * 60 * 60
}

#[allow(clippy::unnecessary_wraps)]
const fn default_escalation_window_secs() -> Option<u64> {
    Some(7 * 24 * 60 * 60)
}

impl Default for OutreachConfig {
    fn default() -> Self {
        Self {
            response_timeout_secs: default_response_timeout_secs(),
            escalation_window_secs: default_escalation_window_secs(),
            weights: MatchWeights::default(),
        }
    }
}

impl OutreachConfig {
    /// Validate outreach settings.
    pub fn validate(&self) -> Result<(), String> {
        if self.response_timeout_secs == 0 {
            return Err("response_timeout_secs must be greater than 0".into());
        }
        if let Some(window) = self.escalation_window_secs {
            if window <= self.response_timeout_secs {
                return Err(
                    "escalation_window_secs must be greater than response_timeout_secs".into(),
                );
            }
        }
        let w = &self.weights;
        for (name, value) in [
            ("active_bonus", w.active_bonus),
            ("specialty_weight", w.specialty_weight),
            ("rating_weight", w.rating_weight),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("weights.{name} must be a finite, non-negative number"));
            }
        }
        Ok(())
    }

    /// Coordinator policy derived from these settings.
    pub fn policy(&self) -> OutreachPolicy {
        OutreachPolicy {
            response_timeout: Duration::from_secs(self.response_timeout_secs),
            escalation_window: self.escalation_window_secs.map(Duration::from_secs),
            weights: self.weights,
        }
    }
}

/// Recurrence expansion limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceConfig {
    /// Days a weekly walk may cover before it stops.
    #[serde(default = "default_weekly_bound")]
    pub weekly_safety_bound_days: u32,
}

const fn default_weekly_bound() -> u32 {
    DEFAULT_WEEKLY_SAFETY_BOUND_DAYS
}

impl Default for RecurrenceConfig {
    fn default() -> Self {
        Self {
            weekly_safety_bound_days: default_weekly_bound(),
        }
    }
}

/// Root engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Bookable courts.
    pub resources: Vec<ResourceId>,
    /// Outreach settings.
    #[serde(default)]
    pub outreach: OutreachConfig,
    /// Recurrence limits.
    #[serde(default)]
    pub recurrence: RecurrenceConfig,
    /// State store backend.
    #[serde(default)]
    pub store: StoreBackendConfig,
}

impl EngineConfig {
    /// Configuration with defaults for everything but the court list.
    pub fn with_resources<I, S>(resources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ResourceId>,
    {
        Self {
            resources: resources.into_iter().map(Into::into).collect(),
            outreach: OutreachConfig::default(),
            recurrence: RecurrenceConfig::default(),
            store: StoreBackendConfig::default(),
        }
    }

    /// Validate all sections.
    pub fn validate(&self) -> Result<(), String> {
        if self.resources.is_empty() {
            return Err("at least one resource must be defined".into());
        }
        let mut seen = HashSet::new();
        for resource in &self.resources {
            if resource.trim().is_empty() {
                return Err("resource ids must not be empty".into());
            }
            if !seen.insert(resource.as_str()) {
                return Err(format!("resource `{resource}` is listed twice"));
            }
        }
        self.outreach
            .validate()
            .map_err(|e| format!("outreach invalid: {e}"))?;
        if self.recurrence.weekly_safety_bound_days == 0 {
            return Err("recurrence.weekly_safety_bound_days must be greater than 0".into());
        }
        match &self.store {
            StoreBackendConfig::File { path } if path.as_os_str().is_empty() => {
                Err("store.path must not be empty".into())
            }
            StoreBackendConfig::Postgres { url } if url.trim().is_empty() => {
                Err("store.url must not be empty".into())
            }
            _ => Ok(()),
        }
    }

    /// Parse engine configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load configuration the way a deployed service does.
    ///
    /// Reads `.env` if present, then the JSON file named by
    /// `COURT_SCHEDULER_CONFIG`, then applies
    /// `COURT_SCHEDULER_RESPONSE_TIMEOUT_SECS`.
    pub fn from_env() -> AppResult<Self> {
        if let Err(err) = dotenvy::dotenv() {
            if !err.not_found() {
                return Err(anyhow::anyhow!("failed to read .env: {err}"));
            }
        }
        let path = std::env::var(CONFIG_PATH_ENV)
            .map_err(|_| anyhow::anyhow!("{CONFIG_PATH_ENV} is not set"))?;
        let raw = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("failed to read config `{path}`: {e}"))?;
        let mut cfg: Self =
            serde_json::from_str(&raw).map_err(|e| anyhow::anyhow!("parse error: {e}"))?;
        if let Ok(value) = std::env::var(RESPONSE_TIMEOUT_ENV) {
            cfg.outreach.response_timeout_secs = value
                .trim()
                .parse()
                .map_err(|e| anyhow::anyhow!("{RESPONSE_TIMEOUT_ENV} is not a number: {e}"))?;
        }
        cfg.validate().map_err(anyhow::Error::msg)?;
        tracing::info!(path = %path, resources = cfg.resources.len(), "configuration loaded");
        Ok(cfg)
    }
}
