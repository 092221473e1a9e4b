//! Builder to construct a scheduling engine from configuration.

use std::sync::Arc;

use crate::config::{EngineConfig, StoreBackendConfig};
use crate::core::{
    BookingLedger, ClockSource, CoachRoster, EscalationSink, Notifier, OutreachCoordinator,
    OutreachDeps, RecurrenceExpander, SchedulingEngine, SchedulingError, SharedAudit, Spawn,
    StateStore, TimerScheduler,
};
use crate::infra::{
    InMemoryOperatorQueue, InMemoryRoster, InMemoryStore, JsonlStore, RecordingNotifier,
    StaticResourceRegistry,
};
use crate::util::clock::SystemClock;

/// Assembles a [`SchedulingEngine`]; unset collaborators get in-process defaults.
///
/// Spawner and timers default to the current tokio runtime when the
/// `tokio-runtime` feature is on; otherwise both must be supplied.
pub struct EngineBuilder {
    config: EngineConfig,
    store: Option<Arc<dyn StateStore>>,
    roster: Option<Arc<dyn CoachRoster>>,
    notifier: Option<Arc<dyn Notifier>>,
    operators: Option<Arc<dyn EscalationSink>>,
    timers: Option<Arc<dyn TimerScheduler>>,
    spawner: Option<Arc<dyn Spawn>>,
    clock: Option<Arc<dyn ClockSource>>,
    audit: Option<SharedAudit>,
}

impl EngineBuilder {
    /// Start from `config`.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            store: None,
            roster: None,
            notifier: None,
            operators: None,
            timers: None,
            spawner: None,
            clock: None,
            audit: None,
        }
    }

    /// Use `store` instead of the configured backend.
    #[must_use]
    pub fn store(mut self, store: Arc<dyn StateStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Coach roster.
    #[must_use]
    pub fn roster(mut self, roster: Arc<dyn CoachRoster>) -> Self {
        self.roster = Some(roster);
        self
    }

    /// Outbound transport.
    #[must_use]
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Operator queue for escalations.
    #[must_use]
    pub fn operators(mut self, operators: Arc<dyn EscalationSink>) -> Self {
        self.operators = Some(operators);
        self
    }

    /// Timer primitive.
    #[must_use]
    pub fn timers(mut self, timers: Arc<dyn TimerScheduler>) -> Self {
        self.timers = Some(timers);
        self
    }

    /// Background executor.
    #[must_use]
    pub fn spawner(mut self, spawner: Arc<dyn Spawn>) -> Self {
        self.spawner = Some(spawner);
        self
    }

    /// Wall clock.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn ClockSource>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Audit sink shared by the ledger and the coordinator.
    #[must_use]
    pub fn audit(mut self, audit: SharedAudit) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Validate the configuration and wire the engine.
    pub fn build(self) -> Result<SchedulingEngine, SchedulingError> {
        self.config
            .validate()
            .map_err(|e| SchedulingError::Validation(format!("config invalid: {e}")))?;

        let store = match self.store {
            Some(store) => store,
            None => store_from_config(&self.config.store)?,
        };
        let (spawner, timers) = runtime_parts(self.spawner, self.timers)?;

        let registry = StaticResourceRegistry::new(self.config.resources.iter().cloned());
        let mut ledger = BookingLedger::from_registry(&registry, Arc::clone(&store));
        if let Some(audit) = &self.audit {
            ledger = ledger.with_audit(Arc::clone(audit));
        }

        let deps = OutreachDeps {
            roster: self
                .roster
                .unwrap_or_else(|| Arc::new(InMemoryRoster::default())),
            notifier: self
                .notifier
                .unwrap_or_else(|| Arc::new(RecordingNotifier::new())),
            operators: self
                .operators
                .unwrap_or_else(|| Arc::new(InMemoryOperatorQueue::new())),
            timers,
            spawner,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            store: Arc::clone(&store),
            audit: self.audit,
        };
        let coordinator = OutreachCoordinator::new(self.config.outreach.policy(), deps);
        let expander = RecurrenceExpander::new(self.config.recurrence.weekly_safety_bound_days);

        tracing::info!(
            resources = self.config.resources.len(),
            store = ?self.config.store,
            "scheduling engine built"
        );
        Ok(SchedulingEngine::new(
            Arc::new(ledger),
            coordinator,
            store,
            expander,
        ))
    }
}

/// State store for the configured backend.
pub fn store_from_config(cfg: &StoreBackendConfig) -> Result<Arc<dyn StateStore>, SchedulingError> {
    match cfg {
        StoreBackendConfig::InMemory => Ok(Arc::new(InMemoryStore::new())),
        StoreBackendConfig::File { path } => Ok(Arc::new(JsonlStore::open(path)?)),
        StoreBackendConfig::Postgres { .. } => Err(SchedulingError::Backend(
            "postgres store is schema-only; select in_memory or file".into(),
        )),
    }
}

#[cfg(feature = "tokio-runtime")]
fn runtime_parts(
    spawner: Option<Arc<dyn Spawn>>,
    timers: Option<Arc<dyn TimerScheduler>>,
) -> Result<(Arc<dyn Spawn>, Arc<dyn TimerScheduler>), SchedulingError> {
    use crate::runtime::{TokioSpawner, TokioTimerScheduler};

    if let (Some(spawner), Some(timers)) = (&spawner, &timers) {
        return Ok((Arc::clone(spawner), Arc::clone(timers)));
    }
    let tokio = TokioSpawner::current().ok_or_else(|| {
        SchedulingError::Backend("no tokio runtime; supply a spawner and timers".into())
    })?;
    let spawner = spawner.unwrap_or_else(|| Arc::new(tokio.clone()));
    let timers = timers.unwrap_or_else(|| Arc::new(TokioTimerScheduler::new(tokio)));
    Ok((spawner, timers))
}

#[cfg(not(feature = "tokio-runtime"))]
fn runtime_parts(
    spawner: Option<Arc<dyn Spawn>>,
    timers: Option<Arc<dyn TimerScheduler>>,
) -> Result<(Arc<dyn Spawn>, Arc<dyn TimerScheduler>), SchedulingError> {
    match (spawner, timers) {
        (Some(spawner), Some(timers)) => Ok((spawner, timers)),
        _ => Err(SchedulingError::Backend(
            "spawner and timers are required without the tokio-runtime feature".into(),
        )),
    }
}
