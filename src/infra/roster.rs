//! Static coach roster and court registry.

use std::collections::{BTreeSet, HashMap};

use parking_lot::RwLock;

use crate::core::{CoachCandidate, CoachRoster, ResourceRegistry};
use crate::util::serde::ResourceId;

/// Roster held in memory, replaceable at runtime.
#[derive(Default)]
pub struct InMemoryRoster {
    coaches: RwLock<HashMap<String, CoachCandidate>>,
}

impl InMemoryRoster {
    /// Build a roster from `coaches`; later duplicates replace earlier ones.
    pub fn new(coaches: impl IntoIterator<Item = CoachCandidate>) -> Self {
        Self {
            coaches: RwLock::new(coaches.into_iter().map(|c| (c.id.clone(), c)).collect()),
        }
    }

    /// Add or replace a coach.
    pub fn upsert(&self, coach: CoachCandidate) {
        self.coaches.write().insert(coach.id.clone(), coach);
    }

    /// Remove a coach.
    pub fn remove(&self, id: &str) -> Option<CoachCandidate> {
        self.coaches.write().remove(id)
    }
}

impl CoachRoster for InMemoryRoster {
    fn candidate(&self, id: &str) -> Option<CoachCandidate> {
        self.coaches.read().get(id).cloned()
    }
}

/// Fixed court list, usually taken from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticResourceRegistry {
    resources: BTreeSet<ResourceId>,
}

impl StaticResourceRegistry {
    /// Registry listing `resources`.
    pub fn new<I, S>(resources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ResourceId>,
    {
        Self {
            resources: resources.into_iter().map(Into::into).collect(),
        }
    }
}

impl ResourceRegistry for StaticResourceRegistry {
    fn list(&self) -> BTreeSet<ResourceId> {
        self.resources.clone()
    }
}
