//! Infrastructure adapters for state stores, operator queues, notifiers and
//! the roster.

pub mod escalation;
pub mod notifier;
pub mod roster;
pub mod store;

pub use escalation::InMemoryOperatorQueue;
pub use notifier::{RecordingNotifier, SentMessage};
pub use roster::{InMemoryRoster, StaticResourceRegistry};
pub use store::{InMemoryStore, JsonlStore, PostgresStore};
