//! State store backends.

pub mod jsonl;
pub mod memory;
pub mod postgres;

pub use jsonl::JsonlStore;
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
