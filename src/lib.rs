//! # Court Scheduler
//!
//! Conflict-free booking of shared courts with recurring planning events and
//! automated coach outreach.
//!
//! The engine keeps one guarantee above all others: two bookings on the same
//! court never overlap. Every write holds the court's lane lock across the
//! conflict check and the insert, so concurrent requests cannot both win the
//! same window.
//!
//! ## Key Features
//!
//! - **Atomic booking**: per-court check-and-insert, reschedule that excludes
//!   the booking's own reservation
//! - **Planning events**: daily, weekly and monthly recurrence expanded into
//!   derived bookings; re-sync is idempotent and conflicts come back as
//!   rejected pairs instead of failing the request
//! - **Coach outreach**: ranked candidates contacted one at a time with
//!   cancellable response timers, first accept wins, escalation to an
//!   operator queue exactly once
//! - **Recovery**: bookings, events and outreach deadlines reload from the
//!   state store; overdue timers fire on startup
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use court_scheduler::builders::EngineBuilder;
//! use court_scheduler::config::EngineConfig;
//! use court_scheduler::core::TimeWindow;
//!
//! let engine = EngineBuilder::new(EngineConfig::with_resources(["CourtA", "CourtB"])).build()?;
//! let window = TimeWindow::new(date, nine_am, 60)?;
//! let booking = engine.book("CourtA", window)?;
//! ```
//!
//! For complete examples, see:
//! - `tests/booking_ledger_test.rs` - booking and conflict scenarios
//! - `tests/outreach_test.rs` - timer-driven outreach

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core scheduling abstractions: windows, bookings, outreach, engine.
pub mod core;
/// Configuration models for resources, outreach, recurrence and storage.
pub mod config;
/// Builders to construct the engine from configuration.
pub mod builders;
/// Infrastructure adapters for state stores, operator queues and notifiers.
pub mod infra;
/// Runtime adapters (tokio spawner and timers) and API surface.
pub mod runtime;
/// Shared utilities.
pub mod util;
