//! # Event subscribers for the pool runtime.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out and
//! the built-in subscribers.
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   Worker ── publish(Event) ──► Bus ──► Pool listener ──► SubscriberSet::emit()
//!                                                               │
//!                                                ┌──────────────┼──────────────┐
//!                                                ▼              ▼              ▼
//!                                           LogWriter     WorkerTracker     Custom
//!                                           (tracing)   (state per worker)
//! ```
//!
//! ## Subscriber types
//! - **Passive subscribers** - observe and react to events (logging, metrics, alerts)
//! - **Stateful subscribers** - maintain internal state based on events (WorkerTracker)

mod log;
mod set;
mod subscribe;
mod tracker;

pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
pub use tracker::{WorkerState, WorkerTracker};
