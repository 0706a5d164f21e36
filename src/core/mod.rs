//! Runtime core: worker pool and lifecycle.
//!
//! The public API from this module is [`Pool`] (with its [`PoolBuilder`] and
//! [`Config`]), which subscribes to a broker, runs the workers and handles
//! graceful shutdown.
//!
//! Internal modules:
//! - [`pool`]: owns the subscription, spawns workers, drives shutdown;
//! - [`worker`]: one competing consumer on the shared stream;
//! - [`pipeline`]: decode/execute/encode/publish/ack for a single message;
//! - [`shutdown`]: cross-platform shutdown signal handling.

mod builder;
mod config;
mod pipeline;
mod pool;
mod shutdown;
mod worker;

pub use builder::PoolBuilder;
pub use config::Config;
pub use pool::Pool;
