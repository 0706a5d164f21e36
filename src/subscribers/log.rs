//! # LogWriter: events to `tracing` records
//!
//! Turns every [`Event`] into a structured `tracing` record. The process decides
//! where records go by installing a `tracing` subscriber (e.g. `tracing-subscriber`).
//!
//! ## Levels
//! ```text
//! info   pool starting (concurrency), worker starting, worker stopped,
//!        stream closed, shutdown requested, all stopped
//! debug  executing (message received), acked
//! warn   decode / execute / encode / publish failures, subscriber overflow/panic
//! error  grace exceeded
//! ```

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber backed by `tracing`.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let reason = e.reason.as_deref().unwrap_or_default();

        match e.kind {
            EventKind::PoolStarting => {
                info!(concurrency = e.concurrency, "starting worker pool");
            }
            EventKind::ShutdownRequested => {
                info!("graceful shutdown");
            }
            EventKind::AllStoppedWithin => {
                info!("all workers stopped");
            }
            EventKind::GraceExceeded => {
                error!(grace_ms = e.grace_ms, "shutdown grace exceeded");
            }
            EventKind::WorkerStarting => {
                info!(worker = e.worker, "started");
            }
            EventKind::StreamClosed => {
                info!(worker = e.worker, "subscription closed");
            }
            EventKind::WorkerStopped => {
                info!(worker = e.worker, "stopped");
            }
            EventKind::MessageReceived => {
                debug!(worker = e.worker, "executing");
            }
            EventKind::MessageAcked => {
                debug!(worker = e.worker, "acked");
            }
            EventKind::DecodeFailed => {
                warn!(worker = e.worker, type_name = e.type_name, error = reason, "decode");
            }
            EventKind::ExecuteFailed => {
                warn!(worker = e.worker, error = reason, "execute");
            }
            EventKind::EncodeFailed => {
                warn!(worker = e.worker, type_name = e.type_name, error = reason, "encode");
            }
            EventKind::PublishFailed => {
                warn!(worker = e.worker, error = reason, "broker");
            }
            EventKind::SubscriberOverflow => {
                warn!(subscriber = e.subscriber, reason, "subscriber dropped event");
            }
            EventKind::SubscriberPanicked => {
                warn!(subscriber = e.subscriber, info = reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
