//! # Runtime events emitted by the pool and its workers.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Pool events**: pool start, shutdown request, final outcome
//! - **Worker events**: worker lifecycle (starting, stopped, stream closed)
//! - **Pipeline events**: per-message progress and per-stage failures
//! - **Subscriber events**: overflow and panics inside subscribers
//!
//! The [`Event`] struct carries additional metadata such as timestamps, worker id,
//! type names and failure reasons.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use workvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::DecodeFailed)
//!     .with_worker(3)
//!     .with_type_name("demo::Order")
//!     .with_reason("expected value at line 1 column 1");
//!
//! assert_eq!(ev.kind, EventKind::DecodeFailed);
//! assert_eq!(ev.worker, Some(3));
//! assert_eq!(ev.type_name, Some("demo::Order"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::error::StageError;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(1);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `subscriber`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `subscriber`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    SubscriberOverflow,

    // === Pool events ===
    /// Pool is starting its workers.
    ///
    /// Sets:
    /// - `concurrency`: configured worker count
    PoolStarting,

    /// Shutdown requested (termination signal observed).
    ShutdownRequested,

    /// All workers stopped (within the grace period, if one is configured).
    AllStoppedWithin,

    /// Grace period exceeded; some workers did not stop in time.
    ///
    /// Sets:
    /// - `grace_ms`: configured grace (ms)
    GraceExceeded,

    // === Worker lifecycle events ===
    /// Worker started and is idle, waiting for a message.
    ///
    /// Sets:
    /// - `worker`: worker id
    WorkerStarting,

    /// Worker observed the end of the subscription stream.
    ///
    /// Sets:
    /// - `worker`: worker id
    StreamClosed,

    /// Worker left its loop. Published exactly once per worker.
    ///
    /// Sets:
    /// - `worker`: worker id
    WorkerStopped,

    // === Pipeline events ===
    /// Worker received a message and starts executing the pipeline.
    ///
    /// Sets:
    /// - `worker`: worker id
    MessageReceived,

    /// Payload could not be decoded; the message is dropped without ack.
    ///
    /// Sets:
    /// - `worker`: worker id
    /// - `type_name`: decode target type
    /// - `reason`: codec failure
    DecodeFailed,

    /// Job execution failed; the message is dropped without ack.
    ///
    /// Sets:
    /// - `worker`: worker id
    /// - `reason`: job failure
    ExecuteFailed,

    /// Job output could not be encoded; the message is dropped without ack.
    ///
    /// Sets:
    /// - `worker`: worker id
    /// - `type_name`: output type
    /// - `reason`: codec failure
    EncodeFailed,

    /// Publishing the output failed; the message is still acknowledged.
    ///
    /// Sets:
    /// - `worker`: worker id
    /// - `reason`: broker failure
    PublishFailed,

    /// Message acknowledged; the pipeline for it is complete.
    ///
    /// Sets:
    /// - `worker`: worker id
    MessageAcked,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Worker id, if applicable.
    pub worker: Option<u8>,
    /// Configured worker count (only for `PoolStarting`).
    pub concurrency: Option<u8>,
    /// Type name of the value involved in a codec failure.
    pub type_name: Option<&'static str>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// Subscriber name (only for subscriber events).
    pub subscriber: Option<&'static str>,
    /// Shutdown grace in milliseconds (compact).
    pub grace_ms: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            worker: None,
            concurrency: None,
            type_name: None,
            reason: None,
            subscriber: None,
            grace_ms: None,
        }
    }

    /// Attaches a worker id.
    #[inline]
    pub fn with_worker(mut self, id: u8) -> Self {
        self.worker = Some(id);
        self
    }

    /// Attaches the configured worker count.
    #[inline]
    pub fn with_concurrency(mut self, n: u8) -> Self {
        self.concurrency = Some(n);
        self
    }

    /// Attaches a type name.
    #[inline]
    pub fn with_type_name(mut self, name: &'static str) -> Self {
        self.type_name = Some(name);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a grace duration (stored as milliseconds).
    #[inline]
    pub fn with_grace(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.grace_ms = Some(ms);
        self
    }

    /// Creates the failure event matching a pipeline stage error.
    pub fn stage_failed(worker: u8, err: &StageError) -> Self {
        let kind = match err {
            StageError::Decode { .. } => EventKind::DecodeFailed,
            StageError::Execute(_) => EventKind::ExecuteFailed,
            StageError::Encode { .. } => EventKind::EncodeFailed,
            StageError::Publish(_) => EventKind::PublishFailed,
        };
        let reason = match err {
            StageError::Decode { source, .. } | StageError::Encode { source, .. } => {
                source.as_message()
            }
            StageError::Execute(e) => e.as_message(),
            StageError::Publish(e) => e.as_message(),
        };

        let ev = Event::new(kind).with_worker(worker).with_reason(reason);
        match err.type_name() {
            Some(name) => ev.with_type_name(name),
            None => ev,
        }
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        let mut ev = Event::new(EventKind::SubscriberOverflow)
            .with_reason(format!("subscriber={subscriber} reason={reason}"));
        ev.subscriber = Some(subscriber);
        ev
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        let mut ev = Event::new(EventKind::SubscriberPanicked).with_reason(info);
        ev.subscriber = Some(subscriber);
        ev
    }

    /// True for the per-stage failure kinds.
    #[inline]
    pub fn is_stage_failure(&self) -> bool {
        matches!(
            self.kind,
            EventKind::DecodeFailed
                | EventKind::ExecuteFailed
                | EventKind::EncodeFailed
                | EventKind::PublishFailed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{BrokerError, CodecError, JobError};

    #[test]
    fn test_seq_is_monotonic() {
        let a = Event::new(EventKind::WorkerStarting);
        let b = Event::new(EventKind::WorkerStarting);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_stage_failed_maps_kind_and_type_name() {
        let decode = Event::stage_failed(
            2,
            &StageError::Decode {
                type_name: "u64",
                source: CodecError::Decode {
                    error: "eof".into(),
                },
            },
        );
        assert_eq!(decode.kind, EventKind::DecodeFailed);
        assert_eq!(decode.worker, Some(2));
        assert_eq!(decode.type_name, Some("u64"));
        assert_eq!(decode.reason.as_deref(), Some("decode: eof"));

        let exec = Event::stage_failed(1, &StageError::Execute(JobError::fail("nope")));
        assert_eq!(exec.kind, EventKind::ExecuteFailed);
        assert_eq!(exec.type_name, None);
        assert_eq!(exec.reason.as_deref(), Some("error: nope"));

        let publish = Event::stage_failed(
            1,
            &StageError::Publish(BrokerError::Publish {
                error: "down".into(),
            }),
        );
        assert_eq!(publish.kind, EventKind::PublishFailed);
        assert_eq!(publish.reason.as_deref(), Some("publish: down"));
        assert!(publish.is_stage_failure());
    }

    #[test]
    fn test_grace_is_clamped_to_u32_millis() {
        let ev = Event::new(EventKind::GraceExceeded).with_grace(Duration::from_secs(u64::MAX));
        assert_eq!(ev.grace_ms, Some(u32::MAX));
    }
}
