//! # Worker: one competing consumer on the shared stream.
//!
//! ## State machine
//! ```text
//!            ┌────────── message ──────────┐
//!            │                             ▼
//! start ──► Idle ◄── pipeline done ── Processing
//!            │
//!            ├── cancellation ──► Stopped
//!            └── stream closed ─► Stopped
//! ```
//!
//! ## Rules
//! - Cancellation is observed **only** in the idle select, and is polled first
//! - A message already received always runs its whole pipeline
//! - Messages are processed **sequentially** within one worker
//! - `WorkerStopped` is published exactly once, on exit

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;

use crate::{
    broker::{Broker, Message},
    codec::Codec,
    core::pipeline,
    events::{Bus, Event, EventKind},
    jobs::Job,
};

/// The subscription stream shared by every worker of a pool.
pub(crate) type SharedStream = Arc<Mutex<mpsc::Receiver<Message>>>;

/// Consumer loop bound to one worker id.
pub(crate) struct Worker<B: ?Sized, J, C> {
    id: u8,
    broker: Arc<B>,
    job: Arc<J>,
    codec: Arc<C>,
    bus: Bus,
}

impl<B, J, C> Worker<B, J, C>
where
    B: Broker + ?Sized,
    J: Job,
    C: Codec,
{
    pub(crate) fn new(id: u8, broker: Arc<B>, job: Arc<J>, codec: Arc<C>, bus: Bus) -> Self {
        Self {
            id,
            broker,
            job,
            codec,
            bus,
        }
    }

    /// Runs until `token` is cancelled or the stream ends.
    pub(crate) async fn run(self, stream: SharedStream, token: CancellationToken) {
        self.bus
            .publish(Event::new(EventKind::WorkerStarting).with_worker(self.id));

        loop {
            let next = tokio::select! {
                biased;
                _ = token.cancelled() => break,
                msg = next_message(&stream) => msg,
            };
            let Some(msg) = next else {
                self.bus
                    .publish(Event::new(EventKind::StreamClosed).with_worker(self.id));
                break;
            };

            self.bus
                .publish(Event::new(EventKind::MessageReceived).with_worker(self.id));
            // Failures are already reported as events by the pipeline.
            let _ = pipeline::process(
                self.id,
                msg,
                self.broker.as_ref(),
                self.job.as_ref(),
                self.codec.as_ref(),
                &self.bus,
            )
            .await;
        }

        self.bus
            .publish(Event::new(EventKind::WorkerStopped).with_worker(self.id));
    }
}

/// Waits for the stream lock, then for the next message.
async fn next_message(stream: &Mutex<mpsc::Receiver<Message>>) -> Option<Message> {
    stream.lock().await.recv().await
}
