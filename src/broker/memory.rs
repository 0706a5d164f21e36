//! # In-process broker.
//!
//! [`MemoryBroker`] keeps the inbound queue in a bounded `mpsc` channel and
//! records everything that is published or acknowledged.
//!
//! ## Architecture
//! ```text
//! push(payload) ──► [inbound mpsc] ──► forwarder ──► [stream mpsc] ──► workers
//!                                        │
//!                               stops on token cancel
//!
//! publish(bytes) ──► published log
//! message.ack()  ──► acked log
//! ```
//!
//! Failure switches (`set_subscribe_failing`, `set_publish_failing`) make the
//! broker return errors, to exercise the pool's error paths.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::broker::{Broker, Message};
use crate::error::BrokerError;

type Log = Arc<Mutex<Vec<Vec<u8>>>>;

fn snapshot(log: &Mutex<Vec<Vec<u8>>>) -> Vec<Vec<u8>> {
    log.lock().unwrap_or_else(PoisonError::into_inner).clone()
}

/// In-memory broker.
pub struct MemoryBroker {
    capacity: usize,
    tx: Mutex<Option<mpsc::Sender<Message>>>,
    rx: Mutex<Option<mpsc::Receiver<Message>>>,
    published: Log,
    acked: Log,
    fail_subscribe: AtomicBool,
    fail_publish: AtomicBool,
}

impl MemoryBroker {
    /// Creates a broker whose queues hold up to `capacity` messages (min 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, rx) = mpsc::channel(capacity);
        Self {
            capacity,
            tx: Mutex::new(Some(tx)),
            rx: Mutex::new(Some(rx)),
            published: Arc::default(),
            acked: Arc::default(),
            fail_subscribe: AtomicBool::new(false),
            fail_publish: AtomicBool::new(false),
        }
    }

    /// Enqueues a payload. Acknowledging it records the payload in [`acked`](Self::acked).
    ///
    /// Waits for queue capacity. Fails once the broker is closed.
    pub async fn push(&self, payload: impl Into<Vec<u8>>) -> Result<(), BrokerError> {
        let payload = payload.into();
        let acked = Arc::clone(&self.acked);
        let record = payload.clone();
        let msg = Message::new(payload, move || {
            acked
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(record);
        });
        self.push_message(msg).await
    }

    /// Enqueues a pre-built message (custom acknowledge action).
    pub async fn push_message(&self, msg: Message) -> Result<(), BrokerError> {
        let tx = self
            .tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let Some(tx) = tx else {
            return Err(BrokerError::Publish {
                error: "broker closed".into(),
            });
        };
        tx.send(msg).await.map_err(|_| BrokerError::Publish {
            error: "subscription dropped".into(),
        })
    }

    /// Closes the inbound queue; the stream ends once drained.
    pub fn close(&self) {
        self.tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    /// Payloads published so far, in publish order.
    pub fn published(&self) -> Vec<Vec<u8>> {
        snapshot(&self.published)
    }

    /// Payloads acknowledged so far, in acknowledge order.
    pub fn acked(&self) -> Vec<Vec<u8>> {
        snapshot(&self.acked)
    }

    /// Makes `subscribe` fail while `failing` is set.
    pub fn set_subscribe_failing(&self, failing: bool) {
        self.fail_subscribe.store(failing, Ordering::SeqCst);
    }

    /// Makes `publish` fail while `failing` is set.
    pub fn set_publish_failing(&self, failing: bool) {
        self.fail_publish.store(failing, Ordering::SeqCst);
    }
}

impl Default for MemoryBroker {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[async_trait]
impl Broker for MemoryBroker {
    async fn subscribe(
        &self,
        token: CancellationToken,
    ) -> Result<mpsc::Receiver<Message>, BrokerError> {
        if self.fail_subscribe.load(Ordering::SeqCst) {
            return Err(BrokerError::Subscribe {
                error: "broker unavailable".into(),
            });
        }
        let inbound = self
            .rx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(mut inbound) = inbound else {
            return Err(BrokerError::Subscribe {
                error: "already subscribed".into(),
            });
        };

        let (out, stream) = mpsc::channel(self.capacity);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    msg = inbound.recv() => match msg {
                        Some(msg) => {
                            if out.send(msg).await.is_err() {
                                break;
                            }
                        }
                        None => break,
                    }
                }
            }
        });
        Ok(stream)
    }

    async fn publish(&self, payload: Vec<u8>) -> Result<(), BrokerError> {
        if self.fail_publish.load(Ordering::SeqCst) {
            return Err(BrokerError::Publish {
                error: "downstream unavailable".into(),
            });
        }
        self.published
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(payload);
        Ok(())
    }
}
