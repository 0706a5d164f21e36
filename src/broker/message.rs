//! # Inbound message.
//!
//! A [`Message`] is one unit of work: opaque payload bytes plus a one-shot
//! acknowledge action supplied by the broker (offset commit, delete, ...).
//!
//! [`Message::ack`] consumes the message, so it can be acknowledged at most once.
//! Dropping a message without acknowledging it abandons it; the pool never
//! requeues.

use std::fmt;

type AckFn = Box<dyn FnOnce() + Send + Sync + 'static>;

/// Payload bytes plus an acknowledge action.
pub struct Message {
    data: Vec<u8>,
    ack: Option<AckFn>,
}

impl Message {
    /// Creates a message with the given acknowledge action.
    ///
    /// # Example
    /// ```
    /// use std::sync::Arc;
    /// use std::sync::atomic::{AtomicUsize, Ordering};
    /// use workvisor::Message;
    ///
    /// let acks = Arc::new(AtomicUsize::new(0));
    /// let counter = acks.clone();
    /// let msg = Message::new(b"{}".to_vec(), move || {
    ///     counter.fetch_add(1, Ordering::SeqCst);
    /// });
    ///
    /// assert_eq!(msg.data(), b"{}");
    /// msg.ack();
    /// assert_eq!(acks.load(Ordering::SeqCst), 1);
    /// ```
    pub fn new(data: impl Into<Vec<u8>>, ack: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            data: data.into(),
            ack: Some(Box::new(ack)),
        }
    }

    /// Creates a message whose acknowledgement is a no-op.
    ///
    /// For transports without an acknowledge step.
    pub fn without_ack(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            ack: None,
        }
    }

    /// Returns the payload bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Signals successful processing to the broker.
    pub fn ack(mut self) {
        if let Some(ack) = self.ack.take() {
            ack();
        }
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("len", &self.data.len())
            .field("ackable", &self.ack.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_drop_without_ack_does_not_acknowledge() {
        let acks = Arc::new(AtomicUsize::new(0));
        let counter = acks.clone();
        let msg = Message::new(vec![1], move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        drop(msg);
        assert_eq!(acks.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_without_ack_is_noop() {
        let msg = Message::without_ack("raw");
        assert_eq!(msg.data(), b"raw");
        msg.ack();
    }
}
