//! # Broker abstraction.
//!
//! A [`Broker`] provides the inbound message stream and the outbound publish
//! action. Transport concerns (connections, reconnects, retries) live entirely
//! behind this trait.
//!
//! ## Contents
//! - [`Broker`] subscribe/publish contract
//! - [`Message`] payload + acknowledge action
//! - [`MemoryBroker`] in-process broker for demos and tests

mod memory;
mod message;

pub use memory::MemoryBroker;
pub use message::Message;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::BrokerError;

/// Subscribe/publish contract.
///
/// `publish` is called concurrently from every worker and must be safe for it.
#[async_trait]
pub trait Broker: Send + Sync + 'static {
    /// Opens the inbound stream.
    ///
    /// The stream lives until `token` is cancelled or the broker closes it.
    /// Fails with [`BrokerError::Subscribe`] if it cannot be established.
    async fn subscribe(&self, token: CancellationToken)
    -> Result<mpsc::Receiver<Message>, BrokerError>;

    /// Publishes output bytes downstream.
    ///
    /// Fails with [`BrokerError::Publish`] on transport failure.
    async fn publish(&self, payload: Vec<u8>) -> Result<(), BrokerError>;
}
