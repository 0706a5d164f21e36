//! # workvisor
//!
//! **Workvisor** is a fixed-size async worker pool for message processing.
//!
//! It subscribes once to a [`Broker`], lets `N` workers compete for the messages
//! of that single stream, runs each message through a user [`Job`] (decoded and
//! encoded by a [`Codec`]), publishes the result and acknowledges the source
//! message. SIGINT/SIGTERM trigger a graceful shutdown: in-flight messages finish,
//! idle workers exit, and [`Pool::run`] returns once every worker is gone.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!                     ┌──────────────────────────────┐
//!                     │  Broker::subscribe(token)    │
//!                     │  (one stream per run)        │
//!                     └──────────────┬───────────────┘
//!                                    ▼
//!                    Arc<Mutex<Receiver<Message>>>
//!            ┌───────────────────────┼───────────────────────┐
//!            ▼                       ▼                       ▼
//!     ┌──────────────┐        ┌──────────────┐        ┌──────────────┐
//!     │   Worker 1   │        │   Worker 2   │        │   Worker N   │
//!     │  (pipeline)  │        │  (pipeline)  │        │  (pipeline)  │
//!     └┬─────────────┘        └┬─────────────┘        └┬─────────────┘
//!      │ Publishes events:     │                       │
//!      │ - WorkerStarting      │ - MessageReceived     │ - DecodeFailed
//!      │ - MessageAcked        │ - PublishFailed       │ - WorkerStopped
//!      ▼                       ▼                       ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                   Bus (broadcast channel)                         │
//! │                (capacity: Config::bus_capacity)                   │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                       ┌────────────────────────┐
//!                       │  subscriber_listener   │
//!                       │       (in Pool)        │
//!                       └───────────┬────────────┘
//!                                   ▼
//!                             SubscriberSet
//!                          ┌────────┼─────────┐
//!                          ▼        ▼         ▼
//!                     LogWriter  WorkerTracker  custom
//! ```
//!
//! ### Per-message pipeline
//! ```text
//! Message ──► Codec::decode(into Job::new_in_message())
//!               ├─ Err ──► DecodeFailed, dropped (no ack)
//!               ▼
//!             Job::execute(input)
//!               ├─ Err/panic ──► ExecuteFailed, dropped (no ack)
//!               ▼
//!             Codec::encode(output)
//!               ├─ Err ──► EncodeFailed, dropped (no ack)
//!               ▼
//!             Broker::publish(bytes)
//!               ├─ Err ──► PublishFailed, then ack
//!               ▼
//!             Message::ack() ──► MessageAcked
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                     |
//! |-------------------|--------------------------------------------------------------|----------------------------------------|
//! | **Pool**          | Run workers over one subscription, graceful shutdown.        | [`Pool`], [`PoolBuilder`], [`Config`]  |
//! | **Collaborators** | Plug in the message source/sink, format and business logic.  | [`Broker`], [`Codec`], [`Job`]         |
//! | **Jobs**          | Define jobs as plain async functions.                        | [`JobFn`]                              |
//! | **Subscriber API**| Hook into worker and pipeline events.                        | [`Subscribe`], [`Event`]               |
//! | **Errors**        | Typed errors for the runtime and each pipeline stage.        | [`RuntimeError`], [`StageError`]       |
//! | **Testing**       | In-process broker with recorded publishes and acks.          | [`MemoryBroker`]                       |
//!
//! ## Optional features
//! - `json` _(default)_: exports [`JsonCodec`] backed by `serde_json`.
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use serde::{Deserialize, Serialize};
//! use workvisor::{Config, JobError, JobFn, JsonCodec, MemoryBroker, Pool};
//!
//! #[derive(Default, Deserialize)]
//! struct Order { id: u64, qty: u32 }
//!
//! #[derive(Serialize)]
//! struct Reserved { id: u64, ok: bool }
//!
//! #[tokio::main]
//! async fn main() {
//!     let broker = Arc::new(MemoryBroker::default());
//!     let job = JobFn::arc(|o: Order| async move {
//!         if o.qty == 0 {
//!             return Err(JobError::fail("empty order"));
//!         }
//!         Ok(Reserved { id: o.id, ok: true })
//!     });
//!
//!     let pool = Pool::new(Config::with_concurrency(4), broker, job, Arc::new(JsonCodec));
//!     if let Err(e) = pool.run().await {
//!         workvisor::exit("worker pool", &e);
//!     }
//! }
//! ```
mod broker;
mod codec;
mod core;
mod error;
mod events;
mod jobs;
mod process;
mod subscribers;

// ---- Public re-exports ----

pub use broker::{Broker, MemoryBroker, Message};
pub use codec::Codec;
pub use core::{Config, Pool, PoolBuilder};
pub use error::{BrokerError, CodecError, JobError, RuntimeError, StageError};
pub use events::{Bus, Event, EventKind};
pub use jobs::{Job, JobFn};
pub use process::exit;
pub use subscribers::{LogWriter, Subscribe, SubscriberSet, WorkerState, WorkerTracker};

// Optional: bundled JSON codec.
// Enable with: `--features json` (on by default)
#[cfg(feature = "json")]
pub use codec::JsonCodec;
