//! # Worker state tracker with sequence-based ordering.
//!
//! Maintains the last observed state of every worker, using event sequence
//! numbers to handle out-of-order delivery.
//!
//! ## Architecture
//! ```text
//! Worker ──► Bus ──► subscriber_listener() ──► SubscriberSet ──► WorkerTracker::update()
//!                                                                       │
//!                                                                       ▼
//!                                                         HashMap<u8, WorkerEntry>
//!                                                           (id → {seq, state})
//! ```
//!
//! ## Transitions
//! ```text
//! WorkerStarting ──► Idle
//! MessageReceived ─► Processing
//! MessageAcked / DecodeFailed / ExecuteFailed / EncodeFailed ──► Idle
//! WorkerStopped ──► Stopped
//! ```
//! `PublishFailed` is followed by `MessageAcked`, so it does not change state.
//!
//! ## Rules
//! - Read operations (`snapshot`, `state`) are **eventually consistent**
//! - Events with `seq <= last_seq` are **rejected** (stale)

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Observed state of one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Waiting for a message or cancellation.
    Idle,
    /// Running the pipeline for one message.
    Processing,
    /// Left its loop (terminal).
    Stopped,
}

#[derive(Debug, Clone)]
struct WorkerEntry {
    last_seq: u64,
    state: WorkerState,
}

/// Thread-safe tracker of worker states.
///
/// Installed by default in every [`Pool`](crate::Pool); the pool uses it to name
/// stuck workers when the shutdown grace period is exceeded.
#[derive(Default)]
pub struct WorkerTracker {
    state: RwLock<HashMap<u8, WorkerEntry>>,
}

impl WorkerTracker {
    /// Creates a new empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies an event if it is newer than the last one seen for its worker.
    ///
    /// Returns `true` if the worker's state changed.
    pub async fn update(&self, ev: &Event) -> bool {
        let Some(id) = ev.worker else {
            return false;
        };
        let next = match ev.kind {
            EventKind::WorkerStarting => Some(WorkerState::Idle),
            EventKind::MessageReceived => Some(WorkerState::Processing),
            EventKind::MessageAcked
            | EventKind::DecodeFailed
            | EventKind::ExecuteFailed
            | EventKind::EncodeFailed => Some(WorkerState::Idle),
            EventKind::WorkerStopped => Some(WorkerState::Stopped),
            _ => None,
        };

        let mut state = self.state.write().await;
        let entry = state.entry(id).or_insert(WorkerEntry {
            last_seq: 0,
            state: WorkerState::Idle,
        });
        if ev.seq <= entry.last_seq {
            return false;
        }
        entry.last_seq = ev.seq;

        match next {
            Some(s) if s != entry.state => {
                entry.state = s;
                true
            }
            _ => false,
        }
    }

    /// Returns the last observed state of a worker, if it was ever seen.
    pub async fn state(&self, id: u8) -> Option<WorkerState> {
        self.state.read().await.get(&id).map(|e| e.state)
    }

    /// Returns sorted ids of workers not yet observed as stopped.
    pub async fn snapshot(&self) -> Vec<u8> {
        let state = self.state.read().await;
        let mut live: Vec<u8> = state
            .iter()
            .filter(|(_, e)| e.state != WorkerState::Stopped)
            .map(|(id, _)| *id)
            .collect();
        live.sort_unstable();
        live
    }
}

#[async_trait]
impl Subscribe for WorkerTracker {
    async fn on_event(&self, event: &Event) {
        self.update(event).await;
    }

    fn name(&self) -> &'static str {
        "WorkerTracker"
    }
}
