use std::sync::Arc;

use crate::{
    broker::Broker,
    codec::Codec,
    core::{Config, pool::Pool},
    jobs::Job,
    subscribers::{LogWriter, Subscribe, WorkerTracker},
};

/// Builder for constructing a [`Pool`] with extra subscribers.
pub struct PoolBuilder<B: ?Sized, J, C> {
    cfg: Config,
    broker: Arc<B>,
    job: Arc<J>,
    codec: Arc<C>,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl<B, J, C> PoolBuilder<B, J, C>
where
    B: Broker + ?Sized,
    J: Job,
    C: Codec,
{
    /// Creates a new builder with the given configuration and collaborators.
    pub fn new(cfg: Config, broker: Arc<B>, job: Arc<J>, codec: Arc<C>) -> Self {
        Self {
            cfg,
            broker,
            job,
            codec,
            subscribers: Vec::new(),
        }
    }

    /// Adds event subscribers.
    ///
    /// They run next to the built-in [`LogWriter`] and [`WorkerTracker`],
    /// each through a dedicated worker with a bounded queue.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers.extend(subscribers);
        self
    }

    /// Builds the pool. Nothing is spawned until the pool runs.
    pub fn build(self) -> Pool<B, J, C> {
        let tracker = Arc::new(WorkerTracker::new());

        let mut subscribers: Vec<Arc<dyn Subscribe>> =
            Vec::with_capacity(self.subscribers.len() + 2);
        subscribers.push(Arc::new(LogWriter::new()));
        subscribers.push(tracker.clone());
        subscribers.extend(self.subscribers);

        Pool::from_parts(
            self.cfg,
            self.broker,
            self.job,
            self.codec,
            subscribers,
            tracker,
        )
    }
}
