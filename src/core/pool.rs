//! # Pool: runs workers over one subscription and drives graceful shutdown.
//!
//! The [`Pool`] owns the event bus, the subscriber list and the shared
//! collaborators (broker, job, codec). It subscribes once, spawns `concurrency`
//! workers on the shared stream, handles OS signals, and waits for every worker
//! before returning.
//!
//! ## High-level architecture
//! ```text
//! run():
//!   ShutdownSignal::install()          (SIGINT/SIGTERM, before any worker starts)
//!   run_until(signal.recv())
//!
//! run_until(shutdown):
//!   subscriber_listener(): Bus.subscribe() ─► SubscriberSet::emit(&Event)
//!   Bus.publish(PoolStarting{concurrency})
//!   broker.subscribe(token) ── Err ──► RuntimeError::Subscription (no worker started)
//!          │
//!          ▼
//!   Arc<Mutex<Receiver<Message>>>   (one stream, competing consumers)
//!      │         │           │
//!   Worker 1  Worker 2 ... Worker N      set.spawn(worker.run(stream, token.child_token()))
//!
//! Shutdown path:
//!   shutdown resolves
//!     └─► Bus.publish(ShutdownRequested)
//!     └─► token.cancel()               → every idle worker exits
//!     └─► wait_all_with_grace(cfg.grace):
//!            ├─ all joined             → Bus.publish(AllStoppedWithin)
//!            └─ grace exceeded         → Bus.publish(GraceExceeded), abort the rest
//!                                        (WorkerTracker.snapshot() for stuck workers)
//!
//! Stream closed:
//!   every worker exits on its own     → Bus.publish(AllStoppedWithin), return
//! ```
//!
//! Subscribers are flushed before `run_until` returns, so every event of the
//! run has been delivered by then.
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use workvisor::{Config, JobError, JobFn, JsonCodec, MemoryBroker, Pool};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let broker = Arc::new(MemoryBroker::default());
//!     let job = JobFn::arc(|s: String| async move { Ok::<_, JobError>(s.to_uppercase()) });
//!
//!     let pool = Pool::new(Config::with_concurrency(4), broker, job, Arc::new(JsonCodec));
//!     pool.run().await?;
//!     Ok(())
//! }
//! ```

use std::future::Future;
use std::sync::Arc;

use tokio::{
    sync::{Mutex, broadcast::error::RecvError},
    task::{JoinHandle, JoinSet},
    time,
};
use tokio_util::sync::CancellationToken;

use crate::{
    broker::Broker,
    codec::Codec,
    core::{
        builder::PoolBuilder,
        config::Config,
        shutdown::ShutdownSignal,
        worker::{SharedStream, Worker},
    },
    error::RuntimeError,
    events::{Bus, Event, EventKind},
    jobs::Job,
    subscribers::{Subscribe, SubscriberSet, WorkerTracker},
};

/// Fixed-size worker pool over one subscription stream.
pub struct Pool<B: ?Sized, J, C> {
    cfg: Config,
    broker: Arc<B>,
    job: Arc<J>,
    codec: Arc<C>,
    bus: Bus,
    subscribers: Vec<Arc<dyn Subscribe>>,
    tracker: Arc<WorkerTracker>,
}

impl<B, J, C> Pool<B, J, C>
where
    B: Broker + ?Sized,
    J: Job,
    C: Codec,
{
    /// Creates a pool with the built-in subscribers only.
    pub fn new(cfg: Config, broker: Arc<B>, job: Arc<J>, codec: Arc<C>) -> Self {
        PoolBuilder::new(cfg, broker, job, codec).build()
    }

    /// Returns a builder for a pool with extra subscribers.
    pub fn builder(
        cfg: Config,
        broker: Arc<B>,
        job: Arc<J>,
        codec: Arc<C>,
    ) -> PoolBuilder<B, J, C> {
        PoolBuilder::new(cfg, broker, job, codec)
    }

    pub(crate) fn from_parts(
        cfg: Config,
        broker: Arc<B>,
        job: Arc<J>,
        codec: Arc<C>,
        subscribers: Vec<Arc<dyn Subscribe>>,
        tracker: Arc<WorkerTracker>,
    ) -> Self {
        let bus = Bus::new(cfg.bus_capacity_clamped());
        Self {
            cfg,
            broker,
            job,
            codec,
            bus,
            subscribers,
            tracker,
        }
    }

    /// Pool configuration.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Event bus of this pool.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Worker state tracker of this pool.
    pub fn tracker(&self) -> &Arc<WorkerTracker> {
        &self.tracker
    }

    /// Runs the pool until SIGINT/SIGTERM (Ctrl-C on non-Unix), then waits for
    /// every worker to finish its current message and exit.
    ///
    /// Fails with [`RuntimeError::Signal`] if the signal listeners cannot be
    /// installed, and with [`RuntimeError::Subscription`] if the stream cannot
    /// be established. Per-message failures are only reported as events.
    pub async fn run(&self) -> Result<(), RuntimeError> {
        let signal = ShutdownSignal::install().map_err(RuntimeError::Signal)?;
        self.run_until(signal.recv()).await
    }

    /// Same lifecycle as [`run`](Self::run), with `shutdown` as the termination trigger.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<(), RuntimeError>
    where
        F: Future<Output = ()>,
    {
        let (stop_listener, listener) = self.subscriber_listener();
        let res = self.drive(shutdown).await;

        stop_listener.cancel();
        let _ = listener.await;
        res
    }

    async fn drive<F>(&self, shutdown: F) -> Result<(), RuntimeError>
    where
        F: Future<Output = ()>,
    {
        self.bus
            .publish(Event::new(EventKind::PoolStarting).with_concurrency(self.cfg.concurrency));

        let token = CancellationToken::new();
        let _cancel_on_exit = token.clone().drop_guard();

        let stream = self
            .broker
            .subscribe(token.clone())
            .await
            .map_err(RuntimeError::Subscription)?;
        let stream: SharedStream = Arc::new(Mutex::new(stream));

        let mut set = JoinSet::new();
        self.spawn_workers(&mut set, &token, &stream);
        self.drive_shutdown(&mut set, &token, shutdown).await
    }

    /// Subscribes to the bus and forwards events to the subscriber set.
    ///
    /// Once stopped, the listener drains pending events and flushes the set.
    fn subscriber_listener(&self) -> (CancellationToken, JoinHandle<()>) {
        let mut rx = self.bus.subscribe();
        let set = SubscriberSet::new(self.subscribers.clone(), self.bus.clone());
        let stop = CancellationToken::new();
        let stopped = stop.clone();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    msg = rx.recv() => match msg {
                        Ok(ev) => set.emit(&ev),
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "event listener lagged");
                        }
                        Err(RecvError::Closed) => break,
                    },
                    _ = stopped.cancelled() => break,
                }
            }
            set.shutdown().await;
        });
        (stop, handle)
    }

    fn spawn_workers(
        &self,
        set: &mut JoinSet<()>,
        token: &CancellationToken,
        stream: &SharedStream,
    ) {
        for id in 1..=self.cfg.concurrency {
            let worker = Worker::new(
                id,
                Arc::clone(&self.broker),
                Arc::clone(&self.job),
                Arc::clone(&self.codec),
                self.bus.clone(),
            );
            set.spawn(worker.run(Arc::clone(stream), token.child_token()));
        }
    }

    /// Waits until either the shutdown trigger fires or every worker exits on its own.
    async fn drive_shutdown<F>(
        &self,
        set: &mut JoinSet<()>,
        token: &CancellationToken,
        shutdown: F,
    ) -> Result<(), RuntimeError>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            _ = shutdown => {
                self.bus.publish(Event::new(EventKind::ShutdownRequested));
                token.cancel();
                self.wait_all_with_grace(set).await
            }
            _ = join_all(set), if !set.is_empty() => {
                self.bus.publish(Event::new(EventKind::AllStoppedWithin));
                Ok(())
            }
        }
    }

    /// Waits for all workers, bounded by the configured grace (if any).
    ///
    /// On timeout, publishes [`EventKind::GraceExceeded`], aborts the remaining
    /// workers and returns [`RuntimeError::GraceExceeded`].
    async fn wait_all_with_grace(&self, set: &mut JoinSet<()>) -> Result<(), RuntimeError> {
        let Some(grace) = self.cfg.grace_limit() else {
            join_all(set).await;
            self.bus.publish(Event::new(EventKind::AllStoppedWithin));
            return Ok(());
        };

        let timed = time::timeout(grace, join_all(set)).await;
        match timed {
            Ok(()) => {
                self.bus.publish(Event::new(EventKind::AllStoppedWithin));
                Ok(())
            }
            Err(_elapsed) => {
                self.bus
                    .publish(Event::new(EventKind::GraceExceeded).with_grace(grace));
                set.abort_all();
                let stuck = self.tracker.snapshot().await;
                Err(RuntimeError::GraceExceeded { grace, stuck })
            }
        }
    }
}

/// Joins every task of the set; panicked or aborted workers count as exited.
async fn join_all(set: &mut JoinSet<()>) {
    while let Some(res) = set.join_next().await {
        if let Err(e) = res {
            if e.is_panic() {
                tracing::error!(error = %e, "worker panicked");
            }
        }
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::{
        broker::MemoryBroker,
        codec::JsonCodec,
        error::JobError,
        jobs::JobFn,
        subscribers::WorkerState,
    };

    const WAIT: Duration = Duration::from_secs(5);

    #[derive(Default)]
    struct Recorder(StdMutex<Vec<Event>>);

    impl Recorder {
        fn count(&self, kind: EventKind) -> usize {
            self.0
                .lock()
                .unwrap()
                .iter()
                .filter(|e| e.kind == kind)
                .count()
        }
    }

    #[async_trait]
    impl Subscribe for Recorder {
        async fn on_event(&self, ev: &Event) {
            self.0.lock().unwrap().push(ev.clone());
        }
        fn name(&self) -> &'static str {
            "recorder"
        }
    }

    fn uppercase() -> Arc<impl Job<In = String, Out = String>> {
        JobFn::arc(|s: String| async move {
            if s == "bad" {
                return Err(JobError::fail("rejected"));
            }
            Ok(s.to_uppercase())
        })
    }

    fn pool_with<J: Job>(
        cfg: Config,
        broker: &Arc<MemoryBroker>,
        job: Arc<J>,
        recorder: &Arc<Recorder>,
    ) -> Pool<MemoryBroker, J, JsonCodec> {
        Pool::builder(cfg, Arc::clone(broker), job, Arc::new(JsonCodec))
            .with_subscribers(vec![recorder.clone()])
            .build()
    }

    /// Polls `cond` until it holds; panics after [`WAIT`].
    async fn wait_until(mut cond: impl FnMut() -> bool) {
        time::timeout(WAIT, async {
            while !cond() {
                time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("condition not reached in time");
    }

    async fn wait_for_worker(tracker: &WorkerTracker, id: u8, state: WorkerState) {
        time::timeout(WAIT, async {
            while tracker.state(id).await != Some(state) {
                time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("worker state not reached in time");
    }

    #[tokio::test]
    async fn test_spawns_exactly_concurrency_workers() {
        for c in [1u8, 255] {
            let broker = Arc::new(MemoryBroker::new(4));
            let recorder = Arc::new(Recorder::default());
            let pool = pool_with(Config::with_concurrency(c), &broker, uppercase(), &recorder);
            let stop = CancellationToken::new();

            let (res, ()) = tokio::join!(pool.run_until(stop.clone().cancelled_owned()), async {
                let expected: Vec<u8> = (1..=c).collect();
                time::timeout(WAIT, async {
                    while pool.tracker().snapshot().await != expected {
                        time::sleep(Duration::from_millis(5)).await;
                    }
                })
                .await
                .expect("workers not started in time");
                for id in 1..=c {
                    assert_eq!(pool.tracker().state(id).await, Some(WorkerState::Idle));
                }
                stop.cancel();
            });

            res.unwrap();
            assert_eq!(recorder.count(EventKind::WorkerStarting), usize::from(c));
            assert_eq!(recorder.count(EventKind::WorkerStopped), usize::from(c));
            assert_eq!(recorder.count(EventKind::MessageReceived), 0);
            assert!(pool.tracker().snapshot().await.is_empty());
        }
    }

    #[tokio::test]
    async fn test_in_flight_message_finishes_after_shutdown() {
        let broker = Arc::new(MemoryBroker::new(16));
        let recorder = Arc::new(Recorder::default());
        let job = JobFn::arc(|s: String| async move {
            time::sleep(Duration::from_millis(200)).await;
            Ok::<_, JobError>(s.to_uppercase())
        });
        let pool = pool_with(Config::with_concurrency(1), &broker, job, &recorder);
        let stop = CancellationToken::new();

        let (res, ()) = tokio::join!(pool.run_until(stop.clone().cancelled_owned()), async {
            for i in 0..5 {
                broker.push(format!("\"m{i}\"")).await.unwrap();
            }
            wait_for_worker(pool.tracker(), 1, WorkerState::Processing).await;
            stop.cancel();
        });

        res.unwrap();
        assert_eq!(broker.published(), vec![b"\"M0\"".to_vec()]);
        assert_eq!(broker.acked(), vec![b"\"m0\"".to_vec()]);
        assert_eq!(recorder.count(EventKind::MessageReceived), 1);
        assert_eq!(recorder.count(EventKind::MessageAcked), 1);
        assert_eq!(recorder.count(EventKind::AllStoppedWithin), 1);
        assert_eq!(pool.tracker().state(1).await, Some(WorkerState::Stopped));
    }

    #[tokio::test]
    async fn test_workers_compete_for_one_stream() {
        let broker = Arc::new(MemoryBroker::new(16));
        let recorder = Arc::new(Recorder::default());
        let pool = pool_with(Config::with_concurrency(3), &broker, uppercase(), &recorder);
        let stop = CancellationToken::new();

        let (res, ()) = tokio::join!(pool.run_until(stop.clone().cancelled_owned()), async {
            for id in 1..=3 {
                wait_for_worker(pool.tracker(), id, WorkerState::Idle).await;
            }
            for i in 0..6 {
                broker.push(format!("\"m{i}\"")).await.unwrap();
            }
            wait_until(|| broker.acked().len() == 6).await;
            stop.cancel();
        });

        res.unwrap();
        let mut published = broker.published();
        published.sort();
        let expected: Vec<Vec<u8>> = (0..6).map(|i| format!("\"M{i}\"").into_bytes()).collect();
        assert_eq!(published, expected);
        assert_eq!(recorder.count(EventKind::WorkerStarting), 3);
        assert_eq!(recorder.count(EventKind::WorkerStopped), 3);
        assert_eq!(recorder.count(EventKind::ShutdownRequested), 1);
        assert_eq!(recorder.count(EventKind::AllStoppedWithin), 1);
    }

    #[tokio::test]
    async fn test_malformed_message_is_dropped_without_ack() {
        let broker = Arc::new(MemoryBroker::new(16));
        let recorder = Arc::new(Recorder::default());
        let pool = pool_with(Config::with_concurrency(2), &broker, uppercase(), &recorder);
        let stop = CancellationToken::new();

        let (res, ()) = tokio::join!(pool.run_until(stop.clone().cancelled_owned()), async {
            broker.push("\"hello\"").await.unwrap();
            broker.push("{not json").await.unwrap();
            wait_until(|| {
                broker.acked().len() == 1 && recorder.count(EventKind::DecodeFailed) == 1
            })
            .await;
            stop.cancel();
        });

        res.unwrap();
        assert_eq!(broker.published(), vec![b"\"HELLO\"".to_vec()]);
        assert_eq!(broker.acked(), vec![b"\"hello\"".to_vec()]);
        assert_eq!(recorder.count(EventKind::DecodeFailed), 1);
    }

    #[tokio::test]
    async fn test_failed_execute_keeps_worker_alive() {
        let broker = Arc::new(MemoryBroker::new(16));
        let recorder = Arc::new(Recorder::default());
        let pool = pool_with(Config::with_concurrency(1), &broker, uppercase(), &recorder);
        let stop = CancellationToken::new();

        let (res, ()) = tokio::join!(pool.run_until(stop.clone().cancelled_owned()), async {
            broker.push("\"bad\"").await.unwrap();
            broker.push("\"ok\"").await.unwrap();
            wait_until(|| broker.acked().len() == 1).await;
            stop.cancel();
        });

        res.unwrap();
        assert_eq!(broker.published(), vec![b"\"OK\"".to_vec()]);
        assert_eq!(broker.acked(), vec![b"\"ok\"".to_vec()]);
        assert_eq!(recorder.count(EventKind::ExecuteFailed), 1);
        assert_eq!(recorder.count(EventKind::MessageAcked), 1);
    }

    #[tokio::test]
    async fn test_publish_failure_still_acknowledges() {
        let broker = Arc::new(MemoryBroker::new(16));
        broker.set_publish_failing(true);
        let recorder = Arc::new(Recorder::default());
        let pool = pool_with(Config::with_concurrency(1), &broker, uppercase(), &recorder);
        let stop = CancellationToken::new();

        let (res, ()) = tokio::join!(pool.run_until(stop.clone().cancelled_owned()), async {
            broker.push("\"lost\"").await.unwrap();
            wait_until(|| broker.acked().len() == 1).await;
            stop.cancel();
        });

        res.unwrap();
        assert!(broker.published().is_empty());
        assert_eq!(recorder.count(EventKind::PublishFailed), 1);
        assert_eq!(recorder.count(EventKind::MessageAcked), 1);
    }

    #[tokio::test]
    async fn test_immediate_shutdown_stops_every_worker() {
        let broker = Arc::new(MemoryBroker::new(4));
        let recorder = Arc::new(Recorder::default());
        let pool = pool_with(Config::with_concurrency(3), &broker, uppercase(), &recorder);

        time::timeout(WAIT, pool.run_until(async {}))
            .await
            .expect("pool did not stop")
            .unwrap();

        assert_eq!(recorder.count(EventKind::PoolStarting), 1);
        assert_eq!(recorder.count(EventKind::WorkerStopped), 3);
        assert_eq!(recorder.count(EventKind::AllStoppedWithin), 1);
        assert!(pool.tracker().snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_subscription_failure_starts_no_worker() {
        let broker = Arc::new(MemoryBroker::new(4));
        broker.set_subscribe_failing(true);
        let recorder = Arc::new(Recorder::default());
        let pool = pool_with(Config::with_concurrency(2), &broker, uppercase(), &recorder);

        let err = time::timeout(WAIT, pool.run_until(std::future::pending()))
            .await
            .expect("pool did not return")
            .unwrap_err();

        assert!(matches!(err, RuntimeError::Subscription(_)));
        assert!(err.to_string().starts_with("broker: "));
        assert_eq!(recorder.count(EventKind::PoolStarting), 1);
        assert_eq!(recorder.count(EventKind::WorkerStarting), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_grace_exceeded_names_stuck_worker() {
        let broker = Arc::new(MemoryBroker::new(4));
        let recorder = Arc::new(Recorder::default());
        let job = JobFn::arc(|s: String| async move {
            time::sleep(Duration::from_secs(3600)).await;
            Ok::<_, JobError>(s)
        });
        let mut cfg = Config::with_concurrency(1);
        cfg.grace = Duration::from_millis(50);
        let pool = pool_with(cfg, &broker, job, &recorder);
        let stop = CancellationToken::new();

        let (res, ()) = tokio::join!(pool.run_until(stop.clone().cancelled_owned()), async {
            broker.push("\"slow\"").await.unwrap();
            wait_for_worker(pool.tracker(), 1, WorkerState::Processing).await;
            stop.cancel();
        });

        match res {
            Err(RuntimeError::GraceExceeded { grace, stuck }) => {
                assert_eq!(grace, Duration::from_millis(50));
                assert_eq!(stuck, vec![1]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(broker.acked().is_empty());
        assert_eq!(recorder.count(EventKind::GraceExceeded), 1);
    }

    #[tokio::test]
    async fn test_closed_stream_ends_run() {
        let broker = Arc::new(MemoryBroker::new(4));
        let recorder = Arc::new(Recorder::default());
        let pool = pool_with(Config::with_concurrency(2), &broker, uppercase(), &recorder);

        broker.push("\"last\"").await.unwrap();
        broker.close();

        time::timeout(WAIT, pool.run_until(std::future::pending()))
            .await
            .expect("pool did not stop")
            .unwrap();

        assert_eq!(broker.acked(), vec![b"\"last\"".to_vec()]);
        assert_eq!(recorder.count(EventKind::StreamClosed), 2);
        assert_eq!(recorder.count(EventKind::ShutdownRequested), 0);
        assert_eq!(recorder.count(EventKind::AllStoppedWithin), 1);
    }

    #[tokio::test]
    async fn test_zero_concurrency_waits_for_trigger() {
        let broker = Arc::new(MemoryBroker::new(4));
        let recorder = Arc::new(Recorder::default());
        let pool = pool_with(Config::with_concurrency(0), &broker, uppercase(), &recorder);

        time::timeout(
            WAIT,
            pool.run_until(time::sleep(Duration::from_millis(20))),
        )
        .await
        .expect("pool did not stop")
        .unwrap();

        assert_eq!(recorder.count(EventKind::WorkerStarting), 0);
        assert_eq!(recorder.count(EventKind::ShutdownRequested), 1);
    }
}
