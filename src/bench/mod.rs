//! Producer/consumer throughput harness.
//!
//! Every selected queue runs once per (producer count, consumer count) pair
//! and scheduling model. Producers push a fixed quota of tagged items and
//! count down a latch; consumers poll [`ConcurrentQueue::try_dequeue`],
//! sleeping briefly on a miss, until the latch is set and the queue is
//! observed empty.
//!
//! # Examples
//!
//! ```rust
//! use queuebench::bench::{BenchConfig, Harness, Scheduling};
//! use std::time::Duration;
//!
//! let config = BenchConfig::default()
//!     .with_total_items(10_000)
//!     .with_counts(&[2], &[2])
//!     .with_idle_sleep(Duration::from_micros(50));
//! let harness = Harness::new(config)?;
//!
//! let entry = queuebench::bench::registry::lookup("LockFreeQueue")?;
//! let report = harness.run(entry, 2, 2, Scheduling::Pooled)?;
//! assert_eq!(report.pushed, 10_000);
//! assert_eq!(report.popped, 10_000);
//! # Ok::<(), queuebench::Error>(())
//! ```

mod config;
mod latch;
mod pool;
pub mod registry;
mod report;
pub mod verify;

pub use config::BenchConfig;
pub use latch::CountdownLatch;
pub use pool::WorkerPool;
pub use registry::QueueEntry;
pub use report::{write_report, RunReport, Scheduling};

use crate::metrics::RunCounters;
use crate::queue::ConcurrentQueue;
use crate::{Error, Result};
use core::sync::atomic::{AtomicBool, Ordering};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// State shared by every worker of one run
struct RunState {
    queue: Arc<dyn ConcurrentQueue<u64>>,
    counters: RunCounters,
    producers_done: CountdownLatch,
    consumers_done: CountdownLatch,
    cancelled: AtomicBool,
    panicked: AtomicBool,
    consumed: Mutex<Vec<Vec<u64>>>,
    items_per_producer: usize,
    idle_sleep: Duration,
    keep_items: bool,
}

/// Counts a worker down on its latch when it exits, including by panic.
/// A panic also cancels the rest of the run.
struct WorkerExit<'a> {
    state: &'a RunState,
    latch: &'a CountdownLatch,
}

impl Drop for WorkerExit<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.state.panicked.store(true, Ordering::Release);
            self.state.cancel();
        }
        self.latch.count_down();
    }
}

impl RunState {
    fn exit_guard<'a>(&'a self, latch: &'a CountdownLatch) -> WorkerExit<'a> {
        WorkerExit { state: self, latch }
    }

    fn produce(&self, producer: usize) {
        let _exit = self.exit_guard(&self.producers_done);
        debug!(producer, "producer started");
        for seq in 0..self.items_per_producer {
            if self.cancelled.load(Ordering::Relaxed) {
                break;
            }
            self.queue.enqueue(verify::tag(producer, seq));
            self.counters.record_push();
        }
        debug!(producer, "producer finished");
    }

    fn consume(&self, consumer: usize) {
        let _exit = self.exit_guard(&self.consumers_done);
        debug!(consumer, "consumer started");
        let mut kept = Vec::new();
        loop {
            if self.cancelled.load(Ordering::Relaxed) {
                break;
            }
            // Nothing is enqueued once the latch is set, so an empty
            // observation after it is final.
            if self.producers_done.is_set() && self.queue.is_empty() {
                break;
            }
            match self.queue.try_dequeue() {
                Some(item) => {
                    self.counters.record_pop();
                    if self.keep_items {
                        kept.push(item);
                    }
                }
                None => thread::sleep(self.idle_sleep),
            }
        }
        if self.keep_items {
            self.consumed.lock().push(kept);
        }
        debug!(consumer, "consumer finished");
    }

    fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Wait for every consumer, cancelling the run once `timeout` expires.
    /// Returns whether the run completed in time.
    fn await_consumers(&self, timeout: Option<Duration>) -> bool {
        match timeout {
            Some(timeout) if !self.consumers_done.wait_timeout(timeout) => {
                self.cancel();
                self.consumers_done.wait();
                false
            }
            _ => {
                self.consumers_done.wait();
                true
            }
        }
    }
}

/// Runs benchmark cells against a shared worker pool.
#[derive(Debug)]
pub struct Harness {
    config: BenchConfig,
    pool: WorkerPool,
}

impl Harness {
    /// Validate `config` and start the worker pool.
    pub fn new(config: BenchConfig) -> Result<Self> {
        config.validate()?;
        let pool = WorkerPool::new(config.pool_size())?;
        Ok(Self { config, pool })
    }

    /// Active configuration
    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    /// Run one cell against a fresh queue from `entry`.
    pub fn run(
        &self,
        entry: &QueueEntry,
        producers: usize,
        consumers: usize,
        scheduling: Scheduling,
    ) -> Result<RunReport> {
        self.run_on((entry.create)(), entry.name, producers, consumers, scheduling)
    }

    /// Run one cell against `queue`, which should be empty.
    pub fn run_on(
        &self,
        queue: Arc<dyn ConcurrentQueue<u64>>,
        name: &'static str,
        producers: usize,
        consumers: usize,
        scheduling: Scheduling,
    ) -> Result<RunReport> {
        if producers == 0 || consumers == 0 {
            return Err(Error::Config(
                "a run needs at least one producer and one consumer".into(),
            ));
        }
        if scheduling == Scheduling::Pooled && producers + consumers > self.pool.threads() {
            return Err(Error::Config(format!(
                "{producers} producers and {consumers} consumers exceed the pool of {} threads",
                self.pool.threads()
            )));
        }

        let items_per_producer = self.config.items_per_producer(producers);
        let state = Arc::new(RunState {
            queue,
            counters: RunCounters::new(),
            producers_done: CountdownLatch::new(producers),
            consumers_done: CountdownLatch::new(consumers),
            cancelled: AtomicBool::new(false),
            panicked: AtomicBool::new(false),
            consumed: Mutex::new(Vec::with_capacity(consumers)),
            items_per_producer,
            idle_sleep: self.config.idle_sleep(),
            keep_items: self.config.verify,
        });

        let start = Instant::now();
        let completed = match scheduling {
            Scheduling::Dedicated => self.run_dedicated(&state, producers, consumers)?,
            Scheduling::Pooled => self.run_pooled(&state, producers, consumers)?,
        };
        let elapsed = start.elapsed();

        let pushed = state.counters.pushed();
        let popped = state.counters.popped();
        if state.panicked.load(Ordering::Acquire) {
            error!(
                queue = name,
                scheduling = scheduling.label(),
                producers,
                consumers,
                pushed,
                popped,
                "worker panicked, run cancelled"
            );
            return Err(Error::WorkerPanicked { pushed, popped });
        }
        if !completed {
            warn!(
                queue = name,
                scheduling = scheduling.label(),
                producers,
                consumers,
                pushed,
                popped,
                "run cancelled after timeout"
            );
            return Err(Error::Timeout { pushed, popped });
        }

        let report = RunReport {
            queue: name,
            scheduling,
            producers,
            consumers,
            pushed,
            popped,
            expected: producers * items_per_producer,
            elapsed,
        };
        info!(
            queue = name,
            scheduling = scheduling.label(),
            producers,
            consumers,
            pushed,
            popped,
            elapsed_ms = report.elapsed_ms() as u64,
            "run complete"
        );
        if !report.is_balanced() {
            warn!(queue = name, pushed, popped, "pushed and popped counts differ");
        }

        if self.config.verify {
            let consumed = std::mem::take(&mut *state.consumed.lock());
            verify::verify(&consumed, producers, items_per_producer)?;
        }

        Ok(report)
    }

    /// One OS thread per worker, all joined before returning.
    fn run_dedicated(
        &self,
        state: &Arc<RunState>,
        producers: usize,
        consumers: usize,
    ) -> Result<bool> {
        let mut handles = Vec::with_capacity(producers + consumers);

        let spawned = (0..producers)
            .map(|id| {
                let state = Arc::clone(state);
                spawn_worker(format!("producer-{id}"), move || state.produce(id))
            })
            .chain((0..consumers).map(|id| {
                let state = Arc::clone(state);
                spawn_worker(format!("consumer-{id}"), move || state.consume(id))
            }))
            .try_for_each(|handle| handle.map(|handle| handles.push(handle)));

        if let Err(err) = spawned {
            state.cancel();
            join_all(handles);
            return Err(err);
        }

        // Without a timeout the joins below are the completion signal.
        let completed = match self.config.run_timeout() {
            Some(timeout) => state.await_consumers(Some(timeout)),
            None => true,
        };
        join_all(handles);
        Ok(completed)
    }

    /// Every worker as a pool job; completion observed through the consumer
    /// latch.
    fn run_pooled(&self, state: &Arc<RunState>, producers: usize, consumers: usize) -> Result<bool> {
        for id in 0..producers {
            let state_ref = Arc::clone(state);
            if let Err(err) = self.pool.execute(move || state_ref.produce(id)) {
                state.cancel();
                return Err(err);
            }
        }
        for id in 0..consumers {
            let state_ref = Arc::clone(state);
            if let Err(err) = self.pool.execute(move || state_ref.consume(id)) {
                state.cancel();
                return Err(err);
            }
        }
        Ok(state.await_consumers(self.config.run_timeout()))
    }

    /// Run every configured cell.
    pub fn run_matrix(&self) -> Result<Vec<RunReport>> {
        self.run_matrix_with(|_| Ok(()))
    }

    /// Run every configured cell, handing each report to `on_report` as soon
    /// as it is produced.
    ///
    /// Order: producer count, then consumer count, then queue, then
    /// dedicated before pooled.
    pub fn run_matrix_with<F>(&self, mut on_report: F) -> Result<Vec<RunReport>>
    where
        F: FnMut(&RunReport) -> std::io::Result<()>,
    {
        let entries = self.config.selected_queues()?;
        let mut reports = Vec::new();

        for &producers in &self.config.producer_counts {
            for &consumers in &self.config.consumer_counts {
                for entry in &entries {
                    for scheduling in Scheduling::ALL {
                        let report = self.run(entry, producers, consumers, scheduling)?;
                        on_report(&report)?;
                        reports.push(report);
                    }
                }
            }
        }
        Ok(reports)
    }
}

/// Build a harness for `config` and run its full matrix.
pub fn run_matrix(config: &BenchConfig) -> Result<Vec<RunReport>> {
    Harness::new(config.clone())?.run_matrix()
}

fn spawn_worker<F>(name: String, work: F) -> Result<JoinHandle<()>>
where
    F: FnOnce() + Send + 'static,
{
    thread::Builder::new()
        .name(name)
        .spawn(work)
        .map_err(Error::Spawn)
}

// Worker panics are already recorded by their exit guards.
fn join_all(handles: Vec<JoinHandle<()>>) {
    for handle in handles {
        let _ = handle.join();
    }
}
