//! Fixed-size worker pool for the pooled scheduling model.
//!
//! Jobs are boxed closures sent over an unbounded `crossbeam-channel`; every
//! worker pulls from the same receiver. Pooled jobs cannot be joined
//! individually, so callers signal completion themselves (see
//! [`CountdownLatch`](crate::bench::CountdownLatch)).

use crate::{Error, Result};
use core::fmt;
use crossbeam_channel::{Receiver, Sender};
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};
use tracing::{debug, error, warn};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// A pool of named worker threads executing submitted jobs.
///
/// Dropping the pool closes the job channel, lets queued jobs finish and
/// joins every worker.
///
/// # Examples
///
/// ```rust
/// use queuebench::bench::WorkerPool;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// let pool = WorkerPool::new(2)?;
/// let done = Arc::new(AtomicUsize::new(0));
/// for _ in 0..10 {
///     let done = Arc::clone(&done);
///     pool.execute(move || {
///         done.fetch_add(1, Ordering::Relaxed);
///     })?;
/// }
/// drop(pool);
/// assert_eq!(done.load(Ordering::Relaxed), 10);
/// # Ok::<(), queuebench::Error>(())
/// ```
pub struct WorkerPool {
    sender: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Start `threads` workers.
    pub fn new(threads: usize) -> Result<Self> {
        let (sender, receiver) = crossbeam_channel::unbounded::<Job>();

        let workers = (0..threads.max(1))
            .map(|id| {
                let receiver = receiver.clone();
                thread::Builder::new()
                    .name(format!("queuebench-pool-{id}"))
                    .spawn(move || worker_loop(id, receiver))
                    .map_err(Error::Spawn)
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(threads = workers.len(), "worker pool started");
        Ok(Self {
            sender: Some(sender),
            workers,
        })
    }

    /// Submit a job to run on some worker.
    pub fn execute<F>(&self, job: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.sender
            .as_ref()
            .ok_or(Error::PoolClosed)?
            .send(Box::new(job))
            .map_err(|_| Error::PoolClosed)
    }

    /// Number of worker threads
    pub fn threads(&self) -> usize {
        self.workers.len()
    }
}

fn worker_loop(id: usize, jobs: Receiver<Job>) {
    for job in jobs.iter() {
        if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
            error!(worker = id, "pooled job panicked");
        }
    }
    debug!(worker = id, "worker exiting");
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        drop(self.sender.take());
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                warn!("worker thread panicked during shutdown");
            }
        }
    }
}

impl fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("threads", &self.workers.len())
            .field("open", &self.sender.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bench::CountdownLatch;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_jobs_run_concurrently() {
        // Both jobs wait for each other, which only finishes if they run on
        // different workers at the same time.
        let pool = WorkerPool::new(2).unwrap();
        let both_started = Arc::new(CountdownLatch::new(2));
        let finished = Arc::new(CountdownLatch::new(2));

        for _ in 0..2 {
            let both_started = Arc::clone(&both_started);
            let finished = Arc::clone(&finished);
            pool.execute(move || {
                both_started.count_down();
                both_started.wait();
                finished.count_down();
            })
            .unwrap();
        }

        assert!(finished.wait_timeout(Duration::from_secs(5)));
    }

    #[test]
    fn test_panicking_job_keeps_worker_alive() {
        let pool = WorkerPool::new(1).unwrap();
        let ran = Arc::new(AtomicUsize::new(0));

        pool.execute(|| panic!("job failure")).unwrap();
        let counter = Arc::clone(&ran);
        pool.execute(move || {
            counter.fetch_add(1, Ordering::Relaxed);
        })
        .unwrap();

        drop(pool);
        assert_eq!(ran.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_thread_count() {
        let pool = WorkerPool::new(3).unwrap();
        assert_eq!(pool.threads(), 3);
        assert!(format!("{pool:?}").contains("threads: 3"));

        assert_eq!(WorkerPool::new(0).unwrap().threads(), 1);
    }
}
