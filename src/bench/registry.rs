//! Compile-time registry of the queue implementations under test.
//!
//! The harness resolves queue names through this table instead of
//! discovering types at runtime.

use crate::queue::{BlockingQueue, ConcurrentQueue, LockFreeQueue, ReferenceQueue};
use crate::{Error, Result};
use std::sync::Arc;

/// Builds a fresh, empty queue for one run
pub type QueueFactory = fn() -> Arc<dyn ConcurrentQueue<u64>>;

/// A named queue constructor
#[derive(Debug, Clone, Copy)]
pub struct QueueEntry {
    /// Name used in configuration and reports
    pub name: &'static str,
    /// Constructor
    pub create: QueueFactory,
}

fn reference_queue() -> Arc<dyn ConcurrentQueue<u64>> {
    Arc::new(ReferenceQueue::new())
}

fn blocking_queue() -> Arc<dyn ConcurrentQueue<u64>> {
    Arc::new(BlockingQueue::new())
}

fn lock_free_queue() -> Arc<dyn ConcurrentQueue<u64>> {
    Arc::new(LockFreeQueue::new())
}

/// Every benchmarked implementation, baseline first
pub static QUEUES: &[QueueEntry] = &[
    QueueEntry {
        name: "SegQueue",
        create: reference_queue,
    },
    QueueEntry {
        name: "BlockingQueue",
        create: blocking_queue,
    },
    QueueEntry {
        name: "LockFreeQueue",
        create: lock_free_queue,
    },
];

/// Find an entry by name.
pub fn lookup(name: &str) -> Result<&'static QueueEntry> {
    QUEUES
        .iter()
        .find(|entry| entry.name == name)
        .ok_or_else(|| Error::UnknownQueue(name.to_owned()))
}
