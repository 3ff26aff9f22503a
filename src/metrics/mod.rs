//! Counters shared between concurrent workers.
//!
//! Two families live here: the per-run `pushed`/`popped` counters the
//! benchmark harness increments from every producer and consumer, and the
//! CAS contention counters of the lock-free queue. Both are updated only with
//! atomic read-modify-write operations, never under a lock, because many
//! threads read them while others are still mutating.

use crate::util::CachePadded;
use core::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Snapshot of CAS contention observed by a lock-free queue
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ContentionMetrics {
    /// CAS attempts on `head`, `tail` or `tail.next` that lost a race
    pub cas_failures: u64,
    /// Times a thread advanced a lagging `tail` on another thread's behalf
    pub tail_assists: u64,
}

impl ContentionMetrics {
    /// Failed CAS attempts per completed operation
    pub fn failures_per_operation(&self, operations: u64) -> f64 {
        if operations == 0 {
            0.0
        } else {
            self.cas_failures as f64 / operations as f64
        }
    }
}

/// Internal atomic contention collection
#[derive(Debug, Default)]
pub struct AtomicContention {
    cas_failures: AtomicU64,
    tail_assists: AtomicU64,
}

impl AtomicContention {
    /// Record a CAS that lost a race and forced a retry
    #[inline]
    pub fn record_cas_failure(&self) {
        self.cas_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a helping step on a lagging tail
    #[inline]
    pub fn record_tail_assist(&self) {
        self.tail_assists.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> ContentionMetrics {
        ContentionMetrics {
            cas_failures: self.cas_failures.load(Ordering::Relaxed),
            tail_assists: self.tail_assists.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters
    pub fn reset(&self) {
        self.cas_failures.store(0, Ordering::Relaxed);
        self.tail_assists.store(0, Ordering::Relaxed);
    }
}

/// Trait for queues that report CAS contention
pub trait ContentionStats {
    /// Get current contention metrics
    fn contention(&self) -> ContentionMetrics;

    /// Reset contention metrics
    fn reset_contention(&self);
}

/// Items pushed and popped during one benchmark run
///
/// Producers call [`record_push`](Self::record_push) after each successful
/// enqueue and consumers call [`record_pop`](Self::record_pop) after each
/// successful dequeue. The two counters sit on separate cache lines.
#[derive(Debug, Default)]
pub struct RunCounters {
    pushed: CachePadded<AtomicUsize>,
    popped: CachePadded<AtomicUsize>,
}

impl RunCounters {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one enqueued item
    #[inline]
    pub fn record_push(&self) {
        self.pushed.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one dequeued item
    #[inline]
    pub fn record_pop(&self) {
        self.popped.fetch_add(1, Ordering::Relaxed);
    }

    /// Items pushed so far
    pub fn pushed(&self) -> usize {
        self.pushed.load(Ordering::Acquire)
    }

    /// Items popped so far
    pub fn popped(&self) -> usize {
        self.popped.load(Ordering::Acquire)
    }
}
