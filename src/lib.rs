//! # queuebench
//!
//! Interchangeable concurrent FIFO queues and a harness that measures their
//! throughput under varying producer/consumer concurrency.
//!
//! ## Queues
//!
//! - [`LockFreeQueue`]: Michael-Scott two-pointer queue driven only by CAS on
//!   `head`/`tail`, with epoch-based node reclamation
//! - [`BlockingQueue`]: singly linked list behind one mutex, with a condition
//!   variable that wakes waiting consumers
//! - [`ReferenceQueue`]: `crossbeam_queue::SegQueue` used as a baseline
//!
//! All three implement [`ConcurrentQueue`], which is the only thing the
//! benchmark harness knows about.
//!
//! ## Quick Start
//!
//! ```rust
//! use queuebench::{ConcurrentQueue, LockFreeQueue};
//!
//! let queue = LockFreeQueue::new();
//! queue.enqueue(1);
//! queue.enqueue(2);
//! assert_eq!(queue.try_dequeue(), Some(1));
//! assert_eq!(queue.try_dequeue(), Some(2));
//! assert_eq!(queue.try_dequeue(), None);
//! ```
//!
//! ## Benchmarking
//!
//! ```rust,no_run
//! use queuebench::bench::{self, BenchConfig};
//!
//! let config = BenchConfig::default();
//! for report in bench::run_matrix(&config)? {
//!     println!("{report}");
//! }
//! # Ok::<(), queuebench::Error>(())
//! ```

#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]

pub mod bench;
pub mod metrics;
pub mod queue;

pub use crate::queue::{BlockingQueue, ConcurrentQueue, LockFreeQueue, ReferenceQueue};

/// Common utilities and helper types
pub mod util {
    use core::ops::{Deref, DerefMut};

    /// Pads and aligns a value to the cache line size.
    ///
    /// Used for the queue's `head`/`tail` and for the harness counters so that
    /// producers and consumers hammering different words do not share a line.
    #[repr(align(64))]
    #[derive(Default)]
    pub struct CachePadded<T> {
        value: T,
    }

    impl<T> CachePadded<T> {
        /// Create a new cache-padded value
        #[inline]
        pub const fn new(value: T) -> Self {
            Self { value }
        }

        /// Get the inner value
        #[inline]
        pub fn into_inner(self) -> T {
            self.value
        }
    }

    impl<T> Deref for CachePadded<T> {
        type Target = T;

        #[inline]
        fn deref(&self) -> &T {
            &self.value
        }
    }

    impl<T> DerefMut for CachePadded<T> {
        #[inline]
        fn deref_mut(&mut self) -> &mut T {
            &mut self.value
        }
    }

    impl<T: core::fmt::Debug> core::fmt::Debug for CachePadded<T> {
        fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
            core::fmt::Debug::fmt(&self.value, f)
        }
    }
}

/// Error types for queuebench operations
///
/// Queue operations themselves never fail: `enqueue` is unbounded and
/// `try_dequeue` reports emptiness through `None`. Errors come from the
/// benchmark harness and its configuration.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Benchmark configuration is unusable
    #[error("invalid benchmark configuration: {0}")]
    Config(String),
    /// A queue name is not present in the registry
    #[error("unknown queue implementation `{0}`")]
    UnknownQueue(String),
    /// A run was cancelled by its timeout before completing
    #[error("run timed out (pushed: {pushed}, popped: {popped})")]
    Timeout {
        /// Items pushed before cancellation
        pushed: usize,
        /// Items popped before cancellation
        popped: usize,
    },
    /// A producer or consumer panicked; the run was cancelled
    #[error("worker panicked during run (pushed: {pushed}, popped: {popped})")]
    WorkerPanicked {
        /// Items pushed before the run stopped
        pushed: usize,
        /// Items popped before the run stopped
        popped: usize,
    },
    /// Item verification found lost, duplicated or reordered items
    #[error("item verification failed: {0}")]
    Verification(String),
    /// A worker thread could not be started
    #[error("failed to spawn worker thread")]
    Spawn(#[source] std::io::Error),
    /// A job was submitted to a worker pool that is shutting down
    #[error("worker pool is closed")]
    PoolClosed,
    /// A configuration file could not be parsed
    #[error("failed to parse configuration file")]
    ConfigFile(#[from] serde_json::Error),
    /// A configuration file could not be read
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type for queuebench operations
pub type Result<T> = core::result::Result<T, Error>;
