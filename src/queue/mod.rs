//! Queue implementations
//!
//! This module provides the FIFO queue family measured by the benchmark
//! harness, all behind the [`ConcurrentQueue`] contract.
//!
//! ## Available Queues
//!
//! - [`LockFreeQueue`]: Michael-Scott queue, CAS on `head`/`tail` only
//! - [`BlockingQueue`]: one coarse mutex plus a condition variable
//! - [`ReferenceQueue`]: `crossbeam_queue::SegQueue` baseline
//!
//! ## Ordering Guarantees
//!
//! Every implementation keeps items from the same producer thread in the
//! order that thread enqueued them. Order across producers follows the
//! implementation's linearization: the successful `tail.next` CAS for the
//! lock-free queue, mutex acquisition order for the blocking queue.
//!
//! | Queue | Enqueue | Dequeue | Blocks | Linearization point |
//! |-------|---------|---------|--------|---------------------|
//! | LockFreeQueue | O(1) | O(1) | never | CAS on `tail.next` / `head` |
//! | BlockingQueue | O(1) | O(1) | `dequeue` only | lock acquisition |
//!
//! ## Examples
//!
//! ```rust
//! use queuebench::queue::{BlockingQueue, ConcurrentQueue, LockFreeQueue};
//! use std::sync::Arc;
//!
//! let queues: Vec<Arc<dyn ConcurrentQueue<u64>>> = vec![
//!     Arc::new(LockFreeQueue::<u64>::new()),
//!     Arc::new(BlockingQueue::<u64>::new()),
//! ];
//!
//! for queue in &queues {
//!     queue.enqueue(7);
//!     assert_eq!(queue.len(), 1);
//!     assert_eq!(queue.try_dequeue(), Some(7));
//!     assert!(queue.is_empty());
//! }
//! ```
pub mod blocking;
pub mod lock_free;
pub mod reference;

pub use blocking::BlockingQueue;
pub use lock_free::LockFreeQueue;
pub use reference::ReferenceQueue;

/// Operations every FIFO queue in this crate provides.
///
/// The trait is object safe; the harness holds queues as
/// `Arc<dyn ConcurrentQueue<u64>>`.
pub trait ConcurrentQueue<T>: Send + Sync {
    /// Insert `item` at the logical tail.
    ///
    /// Never blocks and never fails. Allocation failure aborts the process.
    /// Once this returns, the item is visible to a `try_dequeue` on any
    /// thread that synchronizes with the caller.
    fn enqueue(&self, item: T);

    /// Remove and return the logical head, or `None` if the queue is empty.
    ///
    /// Never blocks.
    fn try_dequeue(&self) -> Option<T>;

    /// Whether the queue looked empty at some instant during the call.
    ///
    /// Under concurrent mutation the answer may be stale by the time it is
    /// returned; treat it as a liveness hint.
    fn is_empty(&self) -> bool;

    /// Number of queued items at some instant during the call.
    ///
    /// Same staleness caveat as [`is_empty`](Self::is_empty).
    fn len(&self) -> usize;

    /// Implementation name used in benchmark reports.
    fn name(&self) -> &'static str;
}

// Include test modules
#[cfg(test)]
mod tests;

#[cfg(test)]
mod proptests;
