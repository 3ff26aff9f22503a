//! Baseline queue backed by `crossbeam_queue::SegQueue`.
//!
//! Not part of the measured designs; it gives the benchmark matrix a
//! well-tuned third-party number to compare against.

use crate::queue::ConcurrentQueue;
use core::fmt;
use crossbeam_queue::SegQueue;

/// [`ConcurrentQueue`] adapter over [`SegQueue`].
pub struct ReferenceQueue<T> {
    inner: SegQueue<T>,
}

impl<T> ReferenceQueue<T> {
    /// Create an empty queue.
    pub const fn new() -> Self {
        Self {
            inner: SegQueue::new(),
        }
    }
}

impl<T> Default for ReferenceQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for ReferenceQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReferenceQueue")
            .field("len", &self.inner.len())
            .finish()
    }
}

impl<T: Send> ConcurrentQueue<T> for ReferenceQueue<T> {
    #[inline]
    fn enqueue(&self, item: T) {
        self.inner.push(item);
    }

    #[inline]
    fn try_dequeue(&self) -> Option<T> {
        self.inner.pop()
    }

    #[inline]
    fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    #[inline]
    fn len(&self) -> usize {
        self.inner.len()
    }

    fn name(&self) -> &'static str {
        "SegQueue"
    }
}
