//! Lock-Free Queue
//!
//! An unbounded multi-producer, multi-consumer FIFO following the
//! Michael-Scott two-pointer algorithm. The structure is a singly linked list
//! whose first node is always a sentinel; `head` points at the sentinel and
//! `tail` points at the last node or, transiently, at the node before it.
//!
//! ## Algorithm
//!
//! ```text
//!  head                       tail
//!   |                          |
//!   v                          v
//! [sentinel] -> [a] -> [b] -> [c] -> null
//! ```
//!
//! - **Enqueue** links a new node with a CAS on `tail.next` (null -> node),
//!   then swings `tail` with a second, best-effort CAS. A thread that finds
//!   `tail.next` already set helps by advancing `tail` before retrying.
//! - **Dequeue** swings `head` from the sentinel to its successor with a CAS;
//!   the successor becomes the new sentinel and its value is moved out by the
//!   thread that won the CAS. If `head == tail` but `head.next` is set, the
//!   tail is lagging and is advanced first.
//!
//! Every failed CAS means some other thread completed a structural step, so
//! the queue as a whole always makes progress.
//!
//! ## Memory Reclamation
//!
//! Unlinked sentinels are retired through `crossbeam-epoch`: a node is freed
//! only once every thread pinned at the time of unlinking has unpinned, so an
//! in-flight `enqueue` or `try_dequeue` never dereferences freed memory.
//!
//! ## Memory Ordering
//!
//! ```text
//! Producer (enqueue)                 Consumer (try_dequeue)
//! ------------------                 ----------------------
//! Write node value                   Load head / head.next   (Acquire)
//! CAS tail.next    (Release)  ---->  CAS head                (Release)
//!                                    Read value
//! ```

use crate::metrics::{AtomicContention, ContentionMetrics, ContentionStats};
use crate::queue::ConcurrentQueue;
use crate::util::CachePadded;
use core::fmt;
use core::mem::MaybeUninit;
use core::sync::atomic::{AtomicIsize, Ordering};
use crossbeam_epoch::{self as epoch, Atomic, Owned, Shared};

/// A node in the linked list.
///
/// The value is uninitialized for the sentinel and for every node whose value
/// has already been moved out by a dequeue.
struct Node<T> {
    value: MaybeUninit<T>,
    next: Atomic<Node<T>>,
}

/// An unbounded lock-free FIFO queue.
///
/// # Examples
///
/// ```rust
/// use queuebench::queue::LockFreeQueue;
/// use std::sync::Arc;
/// use std::thread;
///
/// let queue = Arc::new(LockFreeQueue::new());
///
/// let producer = thread::spawn({
///     let queue = Arc::clone(&queue);
///     move || {
///         for i in 0..1000 {
///             queue.enqueue(i);
///         }
///     }
/// });
///
/// let consumer = thread::spawn({
///     let queue = Arc::clone(&queue);
///     move || {
///         let mut sum = 0;
///         let mut received = 0;
///         while received < 1000 {
///             if let Some(value) = queue.try_dequeue() {
///                 sum += value;
///                 received += 1;
///             }
///         }
///         sum
///     }
/// });
///
/// producer.join().unwrap();
/// assert_eq!(consumer.join().unwrap(), 499500);
/// ```
pub struct LockFreeQueue<T> {
    /// Sentinel node; its successor holds the oldest item
    head: CachePadded<Atomic<Node<T>>>,

    /// Last node, or the one before it while an enqueue is in flight
    tail: CachePadded<Atomic<Node<T>>>,

    /// Observability only. Updated after the structural CAS, so it can lag
    /// and even dip below zero for an instant.
    size: CachePadded<AtomicIsize>,

    contention: AtomicContention,
}

// SAFETY: values are moved between threads through the queue, never shared.
unsafe impl<T: Send> Send for LockFreeQueue<T> {}
unsafe impl<T: Send> Sync for LockFreeQueue<T> {}

impl<T> LockFreeQueue<T> {
    /// Create an empty queue holding only the sentinel node.
    pub fn new() -> Self {
        let queue = Self {
            head: CachePadded::new(Atomic::null()),
            tail: CachePadded::new(Atomic::null()),
            size: CachePadded::new(AtomicIsize::new(0)),
            contention: AtomicContention::default(),
        };

        let sentinel = Owned::new(Node {
            value: MaybeUninit::uninit(),
            next: Atomic::null(),
        });

        // SAFETY: the queue is not shared yet.
        unsafe {
            let guard = epoch::unprotected();
            let sentinel = sentinel.into_shared(guard);
            queue.head.store(sentinel, Ordering::Relaxed);
            queue.tail.store(sentinel, Ordering::Relaxed);
        }

        queue
    }

    /// Append `value` at the tail.
    ///
    /// Lock-free; retries until its node is linked after the current last
    /// node. Linearizes at the successful CAS on `tail.next`.
    pub fn enqueue(&self, value: T) {
        let guard = &epoch::pin();

        let new = Owned::new(Node {
            value: MaybeUninit::new(value),
            next: Atomic::null(),
        })
        .into_shared(guard);

        loop {
            let tail = self.tail.load(Ordering::Acquire, guard);
            // SAFETY: `tail` is never null and is protected by `guard`.
            let tail_ref = unsafe { tail.deref() };
            let next = tail_ref.next.load(Ordering::Acquire, guard);

            if !next.is_null() {
                // Another enqueue linked a node but has not swung tail yet.
                let _ = self.tail.compare_exchange(
                    tail,
                    next,
                    Ordering::Release,
                    Ordering::Relaxed,
                    guard,
                );
                self.contention.record_tail_assist();
                continue;
            }

            match tail_ref.next.compare_exchange(
                Shared::null(),
                new,
                Ordering::Release,
                Ordering::Relaxed,
                guard,
            ) {
                Ok(_) => {
                    // Best effort: if this fails someone already helped.
                    let _ = self.tail.compare_exchange(
                        tail,
                        new,
                        Ordering::Release,
                        Ordering::Relaxed,
                        guard,
                    );
                    self.size.fetch_add(1, Ordering::Release);
                    return;
                }
                Err(_) => self.contention.record_cas_failure(),
            }
        }
    }

    /// Remove and return the oldest item, or `None` if the queue is empty.
    ///
    /// Never blocks. Linearizes at the successful CAS on `head`, or at the
    /// read of a null `head.next` when the queue is empty.
    pub fn try_dequeue(&self) -> Option<T> {
        let guard = &epoch::pin();

        loop {
            let head = self.head.load(Ordering::Acquire, guard);
            let tail = self.tail.load(Ordering::Acquire, guard);
            // SAFETY: `head` is never null and is protected by `guard`.
            let next = unsafe { head.deref() }.next.load(Ordering::Acquire, guard);

            // SAFETY: a non-null successor is protected by `guard`.
            let next_ref = match unsafe { next.as_ref() } {
                Some(node) => node,
                None => return None,
            };

            if head == tail {
                // Tail is lagging behind a linked node; never move head past it.
                let _ = self.tail.compare_exchange(
                    tail,
                    next,
                    Ordering::Release,
                    Ordering::Relaxed,
                    guard,
                );
                self.contention.record_tail_assist();
                continue;
            }

            match self.head.compare_exchange(
                head,
                next,
                Ordering::Release,
                Ordering::Relaxed,
                guard,
            ) {
                Ok(_) => {
                    // SAFETY: only the winner of the head CAS reads this slot,
                    // and `next` is now the sentinel so nobody reads it again.
                    // The old sentinel is unreachable; retire it.
                    let value = unsafe {
                        let value = next_ref.value.assume_init_read();
                        guard.defer_destroy(head);
                        value
                    };
                    self.size.fetch_sub(1, Ordering::Release);
                    return Some(value);
                }
                Err(_) => self.contention.record_cas_failure(),
            }
        }
    }

    /// Copy of the oldest item without removing it.
    ///
    /// Restricted to `Copy` values: a concurrent dequeue may move the value
    /// out while it is being read, which is only harmless when the value
    /// has no drop glue.
    pub fn peek(&self) -> Option<T>
    where
        T: Copy,
    {
        let guard = &epoch::pin();
        let head = self.head.load(Ordering::Acquire, guard);
        // SAFETY: `head` and its successor are protected by `guard`.
        unsafe {
            let next = head.deref().next.load(Ordering::Acquire, guard);
            next.as_ref().map(|node| node.value.assume_init_read())
        }
    }

    /// Approximate number of items.
    ///
    /// Reads the observability counter, which may trail the structure.
    #[inline]
    pub fn len(&self) -> usize {
        self.size.load(Ordering::Acquire).max(0) as usize
    }

    /// Whether the sentinel currently has no successor.
    #[inline]
    pub fn is_empty(&self) -> bool {
        let guard = &epoch::pin();
        let head = self.head.load(Ordering::Acquire, guard);
        // SAFETY: `head` is never null and is protected by `guard`.
        unsafe { head.deref() }
            .next
            .load(Ordering::Acquire, guard)
            .is_null()
    }
}

impl<T> Default for LockFreeQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for LockFreeQueue<T> {
    fn drop(&mut self) {
        // SAFETY: `&mut self` means no other thread can reach the chain.
        // Walk it iteratively so long queues do not recurse.
        unsafe {
            let guard = epoch::unprotected();
            let sentinel = self.head.load(Ordering::Relaxed, guard);
            let mut current = sentinel.deref().next.load(Ordering::Relaxed, guard);
            drop(sentinel.into_owned());

            while !current.is_null() {
                let mut node = current.into_owned();
                current = node.next.load(Ordering::Relaxed, guard);
                node.value.assume_init_drop();
            }
        }
    }
}

impl<T> fmt::Debug for LockFreeQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockFreeQueue")
            .field("len", &self.len())
            .field("contention", &self.contention.snapshot())
            .finish_non_exhaustive()
    }
}

impl<T> ContentionStats for LockFreeQueue<T> {
    fn contention(&self) -> ContentionMetrics {
        self.contention.snapshot()
    }

    fn reset_contention(&self) {
        self.contention.reset();
    }
}

impl<T: Send> ConcurrentQueue<T> for LockFreeQueue<T> {
    #[inline]
    fn enqueue(&self, item: T) {
        LockFreeQueue::enqueue(self, item)
    }

    #[inline]
    fn try_dequeue(&self) -> Option<T> {
        LockFreeQueue::try_dequeue(self)
    }

    #[inline]
    fn is_empty(&self) -> bool {
        LockFreeQueue::is_empty(self)
    }

    #[inline]
    fn len(&self) -> usize {
        LockFreeQueue::len(self)
    }

    fn name(&self) -> &'static str {
        "LockFreeQueue"
    }
}
