//! Blocking Queue
//!
//! A singly linked list with separate head and tail pointers, guarded by one
//! coarse [`Mutex`]. Every enqueue and dequeue serializes on that lock; there
//! is no reader/writer split. A [`Condvar`] lets consumers sleep until an
//! item arrives or the queue is closed.
//!
//! Two dequeue flavours share the same list:
//!
//! - [`try_dequeue`](BlockingQueue::try_dequeue) returns `None` at once when
//!   the list is empty; this is what the benchmark harness uses
//! - [`dequeue`](BlockingQueue::dequeue) and
//!   [`dequeue_timeout`](BlockingQueue::dequeue_timeout) wait on the condition
//!   variable, signalled by every `enqueue` and by [`close`](BlockingQueue::close)

use crate::queue::ConcurrentQueue;
use core::fmt;
use core::marker::PhantomData;
use core::ptr::NonNull;
use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};

struct Node<T> {
    value: T,
    next: Option<NonNull<Node<T>>>,
}

/// The list itself. Only ever touched while the queue's mutex is held.
struct Chain<T> {
    head: Option<NonNull<Node<T>>>,
    tail: Option<NonNull<Node<T>>>,
    len: usize,
    closed: bool,
    _owns: PhantomData<Box<Node<T>>>,
}

// SAFETY: the chain exclusively owns its nodes; moving it moves the values.
unsafe impl<T: Send> Send for Chain<T> {}

impl<T> Chain<T> {
    const fn new() -> Self {
        Self {
            head: None,
            tail: None,
            len: 0,
            closed: false,
            _owns: PhantomData,
        }
    }

    fn push_back(&mut self, value: T) {
        let node = NonNull::from(Box::leak(Box::new(Node { value, next: None })));
        match self.tail {
            // SAFETY: `tail` is the last live node of this chain.
            Some(tail) => unsafe { (*tail.as_ptr()).next = Some(node) },
            None => self.head = Some(node),
        }
        self.tail = Some(node);
        self.len += 1;
    }

    fn pop_front(&mut self) -> Option<T> {
        self.head.map(|head| {
            // SAFETY: `head` was leaked from a Box in `push_back` and is
            // unlinked here exactly once.
            let node = unsafe { Box::from_raw(head.as_ptr()) };
            self.head = node.next;
            if self.head.is_none() {
                self.tail = None;
            }
            self.len -= 1;
            node.value
        })
    }

    fn front(&self) -> Option<&T> {
        // SAFETY: `head` is live for as long as `self` is borrowed.
        self.head.map(|head| unsafe { &(*head.as_ptr()).value })
    }
}

impl<T> Drop for Chain<T> {
    fn drop(&mut self) {
        while self.pop_front().is_some() {}
    }
}

/// A mutex-protected FIFO queue with blocking and non-blocking dequeue.
///
/// # Examples
///
/// ```rust
/// use queuebench::queue::BlockingQueue;
/// use std::sync::Arc;
/// use std::thread;
///
/// let queue = Arc::new(BlockingQueue::new());
///
/// let consumer = thread::spawn({
///     let queue = Arc::clone(&queue);
///     move || {
///         let mut received = Vec::new();
///         while let Some(value) = queue.dequeue() {
///             received.push(value);
///         }
///         received
///     }
/// });
///
/// for i in 0..5 {
///     queue.enqueue(i);
/// }
/// queue.close();
///
/// assert_eq!(consumer.join().unwrap(), vec![0, 1, 2, 3, 4]);
/// ```
pub struct BlockingQueue<T> {
    chain: Mutex<Chain<T>>,
    item_available: Condvar,
}

impl<T> BlockingQueue<T> {
    /// Create an empty, open queue.
    pub fn new() -> Self {
        Self {
            chain: Mutex::new(Chain::new()),
            item_available: Condvar::new(),
        }
    }

    /// Append `value` at the tail and wake one waiting consumer.
    ///
    /// Accepted even after [`close`](Self::close); consumers drain the
    /// remaining items before observing the close.
    pub fn enqueue(&self, value: T) {
        self.chain.lock().push_back(value);
        self.item_available.notify_one();
    }

    /// Remove the head item without waiting.
    pub fn try_dequeue(&self) -> Option<T> {
        self.chain.lock().pop_front()
    }

    /// Remove the head item, waiting for one if the queue is empty.
    ///
    /// Returns `None` only once the queue is closed and empty.
    pub fn dequeue(&self) -> Option<T> {
        let mut chain = self.chain.lock();
        loop {
            if let Some(value) = chain.pop_front() {
                return Some(value);
            }
            if chain.closed {
                return None;
            }
            self.item_available.wait(&mut chain);
        }
    }

    /// Like [`dequeue`](Self::dequeue), giving up after `timeout`.
    pub fn dequeue_timeout(&self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now() + timeout;
        let mut chain = self.chain.lock();
        loop {
            if let Some(value) = chain.pop_front() {
                return Some(value);
            }
            if chain.closed {
                return None;
            }
            if self
                .item_available
                .wait_until(&mut chain, deadline)
                .timed_out()
            {
                return chain.pop_front();
            }
        }
    }

    /// Stop blocked consumers.
    ///
    /// Every thread waiting in [`dequeue`](Self::dequeue) wakes up, drains
    /// what is left and then receives `None`.
    pub fn close(&self) {
        self.chain.lock().closed = true;
        self.item_available.notify_all();
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.chain.lock().closed
    }

    /// Clone of the head item without removing it.
    pub fn peek(&self) -> Option<T>
    where
        T: Clone,
    {
        self.chain.lock().front().cloned()
    }

    /// Number of queued items.
    pub fn len(&self) -> usize {
        self.chain.lock().len
    }

    /// Whether the queue holds no items.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for BlockingQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for BlockingQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let chain = self.chain.lock();
        f.debug_struct("BlockingQueue")
            .field("len", &chain.len)
            .field("closed", &chain.closed)
            .finish()
    }
}

impl<T: Send> ConcurrentQueue<T> for BlockingQueue<T> {
    #[inline]
    fn enqueue(&self, item: T) {
        BlockingQueue::enqueue(self, item)
    }

    #[inline]
    fn try_dequeue(&self) -> Option<T> {
        BlockingQueue::try_dequeue(self)
    }

    #[inline]
    fn is_empty(&self) -> bool {
        BlockingQueue::is_empty(self)
    }

    #[inline]
    fn len(&self) -> usize {
        BlockingQueue::len(self)
    }

    fn name(&self) -> &'static str {
        "BlockingQueue"
    }
}
