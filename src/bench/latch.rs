//! One-shot countdown completion signal.

use core::fmt;
use core::sync::atomic::{AtomicUsize, Ordering};
use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// Released once [`count_down`](Self::count_down) has been called `count`
/// times.
///
/// [`is_set`](Self::is_set) is a single atomic load, cheap enough for a
/// consumer to check on every poll; [`wait`](Self::wait) parks the caller on
/// a condition variable.
pub struct CountdownLatch {
    remaining: AtomicUsize,
    lock: Mutex<()>,
    released: Condvar,
}

impl CountdownLatch {
    /// Create a latch that needs `count` signals. A zero count starts set.
    pub fn new(count: usize) -> Self {
        Self {
            remaining: AtomicUsize::new(count),
            lock: Mutex::new(()),
            released: Condvar::new(),
        }
    }

    /// Signal once. Returns `true` for the call that released the latch.
    ///
    /// Extra signals after release are ignored.
    pub fn count_down(&self) -> bool {
        let previous =
            self.remaining
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
        if previous == Ok(1) {
            let _guard = self.lock.lock();
            self.released.notify_all();
            true
        } else {
            false
        }
    }

    /// Whether every signal has arrived.
    #[inline]
    pub fn is_set(&self) -> bool {
        self.remaining.load(Ordering::Acquire) == 0
    }

    /// Signals still outstanding
    pub fn remaining(&self) -> usize {
        self.remaining.load(Ordering::Acquire)
    }

    /// Block until the latch is released.
    pub fn wait(&self) {
        let mut guard = self.lock.lock();
        while !self.is_set() {
            self.released.wait(&mut guard);
        }
    }

    /// Block until the latch is released or `timeout` passes.
    ///
    /// Returns whether the latch is set.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut guard = self.lock.lock();
        while !self.is_set() {
            if self.released.wait_until(&mut guard, deadline).timed_out() {
                return self.is_set();
            }
        }
        true
    }
}

impl fmt::Debug for CountdownLatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CountdownLatch")
            .field("remaining", &self.remaining())
            .finish()
    }
}
