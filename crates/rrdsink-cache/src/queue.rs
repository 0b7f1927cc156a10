// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The flush queue.
//!
//! An unbounded FIFO of archive paths with wake-on-push semantics: the
//! cache pushes a path when an entry's batch is due, and the single flush
//! worker blocks on [`FlushQueue::pop_blocking`] until work or shutdown
//! arrives.
//!
//! The queue owns its own lock. Where the cache lock and the queue lock are
//! both needed, the cache lock is acquired first and released last; nothing
//! in this module ever takes the cache lock.

use std::collections::VecDeque;

use parking_lot::{Condvar, Mutex};

// =============================================================================
// Flush Queue
// =============================================================================

struct QueueInner {
    items: VecDeque<String>,
    shutdown: bool,
}

/// An unbounded FIFO of archive paths awaiting a flush.
pub struct FlushQueue {
    inner: Mutex<QueueInner>,
    cond: Condvar,
}

impl FlushQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(QueueInner {
                items: VecDeque::new(),
                shutdown: false,
            }),
            cond: Condvar::new(),
        }
    }

    /// Appends a path and wakes the worker.
    pub fn push(&self, path: &str) {
        let mut inner = self.inner.lock();
        inner.items.push_back(path.to_string());
        self.cond.notify_one();
    }

    /// Blocks until an item is available or shutdown is signalled.
    ///
    /// Returns `None` only once the queue is drained after shutdown; queued
    /// items are always delivered first, so a shutdown never discards work.
    pub fn pop_blocking(&self) -> Option<String> {
        let mut inner = self.inner.lock();
        while inner.items.is_empty() && !inner.shutdown {
            self.cond.wait(&mut inner);
        }
        inner.items.pop_front()
    }

    /// Removes and returns the head without blocking.
    pub fn try_pop(&self) -> Option<String> {
        self.inner.lock().items.pop_front()
    }

    /// Sets the shutdown flag and wakes every waiter.
    pub fn signal_shutdown(&self) {
        let mut inner = self.inner.lock();
        inner.shutdown = true;
        self.cond.notify_all();
    }

    /// Returns `true` once shutdown has been signalled.
    pub fn is_shutdown(&self) -> bool {
        self.inner.lock().shutdown
    }

    /// Returns the number of queued paths.
    pub fn len(&self) -> usize {
        self.inner.lock().items.len()
    }

    /// Returns `true` if no paths are queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for FlushQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FlushQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("FlushQueue")
            .field("len", &inner.items.len())
            .field("shutdown", &inner.shutdown)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_fifo_order() {
        let queue = FlushQueue::new();
        queue.push("a.rrd");
        queue.push("b.rrd");
        queue.push("c.rrd");

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.try_pop().as_deref(), Some("a.rrd"));
        assert_eq!(queue.try_pop().as_deref(), Some("b.rrd"));
        assert_eq!(queue.try_pop().as_deref(), Some("c.rrd"));
        assert_eq!(queue.try_pop(), None);
    }

    #[test]
    fn test_pop_blocking_drains_before_shutdown() {
        let queue = FlushQueue::new();
        queue.push("a.rrd");
        queue.signal_shutdown();

        assert_eq!(queue.pop_blocking().as_deref(), Some("a.rrd"));
        assert_eq!(queue.pop_blocking(), None);
    }

    #[test]
    fn test_push_wakes_blocked_popper() {
        let queue = Arc::new(FlushQueue::new());

        let popper = {
            let queue = queue.clone();
            std::thread::spawn(move || queue.pop_blocking())
        };

        // Give the popper time to block, then push.
        std::thread::sleep(Duration::from_millis(50));
        queue.push("late.rrd");

        assert_eq!(popper.join().unwrap().as_deref(), Some("late.rrd"));
    }

    #[test]
    fn test_shutdown_wakes_blocked_popper() {
        let queue = Arc::new(FlushQueue::new());

        let popper = {
            let queue = queue.clone();
            std::thread::spawn(move || queue.pop_blocking())
        };

        std::thread::sleep(Duration::from_millis(50));
        queue.signal_shutdown();

        assert_eq!(popper.join().unwrap(), None);
        assert!(queue.is_shutdown());
    }
}
