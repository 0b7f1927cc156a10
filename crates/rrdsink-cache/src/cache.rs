// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The write-coalescing cache.
//!
//! One entry per archive path accumulates formatted update lines until the
//! batch spans `cache_timeout` seconds of sample time, at which point the
//! path is pushed onto the flush queue for the worker. Periodic sweeps push
//! aging batches that never reached the threshold and remove entries that
//! have been idle and empty past the flush deadline.
//!
//! # Locking
//!
//! The cache exposes a single lock; the flush queue has its own. When both
//! must be held, the cache lock is acquired first and released last. All
//! enqueues in this module happen while holding the cache lock, so no
//! thread can observe a queued path without its entry being marked
//! [`EntryState::Queued`].
//!
//! # Per-entry state machine
//!
//! ```text
//!         insert past timeout,
//!         or swept while non-empty
//! Idle ────────────────────────────▶ Queued
//!   ▲                                  │
//!   └──────────────────────────────────┘
//!         worker handoff (batch taken)
//!
//! removal: swept while idle and empty, or cache teardown
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use tracing::{debug, warn};

use rrdsink_core::error::CacheError;

use crate::queue::FlushQueue;
use crate::stats::{CacheStats, CacheStatsInner};

// =============================================================================
// Entry
// =============================================================================

/// Flush state of one cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    /// Accumulating; not on the flush queue.
    Idle,
    /// On the flush queue, awaiting the worker's handoff.
    Queued,
}

/// One pending batch: the update lines accumulated for a single archive.
#[derive(Debug)]
struct CacheEntry {
    /// Formatted update lines, oldest first.
    values: Vec<String>,
    /// Timestamp of the oldest line; `Some` iff `values` is non-empty.
    first_value: Option<i64>,
    /// Newest accepted timestamp. Survives handoff so monotonicity holds
    /// across batches.
    last_value: Option<i64>,
    /// Flush state.
    state: EntryState,
}

impl Default for CacheEntry {
    fn default() -> Self {
        Self {
            values: Vec::new(),
            first_value: None,
            last_value: None,
            state: EntryState::Idle,
        }
    }
}

/// An inspection snapshot of one entry, for hosts and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryView {
    /// Number of pending update lines.
    pub pending: usize,
    /// Timestamp of the oldest pending line.
    pub first_value: Option<i64>,
    /// Newest accepted timestamp.
    pub last_value: Option<i64>,
    /// Flush state.
    pub state: EntryState,
}

// =============================================================================
// Cache
// =============================================================================

struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    /// Cleared by the worker's final teardown; inserts fail afterwards.
    open: bool,
    /// Unix time of the last sweep.
    last_sweep: i64,
}

/// The keyed store of pending batches.
///
/// Thread-safe; every mutation happens under the single internal lock.
/// Enqueueing onto the [`FlushQueue`] nests the queue lock inside the cache
/// lock, never the other way around.
pub struct UpdateCache {
    inner: Mutex<CacheInner>,
    queue: Arc<FlushQueue>,
    cache_timeout: i64,
    cache_flush_timeout: i64,
    stats: CacheStatsInner,
}

impl UpdateCache {
    /// Creates a cache feeding the given flush queue.
    ///
    /// `cache_timeout` is the sample-time span a batch accumulates before
    /// it is queued; `cache_flush_timeout` is the wall-clock interval
    /// between automatic sweeps. A `cache_timeout` of zero queues every
    /// insert immediately.
    pub fn new(cache_timeout: i64, cache_flush_timeout: i64, queue: Arc<FlushQueue>) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                open: true,
                last_sweep: Utc::now().timestamp(),
            }),
            queue,
            cache_timeout,
            cache_flush_timeout,
            stats: CacheStatsInner::new(),
        }
    }

    /// Inserts one formatted update line for `path`.
    ///
    /// Rejects samples whose timestamp does not advance past the newest one
    /// already accepted for the path; the entry is left untouched. On
    /// success the entry is queued if its batch now spans `cache_timeout`
    /// seconds, and an automatic sweep runs if one is due.
    pub fn insert(&self, path: &str, line: &str, value_time: i64) -> Result<(), CacheError> {
        let mut inner = self.inner.lock();
        if !inner.open {
            return Err(CacheError::Closed);
        }

        let created = !inner.entries.contains_key(path);
        let entry = inner.entries.entry(path.to_string()).or_default();

        if let Some(last) = entry.last_value {
            if value_time <= last {
                drop(inner);
                self.stats.record_rejected();
                warn!(
                    path,
                    last_value = last,
                    value_time,
                    "dropping non-monotonic sample"
                );
                return Err(CacheError::NonMonotonic {
                    path: path.to_string(),
                    last,
                    attempted: value_time,
                });
            }
        }

        entry.values.push(line.to_string());
        let first = *entry.first_value.get_or_insert(value_time);
        entry.last_value = Some(value_time);

        let should_queue =
            value_time - first >= self.cache_timeout && entry.state == EntryState::Idle;
        if should_queue {
            entry.state = EntryState::Queued;
        }
        let pending = entry.values.len();

        if created {
            self.stats.record_entry_created();
        }
        self.stats.record_insert();

        if should_queue {
            self.queue.push(path);
            self.stats.record_enqueue();
            debug!(path, pending, "queued archive for flushing");
        }

        if self.cache_timeout > 0 {
            let now = Utc::now().timestamp();
            if now - inner.last_sweep > self.cache_flush_timeout {
                self.sweep_locked(&mut inner, self.cache_flush_timeout, now);
            }
        }

        Ok(())
    }

    /// Sweeps the cache with the given deadline in seconds.
    ///
    /// Queued entries are skipped. Entries whose oldest pending line is
    /// younger than the deadline are skipped. Everything else is queued if
    /// it holds lines, removed if it is empty. A negative deadline (used at
    /// shutdown) forces every idle entry out.
    pub fn sweep(&self, deadline: i64) {
        let mut inner = self.inner.lock();
        if !inner.open {
            return;
        }
        let now = Utc::now().timestamp();
        self.sweep_locked(&mut inner, deadline, now);
    }

    fn sweep_locked(&self, inner: &mut CacheInner, deadline: i64, now: i64) {
        let mut evict: Vec<String> = Vec::new();
        let mut queued = 0usize;

        for (path, entry) in inner.entries.iter_mut() {
            if entry.state == EntryState::Queued {
                continue;
            }
            if let Some(first) = entry.first_value {
                if now - first < deadline {
                    continue;
                }
            }
            if !entry.values.is_empty() {
                entry.state = EntryState::Queued;
                self.queue.push(path);
                self.stats.record_enqueue();
                queued += 1;
            } else {
                evict.push(path.clone());
            }
        }

        for path in &evict {
            inner.entries.remove(path);
        }

        inner.last_sweep = now;
        self.stats.record_sweep(evict.len() as u64, now);

        debug!(deadline, queued, evicted = evict.len(), "swept cache");
    }

    /// Takes the pending batch for a queued path, resetting the entry to
    /// idle and empty. Called by the flush worker after dequeueing.
    ///
    /// Returns `None` when the entry no longer exists (possible only after
    /// teardown); the newest accepted timestamp is kept so later inserts
    /// remain monotonic across the handoff.
    pub fn take_batch(&self, path: &str) -> Option<Vec<String>> {
        let mut inner = self.inner.lock();
        let entry = inner.entries.get_mut(path)?;

        let batch = std::mem::take(&mut entry.values);
        entry.first_value = None;
        entry.state = EntryState::Idle;

        Some(batch)
    }

    /// Tears the cache down: removes every entry and refuses further
    /// inserts. Called once by the flush worker on its way out.
    pub fn close(&self) {
        let mut inner = self.inner.lock();
        let remaining = inner.entries.len();
        inner.entries.clear();
        inner.open = false;
        debug!(remaining, "cache torn down");
    }

    /// Returns `true` until [`close`](Self::close) has run.
    pub fn is_open(&self) -> bool {
        self.inner.lock().open
    }

    /// Returns the number of live entries.
    pub fn entry_count(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Returns an inspection snapshot of one entry.
    pub fn inspect(&self, path: &str) -> Option<EntryView> {
        let inner = self.inner.lock();
        inner.entries.get(path).map(|entry| EntryView {
            pending: entry.values.len(),
            first_value: entry.first_value,
            last_value: entry.last_value,
            state: entry.state,
        })
    }

    /// Returns a statistics snapshot.
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot()
    }

    pub(crate) fn stats_ref(&self) -> &CacheStatsInner {
        &self.stats
    }
}

impl std::fmt::Debug for UpdateCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("UpdateCache")
            .field("entries", &inner.entries.len())
            .field("open", &inner.open)
            .field("cache_timeout", &self.cache_timeout)
            .field("cache_flush_timeout", &self.cache_flush_timeout)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
