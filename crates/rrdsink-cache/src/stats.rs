// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Lock-free cache statistics.
//!
//! All counters are atomics so recording never contends with the cache
//! lock; [`CacheStatsInner::snapshot`] produces an immutable, serializable
//! view for the host.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Internal Counters
// =============================================================================

/// Live statistics counters, updated by the cache and the flush worker.
#[derive(Debug, Default)]
pub struct CacheStatsInner {
    /// Update lines accepted into the cache (cumulative).
    lines_inserted: AtomicU64,
    /// Samples rejected for non-monotonic timestamps (cumulative).
    rejected_samples: AtomicU64,
    /// Cache entries created (cumulative).
    entries_created: AtomicU64,
    /// Archive paths pushed onto the flush queue (cumulative).
    enqueues: AtomicU64,
    /// Batches successfully applied by the worker (cumulative).
    batches_flushed: AtomicU64,
    /// Update lines successfully applied by the worker (cumulative).
    lines_flushed: AtomicU64,
    /// Engine update failures (cumulative).
    flush_errors: AtomicU64,
    /// Idle, empty entries removed by sweeps (cumulative).
    entries_evicted: AtomicU64,
    /// Sweep passes performed (cumulative).
    sweeps: AtomicU64,
    /// Unix time of the last sweep, 0 when none has run.
    last_sweep_unix: AtomicI64,
}

impl CacheStatsInner {
    /// Creates zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an accepted insert.
    #[inline]
    pub fn record_insert(&self) {
        self.lines_inserted.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a non-monotonic rejection.
    #[inline]
    pub fn record_rejected(&self) {
        self.rejected_samples.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a newly created cache entry.
    #[inline]
    pub fn record_entry_created(&self) {
        self.entries_created.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a path pushed onto the flush queue.
    #[inline]
    pub fn record_enqueue(&self) {
        self.enqueues.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a successfully flushed batch of `lines` update lines.
    #[inline]
    pub fn record_batch_flushed(&self, lines: u64) {
        self.batches_flushed.fetch_add(1, Ordering::Relaxed);
        self.lines_flushed.fetch_add(lines, Ordering::Relaxed);
    }

    /// Records an engine update failure.
    #[inline]
    pub fn record_flush_error(&self) {
        self.flush_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a completed sweep pass.
    #[inline]
    pub fn record_sweep(&self, evicted: u64, now: i64) {
        self.sweeps.fetch_add(1, Ordering::Relaxed);
        self.entries_evicted.fetch_add(evicted, Ordering::Relaxed);
        self.last_sweep_unix.store(now, Ordering::Relaxed);
    }

    /// Creates an immutable snapshot.
    pub fn snapshot(&self) -> CacheStats {
        let last_sweep_unix = self.last_sweep_unix.load(Ordering::Relaxed);

        CacheStats {
            lines_inserted: self.lines_inserted.load(Ordering::Relaxed),
            rejected_samples: self.rejected_samples.load(Ordering::Relaxed),
            entries_created: self.entries_created.load(Ordering::Relaxed),
            enqueues: self.enqueues.load(Ordering::Relaxed),
            batches_flushed: self.batches_flushed.load(Ordering::Relaxed),
            lines_flushed: self.lines_flushed.load(Ordering::Relaxed),
            flush_errors: self.flush_errors.load(Ordering::Relaxed),
            entries_evicted: self.entries_evicted.load(Ordering::Relaxed),
            sweeps: self.sweeps.load(Ordering::Relaxed),
            last_sweep: DateTime::from_timestamp(last_sweep_unix, 0).filter(|_| last_sweep_unix > 0),
        }
    }
}

// =============================================================================
// Snapshot
// =============================================================================

/// Immutable snapshot of the cache statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    /// Update lines accepted into the cache.
    pub lines_inserted: u64,
    /// Samples rejected for non-monotonic timestamps.
    pub rejected_samples: u64,
    /// Cache entries created.
    pub entries_created: u64,
    /// Archive paths pushed onto the flush queue.
    pub enqueues: u64,
    /// Batches successfully applied by the worker.
    pub batches_flushed: u64,
    /// Update lines successfully applied by the worker.
    pub lines_flushed: u64,
    /// Engine update failures.
    pub flush_errors: u64,
    /// Idle, empty entries removed by sweeps.
    pub entries_evicted: u64,
    /// Sweep passes performed.
    pub sweeps: u64,
    /// Time of the last sweep, if any has run.
    pub last_sweep: Option<DateTime<Utc>>,
}

impl CacheStats {
    /// Update lines accepted but not yet applied by the worker.
    pub fn lines_pending(&self) -> u64 {
        self.lines_inserted
            .saturating_sub(self.lines_flushed)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_snapshot() {
        let stats = CacheStatsInner::new();

        stats.record_insert();
        stats.record_insert();
        stats.record_entry_created();
        stats.record_enqueue();
        stats.record_batch_flushed(2);

        let snap = stats.snapshot();
        assert_eq!(snap.lines_inserted, 2);
        assert_eq!(snap.entries_created, 1);
        assert_eq!(snap.enqueues, 1);
        assert_eq!(snap.batches_flushed, 1);
        assert_eq!(snap.lines_flushed, 2);
        assert_eq!(snap.lines_pending(), 0);
    }

    #[test]
    fn test_last_sweep_absent_until_recorded() {
        let stats = CacheStatsInner::new();
        assert!(stats.snapshot().last_sweep.is_none());

        stats.record_sweep(3, 1_700_000_000);
        let snap = stats.snapshot();
        assert_eq!(snap.entries_evicted, 3);
        assert_eq!(snap.sweeps, 1);
        assert!(snap.last_sweep.is_some());
    }

    #[test]
    fn test_lines_pending() {
        let stats = CacheStatsInner::new();
        stats.record_insert();
        stats.record_insert();
        stats.record_insert();
        stats.record_batch_flushed(1);

        assert_eq!(stats.snapshot().lines_pending(), 2);
    }
}
