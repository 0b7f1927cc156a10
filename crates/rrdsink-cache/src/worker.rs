// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The flush worker.
//!
//! A single dedicated thread drains the flush queue. For each dequeued
//! path it takes the pending batch out of the cache under the cache lock,
//! releases the lock, and only then invokes the engine's update: disk I/O
//! never happens under a lock, which is the point of the whole indirection.
//!
//! Update failures are logged with the engine's error string and the batch
//! is discarded; the worker keeps servicing the queue. Once shutdown is
//! signalled and the queue is drained, the worker tears the cache down and
//! exits.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, info, warn};

use rrdsink_core::error::CacheError;
use rrdsink_engine::RrdEngine;

use crate::cache::UpdateCache;
use crate::queue::FlushQueue;

// =============================================================================
// Flush Worker
// =============================================================================

/// Handle to the background flush thread.
pub struct FlushWorker {
    queue: Arc<FlushQueue>,
    handle: Option<JoinHandle<()>>,
}

impl FlushWorker {
    /// Spawns the worker thread.
    ///
    /// The worker owns the final cache teardown: after it exits, the cache
    /// refuses further inserts.
    pub fn spawn(
        cache: Arc<UpdateCache>,
        queue: Arc<FlushQueue>,
        engine: Arc<dyn RrdEngine>,
    ) -> Result<Self, CacheError> {
        let thread_queue = Arc::clone(&queue);
        let handle = thread::Builder::new()
            .name("rrdsink-flush".to_string())
            .spawn(move || run(cache, thread_queue, engine))
            .map_err(|source| CacheError::WorkerSpawn { source })?;

        Ok(Self {
            queue,
            handle: Some(handle),
        })
    }

    /// Signals the worker to drain the queue once more and exit.
    ///
    /// Does not block; pair with [`join`](Self::join) to wait for the
    /// final drain.
    pub fn shutdown(&self) {
        self.queue.signal_shutdown();
    }

    /// Waits for the worker thread to finish.
    pub fn join(mut self) -> thread::Result<()> {
        match self.handle.take() {
            Some(handle) => handle.join(),
            None => Ok(()),
        }
    }

    /// Returns `true` while the worker thread is still running.
    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }
}

impl std::fmt::Debug for FlushWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlushWorker")
            .field("running", &self.is_running())
            .field("queued", &self.queue.len())
            .finish()
    }
}

// =============================================================================
// Worker Loop
// =============================================================================

fn run(cache: Arc<UpdateCache>, queue: Arc<FlushQueue>, engine: Arc<dyn RrdEngine>) {
    info!(engine = engine.name(), "flush worker started");

    while let Some(filename) = queue.pop_blocking() {
        // Handoff: swap the batch out under the cache lock, then work on it
        // with no lock held.
        let Some(batch) = cache.take_batch(&filename) else {
            debug!(filename = %filename, "queued archive has no cache entry, skipping");
            continue;
        };

        if batch.is_empty() {
            continue;
        }

        let lines = batch.len();
        let mut args = Vec::with_capacity(lines + 2);
        args.push("update".to_string());
        args.push(filename.clone());
        args.extend(batch);

        match engine.update(&args) {
            Ok(()) => {
                cache.stats_ref().record_batch_flushed(lines as u64);
                debug!(filename = %filename, lines, "applied batch");
            }
            Err(e) => {
                cache.stats_ref().record_flush_error();
                warn!(filename = %filename, lines, error = %e, "update failed, discarding batch");
            }
        }
    }

    // Shutdown with a drained queue: tear the cache down and leave.
    cache.close();
    info!("flush worker stopped");
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rrdsink_engine::MockEngine;
    use std::time::Duration;

    fn pipeline(timeout: i64) -> (Arc<UpdateCache>, Arc<FlushQueue>, Arc<MockEngine>, FlushWorker) {
        let queue = Arc::new(FlushQueue::new());
        let cache = Arc::new(UpdateCache::new(timeout, 10 * timeout, Arc::clone(&queue)));
        let engine = Arc::new(MockEngine::new());
        let worker = FlushWorker::spawn(
            Arc::clone(&cache),
            Arc::clone(&queue),
            engine.clone() as Arc<dyn RrdEngine>,
        )
        .unwrap();
        (cache, queue, engine, worker)
    }

    fn wait_until(mut cond: impl FnMut() -> bool, timeout: Duration) -> bool {
        let deadline = std::time::Instant::now() + timeout;
        while std::time::Instant::now() < deadline {
            if cond() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        cond()
    }

    #[test]
    fn test_worker_applies_queued_batch() {
        let (cache, _queue, engine, worker) = pipeline(0);

        cache.insert("a.rrd", "1000:1", 1000).unwrap();
        assert!(wait_until(|| engine.update_count() == 1, Duration::from_secs(2)));

        let updates = engine.updates();
        assert_eq!(updates[0], vec!["update", "a.rrd", "1000:1"]);

        worker.shutdown();
        worker.join().unwrap();
    }

    #[test]
    fn test_worker_drains_on_shutdown() {
        let (cache, _queue, engine, worker) = pipeline(3600);

        for path in ["a.rrd", "b.rrd", "c.rrd"] {
            for t in [1000, 1010, 1020] {
                cache.insert(path, &format!("{t}:1"), t).unwrap();
            }
        }
        assert_eq!(engine.update_count(), 0);

        cache.sweep(-1);
        worker.shutdown();
        worker.join().unwrap();

        let updates = engine.updates();
        assert_eq!(updates.len(), 3);
        for update in &updates {
            assert_eq!(update.len(), 5); // verb + filename + 3 lines
        }
        assert!(!cache.is_open());
    }

    #[test]
    fn test_worker_discards_failed_batch_and_continues() {
        let (cache, _queue, engine, worker) = pipeline(0);
        engine.set_fail_update(true);

        cache.insert("a.rrd", "1000:1", 1000).unwrap();
        assert!(wait_until(
            || cache.stats().flush_errors == 1,
            Duration::from_secs(2)
        ));
        assert_eq!(engine.update_count(), 0);

        // The batch is gone; the next sample flows through normally.
        engine.set_fail_update(false);
        cache.insert("a.rrd", "1010:2", 1010).unwrap();
        assert!(wait_until(|| engine.update_count() == 1, Duration::from_secs(2)));
        assert_eq!(engine.updates()[0], vec!["update", "a.rrd", "1010:2"]);

        worker.shutdown();
        worker.join().unwrap();
    }

    #[test]
    fn test_worker_exits_and_closes_cache() {
        let (cache, _queue, _engine, worker) = pipeline(0);

        worker.shutdown();
        worker.join().unwrap();

        assert!(!cache.is_open());
        assert!(matches!(
            cache.insert("a.rrd", "1000:1", 1000).unwrap_err(),
            CacheError::Closed
        ));
    }

    #[test]
    fn test_worker_skips_empty_batches() {
        let (cache, queue, engine, worker) = pipeline(3600);

        // A path queued with nothing pending (batch already taken) is
        // skipped without an engine invocation.
        cache.insert("a.rrd", "1000:1", 1000).unwrap();
        cache.take_batch("a.rrd").unwrap();
        queue.push("a.rrd");

        worker.shutdown();
        worker.join().unwrap();

        assert_eq!(engine.update_count(), 0);
    }
}
