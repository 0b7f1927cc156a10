// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Cache Integration Tests
//!
//! The coalescing cache, flush queue and flush worker wired together
//! against a mock engine:
//!
//! - coalescing across a timeout window and single-enqueue behavior
//! - immediate flushing with caching disabled
//! - shutdown drain semantics
//! - the no-locks-during-disk-I/O property, via a gate-blocked engine

use std::sync::Arc;
use std::time::Duration;

use rrdsink_cache::{EntryState, FlushQueue, FlushWorker, UpdateCache};
use rrdsink_engine::{MockEngine, RrdEngine};

use rrdsink_tests::common::{init_test_logging, wait_until, GateEngine};

// =============================================================================
// Helpers
// =============================================================================

struct Pipeline {
    cache: Arc<UpdateCache>,
    engine: Arc<MockEngine>,
    worker: FlushWorker,
}

fn pipeline(cache_timeout: i64) -> Pipeline {
    init_test_logging();
    let queue = Arc::new(FlushQueue::new());
    let cache = Arc::new(UpdateCache::new(
        cache_timeout,
        10 * cache_timeout,
        Arc::clone(&queue),
    ));
    let engine = Arc::new(MockEngine::new());
    let worker = FlushWorker::spawn(
        Arc::clone(&cache),
        queue,
        engine.clone() as Arc<dyn RrdEngine>,
    )
    .expect("spawn worker");
    Pipeline {
        cache,
        engine,
        worker,
    }
}

fn drain(p: Pipeline) -> Arc<MockEngine> {
    p.cache.sweep(-1);
    p.worker.shutdown();
    p.worker.join().expect("worker join");
    p.engine
}

// =============================================================================
// Coalescing
// =============================================================================

#[test]
fn test_coalescing_window_produces_one_batch() {
    let p = pipeline(300);

    // 31 samples at a 10-second cadence: the window closes at t0+300 and
    // the worker receives one batch of 31 lines.
    for i in 0..=30 {
        let t = 1000 + 10 * i;
        p.cache.insert("a.rrd", &format!("{t}:{i}"), t).unwrap();
    }

    assert!(wait_until(
        || p.engine.update_count() == 1,
        Duration::from_secs(2)
    ));

    let updates = p.engine.updates();
    assert_eq!(updates[0].len(), 2 + 31);
    assert_eq!(updates[0][1], "a.rrd");
    assert_eq!(updates[0][2], "1000:0");
    assert_eq!(updates[0][32], "1300:30");

    drain(p);
}

#[test]
fn test_lines_reach_engine_in_insert_order() {
    let p = pipeline(0);

    for t in [1000, 1010, 1020] {
        p.cache.insert("a.rrd", &format!("{t}:v"), t).unwrap();
        assert!(wait_until(
            || p.cache.inspect("a.rrd").map(|v| v.pending) == Some(0),
            Duration::from_secs(2)
        ));
    }

    let engine = drain(p);
    let times: Vec<String> = engine
        .updates()
        .iter()
        .flat_map(|u| u[2..].iter().cloned())
        .collect();
    assert_eq!(times, vec!["1000:v", "1010:v", "1020:v"]);
}

#[test]
fn test_disabled_cache_flushes_single_samples() {
    let p = pipeline(0);

    // With caching disabled every insert queues immediately; waiting for
    // the handoff between inserts makes each batch exactly one line.
    for t in [1000, 1010, 1020, 1030] {
        p.cache.insert("a.rrd", &format!("{t}:1"), t).unwrap();
        assert!(wait_until(
            || p.cache.inspect("a.rrd").map(|v| v.pending) == Some(0),
            Duration::from_secs(2)
        ));
    }

    let engine = drain(p);
    let updates = engine.updates();
    assert_eq!(updates.len(), 4);
    for update in &updates {
        assert_eq!(update.len(), 3);
    }
}

// =============================================================================
// Shutdown Drain
// =============================================================================

#[test]
fn test_shutdown_drains_every_path_once() {
    let p = pipeline(3600);

    for path_idx in 0..5 {
        let path = format!("p{path_idx}.rrd");
        for t in [1000, 1010, 1020] {
            p.cache.insert(&path, &format!("{t}:1"), t).unwrap();
        }
    }
    assert_eq!(p.engine.update_count(), 0);

    let cache = Arc::clone(&p.cache);
    let engine = drain(p);

    let updates = engine.updates();
    assert_eq!(updates.len(), 5);
    for update in &updates {
        assert_eq!(update.len(), 5);
    }
    assert!(!cache.is_open());
    assert_eq!(cache.entry_count(), 0);
}

#[test]
fn test_shutdown_with_empty_cache_exits_cleanly() {
    let p = pipeline(300);
    let cache = Arc::clone(&p.cache);
    let engine = drain(p);

    assert_eq!(engine.update_count(), 0);
    assert!(!cache.is_open());
}

// =============================================================================
// Invariants
// =============================================================================

#[test]
fn test_entry_queued_or_young_after_insert() {
    let p = pipeline(300);

    for i in 0..40 {
        let t = 1000 + 10 * i;
        p.cache.insert("a.rrd", &format!("{t}:1"), t).unwrap();

        if let Some(view) = p.cache.inspect("a.rrd") {
            if view.state == EntryState::Idle {
                if let (Some(first), Some(last)) = (view.first_value, view.last_value) {
                    assert!(last - first < 300);
                }
            }
        }
    }

    drain(p);
}

#[test]
fn test_concurrent_producers_one_winner_per_timestamp() {
    let p = pipeline(3600);
    let cache = Arc::clone(&p.cache);

    let mut handles = Vec::new();
    for _ in 0..4 {
        let cache = Arc::clone(&cache);
        handles.push(std::thread::spawn(move || {
            let mut accepted = 0usize;
            for t in 1000..1100 {
                if cache.insert("shared.rrd", &format!("{t}:1"), t).is_ok() {
                    accepted += 1;
                }
            }
            accepted
        }));
    }

    let accepted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

    // Each timestamp is accepted exactly once across all racing producers.
    assert_eq!(accepted, 100);
    assert_eq!(cache.inspect("shared.rrd").unwrap().pending, 100);

    drain(p);
}

// =============================================================================
// Locking
// =============================================================================

#[test]
fn test_engine_update_runs_outside_the_cache_lock() {
    init_test_logging();
    let queue = Arc::new(FlushQueue::new());
    let cache = Arc::new(UpdateCache::new(0, 0, Arc::clone(&queue)));
    let engine = Arc::new(GateEngine::closed());
    let worker = FlushWorker::spawn(
        Arc::clone(&cache),
        queue,
        engine.clone() as Arc<dyn RrdEngine>,
    )
    .expect("spawn worker");

    // First insert queues immediately; the worker takes the batch and
    // blocks inside the engine call.
    cache.insert("a.rrd", "1000:1", 1000).unwrap();
    assert!(wait_until(|| engine.is_in_update(), Duration::from_secs(2)));

    // While the worker sits in the engine, the cache lock must be free:
    // producers keep inserting and inspecting without blocking.
    cache.insert("a.rrd", "1010:2", 1010).unwrap();
    let view = cache.inspect("a.rrd").unwrap();
    assert_eq!(view.pending, 1);
    assert_eq!(view.last_value, Some(1010));

    engine.open();
    assert!(wait_until(
        || engine.update_count() >= 1,
        Duration::from_secs(2)
    ));

    cache.sweep(-1);
    worker.shutdown();
    worker.join().expect("worker join");

    // Both batches made it to the engine in order.
    let updates = engine.updates();
    assert_eq!(updates.len(), 2);
    assert_eq!(updates[0][2], "1000:1");
    assert_eq!(updates[1][2], "1010:2");
}
