// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # rrdsink-cache
//!
//! Write coalescing and deferred flushing for round-robin archive files.
//!
//! Producers insert formatted update lines keyed by archive path; the cache
//! batches them per path, guards per-path timestamp monotonicity, and hands
//! finished batches to a single background worker that applies them through
//! the RRA engine.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                                                                  │
//! │  producers ──insert──▶ UpdateCache ──push──▶ FlushQueue          │
//! │                        (cache lock)          (queue lock +       │
//! │                            ▲                  condvar)           │
//! │                            │ take_batch          │               │
//! │                            │                     ▼ pop           │
//! │                        FlushWorker ◀─────────────┘               │
//! │                            │                                     │
//! │                            └──update (no locks held)──▶ engine   │
//! │                                                                  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lock ordering is fixed: where the cache lock and the queue lock are both
//! needed, the cache lock comes first and is released last. The engine is
//! only ever invoked with no lock held.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use rrdsink_cache::{FlushQueue, FlushWorker, UpdateCache};
//! use rrdsink_engine::{MockEngine, RrdEngine};
//!
//! let queue = Arc::new(FlushQueue::new());
//! let cache = Arc::new(UpdateCache::new(300, 3000, Arc::clone(&queue)));
//! let engine = Arc::new(MockEngine::new());
//!
//! let worker = FlushWorker::spawn(
//!     Arc::clone(&cache),
//!     Arc::clone(&queue),
//!     engine.clone() as Arc<dyn RrdEngine>,
//! ).unwrap();
//!
//! cache.insert("h1/cpu/cpu.rrd", "1000:42", 1000).unwrap();
//!
//! cache.sweep(-1);
//! worker.shutdown();
//! worker.join().unwrap();
//! assert_eq!(engine.update_count(), 1);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Modules
// =============================================================================

pub mod cache;
pub mod queue;
pub mod stats;
pub mod worker;

// =============================================================================
// Re-exports
// =============================================================================

pub use cache::{EntryState, EntryView, UpdateCache};
pub use queue::FlushQueue;
pub use stats::{CacheStats, CacheStatsInner};
pub use worker::FlushWorker;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Tests
// =============================================================================
