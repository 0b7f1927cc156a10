// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The plugin lifecycle: init, write, shutdown.
//!
//! [`RrdSink`] is the owner value the host holds between its callbacks:
//! resolved configuration, cache, queue, worker handle and engine, created
//! together at init and dropped together.
//!
//! A `write` runs entirely on the calling (producer) thread: derive the
//! archive path, render the update line, probe the file, create it on first
//! use, and insert into the cache. Only the eventual `update` is deferred
//! to the flush worker.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::thread;

use tracing::{debug, info};

use rrdsink_cache::{CacheStats, FlushQueue, FlushWorker, UpdateCache};
use rrdsink_core::error::{SinkError, SinkResult};
use rrdsink_core::format::update_line;
use rrdsink_core::layout::create_args;
use rrdsink_core::path::archive_path;
use rrdsink_core::types::{Identity, Sample, Schema};
use rrdsink_engine::RrdEngine;

use crate::config::{ResolvedConfig, SinkConfig};

// =============================================================================
// RrdSink
// =============================================================================

/// The write plugin: accepts samples, coalesces them per archive file and
/// defers disk updates to a background worker.
pub struct RrdSink {
    config: ResolvedConfig,
    cache: Arc<UpdateCache>,
    engine: Arc<dyn RrdEngine>,
    worker: FlushWorker,
}

impl RrdSink {
    /// Initializes the plugin: resolves the configuration against the
    /// collector's sampling interval, creates the cache and queue, and
    /// spawns the flush worker.
    pub fn start(
        config: SinkConfig,
        interval: i64,
        engine: Arc<dyn RrdEngine>,
    ) -> SinkResult<Self> {
        let config = config.resolve(interval)?;

        let queue = Arc::new(FlushQueue::new());
        let cache = Arc::new(UpdateCache::new(
            config.cache_timeout,
            config.cache_flush_timeout,
            Arc::clone(&queue),
        ));
        let worker = FlushWorker::spawn(Arc::clone(&cache), queue, Arc::clone(&engine))
            .map_err(SinkError::Cache)?;

        info!(
            engine = engine.name(),
            cache_timeout = config.cache_timeout,
            cache_flush_timeout = config.cache_flush_timeout,
            step_size = config.archive.step_size,
            "rrdsink started"
        );

        Ok(Self {
            config,
            cache,
            engine,
            worker,
        })
    }

    /// Accepts one sample for the archive named by `identity`.
    ///
    /// Derives the path, renders the update line, creates the archive file
    /// on first use (including its parent directories) and inserts the line
    /// into the coalescing cache. Returns an error for non-monotonic
    /// timestamps, oversize paths, schema mismatches and create failures;
    /// nothing is written to disk on this thread beyond the one-time
    /// create.
    pub fn write(&self, identity: &Identity, schema: &Schema, sample: &Sample) -> SinkResult<()> {
        let path = archive_path(self.config.data_dir.as_deref(), identity)?;
        let line = update_line(schema, sample)?;

        self.ensure_archive(&path, schema)?;

        self.cache.insert(&path, &line, sample.time)?;
        Ok(())
    }

    /// Probes the archive file and creates it if it does not exist yet.
    ///
    /// The probe and the create run back-to-back on the producer thread so
    /// no other component can slip between them with a conflicting create.
    fn ensure_archive(&self, path: &str, schema: &Schema) -> SinkResult<()> {
        match fs::metadata(path) {
            Ok(meta) if meta.is_file() => Ok(()),
            Ok(_) => Err(SinkError::NotRegularFile {
                path: path.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.create_archive(path, schema)
            }
            Err(e) => Err(SinkError::io(path, e)),
        }
    }

    fn create_archive(&self, path: &str, schema: &Schema) -> SinkResult<()> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| SinkError::io(parent, e))?;
            }
        }

        let args = create_args(path, schema, &self.config.archive)?;
        self.engine.create(&args)?;

        info!(path, sources = schema.len(), "created archive file");
        Ok(())
    }

    /// Shuts the plugin down: queues every pending batch and signals the
    /// worker to drain and exit.
    ///
    /// Does not block; the worker finishes the final drain and tears the
    /// cache down on its own thread. Use [`join`](Self::join) to wait for
    /// it. Writes racing a shutdown either land in the final drain or fail
    /// once the cache is torn down.
    pub fn shutdown(&self) {
        debug!("shutting down, flushing all pending batches");
        self.cache.sweep(-1);
        self.worker.shutdown();
    }

    /// Waits for the flush worker to finish its final drain.
    pub fn join(self) -> thread::Result<()> {
        self.worker.join()
    }

    /// Returns a statistics snapshot.
    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Returns the coalescing cache, for observation.
    pub fn cache(&self) -> &Arc<UpdateCache> {
        &self.cache
    }

    /// Returns the resolved configuration in effect.
    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }
}

impl std::fmt::Debug for RrdSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RrdSink")
            .field("engine", &self.engine.name())
            .field("cache_timeout", &self.config.cache_timeout)
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
