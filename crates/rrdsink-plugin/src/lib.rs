// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # rrdsink-plugin
//!
//! The host-callback surface of rrdsink: a write plugin that accepts
//! numeric samples from a metrics collector, coalesces them per destination
//! archive file and defers disk updates to a background flush worker.
//!
//! The host's lifecycle maps onto this crate as:
//!
//! | Host callback | Here |
//! |---|---|
//! | configuration (`key`, `value`) | [`SinkConfig::set`] |
//! | init | [`RrdSink::start`] |
//! | write (schema, sample) | [`RrdSink::write`] |
//! | shutdown | [`RrdSink::shutdown`] (+ optional [`RrdSink::join`]) |
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use rrdsink_core::types::{DataSource, Identity, Sample, Schema};
//! use rrdsink_engine::{MockEngine, RrdEngine};
//! use rrdsink_plugin::{RrdSink, SinkConfig};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let mut config = SinkConfig::new();
//! config.set("DataDir", &dir.path().to_string_lossy()).unwrap();
//! config.set("CacheTimeout", "300").unwrap();
//!
//! let engine = Arc::new(MockEngine::with_touched_files());
//! let sink = RrdSink::start(config, 10, engine.clone() as Arc<dyn RrdEngine>).unwrap();
//!
//! let identity = Identity::new("h1", "load", "", "load", "");
//! let schema = Schema::new(vec![DataSource::gauge("shortterm")]);
//! sink.write(&identity, &schema, &Sample::gauge(0.5, 1000)).unwrap();
//!
//! sink.shutdown();
//! sink.join().unwrap();
//! assert_eq!(engine.update_count(), 1);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Modules
// =============================================================================

pub mod config;
pub mod sink;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{ResolvedConfig, SinkConfig, CONFIG_KEYS};
pub use sink::RrdSink;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Tests
// =============================================================================
