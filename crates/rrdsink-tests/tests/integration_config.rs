// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Configuration Integration Tests
//!
//! The host-facing configuration surface: key dispatch as the collector
//! performs it, init-time resolution and its effect on the running plugin.

use std::sync::Arc;

use rrdsink_core::error::ConfigError;
use rrdsink_engine::{MockEngine, RrdEngine};
use rrdsink_plugin::{RrdSink, SinkConfig, CONFIG_KEYS};

use rrdsink_tests::common::init_test_logging;

// =============================================================================
// Key Dispatch
// =============================================================================

#[test]
fn test_collector_style_key_dispatch() {
    // The collector hands keys over in whatever case the config file used.
    let pairs = [
        ("cachetimeout", "120"),
        ("CACHEFLUSH", "2400"),
        ("DataDir", "/var/lib/collectd/"),
        ("stepsize", "20"),
        ("HeartBeat", "40"),
        ("rrarows", "600"),
        ("RRATimespan", "3600 86400"),
        ("xff", "0.5"),
    ];

    let mut config = SinkConfig::new();
    for (key, value) in pairs {
        config.set(key, value).unwrap();
    }

    let resolved = config.resolve(10).unwrap();
    assert_eq!(resolved.cache_timeout, 120);
    assert_eq!(resolved.cache_flush_timeout, 2400);
    assert_eq!(
        resolved.data_dir.as_deref(),
        Some(std::path::Path::new("/var/lib/collectd"))
    );
    assert_eq!(resolved.archive.step_size, 20);
    assert_eq!(resolved.archive.heartbeat, 40);
    assert_eq!(resolved.archive.rra_rows, 600);
    assert_eq!(resolved.archive.timespans, vec![3600, 86400]);
    assert_eq!(resolved.archive.xff, 0.5);
}

#[test]
fn test_unknown_key_aborts_configuration() {
    let mut config = SinkConfig::new();
    let err = config.set("WriteQueueLimit", "100").unwrap_err();
    assert!(matches!(err, ConfigError::UnknownKey { .. }));
}

#[test]
fn test_every_documented_key_dispatches() {
    let mut config = SinkConfig::new();
    for key in CONFIG_KEYS {
        let value = match key {
            "DataDir" => "/data",
            "XFF" => "0.9",
            _ => "60",
        };
        config.set(key, value).unwrap();
    }
}

// =============================================================================
// Resolution on a Running Plugin
// =============================================================================

#[test]
fn test_sub_two_second_timeout_disables_coalescing() {
    init_test_logging();
    let dir = tempfile::tempdir().unwrap();
    let engine = Arc::new(MockEngine::with_touched_files());

    let mut config = SinkConfig::new();
    config.set("DataDir", &dir.path().to_string_lossy()).unwrap();
    config.set("CacheTimeout", "1").unwrap();
    config.set("CacheFlush", "900").unwrap();

    let sink = RrdSink::start(config, 10, engine as Arc<dyn RrdEngine>).unwrap();
    assert!(sink.config().caching_disabled());
    assert_eq!(sink.config().cache_flush_timeout, 0);

    sink.shutdown();
    sink.join().unwrap();
}

#[test]
fn test_startup_fails_on_invalid_interval() {
    let engine = Arc::new(MockEngine::new());
    let result = RrdSink::start(SinkConfig::new(), 0, engine as Arc<dyn RrdEngine>);
    assert!(result.is_err());
}
