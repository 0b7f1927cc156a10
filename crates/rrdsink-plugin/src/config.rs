// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration for the rrdsink plugin.
//!
//! The host dispatches `(key, value)` pairs from its configuration file;
//! [`SinkConfig::set`] accepts them case-insensitively and validates each
//! value. At init time, [`SinkConfig::resolve`] fills the interval-derived
//! defaults and applies the caching invariants, producing the read-only
//! [`ResolvedConfig`] the rest of the pipeline works from.
//!
//! # Supported Keys
//!
//! | Key           | Meaning                                               |
//! |---------------|-------------------------------------------------------|
//! | `CacheTimeout`| seconds a batch accumulates before it is queued       |
//! | `CacheFlush`  | wall-clock seconds between automatic cache sweeps     |
//! | `DataDir`     | path prefix for archive files                         |
//! | `StepSize`    | seconds between primary data points                   |
//! | `HeartBeat`   | seconds before a missing sample counts as unknown     |
//! | `RRARows`     | rows each archive retains                             |
//! | `RRATimespan` | extra archive timespans (comma/space/tab separated)   |
//! | `XFF`         | tolerated fraction of unknown points, in [0, 1)       |

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use rrdsink_core::error::{ConfigError, ConfigResult};
use rrdsink_core::layout::ArchiveSettings;

/// The configuration keys this plugin accepts.
pub const CONFIG_KEYS: [&str; 8] = [
    "CacheTimeout",
    "CacheFlush",
    "DataDir",
    "StepSize",
    "HeartBeat",
    "RRARows",
    "RRATimespan",
    "XFF",
];

// =============================================================================
// SinkConfig
// =============================================================================

/// Raw plugin configuration, as accumulated from `(key, value)` pairs.
///
/// Zero values for `step_size` and `heartbeat` mean "derive from the
/// collector interval at init".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Seconds of sample time a batch accumulates before being queued.
    #[serde(default)]
    pub cache_timeout: i64,

    /// Wall-clock seconds between automatic cache sweeps.
    #[serde(default)]
    pub cache_flush_timeout: i64,

    /// Path prefix for archive files.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Seconds between primary data points; 0 derives from the interval.
    #[serde(default)]
    pub step_size: i64,

    /// Heartbeat in seconds; 0 derives from the interval.
    #[serde(default)]
    pub heartbeat: i64,

    /// Rows each archive retains.
    #[serde(default = "default_rra_rows")]
    pub rra_rows: i64,

    /// Tolerated fraction of unknown primary points, in [0, 1).
    #[serde(default = "default_xff")]
    pub xff: f64,

    /// Custom archive timespans; empty means the built-in list.
    #[serde(default)]
    pub rra_timespans: Vec<i64>,
}

fn default_rra_rows() -> i64 {
    1200
}

fn default_xff() -> f64 {
    0.1
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            cache_timeout: 0,
            cache_flush_timeout: 0,
            data_dir: None,
            step_size: 0,
            heartbeat: 0,
            rra_rows: default_rra_rows(),
            xff: default_xff(),
            rra_timespans: Vec::new(),
        }
    }
}

impl SinkConfig {
    /// Creates a configuration with all defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one `(key, value)` pair from the host's configuration.
    ///
    /// Keys match case-insensitively. Unknown keys and invalid values are
    /// rejected with a [`ConfigError`]; the host should abort startup on
    /// either.
    pub fn set(&mut self, key: &str, value: &str) -> ConfigResult<()> {
        if key.eq_ignore_ascii_case("CacheTimeout") {
            let timeout = parse_whole(key, value)?;
            if timeout < 0 {
                return Err(ConfigError::validation(key, "must not be negative"));
            }
            self.cache_timeout = timeout;
        } else if key.eq_ignore_ascii_case("CacheFlush") {
            let timeout = parse_whole(key, value)?;
            if timeout < 0 {
                return Err(ConfigError::validation(key, "must not be negative"));
            }
            self.cache_flush_timeout = timeout;
        } else if key.eq_ignore_ascii_case("DataDir") {
            let trimmed = value.trim_end_matches('/');
            self.data_dir = if trimmed.is_empty() {
                None
            } else {
                Some(PathBuf::from(trimmed))
            };
        } else if key.eq_ignore_ascii_case("StepSize") {
            let step = parse_whole(key, value)?;
            if step <= 0 {
                return Err(ConfigError::validation(key, "must be greater than 0"));
            }
            self.step_size = step;
        } else if key.eq_ignore_ascii_case("HeartBeat") {
            let heartbeat = parse_whole(key, value)?;
            if heartbeat <= 0 {
                return Err(ConfigError::validation(key, "must be greater than 0"));
            }
            self.heartbeat = heartbeat;
        } else if key.eq_ignore_ascii_case("RRARows") {
            let rows = parse_whole(key, value)?;
            if rows <= 0 {
                return Err(ConfigError::validation(key, "must be greater than 0"));
            }
            self.rra_rows = rows;
        } else if key.eq_ignore_ascii_case("RRATimespan") {
            for token in value.split([',', ' ', '\t']).filter(|t| !t.is_empty()) {
                let span = parse_whole(key, token)?;
                if span < 0 {
                    return Err(ConfigError::validation(key, "timespans must be positive"));
                }
                // Zero timespans are silently skipped.
                if span > 0 {
                    self.rra_timespans.push(span);
                }
            }
        } else if key.eq_ignore_ascii_case("XFF") {
            let xff: f64 = value.trim().parse().map_err(|_| {
                ConfigError::validation(key, format!("'{value}' is not a number"))
            })?;
            if !(0.0..1.0).contains(&xff) {
                return Err(ConfigError::validation(
                    key,
                    "must be in the range 0 to 1 (exclusive)",
                ));
            }
            self.xff = xff;
        } else {
            return Err(ConfigError::unknown_key(key));
        }

        Ok(())
    }

    /// Resolves the configuration against the collector's sampling
    /// interval, producing the read-only configuration used after init.
    ///
    /// Unset step size and heartbeat default to the interval and twice the
    /// interval. A cache timeout below two seconds disables caching
    /// entirely; a flush timeout below the cache timeout is raised to ten
    /// times the cache timeout.
    pub fn resolve(self, interval: i64) -> ConfigResult<ResolvedConfig> {
        if interval <= 0 {
            return Err(ConfigError::validation(
                "interval",
                "the collector interval must be greater than 0",
            ));
        }
        if !(0.0..1.0).contains(&self.xff) {
            return Err(ConfigError::validation("XFF", "must be in [0, 1)"));
        }
        if self.rra_rows <= 0 {
            return Err(ConfigError::validation("RRARows", "must be greater than 0"));
        }

        let step_size = if self.step_size > 0 {
            self.step_size
        } else {
            interval
        };
        let heartbeat = if self.heartbeat > 0 {
            self.heartbeat
        } else {
            2 * interval
        };

        if heartbeat < interval {
            warn!(
                heartbeat,
                interval, "heartbeat is smaller than the interval; this will likely cause problems"
            );
        } else if step_size < interval {
            warn!(
                step_size,
                interval,
                "step size is smaller than the interval; this will create needlessly big archive files"
            );
        }

        let (cache_timeout, cache_flush_timeout) = if self.cache_timeout < 2 {
            (0, 0)
        } else if self.cache_flush_timeout < self.cache_timeout {
            (self.cache_timeout, 10 * self.cache_timeout)
        } else {
            (self.cache_timeout, self.cache_flush_timeout)
        };

        let resolved = ResolvedConfig {
            cache_timeout,
            cache_flush_timeout,
            data_dir: self.data_dir,
            archive: ArchiveSettings {
                step_size,
                heartbeat,
                rra_rows: self.rra_rows,
                xff: self.xff,
                timespans: self.rra_timespans,
            },
        };

        debug!(
            cache_timeout = resolved.cache_timeout,
            cache_flush_timeout = resolved.cache_flush_timeout,
            step_size = resolved.archive.step_size,
            heartbeat = resolved.archive.heartbeat,
            rra_rows = resolved.archive.rra_rows,
            xff = resolved.archive.xff,
            data_dir = ?resolved.data_dir,
            "resolved configuration"
        );

        Ok(resolved)
    }
}

fn parse_whole(key: &str, value: &str) -> ConfigResult<i64> {
    value.trim().parse().map_err(|_| {
        ConfigError::validation(key, format!("'{value}' is not a whole number"))
    })
}

// =============================================================================
// ResolvedConfig
// =============================================================================

/// The read-only configuration in effect after init.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedConfig {
    /// Seconds of sample time a batch accumulates before being queued.
    pub cache_timeout: i64,
    /// Wall-clock seconds between automatic cache sweeps.
    pub cache_flush_timeout: i64,
    /// Path prefix for archive files.
    pub data_dir: Option<PathBuf>,
    /// Shape of newly created archive files.
    pub archive: ArchiveSettings,
}

impl ResolvedConfig {
    /// Returns `true` when write coalescing is disabled and every sample
    /// flushes immediately.
    pub fn caching_disabled(&self) -> bool {
        self.cache_timeout == 0
    }
}

// =============================================================================
// Tests
// =============================================================================
