// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Unified error hierarchy for rrdsink.
//!
//! All errors in the pipeline can be converted into the root [`SinkError`],
//! giving the host a single surface to match on. Only configuration errors
//! and per-sample write rejections reach the caller; everything that happens
//! on the flush worker is logged and absorbed so the collector keeps running.
//!
//! # Error Hierarchy
//!
//! ```text
//! SinkError (root)
//! ├── ConfigError  - configuration keys and values
//! ├── FormatError  - sample-to-update-line rendering
//! ├── LayoutError  - archive layout planning
//! ├── PathError    - archive path derivation
//! ├── CacheError   - coalescing cache operations
//! └── EngineError  - RRA engine create/update invocations
//! ```

use std::path::PathBuf;
use thiserror::Error;

use crate::types::DsKind;

// =============================================================================
// SinkError - Root Error Type
// =============================================================================

/// The root error type for the rrdsink pipeline.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Sample formatting error.
    #[error("format error: {0}")]
    Format(#[from] FormatError),

    /// Archive layout planning error.
    #[error("layout error: {0}")]
    Layout(#[from] LayoutError),

    /// Archive path derivation error.
    #[error("path error: {0}")]
    Path(#[from] PathError),

    /// Coalescing cache error.
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),

    /// RRA engine error.
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    /// Filesystem error while probing or preparing an archive location.
    #[error("I/O error on '{path}': {source}")]
    Io {
        /// The path the operation touched.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The archive path exists but is not a regular file.
    #[error("'{path}': not a regular file")]
    NotRegularFile {
        /// The offending path.
        path: String,
    },
}

impl SinkError {
    /// Returns the error type as a short string for logging and metrics.
    pub fn error_type(&self) -> &'static str {
        match self {
            SinkError::Config(_) => "config",
            SinkError::Format(_) => "format",
            SinkError::Layout(_) => "layout",
            SinkError::Path(_) => "path",
            SinkError::Cache(_) => "cache",
            SinkError::Engine(_) => "engine",
            SinkError::Io { .. } => "io",
            SinkError::NotRegularFile { .. } => "io",
        }
    }

    /// Creates an I/O error for the given path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Convenience alias for pipeline results.
pub type SinkResult<T> = Result<T, SinkError>;

// =============================================================================
// ConfigError
// =============================================================================

/// Configuration-related errors. These abort startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration key is not recognized.
    #[error("unknown configuration key: {key}")]
    UnknownKey {
        /// The key as supplied by the host.
        key: String,
    },

    /// A configuration value failed validation.
    #[error("invalid value for '{field}': {message}")]
    Validation {
        /// The configuration key.
        field: String,
        /// What was wrong with the value.
        message: String,
    },
}

impl ConfigError {
    /// Creates a validation error.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates an unknown-key error.
    pub fn unknown_key(key: impl Into<String>) -> Self {
        Self::UnknownKey { key: key.into() }
    }
}

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// FormatError
// =============================================================================

/// Errors while rendering a sample into an update line.
#[derive(Debug, Error)]
pub enum FormatError {
    /// The sample carries a different number of values than the schema.
    #[error("sample has {actual} value(s) but the schema defines {expected}")]
    ValueCountMismatch {
        /// Number of data sources in the schema.
        expected: usize,
        /// Number of values in the sample.
        actual: usize,
    },

    /// A value's kind does not match its data source.
    #[error("data source '{name}' is {expected} but the sample value is {actual}")]
    KindMismatch {
        /// The data-source name.
        name: String,
        /// The kind the schema declares.
        expected: DsKind,
        /// The kind the sample carried.
        actual: DsKind,
    },
}

// =============================================================================
// LayoutError
// =============================================================================

/// Errors while planning the layout of a new archive file.
#[derive(Debug, Error)]
pub enum LayoutError {
    /// The step size is not a positive number of seconds.
    #[error("step size must be positive, got {step}")]
    InvalidStep {
        /// The configured step size.
        step: i64,
    },

    /// The row count is not positive.
    #[error("row count must be positive, got {rows}")]
    InvalidRows {
        /// The configured row count.
        rows: i64,
    },

    /// No timespan produced an archive definition.
    #[error(
        "no usable archive timespan: every timespan holds fewer than {rows} steps of {step}s"
    )]
    NoArchives {
        /// The configured step size.
        step: i64,
        /// The configured row count.
        rows: i64,
    },
}

// =============================================================================
// PathError
// =============================================================================

/// Errors while deriving an archive path from an identity tuple.
#[derive(Debug, Error)]
pub enum PathError {
    /// A mandatory identity field is empty.
    #[error("identity field '{field}' must not be empty")]
    EmptyField {
        /// The offending field name.
        field: &'static str,
    },

    /// The derived path exceeds the supported length.
    #[error("archive path is {length} bytes, limit is {limit}")]
    TooLong {
        /// Rendered length in bytes.
        length: usize,
        /// The supported maximum.
        limit: usize,
    },
}

// =============================================================================
// CacheError
// =============================================================================

/// Errors from the coalescing cache.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The sample's timestamp does not advance past the newest cached one.
    #[error("non-monotonic sample for '{path}': {attempted} <= {last}")]
    NonMonotonic {
        /// The archive path.
        path: String,
        /// The newest timestamp already accepted.
        last: i64,
        /// The rejected timestamp.
        attempted: i64,
    },

    /// The cache has been torn down by the flush worker.
    #[error("cache is closed")]
    Closed,

    /// The flush worker thread could not be spawned.
    #[error("failed to spawn flush worker: {source}")]
    WorkerSpawn {
        /// The underlying OS error.
        #[source]
        source: std::io::Error,
    },
}

// =============================================================================
// EngineError
// =============================================================================

/// Errors reported by the RRA engine boundary.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine rejected an operation; `message` is its error string.
    #[error("{operation} failed for '{filename}': {message}")]
    Command {
        /// The engine operation (`create` or `update`).
        operation: String,
        /// The archive file the operation targeted.
        filename: String,
        /// The engine's error string.
        message: String,
    },

    /// The engine process could not be started at all.
    #[error("failed to invoke engine: {source}")]
    Spawn {
        /// The underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// The argument vector was malformed (missing verb or filename).
    #[error("malformed engine argument vector: {message}")]
    BadArguments {
        /// What was missing or wrong.
        message: String,
    },
}

impl EngineError {
    /// Creates a command failure with the engine's error string.
    pub fn command(
        operation: impl Into<String>,
        filename: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Command {
            operation: operation.into(),
            filename: filename.into(),
            message: message.into(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_type_labels() {
        let e: SinkError = ConfigError::unknown_key("Nope").into();
        assert_eq!(e.error_type(), "config");

        let e: SinkError = CacheError::Closed.into();
        assert_eq!(e.error_type(), "cache");

        let e: SinkError = EngineError::command("update", "f.rrd", "boom").into();
        assert_eq!(e.error_type(), "engine");
    }

    #[test]
    fn test_non_monotonic_message() {
        let e = CacheError::NonMonotonic {
            path: "/a/b.rrd".to_string(),
            last: 1000,
            attempted: 1000,
        };
        let msg = e.to_string();
        assert!(msg.contains("non-monotonic"));
        assert!(msg.contains("1000 <= 1000"));
    }

    #[test]
    fn test_engine_command_message_carries_error_string() {
        let e = EngineError::command("create", "x.rrd", "illegal attempt to update using time");
        assert!(e.to_string().contains("illegal attempt"));
        assert!(e.to_string().contains("x.rrd"));
    }

    #[test]
    fn test_config_validation_helper() {
        let e = ConfigError::validation("XFF", "must be in [0, 1)");
        assert!(e.to_string().contains("XFF"));
    }
}
