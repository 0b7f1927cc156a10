// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # rrdsink-engine
//!
//! The boundary to the round-robin archive engine.
//!
//! The rest of the pipeline never manipulates archive files directly; it
//! hands the engine a textual argument vector whose first element is the
//! operation (`create` or `update`) and whose second is the target file.
//! Failures come back as [`EngineError::Command`] carrying the engine's
//! error string.
//!
//! Two implementations ship with the crate:
//!
//! - [`CommandLineEngine`] invokes the `rrdtool` binary, mapping its stderr
//!   onto the error string.
//! - [`MockEngine`] records every invocation for tests and can be toggled
//!   to fail; it optionally touches created files so existence probes
//!   behave as they would against a real engine.

#![warn(missing_docs)]
#![deny(unsafe_code)]

use std::fmt::Debug;
use std::path::PathBuf;
use std::process::Command;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tracing::{debug, warn};

pub use rrdsink_core::error::EngineError;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Engine Trait
// =============================================================================

/// The RRA engine boundary.
///
/// Both operations take the complete argument vector, verb included, so the
/// caller controls exactly what reaches the engine and tests can assert on
/// it verbatim.
pub trait RrdEngine: Send + Sync + Debug {
    /// Creates a new archive file.
    ///
    /// `args` is `["create", filename, "-s", <step>, DS..., RRA...]`.
    fn create(&self, args: &[String]) -> Result<(), EngineError>;

    /// Applies a batch of update lines to an existing archive file.
    ///
    /// `args` is `["update", filename, <line>, ...]`.
    fn update(&self, args: &[String]) -> Result<(), EngineError>;

    /// Returns the engine's name for logging.
    fn name(&self) -> &str;
}

/// Extracts the target filename from an argument vector, validating the verb.
fn parse_argv<'a>(args: &'a [String], verb: &str) -> Result<&'a str, EngineError> {
    match args {
        [v, filename, ..] if v == verb => Ok(filename),
        [v, ..] => Err(EngineError::BadArguments {
            message: format!("expected verb '{}', got '{}'", verb, v),
        }),
        [] => Err(EngineError::BadArguments {
            message: "empty argument vector".to_string(),
        }),
    }
}

// =============================================================================
// Command-Line Engine
// =============================================================================

/// An engine that shells out to the `rrdtool` binary.
///
/// Each invocation spawns one process with the argument vector passed
/// through unchanged. Stderr (or stdout, when stderr is empty) becomes the
/// error string on a non-zero exit.
#[derive(Debug, Clone)]
pub struct CommandLineEngine {
    /// Path to the engine binary.
    binary: PathBuf,
}

impl CommandLineEngine {
    /// Creates an engine using the given binary.
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Creates an engine using `rrdtool` from `PATH`.
    pub fn from_path() -> Self {
        Self::new("rrdtool")
    }

    fn run(&self, args: &[String], verb: &str) -> Result<(), EngineError> {
        let filename = parse_argv(args, verb)?;

        debug!(
            binary = %self.binary.display(),
            operation = verb,
            filename,
            argc = args.len(),
            "invoking engine"
        );

        let output = Command::new(&self.binary)
            .args(args)
            .output()
            .map_err(|source| EngineError::Spawn { source })?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let message = if stderr.trim().is_empty() {
            String::from_utf8_lossy(&output.stdout).trim().to_string()
        } else {
            stderr.trim().to_string()
        };

        Err(EngineError::command(verb, filename, message))
    }
}

impl RrdEngine for CommandLineEngine {
    fn create(&self, args: &[String]) -> Result<(), EngineError> {
        self.run(args, "create")
    }

    fn update(&self, args: &[String]) -> Result<(), EngineError> {
        self.run(args, "update")
    }

    fn name(&self) -> &str {
        "rrdtool"
    }
}

// =============================================================================
// Mock Engine (for testing)
// =============================================================================

/// A recording engine for tests.
///
/// Every argument vector is stored verbatim. Failure behavior is toggled at
/// runtime; when `touch_files` is set, `create` writes an empty file at the
/// target path so producer-side existence probes see the archive.
#[derive(Debug, Default)]
pub struct MockEngine {
    creates: Mutex<Vec<Vec<String>>>,
    updates: Mutex<Vec<Vec<String>>>,
    fail_create: AtomicBool,
    fail_update: AtomicBool,
    touch_files: bool,
}

impl MockEngine {
    /// Creates a mock that succeeds and records.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock whose `create` additionally touches the target file.
    pub fn with_touched_files() -> Self {
        Self {
            touch_files: true,
            ..Self::default()
        }
    }

    /// Makes subsequent `create` calls fail.
    pub fn set_fail_create(&self, fail: bool) {
        self.fail_create.store(fail, Ordering::Relaxed);
    }

    /// Makes subsequent `update` calls fail.
    pub fn set_fail_update(&self, fail: bool) {
        self.fail_update.store(fail, Ordering::Relaxed);
    }

    /// Returns all recorded `create` argument vectors.
    pub fn creates(&self) -> Vec<Vec<String>> {
        self.creates.lock().clone()
    }

    /// Returns all recorded `update` argument vectors.
    pub fn updates(&self) -> Vec<Vec<String>> {
        self.updates.lock().clone()
    }

    /// Returns the number of recorded `create` calls.
    pub fn create_count(&self) -> usize {
        self.creates.lock().len()
    }

    /// Returns the number of recorded `update` calls.
    pub fn update_count(&self) -> usize {
        self.updates.lock().len()
    }
}

impl RrdEngine for MockEngine {
    fn create(&self, args: &[String]) -> Result<(), EngineError> {
        let filename = parse_argv(args, "create")?.to_string();

        if self.fail_create.load(Ordering::Relaxed) {
            return Err(EngineError::command("create", filename, "mock failure"));
        }

        if self.touch_files {
            if let Err(e) = std::fs::write(&filename, b"") {
                warn!(filename, error = %e, "mock engine could not touch file");
            }
        }

        self.creates.lock().push(args.to_vec());
        Ok(())
    }

    fn update(&self, args: &[String]) -> Result<(), EngineError> {
        let filename = parse_argv(args, "update")?.to_string();

        if self.fail_update.load(Ordering::Relaxed) {
            return Err(EngineError::command("update", filename, "mock failure"));
        }

        self.updates.lock().push(args.to_vec());
        Ok(())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// =============================================================================
// Tests
// =============================================================================
