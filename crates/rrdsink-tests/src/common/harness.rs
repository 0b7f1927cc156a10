// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Test harness helpers: logging, polling and a gate-controlled engine.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use rrdsink_engine::{EngineError, MockEngine, RrdEngine};

/// Initializes a test subscriber once; later calls are no-ops.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// Polls `cond` until it holds or `timeout` elapses; returns the final
/// evaluation.
pub fn wait_until(mut cond: impl FnMut() -> bool, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    cond()
}

// =============================================================================
// Gate Engine
// =============================================================================

/// An engine whose `update` blocks on a gate until released.
///
/// Used to hold the flush worker inside an engine call and observe what the
/// rest of the pipeline can still do meanwhile.
#[derive(Debug)]
pub struct GateEngine {
    inner: MockEngine,
    open: Mutex<bool>,
    cond: Condvar,
    in_update: AtomicBool,
}

impl GateEngine {
    /// Creates an engine with a closed gate: the first `update` will block.
    pub fn closed() -> Self {
        Self {
            inner: MockEngine::new(),
            open: Mutex::new(false),
            cond: Condvar::new(),
            in_update: AtomicBool::new(false),
        }
    }

    /// Opens the gate, releasing any blocked `update`.
    pub fn open(&self) {
        let mut open = self.open.lock();
        *open = true;
        self.cond.notify_all();
    }

    /// Returns `true` while an `update` call is blocked on the gate.
    pub fn is_in_update(&self) -> bool {
        self.in_update.load(Ordering::SeqCst)
    }

    /// Returns the recorded `update` argument vectors.
    pub fn updates(&self) -> Vec<Vec<String>> {
        self.inner.updates()
    }

    /// Returns the number of completed `update` calls.
    pub fn update_count(&self) -> usize {
        self.inner.update_count()
    }
}

impl RrdEngine for GateEngine {
    fn create(&self, args: &[String]) -> Result<(), EngineError> {
        self.inner.create(args)
    }

    fn update(&self, args: &[String]) -> Result<(), EngineError> {
        self.in_update.store(true, Ordering::SeqCst);
        {
            let mut open = self.open.lock();
            while !*open {
                self.cond.wait(&mut open);
            }
        }
        self.in_update.store(false, Ordering::SeqCst);
        self.inner.update(args)
    }

    fn name(&self) -> &str {
        "gate"
    }
}
