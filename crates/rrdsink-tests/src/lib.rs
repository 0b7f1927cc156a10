// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # rrdsink-tests
//!
//! Shared fixtures and helpers for the rrdsink integration suites.
//!
//! The actual tests live in this crate's `tests/` directory:
//!
//! - `integration_cache`: cache, queue and worker wired together
//! - `integration_sink`: the full plugin lifecycle over a temp data dir
//! - `integration_config`: the host-facing configuration surface

#![deny(unsafe_code)]

pub mod common;
