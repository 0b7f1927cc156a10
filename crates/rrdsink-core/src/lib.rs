// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # rrdsink-core
//!
//! Core types and pure building blocks for the rrdsink write pipeline:
//!
//! - **Types**: sample identity, data-source schema, values and samples
//! - **Error**: unified error hierarchy rooted at [`error::SinkError`]
//! - **Format**: rendering samples into the engine's update-line format
//! - **Layout**: planning the archive definitions for new files
//! - **Path**: deriving the canonical archive path for an identity
//!
//! Everything in this crate is pure: no locks, no I/O, no global state.
//! The coalescing cache and the flush worker live in `rrdsink-cache`; the
//! engine boundary lives in `rrdsink-engine`.
//!
//! ## Example
//!
//! ```
//! use rrdsink_core::format::update_line;
//! use rrdsink_core::path::archive_path;
//! use rrdsink_core::types::{DataSource, Identity, Sample, Schema};
//!
//! let identity = Identity::new("h1", "cpu", "0", "cpu", "user");
//! let schema = Schema::new(vec![DataSource::counter("value")]);
//!
//! let path = archive_path(None, &identity).unwrap();
//! let line = update_line(&schema, &Sample::counter(42, 1000)).unwrap();
//!
//! assert_eq!(path, "h1/cpu-0/cpu-user.rrd");
//! assert_eq!(line, "1000:42");
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Modules
// =============================================================================

pub mod error;
pub mod format;
pub mod layout;
pub mod path;
pub mod types;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{
    CacheError, ConfigError, ConfigResult, EngineError, FormatError, LayoutError, PathError,
    SinkError, SinkResult,
};
pub use format::{render_bound, render_gauge, update_line, UNKNOWN_TOKEN};
pub use layout::{create_args, ds_defs, rra_defs, ArchiveSettings, AGGREGATIONS, DEFAULT_TIMESPANS};
pub use path::{archive_path, MAX_PATH_BYTES};
pub use types::{DataSource, DsKind, Identity, Sample, Schema, Value};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
