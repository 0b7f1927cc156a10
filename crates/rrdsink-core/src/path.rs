// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Archive path derivation.
//!
//! Maps an identity tuple onto its canonical archive file path:
//!
//! ```text
//! {data_dir}/{host}/{plugin}[-{plugin_instance}]/{type}[-{type_instance}].rrd
//! ```
//!
//! Derivation is pure and idempotent; the resulting string is the cache key
//! for the coalescing cache. Field contents are taken as-is: callers are
//! responsible for producing identifiers free of path separators.

use std::path::Path;

use crate::error::PathError;
use crate::types::Identity;

/// Maximum supported archive path length in bytes.
pub const MAX_PATH_BYTES: usize = 512;

/// Derives the archive file path for an identity tuple.
///
/// `host`, `plugin` and `type_name` must be non-empty; instance fields are
/// appended with a `-` separator only when present. Paths longer than
/// [`MAX_PATH_BYTES`] are rejected.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use rrdsink_core::path::archive_path;
/// use rrdsink_core::types::Identity;
///
/// let id = Identity::new("h1", "cpu", "0", "cpu", "user");
/// let path = archive_path(Some(Path::new("/var/lib/collectd")), &id).unwrap();
/// assert_eq!(path, "/var/lib/collectd/h1/cpu-0/cpu-user.rrd");
/// ```
pub fn archive_path(data_dir: Option<&Path>, identity: &Identity) -> Result<String, PathError> {
    if identity.host.is_empty() {
        return Err(PathError::EmptyField { field: "host" });
    }
    if identity.plugin.is_empty() {
        return Err(PathError::EmptyField { field: "plugin" });
    }
    if identity.type_name.is_empty() {
        return Err(PathError::EmptyField { field: "type" });
    }

    let mut path = String::new();

    if let Some(dir) = data_dir {
        path.push_str(&dir.to_string_lossy());
        path.push('/');
    }

    path.push_str(&identity.host);
    path.push('/');

    path.push_str(&identity.plugin);
    if identity.has_plugin_instance() {
        path.push('-');
        path.push_str(&identity.plugin_instance);
    }
    path.push('/');

    path.push_str(&identity.type_name);
    if identity.has_type_instance() {
        path.push('-');
        path.push_str(&identity.type_instance);
    }
    path.push_str(".rrd");

    if path.len() > MAX_PATH_BYTES {
        return Err(PathError::TooLong {
            length: path.len(),
            limit: MAX_PATH_BYTES,
        });
    }

    Ok(path)
}

// =============================================================================
// Tests
// =============================================================================
