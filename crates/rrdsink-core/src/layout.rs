// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Archive layout planning.
//!
//! When a sample arrives for an archive file that does not exist yet, the
//! planner turns the sample's schema and the static archive settings into
//! the engine's create-time argument vector: one `DS:` definition per data
//! source and one `RRA:` definition per (timespan, aggregation) pair.
//!
//! The planner is pure; it never touches the filesystem or the engine.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::LayoutError;
use crate::format::render_bound;
use crate::types::Schema;

/// The built-in archive timespans in seconds: one hour, one day, one week,
/// one month (31 days), one year (366 days).
pub const DEFAULT_TIMESPANS: [i64; 5] = [3600, 86400, 604800, 2678400, 31622400];

/// The consolidation functions every archive carries.
pub const AGGREGATIONS: [&str; 3] = ["AVERAGE", "MIN", "MAX"];

// =============================================================================
// Archive Settings
// =============================================================================

/// Static settings governing the shape of newly created archive files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveSettings {
    /// Nominal interval between primary data points, in seconds.
    #[serde(default = "default_step_size")]
    pub step_size: i64,

    /// Maximum gap between samples before a reading counts as unknown.
    #[serde(default = "default_heartbeat")]
    pub heartbeat: i64,

    /// Rows each archive should retain.
    #[serde(default = "default_rra_rows")]
    pub rra_rows: i64,

    /// Fraction of unknown primary points tolerated per consolidated point.
    #[serde(default = "default_xff")]
    pub xff: f64,

    /// Custom archive timespans in seconds; empty means the built-in list.
    #[serde(default)]
    pub timespans: Vec<i64>,
}

fn default_step_size() -> i64 {
    10
}

fn default_heartbeat() -> i64 {
    20
}

fn default_rra_rows() -> i64 {
    1200
}

fn default_xff() -> f64 {
    0.1
}

impl Default for ArchiveSettings {
    fn default() -> Self {
        Self {
            step_size: default_step_size(),
            heartbeat: default_heartbeat(),
            rra_rows: default_rra_rows(),
            xff: default_xff(),
            timespans: Vec::new(),
        }
    }
}

impl ArchiveSettings {
    /// Returns the effective timespan list: the custom one if set, the
    /// built-in defaults otherwise.
    pub fn effective_timespans(&self) -> &[i64] {
        if self.timespans.is_empty() {
            &DEFAULT_TIMESPANS
        } else {
            &self.timespans
        }
    }

    /// Validates the numeric settings.
    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.step_size <= 0 {
            return Err(LayoutError::InvalidStep {
                step: self.step_size,
            });
        }
        if self.rra_rows <= 0 {
            return Err(LayoutError::InvalidRows {
                rows: self.rra_rows,
            });
        }
        Ok(())
    }
}

// =============================================================================
// Planner
// =============================================================================

/// Produces one `DS:<name>:<KIND>:<heartbeat>:<min>:<max>` definition per
/// schema source. Unknown bounds render as `U`.
pub fn ds_defs(schema: &Schema, heartbeat: i64) -> Vec<String> {
    schema
        .iter()
        .map(|source| {
            format!(
                "DS:{}:{}:{}:{}:{}",
                source.name,
                source.kind.as_str(),
                heartbeat,
                render_bound(source.min),
                render_bound(source.max)
            )
        })
        .collect()
}

/// Produces the `RRA:<agg>:<xff>:<cdp_len>:<cdp_num>` definitions.
///
/// Timespans too short to fill `rra_rows` rows at the configured step are
/// skipped. The first surviving timespan stores primary points unchanged
/// (consolidation length 1); later ones consolidate
/// `floor(span / (rra_rows * step))` primary points into each archived
/// point, retaining `ceil(span / (cdp_len * step))` points.
///
/// An empty result is not an error here; creating a file from it is (see
/// [`create_args`]).
pub fn rra_defs(settings: &ArchiveSettings) -> Result<Vec<String>, LayoutError> {
    settings.validate()?;

    let step = settings.step_size;
    let rows = settings.rra_rows;

    let mut defs = Vec::new();
    let mut cdp_len: i64 = 0;

    for &span in settings.effective_timespans() {
        if span / step < rows {
            continue;
        }

        cdp_len = if cdp_len == 0 { 1 } else { span / (rows * step) };
        let cdp_num = (span + cdp_len * step - 1) / (cdp_len * step);

        for agg in AGGREGATIONS {
            defs.push(format!(
                "RRA:{}:{:.1}:{}:{}",
                agg, settings.xff, cdp_len, cdp_num
            ));
        }
    }

    debug!(rra_num = defs.len(), "planned archive definitions");
    Ok(defs)
}

/// Assembles the full create-time argument vector:
/// `["create", filename, "-s", <step>, DS..., RRA...]`.
///
/// Fails when the settings are invalid or no timespan survives the row
/// check; a file without archives would never store anything.
pub fn create_args(
    filename: &str,
    schema: &Schema,
    settings: &ArchiveSettings,
) -> Result<Vec<String>, LayoutError> {
    let rras = rra_defs(settings)?;
    if rras.is_empty() {
        return Err(LayoutError::NoArchives {
            step: settings.step_size,
            rows: settings.rra_rows,
        });
    }

    let dses = ds_defs(schema, settings.heartbeat);

    let mut args = Vec::with_capacity(4 + dses.len() + rras.len());
    args.push("create".to_string());
    args.push(filename.to_string());
    args.push("-s".to_string());
    args.push(settings.step_size.to_string());
    args.extend(dses);
    args.extend(rras);

    Ok(args)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DataSource, DsKind};

    fn settings(step: i64, rows: i64, timespans: &[i64]) -> ArchiveSettings {
        ArchiveSettings {
            step_size: step,
            heartbeat: 2 * step,
            rra_rows: rows,
            xff: 0.1,
            timespans: timespans.to_vec(),
        }
    }

    #[test]
    fn test_ds_defs_gauge_with_bounds() {
        let schema = Schema::new(vec![DataSource::new(
            "value",
            DsKind::Gauge,
            Some(0.0),
            Some(100.0),
        )]);
        let defs = ds_defs(&schema, 20);
        assert_eq!(defs, vec!["DS:value:GAUGE:20:0.000000:100.000000"]);
    }

    #[test]
    fn test_ds_defs_counter_unbounded() {
        let schema = Schema::new(vec![DataSource::counter("octets")]);
        let defs = ds_defs(&schema, 20);
        assert_eq!(defs, vec!["DS:octets:COUNTER:20:U:U"]);
    }

    #[test]
    fn test_ds_defs_order_follows_schema() {
        let schema = Schema::new(vec![
            DataSource::counter("rx"),
            DataSource::counter("tx"),
        ]);
        let defs = ds_defs(&schema, 40);
        assert_eq!(defs[0], "DS:rx:COUNTER:40:U:U");
        assert_eq!(defs[1], "DS:tx:COUNTER:40:U:U");
    }

    #[test]
    fn test_rra_defs_default_timespans() {
        // With a 10s step and 1200 rows, the one-hour span holds only 360
        // steps and is dropped; the remaining four spans survive, the first
        // of them at full resolution.
        let defs = rra_defs(&settings(10, 1200, &[])).unwrap();
        assert_eq!(defs.len(), 12);

        assert_eq!(defs[0], "RRA:AVERAGE:0.1:1:8640");
        assert_eq!(defs[1], "RRA:MIN:0.1:1:8640");
        assert_eq!(defs[2], "RRA:MAX:0.1:1:8640");
        assert_eq!(defs[3], "RRA:AVERAGE:0.1:50:1210");
        assert_eq!(defs[6], "RRA:AVERAGE:0.1:223:1202");
        assert_eq!(defs[9], "RRA:AVERAGE:0.1:2635:1201");
    }

    #[test]
    fn test_rra_defs_consolidation_lengths() {
        // 300 rows keep every built-in span, so the hour archive stores
        // primary points unchanged and the rest consolidate.
        let defs = rra_defs(&settings(10, 300, &[])).unwrap();
        assert_eq!(defs.len(), 15);

        let cdp_lens: Vec<&str> = defs
            .iter()
            .step_by(3)
            .map(|d| d.split(':').nth(3).unwrap())
            .collect();
        assert_eq!(cdp_lens, vec!["1", "28", "201", "892", "10540"]);
    }

    #[test]
    fn test_rra_defs_skips_short_timespans() {
        // One hour at a one-hour step is a single row.
        let defs = rra_defs(&settings(3600, 1200, &[3600])).unwrap();
        assert!(defs.is_empty());
    }

    #[test]
    fn test_rra_defs_rejects_bad_step() {
        let err = rra_defs(&settings(0, 1200, &[])).unwrap_err();
        assert!(matches!(err, LayoutError::InvalidStep { step: 0 }));

        let err = rra_defs(&settings(10, -1, &[])).unwrap_err();
        assert!(matches!(err, LayoutError::InvalidRows { rows: -1 }));
    }

    #[test]
    fn test_create_args_shape() {
        let schema = Schema::new(vec![DataSource::gauge("value")]);
        let args = create_args("/data/h1/cpu/cpu.rrd", &schema, &settings(10, 1200, &[])).unwrap();

        assert_eq!(args[0], "create");
        assert_eq!(args[1], "/data/h1/cpu/cpu.rrd");
        assert_eq!(args[2], "-s");
        assert_eq!(args[3], "10");
        assert_eq!(args[4], "DS:value:GAUGE:20:U:U");
        assert!(args[5].starts_with("RRA:AVERAGE:"));
        assert_eq!(args.len(), 4 + 1 + 12);
    }

    #[test]
    fn test_create_args_fails_without_archives() {
        let schema = Schema::new(vec![DataSource::gauge("value")]);
        let err = create_args("x.rrd", &schema, &settings(3600, 1200, &[3600])).unwrap_err();
        assert!(matches!(err, LayoutError::NoArchives { .. }));
    }

    #[test]
    fn test_custom_timespans_preserve_order() {
        let defs = rra_defs(&settings(10, 100, &[7200, 3600])).unwrap();
        // Input order is kept: the first surviving span (7200) stores at
        // full resolution, the later, shorter one consolidates.
        assert_eq!(defs[0], "RRA:AVERAGE:0.1:1:720");
        assert_eq!(defs[3], "RRA:AVERAGE:0.1:3:120");
    }

    #[test]
    fn test_effective_timespans() {
        assert_eq!(
            settings(10, 1200, &[]).effective_timespans(),
            &DEFAULT_TIMESPANS
        );
        assert_eq!(settings(10, 1200, &[60]).effective_timespans(), &[60]);
    }
}
