// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Rendering samples into the engine's textual update format.
//!
//! One update line is `<unix_time>:<value>[:<value>...]` with one value per
//! data source. Counters render as unsigned decimals, gauges as fixed
//! six-decimal numbers. A `NaN` gauge renders as `U`, the engine's token for
//! an unknown reading. All rendering is locale-independent.

use crate::error::FormatError;
use crate::types::{Sample, Schema, Value};

/// The engine's token for an unknown value or bound.
pub const UNKNOWN_TOKEN: &str = "U";

/// Renders a gauge reading.
///
/// `NaN` becomes [`UNKNOWN_TOKEN`]; everything else is a fixed six-decimal
/// number.
///
/// # Examples
///
/// ```
/// use rrdsink_core::format::render_gauge;
///
/// assert_eq!(render_gauge(1.5), "1.500000");
/// assert_eq!(render_gauge(f64::NAN), "U");
/// ```
pub fn render_gauge(value: f64) -> String {
    if value.is_nan() {
        UNKNOWN_TOKEN.to_string()
    } else {
        format!("{:.6}", value)
    }
}

/// Renders an optional data-source bound: `U` when unknown, otherwise a
/// fixed six-decimal number.
pub fn render_bound(bound: Option<f64>) -> String {
    match bound {
        Some(v) if !v.is_nan() => format!("{:.6}", v),
        _ => UNKNOWN_TOKEN.to_string(),
    }
}

/// Renders one sample into an update line.
///
/// The sample must carry exactly one value per schema source, and each
/// value's kind must match its source; any mismatch is a [`FormatError`]
/// and nothing is emitted.
///
/// # Examples
///
/// ```
/// use rrdsink_core::format::update_line;
/// use rrdsink_core::types::{DataSource, Sample, Schema};
///
/// let schema = Schema::new(vec![DataSource::gauge("value")]);
/// let line = update_line(&schema, &Sample::gauge(0.5, 1000)).unwrap();
/// assert_eq!(line, "1000:0.500000");
/// ```
pub fn update_line(schema: &Schema, sample: &Sample) -> Result<String, FormatError> {
    if sample.values.len() != schema.len() {
        return Err(FormatError::ValueCountMismatch {
            expected: schema.len(),
            actual: sample.values.len(),
        });
    }

    let mut line = sample.time.to_string();
    for (source, value) in schema.iter().zip(sample.values.iter()) {
        if value.kind() != source.kind {
            return Err(FormatError::KindMismatch {
                name: source.name.clone(),
                expected: source.kind,
                actual: value.kind(),
            });
        }

        line.push(':');
        match value {
            Value::Counter(v) => line.push_str(&v.to_string()),
            Value::Gauge(v) => line.push_str(&render_gauge(*v)),
        }
    }

    Ok(line)
}

// =============================================================================
// Tests
// =============================================================================
