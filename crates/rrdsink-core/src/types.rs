// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Core data types for the rrdsink write pipeline.
//!
//! This module provides the sample-side vocabulary shared by every other
//! crate: the identity tuple naming a destination archive, the data-source
//! schema describing what one archive stores, and the sample values the
//! collector hands over at each interval.

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Identity
// =============================================================================

/// The identity tuple naming one archive file.
///
/// Every sample is addressed to exactly one archive, derived from this tuple.
/// `host`, `plugin` and `type_name` must be non-empty; the two instance
/// fields may be empty and are then omitted from the derived path.
///
/// # Examples
///
/// ```
/// use rrdsink_core::types::Identity;
///
/// let id = Identity::new("h1", "cpu", "0", "cpu", "user");
/// assert_eq!(id.host, "h1");
/// assert!(id.has_plugin_instance());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    /// Host the sample originates from.
    pub host: String,
    /// Plugin that produced the sample.
    pub plugin: String,
    /// Optional plugin instance (empty = none).
    #[serde(default)]
    pub plugin_instance: String,
    /// The data-set type of the sample.
    pub type_name: String,
    /// Optional type instance (empty = none).
    #[serde(default)]
    pub type_instance: String,
}

impl Identity {
    /// Creates a new identity tuple.
    pub fn new(
        host: impl Into<String>,
        plugin: impl Into<String>,
        plugin_instance: impl Into<String>,
        type_name: impl Into<String>,
        type_instance: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            plugin: plugin.into(),
            plugin_instance: plugin_instance.into(),
            type_name: type_name.into(),
            type_instance: type_instance.into(),
        }
    }

    /// Returns `true` if the plugin instance is set.
    #[inline]
    pub fn has_plugin_instance(&self) -> bool {
        !self.plugin_instance.is_empty()
    }

    /// Returns `true` if the type instance is set.
    #[inline]
    pub fn has_type_instance(&self) -> bool {
        !self.type_instance.is_empty()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.host, self.plugin)?;
        if self.has_plugin_instance() {
            write!(f, "-{}", self.plugin_instance)?;
        }
        write!(f, "/{}", self.type_name)?;
        if self.has_type_instance() {
            write!(f, "-{}", self.type_instance)?;
        }
        Ok(())
    }
}

// =============================================================================
// Data Sources
// =============================================================================

/// The kind of one data source within an archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DsKind {
    /// A monotonically increasing counter; the engine derives rates.
    Counter,
    /// An absolute reading stored as-is.
    Gauge,
}

impl DsKind {
    /// Returns the engine's textual name for this kind.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            DsKind::Counter => "COUNTER",
            DsKind::Gauge => "GAUGE",
        }
    }
}

impl fmt::Display for DsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One data source within an archive: a named stream with a kind and
/// optional value bounds.
///
/// Bounds of `None` mean "unknown" and render as the engine's `U` token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSource {
    /// Stream name within the archive.
    pub name: String,
    /// Counter or gauge.
    pub kind: DsKind,
    /// Minimum acceptable value, if known.
    pub min: Option<f64>,
    /// Maximum acceptable value, if known.
    pub max: Option<f64>,
}

impl DataSource {
    /// Creates a data source with explicit bounds.
    pub fn new(name: impl Into<String>, kind: DsKind, min: Option<f64>, max: Option<f64>) -> Self {
        Self {
            name: name.into(),
            kind,
            min,
            max,
        }
    }

    /// Creates an unbounded gauge source.
    pub fn gauge(name: impl Into<String>) -> Self {
        Self::new(name, DsKind::Gauge, None, None)
    }

    /// Creates an unbounded counter source.
    pub fn counter(name: impl Into<String>) -> Self {
        Self::new(name, DsKind::Counter, None, None)
    }

    /// Sets the bounds and returns the source.
    pub fn with_bounds(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min = min;
        self.max = max;
        self
    }
}

/// The ordered data-source schema of one archive type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// The data sources, in archive order.
    pub sources: Vec<DataSource>,
}

impl Schema {
    /// Creates a schema from a list of sources.
    pub fn new(sources: Vec<DataSource>) -> Self {
        Self { sources }
    }

    /// Returns the number of data sources.
    #[inline]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Returns `true` if the schema has no sources.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Iterates over the data sources.
    pub fn iter(&self) -> std::slice::Iter<'_, DataSource> {
        self.sources.iter()
    }
}

// =============================================================================
// Values & Samples
// =============================================================================

/// One sampled value, matching a data source of the same kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Value {
    /// A counter reading (unsigned, monotonically increasing).
    Counter(u64),
    /// A gauge reading; `NaN` means unknown.
    Gauge(f64),
}

impl Value {
    /// Returns the data-source kind this value belongs to.
    #[inline]
    pub fn kind(&self) -> DsKind {
        match self {
            Value::Counter(_) => DsKind::Counter,
            Value::Gauge(_) => DsKind::Gauge,
        }
    }

    /// Returns the gauge reading, if this is a gauge.
    #[inline]
    pub fn as_gauge(&self) -> Option<f64> {
        match self {
            Value::Gauge(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the counter reading, if this is a counter.
    #[inline]
    pub fn as_counter(&self) -> Option<u64> {
        match self {
            Value::Counter(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Counter(v) => write!(f, "{}", v),
            Value::Gauge(v) => write!(f, "{}", v),
        }
    }
}

/// One sample: a value per data source plus the caller-supplied timestamp.
///
/// The timestamp is unix seconds; the cache enforces that successive samples
/// for the same archive carry strictly increasing timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// The values, in schema order.
    pub values: Vec<Value>,
    /// Sample time in unix seconds.
    pub time: i64,
}

impl Sample {
    /// Creates a sample.
    pub fn new(values: Vec<Value>, time: i64) -> Self {
        Self { values, time }
    }

    /// Creates a single-gauge sample.
    pub fn gauge(value: f64, time: i64) -> Self {
        Self::new(vec![Value::Gauge(value)], time)
    }

    /// Creates a single-counter sample.
    pub fn counter(value: u64, time: i64) -> Self {
        Self::new(vec![Value::Counter(value)], time)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_display_full() {
        let id = Identity::new("h1", "cpu", "0", "cpu", "user");
        assert_eq!(id.to_string(), "h1/cpu-0/cpu-user");
    }

    #[test]
    fn test_identity_display_without_instances() {
        let id = Identity::new("h1", "load", "", "load", "");
        assert_eq!(id.to_string(), "h1/load/load");
        assert!(!id.has_plugin_instance());
        assert!(!id.has_type_instance());
    }

    #[test]
    fn test_ds_kind_names() {
        assert_eq!(DsKind::Counter.as_str(), "COUNTER");
        assert_eq!(DsKind::Gauge.as_str(), "GAUGE");
    }

    #[test]
    fn test_data_source_builders() {
        let ds = DataSource::gauge("value").with_bounds(Some(0.0), None);
        assert_eq!(ds.kind, DsKind::Gauge);
        assert_eq!(ds.min, Some(0.0));
        assert_eq!(ds.max, None);

        let ds = DataSource::counter("octets");
        assert_eq!(ds.kind, DsKind::Counter);
        assert!(ds.min.is_none());
    }

    #[test]
    fn test_value_kind() {
        assert_eq!(Value::Counter(1).kind(), DsKind::Counter);
        assert_eq!(Value::Gauge(1.0).kind(), DsKind::Gauge);
        assert_eq!(Value::Gauge(2.5).as_gauge(), Some(2.5));
        assert_eq!(Value::Counter(7).as_counter(), Some(7));
        assert_eq!(Value::Counter(7).as_gauge(), None);
    }

    #[test]
    fn test_schema_len() {
        let schema = Schema::new(vec![
            DataSource::gauge("shortterm"),
            DataSource::gauge("midterm"),
            DataSource::gauge("longterm"),
        ]);
        assert_eq!(schema.len(), 3);
        assert!(!schema.is_empty());
    }

    #[test]
    fn test_sample_helpers() {
        let s = Sample::gauge(1.5, 1000);
        assert_eq!(s.values.len(), 1);
        assert_eq!(s.time, 1000);

        let s = Sample::counter(42, 2000);
        assert_eq!(s.values[0].as_counter(), Some(42));
    }
}
