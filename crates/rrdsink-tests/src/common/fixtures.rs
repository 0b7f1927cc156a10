// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Test fixtures: identities, schemas and sample sequences.

use rrdsink_core::types::{DataSource, Identity, Sample, Schema};

/// A cpu-style identity with both instances set.
pub fn cpu_identity() -> Identity {
    Identity::new("h1", "cpu", "0", "cpu", "user")
}

/// A load-style identity with no instances.
pub fn load_identity() -> Identity {
    Identity::new("h1", "load", "", "load", "")
}

/// An identity on the given host/plugin-instance, for multi-path tests.
pub fn numbered_identity(n: usize) -> Identity {
    Identity::new("h1", "cpu", n.to_string(), "cpu", "idle")
}

/// A one-counter schema, as used by cpu-style types.
pub fn counter_schema() -> Schema {
    Schema::new(vec![DataSource::counter("value")])
}

/// The classic three-gauge load schema.
pub fn load_schema() -> Schema {
    Schema::new(vec![
        DataSource::gauge("shortterm").with_bounds(Some(0.0), Some(100.0)),
        DataSource::gauge("midterm").with_bounds(Some(0.0), Some(100.0)),
        DataSource::gauge("longterm").with_bounds(Some(0.0), Some(100.0)),
    ])
}

/// Counter samples at a fixed cadence starting at `start`.
pub fn counter_series(start: i64, cadence: i64, count: usize) -> Vec<Sample> {
    (0..count)
        .map(|i| Sample::counter(i as u64, start + cadence * i as i64))
        .collect()
}
