//! Zone data loading.

use std::path::Path;

use anyhow::{Context, Result};
use patrol_core::ZoneSnapshot;

/// Demo dataset around central Chennai.
pub const SAMPLE_ZONES: &str = include_str!("../data/risk_zones.json");

/// Read zones from `path`, or the embedded sample when none is given.
pub fn load_zones(path: Option<&Path>) -> Result<ZoneSnapshot> {
    match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read zone file {}", path.display()))?;
            ZoneSnapshot::from_json(&raw)
                .with_context(|| format!("invalid zone file {}", path.display()))
        }
        None => ZoneSnapshot::from_json(SAMPLE_ZONES).context("embedded sample zones are invalid"),
    }
}
