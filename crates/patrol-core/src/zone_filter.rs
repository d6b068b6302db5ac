//! Scan-radius candidate selection.

use crate::models::{BaseLocation, Zone};
use crate::spatial::haversine_km;

/// Zones within `radius_km` of `base`, boundary inclusive.
///
/// Input order is kept, but callers must not rely on it.
pub fn filter_candidates(zones: &[Zone], base: &BaseLocation, radius_km: f64) -> Vec<Zone> {
    let candidates: Vec<Zone> = zones
        .iter()
        .filter(|zone| haversine_km(base, *zone) <= radius_km)
        .cloned()
        .collect();

    tracing::debug!(
        total = zones.len(),
        candidates = candidates.len(),
        radius_km,
        "Filtered zones by scan radius"
    );
    candidates
}
