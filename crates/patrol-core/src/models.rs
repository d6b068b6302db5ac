//! Core data models for patrol planning.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::error::PlanError;
use crate::spatial::{is_valid_coordinate, path_length_km};

/// Highest risk score a zone may carry.
pub const MAX_RISK: u8 = 10;

/// Stable zone identifier. Zone files use both numeric and string ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ZoneId {
    Num(u64),
    Text(String),
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZoneId::Num(value) => write!(f, "{}", value),
            ZoneId::Text(value) => f.write_str(value),
        }
    }
}

impl From<u64> for ZoneId {
    fn from(value: u64) -> Self {
        ZoneId::Num(value)
    }
}

impl From<&str> for ZoneId {
    fn from(value: &str) -> Self {
        ZoneId::Text(value.to_string())
    }
}

impl From<String> for ZoneId {
    fn from(value: String) -> Self {
        ZoneId::Text(value)
    }
}

/// A point of interest with a risk score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: ZoneId,
    #[serde(default)]
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    /// 0..=10, higher is more dangerous
    pub risk: u8,
}

impl Zone {
    pub fn new(id: impl Into<ZoneId>, name: impl Into<String>, lat: f64, lng: f64, risk: u8) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            lat,
            lng,
            risk,
        }
    }

    pub fn risk_level(&self) -> RiskLevel {
        RiskLevel::from_risk(self.risk)
    }
}

/// Display bands for risk scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// Below 5
    Routine,
    /// 5 through 7
    High,
    /// 8 and above
    Critical,
}

impl RiskLevel {
    pub fn from_risk(risk: u8) -> Self {
        match risk {
            0..=4 => RiskLevel::Routine,
            5..=7 => RiskLevel::High,
            _ => RiskLevel::Critical,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Routine => write!(f, "ROUTINE"),
            RiskLevel::High => write!(f, "HIGH"),
            RiskLevel::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Headquarters coordinate. Every route starts and ends here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaseLocation {
    pub lat: f64,
    pub lng: f64,
}

impl BaseLocation {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn validate(&self) -> Result<(), PlanError> {
        if !is_valid_coordinate(self.lat, self.lng) {
            return Err(PlanError::invalid(format!(
                "base location ({}, {}) is not a valid coordinate",
                self.lat, self.lng
            )));
        }
        Ok(())
    }
}

/// One stop of a planned route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Waypoint {
    /// Synthetic HQ entry; carries no risk.
    Hq { lat: f64, lng: f64 },
    Zone(Zone),
}

impl Waypoint {
    pub fn hq(base: &BaseLocation) -> Self {
        Waypoint::Hq {
            lat: base.lat,
            lng: base.lng,
        }
    }

    pub fn lat(&self) -> f64 {
        match self {
            Waypoint::Hq { lat, .. } => *lat,
            Waypoint::Zone(zone) => zone.lat,
        }
    }

    pub fn lng(&self) -> f64 {
        match self {
            Waypoint::Hq { lng, .. } => *lng,
            Waypoint::Zone(zone) => zone.lng,
        }
    }

    pub fn risk(&self) -> Option<u8> {
        match self {
            Waypoint::Hq { .. } => None,
            Waypoint::Zone(zone) => Some(zone.risk),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Waypoint::Hq { .. } => "HQ",
            Waypoint::Zone(zone) => &zone.name,
        }
    }

    pub fn zone(&self) -> Option<&Zone> {
        match self {
            Waypoint::Hq { .. } => None,
            Waypoint::Zone(zone) => Some(zone),
        }
    }

    pub fn is_hq(&self) -> bool {
        matches!(self, Waypoint::Hq { .. })
    }
}

/// Ordered straight-line patrol plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePlan {
    pub route: Vec<Waypoint>,
    /// Sum of great-circle leg distances in kilometres
    pub total_distance_km: f64,
}

impl RoutePlan {
    /// Build a plan from HQ, the visited zones in order, and HQ again.
    pub fn from_visits(base: &BaseLocation, visits: Vec<Zone>) -> Self {
        let mut route = Vec::with_capacity(visits.len() + 2);
        route.push(Waypoint::hq(base));
        route.extend(visits.into_iter().map(Waypoint::Zone));
        route.push(Waypoint::hq(base));
        let total_distance_km = path_length_km(&route);
        Self {
            route,
            total_distance_km,
        }
    }

    /// HQ to HQ with nothing in between.
    pub fn hq_only(base: &BaseLocation) -> Self {
        Self::from_visits(base, Vec::new())
    }

    pub fn visited_zones(&self) -> impl Iterator<Item = &Zone> {
        self.route.iter().filter_map(Waypoint::zone)
    }

    pub fn points_visited(&self) -> usize {
        self.route.len().saturating_sub(2)
    }

    /// `[lat, lng]` pairs in visiting order.
    pub fn coordinates(&self) -> Vec<[f64; 2]> {
        self.route.iter().map(|wp| [wp.lat(), wp.lng()]).collect()
    }
}

/// Road-following route returned by the directions provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadRoute {
    /// `[lat, lng]` pairs tracing the roads
    pub route_coords: Vec<[f64; 2]>,
    pub distance_km: f64,
    pub duration_min: f64,
}

/// Validated, id-unique zone set read once per planning call.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ZoneSnapshot {
    zones: Vec<Zone>,
}

impl ZoneSnapshot {
    pub fn new(zones: impl IntoIterator<Item = Zone>) -> Result<Self, PlanError> {
        let zones: Vec<Zone> = zones.into_iter().collect();
        validate_zones(&zones)?;
        Ok(Self { zones })
    }

    /// Parse a JSON array of `{id, name, lat, lng, risk}` objects.
    pub fn from_json(raw: &str) -> Result<Self, PlanError> {
        let zones: Vec<Zone> = serde_json::from_str(raw)
            .map_err(|err| PlanError::invalid(format!("zone data is not valid JSON: {}", err)))?;
        Self::new(zones)
    }

    pub fn as_slice(&self) -> &[Zone] {
        &self.zones
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Zone> {
        self.zones.iter()
    }

    pub fn into_vec(self) -> Vec<Zone> {
        self.zones
    }
}

/// Check coordinates, risk range, and id uniqueness.
pub fn validate_zones(zones: &[Zone]) -> Result<(), PlanError> {
    let mut seen = HashSet::with_capacity(zones.len());
    for zone in zones {
        if !is_valid_coordinate(zone.lat, zone.lng) {
            return Err(PlanError::invalid(format!(
                "zone {} has invalid coordinate ({}, {})",
                zone.id, zone.lat, zone.lng
            )));
        }
        if zone.risk > MAX_RISK {
            return Err(PlanError::invalid(format!(
                "zone {} risk {} outside 0..={}",
                zone.id, zone.risk, MAX_RISK
            )));
        }
        if !seen.insert(&zone.id) {
            return Err(PlanError::invalid(format!("duplicate zone id {}", zone.id)));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zone_ids_accept_numbers_and_strings() {
        let raw = r#"[
            {"id": 1, "name": "Harbour", "lat": 13.08, "lng": 80.27, "risk": 9},
            {"id": "z-2", "name": "Market", "lat": 13.10, "lng": 80.30, "risk": 3}
        ]"#;
        let snapshot = ZoneSnapshot::from_json(raw).unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.as_slice()[0].id, ZoneId::Num(1));
        assert_eq!(snapshot.as_slice()[1].id, ZoneId::from("z-2"));
    }

    #[test]
    fn snapshot_rejects_duplicate_ids() {
        let zones = vec![
            Zone::new(1, "a", 13.0, 80.0, 3),
            Zone::new(1, "b", 13.1, 80.1, 4),
        ];
        let err = ZoneSnapshot::new(zones).unwrap_err();
        assert!(matches!(err, PlanError::InvalidInput { .. }));
    }

    #[test]
    fn snapshot_rejects_risk_above_ten() {
        let err = ZoneSnapshot::new(vec![Zone::new(1, "a", 13.0, 80.0, 11)]).unwrap_err();
        assert!(err.to_string().contains("risk 11"));
    }

    #[test]
    fn negative_risk_fails_to_parse() {
        let raw = r#"[{"id": 1, "name": "a", "lat": 13.0, "lng": 80.0, "risk": -1}]"#;
        assert!(ZoneSnapshot::from_json(raw).is_err());
    }

    #[test]
    fn risk_levels_follow_display_bands() {
        assert_eq!(RiskLevel::from_risk(0), RiskLevel::Routine);
        assert_eq!(RiskLevel::from_risk(4), RiskLevel::Routine);
        assert_eq!(RiskLevel::from_risk(5), RiskLevel::High);
        assert_eq!(RiskLevel::from_risk(7), RiskLevel::High);
        assert_eq!(RiskLevel::from_risk(8), RiskLevel::Critical);
        assert_eq!(RiskLevel::from_risk(10), RiskLevel::Critical);
    }

    #[test]
    fn hq_only_plan_is_degenerate() {
        let base = BaseLocation::new(13.05, 80.25);
        let plan = RoutePlan::hq_only(&base);
        assert_eq!(plan.route.len(), 2);
        assert!(plan.route.iter().all(Waypoint::is_hq));
        assert_eq!(plan.total_distance_km, 0.0);
        assert_eq!(plan.points_visited(), 0);
    }

    #[test]
    fn waypoints_serialize_with_kind_tag() {
        let base = BaseLocation::new(13.05, 80.25);
        let plan = RoutePlan::from_visits(&base, vec![Zone::new(1, "Harbour", 13.08, 80.27, 9)]);
        let value = serde_json::to_value(&plan).unwrap();
        assert_eq!(value["route"][0]["kind"], "hq");
        assert_eq!(value["route"][1]["kind"], "zone");
        assert_eq!(value["route"][1]["risk"], 9);
        let back: RoutePlan = serde_json::from_value(value).unwrap();
        assert_eq!(back.route, plan.route);
    }
}
