//! Patrol report rendering.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use patrol_core::{BaseLocation, Decision, PlanOutcome, RiskLevel, RoadRoute, Zone};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ReportStop {
    pub order: usize,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<RiskLevel>,
}

/// Everything printed for one `plan` run.
#[derive(Debug, Clone, Serialize)]
pub struct PlanReport {
    pub generated_at: DateTime<Utc>,
    pub hq: BaseLocation,
    pub km_limit: f64,
    pub radius_km: f64,
    pub attempts: u8,
    pub decision: Option<Decision>,
    pub first_attempt_km: f64,
    pub over_budget: bool,
    pub points_visited: usize,
    pub total_distance_km: f64,
    pub stops: Vec<ReportStop>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub road: Option<RoadRoute>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub road_error: Option<String>,
}

impl PlanReport {
    pub fn new(outcome: &PlanOutcome, hq: BaseLocation, km_limit: f64, radius_km: f64) -> Self {
        let stops = outcome
            .plan
            .route
            .iter()
            .enumerate()
            .map(|(order, wp)| ReportStop {
                order,
                name: wp.name().to_string(),
                lat: wp.lat(),
                lng: wp.lng(),
                risk: wp.risk(),
                level: wp.zone().map(|zone| zone.risk_level()),
            })
            .collect();
        Self {
            generated_at: Utc::now(),
            hq,
            km_limit,
            radius_km,
            attempts: outcome.attempts,
            decision: outcome.decision,
            first_attempt_km: outcome.first_attempt_km,
            over_budget: outcome.over_budget,
            points_visited: outcome.plan.points_visited(),
            total_distance_km: outcome.plan.total_distance_km,
            stops,
            road: None,
            road_error: None,
        }
    }

    pub fn with_road(mut self, road: Result<RoadRoute, String>) -> Self {
        match road {
            Ok(road) => self.road = Some(road),
            Err(err) => self.road_error = Some(err),
        }
        self
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Patrol plan ({})", self.generated_at.format("%Y-%m-%d %H:%M UTC"));
        let _ = writeln!(
            out,
            "  HQ: {:.4}, {:.4}  budget {:.1} km  radius {:.1} km",
            self.hq.lat, self.hq.lng, self.km_limit, self.radius_km
        );
        match self.decision {
            Some(decision) => {
                let _ = writeln!(
                    out,
                    "  First attempt {:.1} km over budget, replanned as {}",
                    self.first_attempt_km, decision
                );
            }
            None => {
                let _ = writeln!(out, "  Accepted on first attempt");
            }
        }
        if self.over_budget {
            let _ = writeln!(out, "  WARNING: route exceeds the distance budget");
        }
        let _ = writeln!(out);

        for stop in &self.stops {
            match (stop.risk, stop.level) {
                (Some(risk), Some(level)) => {
                    let _ = writeln!(
                        out,
                        "  {:>2}. {:<28} risk {:>2} {:<8} ({:.4}, {:.4})",
                        stop.order, stop.name, risk, level.to_string(), stop.lat, stop.lng
                    );
                }
                _ => {
                    let _ = writeln!(
                        out,
                        "  {:>2}. {:<28}                  ({:.4}, {:.4})",
                        stop.order, stop.name, stop.lat, stop.lng
                    );
                }
            }
        }

        let _ = writeln!(out);
        let _ = writeln!(out, "  Points visited: {}", self.points_visited);
        let _ = writeln!(out, "  Straight-line distance: {:.2} km", self.total_distance_km);
        if let Some(road) = &self.road {
            let _ = writeln!(
                out,
                "  Road distance: {:.2} km, about {:.0} min ({} geometry points)",
                road.distance_km,
                road.duration_min,
                road.route_coords.len()
            );
        }
        if let Some(err) = &self.road_error {
            let _ = writeln!(out, "  Road routing failed: {}", err);
        }
        out
    }
}

/// One-line zone label for listings.
pub fn describe(zone: &Zone) -> String {
    format!("{} [{}] risk {} ({})", zone.name, zone.id, zone.risk, zone.risk_level())
}
