//! Greedy risk-aware route construction under a distance budget.
//!
//! Zones below the risk threshold are dropped, the rest are ordered by
//! descending risk (ties: nearer to HQ first, then id) and appended one at a
//! time from the current position. A zone is only eligible while the leg to
//! it plus its distance back to HQ fits in the remaining budget.
//!
//! The two policies account for the budget differently. Distance-limited
//! charges every leg against one tour budget, so the finished tour never
//! exceeds `km_limit`. Safety-first bounds each excursion (current position,
//! zone, back to HQ) by `km_limit` without charging the tour, which is how
//! risk coverage can run over budget and force a renegotiation.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::models::{BaseLocation, RoutePlan, Zone};
use crate::spatial::haversine_km;

/// Selection rule applied at each extension step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutePolicy {
    /// Highest remaining risk first, nearest breaks ties. Budget bounds each excursion.
    SafetyFirst,
    /// Nearest zone first, higher risk breaks ties. Budget bounds the whole tour.
    DistanceLimited,
}

impl RoutePolicy {
    pub fn prioritizes_safety(self) -> bool {
        matches!(self, RoutePolicy::SafetyFirst)
    }
}

impl From<bool> for RoutePolicy {
    fn from(prioritize_safety: bool) -> Self {
        if prioritize_safety {
            RoutePolicy::SafetyFirst
        } else {
            RoutePolicy::DistanceLimited
        }
    }
}

/// Parameters for one builder pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteBuilder {
    pub km_limit: f64,
    pub risk_threshold: u8,
    pub policy: RoutePolicy,
}

#[derive(Debug, Clone)]
struct Candidate {
    zone: Zone,
    home_km: f64,
}

impl RouteBuilder {
    pub fn new(km_limit: f64, risk_threshold: u8, policy: RoutePolicy) -> Self {
        Self {
            km_limit,
            risk_threshold,
            policy,
        }
    }

    /// Produce an HQ-to-HQ plan over `candidates`.
    pub fn build(&self, candidates: &[Zone], base: &BaseLocation) -> RoutePlan {
        let mut pending = self.qualifying(candidates, base);
        if pending.is_empty() {
            tracing::debug!(
                risk_threshold = self.risk_threshold,
                "No zones meet the risk threshold"
            );
            return RoutePlan::hq_only(base);
        }

        let mut visits: Vec<Zone> = Vec::with_capacity(pending.len());
        let mut current = [base.lat, base.lng];
        let mut remaining = self.km_limit;

        while let Some((idx, leg_km)) = self.select_next(&pending, &current, remaining) {
            let picked = pending.remove(idx);
            if !self.policy.prioritizes_safety() {
                remaining -= leg_km;
            }
            current = [picked.zone.lat, picked.zone.lng];
            tracing::debug!(
                zone = %picked.zone.id,
                risk = picked.zone.risk,
                leg_km,
                remaining_km = remaining,
                "Added patrol waypoint"
            );
            visits.push(picked.zone);
        }

        let plan = RoutePlan::from_visits(base, visits);
        tracing::debug!(
            policy = ?self.policy,
            visited = plan.points_visited(),
            skipped = pending.len(),
            total_km = plan.total_distance_km,
            "Route pass complete"
        );
        plan
    }

    /// Zones at or above the threshold, sorted by risk desc, HQ distance asc, id.
    fn qualifying(&self, candidates: &[Zone], base: &BaseLocation) -> Vec<Candidate> {
        let mut qualifying: Vec<Candidate> = candidates
            .iter()
            .filter(|zone| zone.risk >= self.risk_threshold)
            .map(|zone| Candidate {
                home_km: haversine_km(zone, base),
                zone: zone.clone(),
            })
            .collect();

        qualifying.sort_by(|a, b| {
            b.zone
                .risk
                .cmp(&a.zone.risk)
                .then_with(|| a.home_km.total_cmp(&b.home_km))
                .then_with(|| a.zone.id.cmp(&b.zone.id))
        });
        qualifying
    }

    /// Index and leg length of the next zone, if any is still feasible.
    fn select_next(
        &self,
        pending: &[Candidate],
        current: &[f64; 2],
        remaining_km: f64,
    ) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for (idx, candidate) in pending.iter().enumerate() {
            let leg_km = haversine_km(current, &candidate.zone);
            // NaN budgets fail this check too.
            if !(leg_km + candidate.home_km <= remaining_km) {
                continue;
            }
            let better = match best {
                None => true,
                Some((best_idx, best_leg)) => {
                    self.compare(candidate, leg_km, &pending[best_idx], best_leg)
                        == Ordering::Less
                }
            };
            if better {
                best = Some((idx, leg_km));
            }
        }
        best
    }

    /// `Less` when `a` should be visited before `b`.
    fn compare(&self, a: &Candidate, a_leg: f64, b: &Candidate, b_leg: f64) -> Ordering {
        match self.policy {
            RoutePolicy::SafetyFirst => b
                .zone
                .risk
                .cmp(&a.zone.risk)
                .then_with(|| a_leg.total_cmp(&b_leg)),
            RoutePolicy::DistanceLimited => a_leg
                .total_cmp(&b_leg)
                .then_with(|| b.zone.risk.cmp(&a.zone.risk)),
        }
    }
}

/// Build a plan from the functional parameters.
pub fn build(
    candidates: &[Zone],
    base: &BaseLocation,
    km_limit: f64,
    risk_threshold: u8,
    prioritize_safety: bool,
) -> RoutePlan {
    RouteBuilder::new(km_limit, risk_threshold, RoutePolicy::from(prioritize_safety))
        .build(candidates, base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Waypoint;
    use crate::spatial::path_length_km;
    use rand::Rng;

    fn base() -> BaseLocation {
        BaseLocation::new(13.05, 80.25)
    }

    fn ids(plan: &RoutePlan) -> Vec<String> {
        plan.visited_zones().map(|zone| zone.id.to_string()).collect()
    }

    /// A zone `km` kilometres due north of HQ.
    fn north(id: u64, km: f64, risk: u8) -> Zone {
        let lat = base().lat + km / 111.195;
        Zone::new(id, format!("n{id}"), lat, base().lng, risk)
    }

    #[test]
    fn empty_candidates_give_hq_only_route() {
        let plan = build(&[], &base(), 50.0, 2, true);
        assert_eq!(plan.route.len(), 2);
        assert!(plan.route.iter().all(Waypoint::is_hq));
        assert_eq!(plan.total_distance_km, 0.0);
    }

    #[test]
    fn threshold_discards_low_risk_zones() {
        let zones = vec![north(1, 1.0, 1), north(2, 2.0, 6)];
        let plan = build(&zones, &base(), 100.0, 5, true);
        assert_eq!(ids(&plan), vec!["2"]);
    }

    #[test]
    fn budget_below_nearest_round_trip_adds_nothing() {
        let zones = vec![north(1, 5.0, 9)];
        let plan = build(&zones, &base(), 9.9, 0, true);
        assert_eq!(plan.points_visited(), 0);
        assert_eq!(plan.total_distance_km, 0.0);
    }

    #[test]
    fn safety_first_visits_highest_risk_before_nearer_zones() {
        let zones = vec![north(1, 1.0, 3), north(2, 4.0, 9)];
        let plan = build(&zones, &base(), 100.0, 0, true);
        assert_eq!(ids(&plan), vec!["2", "1"]);
    }

    #[test]
    fn distance_limited_visits_nearest_first() {
        let zones = vec![north(1, 1.0, 3), north(2, 4.0, 9)];
        let plan = build(&zones, &base(), 100.0, 0, false);
        assert_eq!(ids(&plan), vec!["1", "2"]);
    }

    #[test]
    fn safety_first_trades_distance_for_coverage() {
        // High-risk zone far south, three routine zones close north.
        let far = Zone::new(9, "far", base().lat - 9.5 / 111.195, base().lng, 10);
        let zones = vec![far, north(1, 1.0, 5), north(2, 2.0, 5), north(3, 3.0, 5)];
        let safety = build(&zones, &base(), 20.0, 5, true);
        let limited = build(&zones, &base(), 20.0, 5, false);

        assert_eq!(ids(&safety), vec!["9", "1", "2", "3"]);
        assert!(safety.total_distance_km > 20.0);
        assert_eq!(ids(&limited), vec!["1", "2", "3"]);
        assert!(limited.total_distance_km <= 20.0);
    }

    #[test]
    fn equal_risk_ties_break_by_nearest() {
        let zones = vec![north(1, 3.0, 7), north(2, 1.0, 7)];
        let plan = build(&zones, &base(), 100.0, 0, true);
        assert_eq!(ids(&plan), vec!["2", "1"]);
    }

    /// Replays the feasibility check the builder must have passed for every stop.
    fn assert_steps_were_feasible(plan: &RoutePlan, km_limit: f64, safety: bool) {
        let mut remaining = km_limit;
        for pair in plan.route.windows(2) {
            let (from, to) = (&pair[0], &pair[1]);
            if to.is_hq() {
                break;
            }
            let leg = haversine_km(from, to);
            let home = haversine_km(to, &base());
            assert!(leg + home <= remaining + 1e-9, "stop {} did not fit", to.name());
            if !safety {
                remaining -= leg;
            }
        }
    }

    #[test]
    fn route_is_deterministic_and_bounded() {
        let mut rng = rand::rng();
        for _ in 0..50 {
            let zones: Vec<Zone> = (0..25u64)
                .map(|id| {
                    Zone::new(
                        id,
                        format!("z{id}"),
                        13.05 + rng.random_range(-0.1..0.1),
                        80.25 + rng.random_range(-0.1..0.1),
                        rng.random_range(0..=10),
                    )
                })
                .collect();
            let km_limit = rng.random_range(0.0..60.0);
            let threshold = rng.random_range(0..=10);
            let safety = rng.random_bool(0.5);

            let plan = build(&zones, &base(), km_limit, threshold, safety);
            let again = build(&zones, &base(), km_limit, threshold, safety);
            assert_eq!(plan, again);

            let first = plan.route.first().unwrap();
            let last = plan.route.last().unwrap();
            assert!(first.is_hq() && last.is_hq());
            assert_eq!((first.lat(), first.lng()), (base().lat, base().lng));
            assert_eq!((last.lat(), last.lng()), (base().lat, base().lng));

            let recomputed = path_length_km(&plan.route);
            assert!((plan.total_distance_km - recomputed).abs() < 1e-9);
            assert!(plan.visited_zones().all(|zone| zone.risk >= threshold));
            assert_steps_were_feasible(&plan, km_limit, safety);
            if !safety {
                assert!(plan.total_distance_km <= km_limit + 1e-9);
            }
        }
    }

    #[test]
    fn each_added_zone_fit_the_remaining_budget() {
        let zones = vec![north(1, 2.0, 9), north(2, 5.0, 8), north(3, 7.0, 7)];
        for safety in [true, false] {
            let plan = build(&zones, &base(), 12.0, 0, safety);
            assert!(plan.points_visited() > 0);
            assert_steps_were_feasible(&plan, 12.0, safety);
        }
    }

    #[test]
    fn nan_budget_adds_nothing() {
        let plan = build(&[north(1, 0.5, 9)], &base(), f64::NAN, 0, true);
        assert_eq!(plan.points_visited(), 0);
    }
}
