//! Two-attempt planning with a caller-supplied budget decision.
//!
//! Attempt one covers critical zones safety-first. If that tour runs past
//! `km_limit + tolerance_km`, the resolver picks the policy for attempt two,
//! whose result is final whether or not it fits the budget.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::{ready, Future};
use std::str::FromStr;

use crate::error::PlanError;
use crate::models::{validate_zones, BaseLocation, RoutePlan, Zone};
use crate::route_builder::{RouteBuilder, RoutePolicy};
use crate::rules::PlannerRules;
use crate::zone_filter::filter_candidates;

/// Answer to a budget overrun.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    /// Keep risk coverage, accept the extra distance.
    SafetyFirst,
    /// Stay within the budget, accept lower coverage.
    DistanceLimited,
}

impl Decision {
    pub fn policy(self) -> RoutePolicy {
        match self {
            Decision::SafetyFirst => RoutePolicy::SafetyFirst,
            Decision::DistanceLimited => RoutePolicy::DistanceLimited,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::SafetyFirst => write!(f, "SAFETY_FIRST"),
            Decision::DistanceLimited => write!(f, "DISTANCE_LIMITED"),
        }
    }
}

impl FromStr for Decision {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "safety_first" | "safety" => Ok(Decision::SafetyFirst),
            "distance_limited" | "distance" => Ok(Decision::DistanceLimited),
            other => Err(format!(
                "unknown decision '{}', expected safety-first or distance-limited",
                other
            )),
        }
    }
}

/// What the resolver is asked about.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetOverrun {
    pub km_limit: f64,
    pub tolerance_km: f64,
    pub planned_km: f64,
    /// `planned_km - km_limit`
    pub overrun_km: f64,
    pub zones_planned: usize,
}

impl fmt::Display for BudgetOverrun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "High-risk coverage needs {:.1} km across {} zones, {:.1} km over the {:.1} km limit (tolerance {:.1} km)",
            self.planned_km, self.zones_planned, self.overrun_km, self.km_limit, self.tolerance_km
        )
    }
}

/// Chooses the second-attempt policy when the first plan runs over budget.
///
/// Returning `None` declines the choice and aborts planning.
pub trait DecisionResolver: Send + Sync {
    fn decide(&self, overrun: &BudgetOverrun) -> impl Future<Output = Option<Decision>> + Send;
}

/// A fixed answer.
impl DecisionResolver for Decision {
    fn decide(&self, _overrun: &BudgetOverrun) -> impl Future<Output = Option<Decision>> + Send {
        ready(Some(*self))
    }
}

/// Wraps a synchronous closure.
pub struct FnResolver<F>(pub F);

impl<F> DecisionResolver for FnResolver<F>
where
    F: Fn(&BudgetOverrun) -> Option<Decision> + Send + Sync,
{
    fn decide(&self, overrun: &BudgetOverrun) -> impl Future<Output = Option<Decision>> + Send {
        ready((self.0)(overrun))
    }
}

/// Final plan plus how it was reached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanOutcome {
    pub plan: RoutePlan,
    /// 1 when the first attempt was accepted, 2 after negotiation
    pub attempts: u8,
    pub decision: Option<Decision>,
    pub first_attempt_km: f64,
    /// Final plan is longer than `km_limit + tolerance_km`
    pub over_budget: bool,
}

/// Runs the first attempt, negotiates on overrun, runs the second.
#[derive(Debug, Clone, Default)]
pub struct RetryCoordinator {
    rules: PlannerRules,
}

impl RetryCoordinator {
    pub fn new(rules: PlannerRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &PlannerRules {
        &self.rules
    }

    pub async fn plan<R: DecisionResolver>(
        &self,
        zones: &[Zone],
        base: &BaseLocation,
        km_limit: f64,
        radius_km: f64,
        resolver: &R,
    ) -> Result<PlanOutcome, PlanError> {
        self.validate(zones, base, km_limit, radius_km)?;

        let candidates = filter_candidates(zones, base, radius_km);
        let budget_km = km_limit + self.rules.tolerance_km;

        let first = RouteBuilder::new(
            km_limit,
            self.rules.first_attempt_min_risk,
            RoutePolicy::SafetyFirst,
        )
        .build(&candidates, base);
        let first_attempt_km = first.total_distance_km;

        if first_attempt_km <= budget_km {
            tracing::info!(
                total_km = first_attempt_km,
                km_limit,
                zones = first.points_visited(),
                "First attempt accepted"
            );
            return Ok(PlanOutcome {
                plan: first,
                attempts: 1,
                decision: None,
                first_attempt_km,
                over_budget: false,
            });
        }

        let overrun = BudgetOverrun {
            km_limit,
            tolerance_km: self.rules.tolerance_km,
            planned_km: first_attempt_km,
            overrun_km: first_attempt_km - km_limit,
            zones_planned: first.points_visited(),
        };
        tracing::warn!(
            planned_km = overrun.planned_km,
            km_limit,
            tolerance_km = overrun.tolerance_km,
            "First attempt over budget, requesting decision"
        );

        let waited = self.rules.decision_timeout();
        let decision = tokio::time::timeout(waited, resolver.decide(&overrun))
            .await
            .map_err(|_| PlanError::DecisionTimeout { waited })?
            .ok_or(PlanError::DecisionDeclined)?;

        let second = RouteBuilder::new(
            km_limit,
            self.rules.second_attempt_min_risk,
            decision.policy(),
        )
        .build(&candidates, base);
        let over_budget = second.total_distance_km > budget_km;

        tracing::info!(
            %decision,
            total_km = second.total_distance_km,
            km_limit,
            zones = second.points_visited(),
            over_budget,
            "Second attempt accepted"
        );

        Ok(PlanOutcome {
            plan: second,
            attempts: 2,
            decision: Some(decision),
            first_attempt_km,
            over_budget,
        })
    }

    fn validate(
        &self,
        zones: &[Zone],
        base: &BaseLocation,
        km_limit: f64,
        radius_km: f64,
    ) -> Result<(), PlanError> {
        self.rules.validate()?;
        base.validate()?;
        if !km_limit.is_finite() || km_limit < 0.0 {
            return Err(PlanError::invalid(format!(
                "km_limit must be a non-negative number, got {}",
                km_limit
            )));
        }
        if !radius_km.is_finite() || radius_km < 0.0 {
            return Err(PlanError::invalid(format!(
                "radius_km must be a non-negative number, got {}",
                radius_km
            )));
        }
        validate_zones(zones)
    }
}
