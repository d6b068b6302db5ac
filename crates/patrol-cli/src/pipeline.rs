//! Plan, negotiate, then road-route: the `plan` subcommand end to end.

use anyhow::{Context, Result};
use patrol_core::{BaseLocation, DecisionResolver, PlannerRules, RetryCoordinator, ZoneSnapshot};
use patrol_directions::{Backoff, OrsClient, RoadRouteAdapter};

use crate::config::Config;
use crate::report::PlanReport;

#[derive(Debug, Clone)]
pub struct PlanRequest {
    pub hq: BaseLocation,
    pub km_limit: f64,
    pub radius_km: f64,
    /// Resolve the final plan against the road network
    pub road: bool,
}

pub async fn plan_patrol<R: DecisionResolver>(
    zones: &ZoneSnapshot,
    request: &PlanRequest,
    config: &Config,
    resolver: &R,
) -> Result<PlanReport> {
    let rules = PlannerRules::default().with_decision_timeout(config.decision_timeout());
    let coordinator = RetryCoordinator::new(rules);
    let outcome = coordinator
        .plan(
            zones.as_slice(),
            &request.hq,
            request.km_limit,
            request.radius_km,
            resolver,
        )
        .await
        .context("patrol planning failed")?;

    let report = PlanReport::new(&outcome, request.hq, request.km_limit, request.radius_km);
    if !request.road {
        return Ok(report);
    }

    let client = OrsClient::new(config.ors_config()).context("invalid directions configuration")?;
    let adapter = RoadRouteAdapter::new(client);
    let mut backoff = Backoff::default();
    let road = adapter
        .for_plan_with_retry(&outcome.plan, config.routing_retries, &mut backoff)
        .await;
    if let Err(err) = &road {
        tracing::error!("Road routing gave up, reporting straight-line plan: {}", err);
    }
    Ok(report.with_road(road.map_err(|err| err.to_string())))
}
