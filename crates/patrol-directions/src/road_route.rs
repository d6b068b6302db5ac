//! Converts an ordered waypoint sequence into a road-following route.

use patrol_core::spatial::{is_valid_coordinate, path_length_km};
use patrol_core::{haversine_km, RoadRoute, RoutePlan, Waypoint};

use crate::backoff::Backoff;
use crate::client::{DirectionsProvider, ProviderRoute};
use crate::error::DirectionsError;

/// Geometry ends further than this from their waypoint get the waypoint appended.
const ANCHOR_TOLERANCE_KM: f64 = 0.001;

/// Wraps a [`DirectionsProvider`] and normalises its answers.
#[derive(Debug, Clone)]
pub struct RoadRouteAdapter<P> {
    provider: P,
}

impl<P: DirectionsProvider> RoadRouteAdapter<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Road route for `plan`, HQ to HQ.
    pub async fn for_plan(&self, plan: &RoutePlan) -> Result<RoadRoute, DirectionsError> {
        self.to_road_route(&plan.route).await
    }

    /// Like [`Self::for_plan`], retrying `RoutingUnavailable` up to `retries`
    /// extra times with `backoff` between attempts.
    pub async fn for_plan_with_retry(
        &self,
        plan: &RoutePlan,
        retries: u32,
        backoff: &mut Backoff,
    ) -> Result<RoadRoute, DirectionsError> {
        let mut attempt = 0;
        loop {
            match self.for_plan(plan).await {
                Ok(road) => {
                    backoff.reset();
                    return Ok(road);
                }
                Err(err) if err.is_retryable() && attempt < retries => {
                    attempt += 1;
                    let delay = backoff.fail();
                    tracing::warn!(
                        "Road routing failed (attempt {}/{}), retrying in {:?}: {}",
                        attempt,
                        retries + 1,
                        delay,
                        err
                    );
                    backoff.wait().await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Road route through `waypoints` in order.
    ///
    /// Issues one provider request, except when every waypoint sits on the
    /// same coordinate; that route resolves locally to a single point.
    pub async fn to_road_route(&self, waypoints: &[Waypoint]) -> Result<RoadRoute, DirectionsError> {
        let (first, last) = match waypoints {
            [first, .., last] => (first, last),
            _ => {
                return Err(DirectionsError::InvalidWaypoints {
                    reason: format!("need at least 2 waypoints, got {}", waypoints.len()),
                })
            }
        };
        if let Some(bad) = waypoints
            .iter()
            .find(|wp| !is_valid_coordinate(wp.lat(), wp.lng()))
        {
            return Err(DirectionsError::InvalidWaypoints {
                reason: format!(
                    "waypoint {} has invalid coordinate ({}, {})",
                    bad.name(),
                    bad.lat(),
                    bad.lng()
                ),
            });
        }

        if waypoints
            .iter()
            .all(|wp| wp.lat() == first.lat() && wp.lng() == first.lng())
        {
            tracing::debug!("All waypoints coincide; skipping directions request");
            return Ok(RoadRoute {
                route_coords: vec![[first.lat(), first.lng()]],
                distance_km: 0.0,
                duration_min: 0.0,
            });
        }

        let coordinates: Vec<[f64; 2]> = waypoints.iter().map(|wp| [wp.lng(), wp.lat()]).collect();
        let response = match self.provider.directions(&coordinates).await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!("Directions request failed: {}", err);
                return Err(err);
            }
        };
        check_response(&response, waypoints.len())?;

        let mut route_coords: Vec<[f64; 2]> = Vec::with_capacity(response.geometry.len() + 2);
        let start = [first.lat(), first.lng()];
        let end = [last.lat(), last.lng()];
        if haversine_km(&start, &[response.geometry[0][1], response.geometry[0][0]])
            > ANCHOR_TOLERANCE_KM
        {
            route_coords.push(start);
        }
        route_coords.extend(response.geometry.iter().map(|[lng, lat]| [*lat, *lng]));
        if route_coords
            .last()
            .map_or(true, |tail| haversine_km(tail, &end) > ANCHOR_TOLERANCE_KM)
        {
            route_coords.push(end);
        }

        let geodesic_km = path_length_km(waypoints);
        let reported_km = response.distance_m / 1000.0;
        if reported_km < geodesic_km {
            tracing::debug!(
                reported_km,
                geodesic_km,
                "Provider distance below geodesic length; using geodesic"
            );
        }

        let road = RoadRoute {
            route_coords,
            distance_km: reported_km.max(geodesic_km),
            duration_min: response.duration_s / 60.0,
        };
        tracing::info!(
            points = road.route_coords.len(),
            distance_km = road.distance_km,
            duration_min = road.duration_min,
            "Road route resolved"
        );
        Ok(road)
    }
}

/// Reject provider answers that cannot describe a route through `stops` stops.
fn check_response(response: &ProviderRoute, stops: usize) -> Result<(), DirectionsError> {
    if response.geometry.is_empty() {
        return Err(DirectionsError::unavailable("directions route has empty geometry"));
    }
    if let Some(bad) = response
        .geometry
        .iter()
        .find(|[lng, lat]| !is_valid_coordinate(*lat, *lng))
    {
        return Err(DirectionsError::unavailable(format!(
            "directions geometry contains invalid coordinate {:?}",
            bad
        )));
    }
    if !(response.distance_m.is_finite() && response.distance_m >= 0.0) {
        return Err(DirectionsError::unavailable(format!(
            "directions distance {} is not usable",
            response.distance_m
        )));
    }
    if !(response.duration_s.is_finite() && response.duration_s >= 0.0) {
        return Err(DirectionsError::unavailable(format!(
            "directions duration {} is not usable",
            response.duration_s
        )));
    }
    if response.way_points.len() != stops {
        return Err(DirectionsError::unavailable(format!(
            "directions returned {} way points for {} stops",
            response.way_points.len(),
            stops
        )));
    }
    if response.way_points.windows(2).any(|pair| pair[1] < pair[0]) {
        return Err(DirectionsError::unavailable(
            "directions way points are out of order",
        ));
    }
    if response
        .way_points
        .iter()
        .any(|idx| *idx >= response.geometry.len())
    {
        return Err(DirectionsError::unavailable(
            "directions way points index past the geometry",
        ));
    }
    Ok(())
}
