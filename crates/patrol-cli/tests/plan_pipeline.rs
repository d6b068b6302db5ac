//! `plan` pipeline against a mock directions server.

use patrol_cli::config::Config;
use patrol_cli::pipeline::{plan_patrol, PlanRequest};
use patrol_core::{BaseLocation, BudgetOverrun, Decision, FnResolver, PlanError, Zone, ZoneSnapshot};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DIRECTIONS_PATH: &str = "/v2/directions/driving-car/geojson";

fn hq() -> BaseLocation {
    BaseLocation::new(13.0827, 80.2707)
}

fn config_for(uri: String, retries: u32) -> Config {
    let mut config = Config::from_lookup(|_| None);
    config.directions_url = uri;
    config.routing_retries = retries;
    config.directions_timeout_secs = 2;
    config
}

/// One critical zone ~1.6 km from HQ.
fn zones() -> ZoneSnapshot {
    ZoneSnapshot::new(vec![
        Zone::new(1, "Central Station", 13.0950, 80.2780, 9),
        Zone::new(2, "Vepery", 13.0860, 80.2610, 3),
    ])
    .unwrap()
}

fn request(road: bool) -> PlanRequest {
    PlanRequest {
        hq: hq(),
        km_limit: 20.0,
        radius_km: 10.0,
        road,
    }
}

fn round_trip_body() -> serde_json::Value {
    json!({
        "features": [{
            "properties": {
                "summary": {"distance": 3950.0, "duration": 540.0},
                "way_points": [0, 1, 2]
            },
            "geometry": {"coordinates": [[80.2707, 13.0827], [80.2780, 13.0950], [80.2707, 13.0827]]}
        }]
    })
}

#[tokio::test]
async fn plan_with_road_route() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(DIRECTIONS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(round_trip_body()))
        .expect(1)
        .mount(&server)
        .await;

    let report = plan_patrol(&zones(), &request(true), &config_for(server.uri(), 0), &Decision::SafetyFirst)
        .await
        .unwrap();

    assert_eq!(report.attempts, 1);
    assert_eq!(report.points_visited, 1);
    let road = report.road.expect("road route present");
    assert_eq!(road.distance_km, 3.95);
    assert!(report.road_error.is_none());
}

#[tokio::test]
async fn road_failure_keeps_straight_line_plan() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(DIRECTIONS_PATH))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    let report = plan_patrol(&zones(), &request(true), &config_for(server.uri(), 1), &Decision::SafetyFirst)
        .await
        .unwrap();

    assert_eq!(report.points_visited, 1);
    assert!(report.road.is_none());
    assert!(report.road_error.unwrap().contains("503"));
}

#[tokio::test]
async fn no_road_skips_the_provider() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(round_trip_body()))
        .expect(0)
        .mount(&server)
        .await;

    let report = plan_patrol(&zones(), &request(false), &config_for(server.uri(), 0), &Decision::SafetyFirst)
        .await
        .unwrap();
    assert!(report.road.is_none() && report.road_error.is_none());
}

#[tokio::test]
async fn declined_decision_fails_planning() {
    // Critical zones 6.5 km out on each compass point: a ~40 km tour against 20 km.
    let d = 6.5 / 111.195;
    let dl = d / hq().lat.to_radians().cos();
    let zones = ZoneSnapshot::new(vec![
        Zone::new(1, "north", hq().lat + d, hq().lng, 9),
        Zone::new(2, "east", hq().lat, hq().lng + dl, 9),
        Zone::new(3, "south", hq().lat - d, hq().lng, 9),
        Zone::new(4, "west", hq().lat, hq().lng - dl, 9),
    ])
    .unwrap();
    let decline = FnResolver(|_: &BudgetOverrun| -> Option<Decision> { None });

    let err = plan_patrol(&zones, &request(false), &config_for("http://127.0.0.1:9".to_string(), 0), &decline)
        .await
        .unwrap_err();
    assert!(matches!(err.downcast_ref::<PlanError>(), Some(PlanError::DecisionDeclined)));
}
