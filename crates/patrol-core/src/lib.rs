//! Patrol route planning core.
//!
//! Selects risk-weighted zones around HQ, orders them under a distance
//! budget, and negotiates between coverage and distance when they conflict.

pub mod coordinator;
pub mod error;
pub mod models;
pub mod route_builder;
pub mod rules;
pub mod spatial;
pub mod zone_filter;

pub use coordinator::{
    BudgetOverrun, Decision, DecisionResolver, FnResolver, PlanOutcome, RetryCoordinator,
};
pub use error::PlanError;
pub use models::{
    BaseLocation, RiskLevel, RoadRoute, RoutePlan, Waypoint, Zone, ZoneId, ZoneSnapshot,
};
pub use route_builder::{build, RouteBuilder, RoutePolicy};
pub use rules::PlannerRules;
pub use spatial::{haversine_distance, haversine_km, path_length_km, GeoPoint};
pub use zone_filter::filter_candidates;
