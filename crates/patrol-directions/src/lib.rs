//! Road routing for patrol plans through an OpenRouteService-compatible API.

pub mod backoff;
pub mod client;
pub mod error;
pub mod road_route;

pub use backoff::Backoff;
pub use client::{DirectionsProvider, OrsClient, OrsConfig, ProviderRoute};
pub use error::DirectionsError;
pub use road_route::RoadRouteAdapter;
