//! OpenRouteService-compatible directions HTTP client.

use dashmap::DashMap;
use patrol_core::{BaseLocation, GeoPoint};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::DirectionsError;

pub const DEFAULT_BASE_URL: &str = "https://api.openrouteservice.org";
pub const DEFAULT_PROFILE: &str = "driving-car";

/// Route as reported by a provider, still in provider units and order.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderRoute {
    /// `[lng, lat]` pairs
    pub geometry: Vec<[f64; 2]>,
    pub distance_m: f64,
    pub duration_s: f64,
    /// Index into `geometry` for each requested stop
    pub way_points: Vec<usize>,
}

/// Something that turns an ordered `[lng, lat]` stop list into a road route.
pub trait DirectionsProvider: Send + Sync {
    fn directions(
        &self,
        coordinates: &[[f64; 2]],
    ) -> impl Future<Output = Result<ProviderRoute, DirectionsError>> + Send;
}

/// Connection settings for [`OrsClient`].
#[derive(Debug, Clone)]
pub struct OrsConfig {
    pub base_url: String,
    pub profile: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub reachability_ttl: Duration,
    /// Entries kept before expired answers are pruned
    pub reachability_capacity: usize,
}

impl Default for OrsConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            profile: DEFAULT_PROFILE.to_string(),
            api_key: None,
            timeout: Duration::from_secs(10),
            reachability_ttl: Duration::from_secs(600),
            reachability_capacity: 1024,
        }
    }
}

#[derive(Debug, Serialize)]
struct DirectionsRequest<'a> {
    coordinates: &'a [[f64; 2]],
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Option<Vec<Feature>>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    geometry: LineString,
    #[serde(default)]
    properties: FeatureProperties,
}

#[derive(Debug, Deserialize)]
struct LineString {
    coordinates: Vec<[f64; 2]>,
}

#[derive(Debug, Default, Deserialize)]
struct FeatureProperties {
    #[serde(default)]
    summary: Summary,
    #[serde(default)]
    way_points: Vec<usize>,
}

/// Zero-length routes come back with the fields omitted.
#[derive(Debug, Default, Deserialize)]
struct Summary {
    #[serde(default)]
    distance: f64,
    #[serde(default)]
    duration: f64,
}

#[derive(Debug, Clone, Copy)]
struct ReachabilityEntry {
    checked_at: Instant,
    reachable: bool,
}

/// HTTP client for the directions service.
#[derive(Debug, Clone)]
pub struct OrsClient {
    client: Client,
    config: OrsConfig,
    reachability: Arc<DashMap<String, ReachabilityEntry>>,
}

impl OrsClient {
    pub fn new(config: OrsConfig) -> Result<Self, DirectionsError> {
        if config.base_url.trim().is_empty() {
            return Err(DirectionsError::InvalidConfig {
                reason: "directions base URL is empty".to_string(),
            });
        }
        if config.profile.trim().is_empty() {
            return Err(DirectionsError::InvalidConfig {
                reason: "directions profile is empty".to_string(),
            });
        }
        let client = Client::builder()
            .timeout(config.timeout.max(Duration::from_secs(1)))
            .build()
            .map_err(|err| DirectionsError::InvalidConfig {
                reason: format!("failed to build HTTP client: {}", err),
            })?;
        Ok(Self {
            client,
            config,
            reachability: Arc::new(DashMap::new()),
        })
    }

    pub fn config(&self) -> &OrsConfig {
        &self.config
    }

    fn directions_url(&self) -> String {
        format!(
            "{}/v2/directions/{}/geojson",
            self.config.base_url.trim_end_matches('/'),
            self.config.profile
        )
    }

    async fn post_directions(
        &self,
        coordinates: &[[f64; 2]],
    ) -> Result<FeatureCollection, DirectionsError> {
        let mut request = self
            .client
            .post(self.directions_url())
            .json(&DirectionsRequest { coordinates });
        if let Some(key) = self.config.api_key.as_deref().filter(|key| !key.is_empty()) {
            request = request.header("Authorization", key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DirectionsError::unavailable(format!(
                "directions provider HTTP {} {}",
                status,
                body.trim()
            )));
        }

        response.json::<FeatureCollection>().await.map_err(|err| {
            DirectionsError::unavailable(format!("malformed directions response: {}", err))
        })
    }

    /// Whether the provider can route by road from `base` to `point`.
    ///
    /// Provider failures count as unreachable. Answers are cached for
    /// `reachability_ttl`.
    pub async fn is_road_reachable<P: GeoPoint>(&self, base: &BaseLocation, point: &P) -> bool {
        let key = reachability_key(base, point);
        let ttl = self.config.reachability_ttl;
        if let Some(entry) = self.reachability.get(&key) {
            if entry.checked_at.elapsed() <= ttl {
                return entry.reachable;
            }
        }

        let coordinates = [[base.lng, base.lat], [point.lng(), point.lat()]];
        let reachable = match self.post_directions(&coordinates).await {
            Ok(collection) => collection
                .features
                .map(|features| !features.is_empty())
                .unwrap_or(false),
            Err(err) => {
                tracing::warn!("Reachability check failed for {}: {}", key, err);
                false
            }
        };

        self.remember(key, reachable);
        reachable
    }

    fn remember(&self, key: String, reachable: bool) {
        if self.reachability.len() >= self.config.reachability_capacity {
            let ttl = self.config.reachability_ttl;
            self.reachability
                .retain(|_, entry| entry.checked_at.elapsed() <= ttl);
            if self.reachability.len() >= self.config.reachability_capacity {
                self.reachability.clear();
            }
        }
        self.reachability.insert(
            key,
            ReachabilityEntry {
                checked_at: Instant::now(),
                reachable,
            },
        );
    }
}

impl DirectionsProvider for OrsClient {
    fn directions(
        &self,
        coordinates: &[[f64; 2]],
    ) -> impl Future<Output = Result<ProviderRoute, DirectionsError>> + Send {
        async move {
            let collection = self.post_directions(coordinates).await?;
            if let Some(error) = collection.error {
                return Err(DirectionsError::unavailable(format!(
                    "directions provider error: {}",
                    error
                )));
            }
            let feature = collection
                .features
                .and_then(|features| features.into_iter().next())
                .ok_or_else(|| DirectionsError::unavailable("directions response has no route"))?;

            Ok(ProviderRoute {
                geometry: feature.geometry.coordinates,
                distance_m: feature.properties.summary.distance,
                duration_s: feature.properties.summary.duration,
                way_points: feature.properties.way_points,
            })
        }
    }
}

fn reachability_key<P: GeoPoint>(base: &BaseLocation, point: &P) -> String {
    format!(
        "reach:{:.5}:{:.5}:{:.5}:{:.5}",
        base.lat,
        base.lng,
        point.lat(),
        point.lng()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_geojson_route() {
        let raw = r#"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {
                    "summary": {"distance": 8123.4, "duration": 912.0},
                    "way_points": [0, 3, 6]
                },
                "geometry": {"type": "LineString", "coordinates": [[80.25, 13.05], [80.26, 13.06]]}
            }]
        }"#;
        let parsed: FeatureCollection = serde_json::from_str(raw).unwrap();
        let feature = parsed.features.unwrap().into_iter().next().unwrap();
        assert_eq!(feature.properties.way_points, vec![0, 3, 6]);
        assert_eq!(feature.properties.summary.distance, 8123.4);
        assert_eq!(feature.geometry.coordinates[1], [80.26, 13.06]);
    }

    #[test]
    fn zero_length_summary_defaults_to_zero() {
        let raw = r#"{"features": [{"properties": {"summary": {}, "way_points": [0, 0]},
            "geometry": {"coordinates": [[80.25, 13.05]]}}]}"#;
        let parsed: FeatureCollection = serde_json::from_str(raw).unwrap();
        let feature = parsed.features.unwrap().into_iter().next().unwrap();
        assert_eq!(feature.properties.summary.distance, 0.0);
        assert_eq!(feature.properties.summary.duration, 0.0);
    }

    #[test]
    fn error_payload_has_no_features() {
        let raw = r#"{"error": {"code": 2010, "message": "Could not find routable point"}}"#;
        let parsed: FeatureCollection = serde_json::from_str(raw).unwrap();
        assert!(parsed.features.is_none());
        assert!(parsed.error.is_some());
    }

    #[test]
    fn empty_base_url_is_rejected() {
        let config = OrsConfig {
            base_url: "  ".to_string(),
            ..OrsConfig::default()
        };
        assert!(matches!(
            OrsClient::new(config),
            Err(DirectionsError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn directions_url_joins_profile() {
        let client = OrsClient::new(OrsConfig {
            base_url: "http://localhost:8080/ors/".to_string(),
            profile: "driving-car".to_string(),
            ..OrsConfig::default()
        })
        .unwrap();
        assert_eq!(
            client.directions_url(),
            "http://localhost:8080/ors/v2/directions/driving-car/geojson"
        );
    }

    #[test]
    fn reachability_cache_stays_within_capacity() {
        let client = OrsClient::new(OrsConfig {
            reachability_ttl: Duration::ZERO,
            reachability_capacity: 2,
            ..OrsConfig::default()
        })
        .unwrap();
        for idx in 0..10 {
            client.remember(format!("reach:{idx}"), true);
            std::thread::sleep(Duration::from_millis(2));
        }
        assert!(client.reachability.len() <= 2);
        assert!(client.reachability.contains_key("reach:9"));
    }

    #[test]
    fn full_cache_of_fresh_entries_is_reset() {
        let client = OrsClient::new(OrsConfig {
            reachability_capacity: 2,
            ..OrsConfig::default()
        })
        .unwrap();
        client.remember("reach:a".to_string(), true);
        client.remember("reach:b".to_string(), false);
        client.remember("reach:c".to_string(), true);
        // Nothing expired, so the full map is dropped and refilled.
        assert_eq!(client.reachability.len(), 1);
        assert!(client.reachability.contains_key("reach:c"));
    }
}
