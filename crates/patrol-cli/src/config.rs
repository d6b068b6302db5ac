//! CLI configuration from environment.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use patrol_core::BaseLocation;
use patrol_directions::client::{DEFAULT_BASE_URL, DEFAULT_PROFILE};
use patrol_directions::OrsConfig;

#[derive(Debug, Clone)]
pub struct Config {
    pub directions_url: String,
    pub directions_profile: String,
    pub api_key: Option<String>,
    pub directions_timeout_secs: u64,
    pub decision_timeout_secs: u64,
    pub routing_retries: u32,
    pub hq: BaseLocation,
    pub log_json: bool,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unset or unparsable values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            directions_url: lookup("PATROL_DIRECTIONS_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            directions_profile: lookup("PATROL_DIRECTIONS_PROFILE")
                .unwrap_or_else(|| DEFAULT_PROFILE.to_string()),
            api_key: lookup("ORS_API_KEY").filter(|key| !key.trim().is_empty()),
            directions_timeout_secs: parse_var(&lookup, "PATROL_DIRECTIONS_TIMEOUT_S").unwrap_or(10),
            decision_timeout_secs: parse_var(&lookup, "PATROL_DECISION_TIMEOUT_S").unwrap_or(120),
            routing_retries: parse_var(&lookup, "PATROL_ROUTING_RETRIES").unwrap_or(2),
            hq: BaseLocation::new(
                parse_var(&lookup, "PATROL_HQ_LAT").unwrap_or(13.0827),
                parse_var(&lookup, "PATROL_HQ_LNG").unwrap_or(80.2707),
            ),
            log_json: lookup("PATROL_LOG_JSON")
                .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
                .unwrap_or(false),
        }
    }

    pub fn decision_timeout(&self) -> Duration {
        Duration::from_secs(self.decision_timeout_secs)
    }

    pub fn ors_config(&self) -> OrsConfig {
        OrsConfig {
            base_url: self.directions_url.clone(),
            profile: self.directions_profile.clone(),
            api_key: self.api_key.clone(),
            timeout: Duration::from_secs(self.directions_timeout_secs),
            ..OrsConfig::default()
        }
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|s| s.trim().parse().ok())
}
