//! Planning thresholds and budget rules.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::PlanError;
use crate::models::MAX_RISK;

/// Configuration for the two-attempt planning policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerRules {
    /// Minimum risk for the first, safety-first attempt (critical zones only).
    /// Must stay above `second_attempt_min_risk`, which is the wider set.
    pub first_attempt_min_risk: u8,
    /// Minimum risk for the renegotiated second attempt; admits more zones
    pub second_attempt_min_risk: u8,
    /// Slack over the budget accepted without negotiation (km)
    pub tolerance_km: f64,
    /// How long to wait for a budget decision (seconds)
    pub decision_timeout_secs: u64,
    /// Distance budget used when the caller gives none (km)
    pub default_km_limit: f64,
    /// Scan radius used when the caller gives none (km)
    pub default_radius_km: f64,
}

impl Default for PlannerRules {
    fn default() -> Self {
        Self {
            first_attempt_min_risk: 8,
            second_attempt_min_risk: 5,
            tolerance_km: 5.0,
            decision_timeout_secs: 120,
            default_km_limit: 20.0,
            default_radius_km: 10.0,
        }
    }
}

impl PlannerRules {
    pub fn decision_timeout(&self) -> Duration {
        Duration::from_secs(self.decision_timeout_secs)
    }

    pub fn with_decision_timeout(mut self, timeout: Duration) -> Self {
        self.decision_timeout_secs = timeout.as_secs().max(1);
        self
    }

    pub fn validate(&self) -> Result<(), PlanError> {
        if self.first_attempt_min_risk > MAX_RISK || self.second_attempt_min_risk > MAX_RISK {
            return Err(PlanError::invalid(format!(
                "attempt risk thresholds must be within 0..={}",
                MAX_RISK
            )));
        }
        if !self.tolerance_km.is_finite() || self.tolerance_km < 0.0 {
            return Err(PlanError::invalid(format!(
                "tolerance_km must be a non-negative number, got {}",
                self.tolerance_km
            )));
        }
        Ok(())
    }
}
