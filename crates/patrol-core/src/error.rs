use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by the planning core.
///
/// An empty qualifying set is not an error; it yields an HQ-only plan.
#[derive(Debug, Error)]
pub enum PlanError {
    /// Malformed coordinates, negative budgets, bad zone data. Nothing is planned.
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    /// The decision resolver did not answer in time.
    #[error("no budget decision received within {waited:?}")]
    DecisionTimeout { waited: Duration },

    /// The decision resolver returned without choosing a policy.
    #[error("budget decision was declined")]
    DecisionDeclined,
}

impl PlanError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        PlanError::InvalidInput {
            reason: reason.into(),
        }
    }
}
