use chrono::{DateTime, Utc};

use super::super::domain::{Actor, DecisionAction, LoanApplication};
use super::super::lifecycle::{LifecycleStateMachine, TransitionError};
use super::config::DecisionConfig;

/// How a recorded decision was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionMode {
    Manual,
    Auto,
}

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum DecisionError {
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(
        "risk score {risk_score:.4} is inside the manual review band [{low:.2}, {high:.2}]"
    )]
    RequiresManualReview {
        risk_score: f64,
        low: f64,
        high: f64,
    },
}

/// Reviewer-facing decision rules layered over the lifecycle state machine.
pub struct DecisionPolicy {
    config: DecisionConfig,
}

impl DecisionPolicy {
    pub fn new(config: DecisionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DecisionConfig {
        &self.config
    }

    /// Explicit reviewer decision, permitted for any PENDING application
    /// regardless of risk score.
    pub fn manual(
        &self,
        application: &mut LoanApplication,
        action: DecisionAction,
        actor: &Actor,
        decided_at: DateTime<Utc>,
    ) -> Result<DecisionAction, DecisionError> {
        LifecycleStateMachine::apply(application, action, actor, decided_at)?;
        Ok(action)
    }

    /// Threshold-driven decision. Scores inside the band (inclusive on both
    /// ends) are deferred without any transition; the application stays
    /// PENDING until a reviewer chooses explicitly.
    pub fn auto(
        &self,
        application: &mut LoanApplication,
        actor: &Actor,
        decided_at: DateTime<Utc>,
    ) -> Result<DecisionAction, DecisionError> {
        LifecycleStateMachine::ensure_decidable(application, actor)?;

        let risk_score = application.risk_score;
        let action = if risk_score < self.config.low_threshold {
            DecisionAction::Approve
        } else if risk_score > self.config.high_threshold {
            DecisionAction::Reject
        } else {
            return Err(DecisionError::RequiresManualReview {
                risk_score,
                low: self.config.low_threshold,
                high: self.config.high_threshold,
            });
        };

        LifecycleStateMachine::apply(application, action, actor, decided_at)?;
        Ok(action)
    }
}
