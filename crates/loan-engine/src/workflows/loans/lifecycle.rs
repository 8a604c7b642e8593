use chrono::{DateTime, Utc};

use super::domain::{Actor, ActorRole, DecisionAction, LoanApplication, LoanStatus};

/// Transition failures for the PENDING -> {APPROVED, REJECTED} machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("only reviewers may decide applications")]
    Unauthorized,
    #[error("application already {}", .status.label())]
    AlreadyDecided { status: LoanStatus },
}

/// State machine for application status. Transitions run only from PENDING,
/// only to a terminal status, and only at the hands of a reviewer; terminal
/// states are immutable thereafter.
pub struct LifecycleStateMachine;

impl LifecycleStateMachine {
    /// Role and status precheck, shared with the auto-decision path so band
    /// evaluation never runs against an undecidable application.
    pub fn ensure_decidable(
        application: &LoanApplication,
        actor: &Actor,
    ) -> Result<(), TransitionError> {
        if actor.role != ActorRole::Reviewer {
            return Err(TransitionError::Unauthorized);
        }
        if application.status.is_terminal() {
            return Err(TransitionError::AlreadyDecided {
                status: application.status,
            });
        }
        Ok(())
    }

    /// Apply a single-shot decision, stamping the decision time.
    pub fn apply(
        application: &mut LoanApplication,
        action: DecisionAction,
        actor: &Actor,
        decided_at: DateTime<Utc>,
    ) -> Result<(), TransitionError> {
        Self::ensure_decidable(application, actor)?;
        application.status = action.target_status();
        application.decided_at = Some(decided_at);
        Ok(())
    }
}
