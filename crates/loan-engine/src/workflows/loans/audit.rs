use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::decision::DecisionMode;
use super::domain::{ApplicantId, LoanId, LoanStatus};
use super::risk::RiskBreakdown;

/// Fire-and-forget notifications of creation and decision events. Sink
/// failures are logged by the caller and never affect the primary result.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: AuditEvent) -> Result<(), AuditError>;
}

/// Events emitted by the application service, carrying enough detail to
/// reconstruct each risk calculation and decision after the fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AuditEvent {
    ApplicationSubmitted {
        loan_id: LoanId,
        applicant_id: ApplicantId,
        risk: RiskBreakdown,
        occurred_at: DateTime<Utc>,
    },
    ApplicationDecided {
        loan_id: LoanId,
        applicant_id: ApplicantId,
        reviewer_id: ApplicantId,
        decision: LoanStatus,
        mode: DecisionMode,
        risk_score: f64,
        occurred_at: DateTime<Utc>,
    },
}

/// Audit dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("audit transport unavailable: {0}")]
    Transport(String),
}
