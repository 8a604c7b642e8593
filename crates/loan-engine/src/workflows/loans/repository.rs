use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{ApplicantId, LoanApplication, LoanId, LoanStatus};
use super::risk;

/// Storage abstraction so the service module can be exercised in isolation.
///
/// `commit_decision` is the conditional update backing decision atomicity:
/// implementations must persist the decided application only if the stored
/// row is still PENDING and fail with `Conflict` otherwise, so two racing
/// decisions yield exactly one recorded outcome.
pub trait LoanStore: Send + Sync {
    fn insert(&self, application: LoanApplication) -> Result<LoanApplication, StoreError>;
    fn fetch(&self, id: &LoanId) -> Result<Option<LoanApplication>, StoreError>;
    fn count_pending_for(&self, applicant: &ApplicantId) -> Result<u32, StoreError>;
    fn commit_decision(&self, application: &LoanApplication) -> Result<(), StoreError>;
    fn list_for(
        &self,
        applicant: &ApplicantId,
        status: Option<LoanStatus>,
    ) -> Result<Vec<LoanApplication>, StoreError>;
    fn list_all(&self, status: Option<LoanStatus>) -> Result<Vec<LoanApplication>, StoreError>;
}

/// Error enumeration for storage failures. `Unavailable` is the transient
/// failure surfaced verbatim to callers; the core never retries it.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("application already exists or was already decided")]
    Conflict,
    #[error("application not found")]
    NotFound,
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Sanitized representation of an application for API responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanApplicationView {
    pub id: LoanId,
    pub applicant_id: ApplicantId,
    pub amount: f64,
    pub income: f64,
    pub credit_score: u16,
    pub term_months: u16,
    pub status: LoanStatus,
    pub risk_score: f64,
    pub approval_chance: f64,
    pub submitted_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decided_at: Option<DateTime<Utc>>,
}

impl LoanApplication {
    pub fn view(&self) -> LoanApplicationView {
        LoanApplicationView {
            id: self.id.clone(),
            applicant_id: self.applicant_id.clone(),
            amount: self.terms.amount,
            income: self.terms.income,
            credit_score: self.terms.credit_score,
            term_months: self.terms.term_months,
            status: self.status,
            risk_score: self.risk_score,
            approval_chance: risk::approval_chance(self.risk_score),
            submitted_at: self.submitted_at,
            decided_at: self.decided_at,
        }
    }
}
