use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for loan applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LoanId(pub String);

/// Identifier of the externally-managed applicant owning an application.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicantId(pub String);

/// Role resolved by the identity collaborator; the core trusts it verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActorRole {
    #[serde(rename = "USER")]
    Applicant,
    #[serde(rename = "ADMIN")]
    Reviewer,
}

impl ActorRole {
    pub const fn label(self) -> &'static str {
        match self {
            ActorRole::Applicant => "USER",
            ActorRole::Reviewer => "ADMIN",
        }
    }
}

/// Request-scoped authenticated identity passed into every core operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub applicant_id: ApplicantId,
    pub role: ActorRole,
}

impl Actor {
    pub fn applicant(id: impl Into<String>) -> Self {
        Self {
            applicant_id: ApplicantId(id.into()),
            role: ActorRole::Applicant,
        }
    }

    pub fn reviewer(id: impl Into<String>) -> Self {
        Self {
            applicant_id: ApplicantId(id.into()),
            role: ActorRole::Reviewer,
        }
    }
}

/// Immutable financial inputs captured at submission time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub amount: f64,
    pub income: f64,
    pub credit_score: u16,
    pub term_months: u16,
}

pub const CREDIT_SCORE_MIN: u16 = 300;
pub const CREDIT_SCORE_MAX: u16 = 850;
pub const TERM_MONTHS_MIN: u16 = 6;
pub const TERM_MONTHS_MAX: u16 = 360;

impl LoanTerms {
    /// Reject out-of-range inputs before any state change, naming the field.
    pub fn validate(&self) -> Result<(), InvalidLoanInput> {
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(InvalidLoanInput::Amount);
        }
        if !self.income.is_finite() || self.income <= 0.0 {
            return Err(InvalidLoanInput::Income);
        }
        if !(CREDIT_SCORE_MIN..=CREDIT_SCORE_MAX).contains(&self.credit_score) {
            return Err(InvalidLoanInput::CreditScore);
        }
        if !(TERM_MONTHS_MIN..=TERM_MONTHS_MAX).contains(&self.term_months) {
            return Err(InvalidLoanInput::TermMonths);
        }
        Ok(())
    }
}

/// Per-field validation failure for submitted loan terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InvalidLoanInput {
    #[error("amount must be a positive number")]
    Amount,
    #[error("income must be a positive number")]
    Income,
    #[error("credit score must be between 300 and 850")]
    CreditScore,
    #[error("term must be between 6 and 360 months")]
    TermMonths,
}

impl InvalidLoanInput {
    pub const fn field(self) -> &'static str {
        match self {
            InvalidLoanInput::Amount => "amount",
            InvalidLoanInput::Income => "income",
            InvalidLoanInput::CreditScore => "credit_score",
            InvalidLoanInput::TermMonths => "term_months",
        }
    }
}

/// Lifecycle status: PENDING is initial, the other two are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoanStatus {
    Pending,
    Approved,
    Rejected,
}

impl LoanStatus {
    pub const fn label(self) -> &'static str {
        match self {
            LoanStatus::Pending => "PENDING",
            LoanStatus::Approved => "APPROVED",
            LoanStatus::Rejected => "REJECTED",
        }
    }

    pub const fn is_terminal(self) -> bool {
        !matches!(self, LoanStatus::Pending)
    }
}

/// Explicit decision input. Deferral is never expressible here, so a caller
/// cannot mistake "requires manual review" for a rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecisionAction {
    #[serde(rename = "APPROVED")]
    Approve,
    #[serde(rename = "REJECTED")]
    Reject,
}

impl DecisionAction {
    pub const fn target_status(self) -> LoanStatus {
        match self {
            DecisionAction::Approve => LoanStatus::Approved,
            DecisionAction::Reject => LoanStatus::Rejected,
        }
    }
}

/// The central entity. Terms and risk score are fixed at creation; only the
/// status and decision timestamp mutate, exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanApplication {
    pub id: LoanId,
    pub applicant_id: ApplicantId,
    pub terms: LoanTerms,
    pub risk_score: f64,
    pub status: LoanStatus,
    pub submitted_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}
