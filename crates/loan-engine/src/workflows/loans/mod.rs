//! Loan application lifecycle and risk decision engine.
//!
//! Submission runs validate -> admission -> risk scoring -> persist; decisions
//! run fetch -> policy -> single-shot transition -> conditional commit. Storage,
//! audit, and identity are trait collaborators so the core can be exercised
//! without real infrastructure.

pub mod admission;
pub mod audit;
pub mod decision;
pub mod domain;
pub mod identity;
pub mod lifecycle;
pub mod repository;
pub mod router;
pub mod service;
pub(crate) mod risk;

#[cfg(test)]
mod tests;

pub use admission::{AdmissionGuard, PendingLimitExceeded};
pub use audit::{AuditError, AuditEvent, AuditSink};
pub use decision::{DecisionConfig, DecisionConfigError, DecisionError, DecisionMode, DecisionPolicy};
pub use domain::{
    Actor, ActorRole, ApplicantId, DecisionAction, InvalidLoanInput, LoanApplication, LoanId,
    LoanStatus, LoanTerms,
};
pub use identity::{IdentityError, IdentityProvider};
pub use lifecycle::{LifecycleStateMachine, TransitionError};
pub use repository::{LoanApplicationView, LoanStore, StoreError};
pub use router::loan_router;
pub use service::{LoanApplicationService, LoanServiceError};
pub use risk::{approval_chance, RiskBreakdown, RiskScorer};
