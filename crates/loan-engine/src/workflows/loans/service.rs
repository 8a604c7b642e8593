use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::warn;

use super::admission::{AdmissionGuard, PendingLimitExceeded};
use super::audit::{AuditEvent, AuditSink};
use super::decision::{DecisionConfig, DecisionError, DecisionMode, DecisionPolicy};
use super::domain::{
    Actor, ActorRole, DecisionAction, InvalidLoanInput, LoanApplication, LoanId,
    LoanStatus, LoanTerms,
};
use super::lifecycle::TransitionError;
use super::repository::{LoanStore, StoreError};
use super::risk::RiskScorer;

/// Service composing admission control, risk scoring, and the decision
/// policy over the storage and audit collaborators.
pub struct LoanApplicationService<S, A> {
    store: Arc<S>,
    audit: Arc<A>,
    guard: AdmissionGuard,
    policy: DecisionPolicy,
}

static LOAN_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_loan_id() -> LoanId {
    let id = LOAN_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    LoanId(format!("loan-{id:06}"))
}

impl<S, A> LoanApplicationService<S, A>
where
    S: LoanStore + 'static,
    A: AuditSink + 'static,
{
    /// Expects a configuration that already passed `DecisionConfig::validated`.
    pub fn new(store: Arc<S>, audit: Arc<A>, config: DecisionConfig) -> Self {
        let guard = AdmissionGuard::new(config.max_pending_per_applicant);
        let policy = DecisionPolicy::new(config);
        Self {
            store,
            audit,
            guard,
            policy,
        }
    }

    /// Validate, admit, score, and persist a new PENDING application.
    pub fn submit(
        &self,
        actor: &Actor,
        terms: LoanTerms,
    ) -> Result<LoanApplication, LoanServiceError> {
        terms.validate()?;

        // Hold the applicant's slot across count-check-insert so concurrent
        // submissions cannot both slip under the pending cap.
        let slot = self.guard.slot_for(&actor.applicant_id);
        let _admission = slot.lock().expect("admission slot poisoned");

        let pending = self.store.count_pending_for(&actor.applicant_id)?;
        self.guard.check(pending)?;

        let breakdown = RiskScorer::breakdown(&terms)?;
        let application = LoanApplication {
            id: next_loan_id(),
            applicant_id: actor.applicant_id.clone(),
            terms,
            risk_score: breakdown.risk_score,
            status: LoanStatus::Pending,
            submitted_at: Utc::now(),
            decided_at: None,
        };

        let stored = self.store.insert(application)?;

        self.record_audit(AuditEvent::ApplicationSubmitted {
            loan_id: stored.id.clone(),
            applicant_id: stored.applicant_id.clone(),
            risk: breakdown,
            occurred_at: stored.submitted_at,
        });

        Ok(stored)
    }

    /// Decide a PENDING application: an explicit action routes through the
    /// manual path, otherwise the threshold policy applies.
    pub fn decide(
        &self,
        actor: &Actor,
        id: &LoanId,
        action: Option<DecisionAction>,
    ) -> Result<LoanApplication, LoanServiceError> {
        let mut application = self.store.fetch(id)?.ok_or(StoreError::NotFound)?;

        let decided_at = Utc::now();
        let (taken, mode) = match action {
            Some(action) => (
                self.policy
                    .manual(&mut application, action, actor, decided_at)?,
                DecisionMode::Manual,
            ),
            None => (
                self.policy.auto(&mut application, actor, decided_at)?,
                DecisionMode::Auto,
            ),
        };

        match self.store.commit_decision(&application) {
            Ok(()) => {}
            Err(StoreError::Conflict) => {
                // A concurrent decision won the race; report the recorded
                // outcome rather than a second success.
                let status = self
                    .store
                    .fetch(id)?
                    .map(|stored| stored.status)
                    .unwrap_or(application.status);
                return Err(DecisionError::Transition(TransitionError::AlreadyDecided {
                    status,
                })
                .into());
            }
            Err(other) => return Err(other.into()),
        }

        self.record_audit(AuditEvent::ApplicationDecided {
            loan_id: application.id.clone(),
            applicant_id: application.applicant_id.clone(),
            reviewer_id: actor.applicant_id.clone(),
            decision: taken.target_status(),
            mode,
            risk_score: application.risk_score,
            occurred_at: decided_at,
        });

        Ok(application)
    }

    /// Applications owned by the caller, optionally filtered by status.
    pub fn list_for(
        &self,
        actor: &Actor,
        status: Option<LoanStatus>,
    ) -> Result<Vec<LoanApplication>, LoanServiceError> {
        Ok(self.store.list_for(&actor.applicant_id, status)?)
    }

    /// Owner-scoped detail lookup. A loan belonging to someone else reads as
    /// NotFound so ids cannot be probed across applicants.
    pub fn get_owned(&self, actor: &Actor, id: &LoanId) -> Result<LoanApplication, LoanServiceError> {
        let application = self.store.fetch(id)?.ok_or(StoreError::NotFound)?;
        if application.applicant_id != actor.applicant_id {
            return Err(StoreError::NotFound.into());
        }
        Ok(application)
    }

    /// Reviewer-only listing across all applicants.
    pub fn list_all(
        &self,
        actor: &Actor,
        status: Option<LoanStatus>,
    ) -> Result<Vec<LoanApplication>, LoanServiceError> {
        if actor.role != ActorRole::Reviewer {
            return Err(LoanServiceError::ReviewerRequired);
        }
        Ok(self.store.list_all(status)?)
    }

    /// Reviewer-only queue of undecided applications.
    pub fn list_pending(&self, actor: &Actor) -> Result<Vec<LoanApplication>, LoanServiceError> {
        self.list_all(actor, Some(LoanStatus::Pending))
    }

    fn record_audit(&self, event: AuditEvent) {
        if let Err(err) = self.audit.record(event) {
            warn!(error = %err, "audit sink rejected event");
        }
    }
}

/// Error raised by the application service.
#[derive(Debug, thiserror::Error)]
pub enum LoanServiceError {
    #[error(transparent)]
    Input(#[from] InvalidLoanInput),
    #[error(transparent)]
    PendingLimit(#[from] PendingLimitExceeded),
    #[error(transparent)]
    Decision(#[from] DecisionError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("reviewer role required")]
    ReviewerRequired,
}

impl From<TransitionError> for LoanServiceError {
    fn from(value: TransitionError) -> Self {
        Self::Decision(DecisionError::Transition(value))
    }
}
