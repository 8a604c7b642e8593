use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::Utc;
use serde_json::Value;

use crate::workflows::loans::audit::{AuditError, AuditEvent, AuditSink};
use crate::workflows::loans::decision::DecisionConfig;
use crate::workflows::loans::domain::{
    Actor, ApplicantId, LoanApplication, LoanId, LoanStatus, LoanTerms,
};
use crate::workflows::loans::identity::{IdentityError, IdentityProvider};
use crate::workflows::loans::repository::{LoanStore, StoreError};
use crate::workflows::loans::router::loan_router;
use crate::workflows::loans::service::LoanApplicationService;

pub(super) fn applicant() -> Actor {
    Actor::applicant("user-1")
}

pub(super) fn other_applicant() -> Actor {
    Actor::applicant("user-2")
}

pub(super) fn reviewer() -> Actor {
    Actor::reviewer("admin-1")
}

pub(super) fn decision_config() -> DecisionConfig {
    DecisionConfig::default()
        .validated()
        .expect("default config valid")
}

pub(super) fn terms(amount: f64, income: f64, credit_score: u16, term_months: u16) -> LoanTerms {
    LoanTerms {
        amount,
        income,
        credit_score,
        term_months,
    }
}

/// risk = 0.5*0.5 + 0.4*(100/550) + 0.1*(60/360) = 0.3394, below 0.35.
pub(super) fn low_risk_terms() -> LoanTerms {
    terms(50_000.0, 100_000.0, 750, 60)
}

/// risk = 0.5*1.0 + 0.4*0.0 + 0.1*0.1 = 0.51, inside the review band.
pub(super) fn band_risk_terms() -> LoanTerms {
    terms(100_000.0, 100_000.0, 850, 36)
}

/// risk = 0.5*2.0 + 0.4*1.0 + 0.1*1.0 = 1.5, above the band and above 1.0.
pub(super) fn high_risk_terms() -> LoanTerms {
    terms(200_000.0, 100_000.0, 300, 360)
}

/// Pending application with a synthetic risk score, for policy-level tests.
pub(super) fn pending_application(risk_score: f64) -> LoanApplication {
    LoanApplication {
        id: LoanId("loan-test-001".to_string()),
        applicant_id: applicant().applicant_id,
        terms: band_risk_terms(),
        risk_score,
        status: LoanStatus::Pending,
        submitted_at: Utc::now(),
        decided_at: None,
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryStore {
    pub(super) records: Arc<Mutex<HashMap<LoanId, LoanApplication>>>,
}

impl LoanStore for MemoryStore {
    fn insert(&self, application: LoanApplication) -> Result<LoanApplication, StoreError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        if guard.contains_key(&application.id) {
            return Err(StoreError::Conflict);
        }
        guard.insert(application.id.clone(), application.clone());
        Ok(application)
    }

    fn fetch(&self, id: &LoanId) -> Result<Option<LoanApplication>, StoreError> {
        let guard = self.records.lock().expect("store mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn count_pending_for(&self, applicant: &ApplicantId) -> Result<u32, StoreError> {
        let guard = self.records.lock().expect("store mutex poisoned");
        Ok(guard
            .values()
            .filter(|loan| loan.applicant_id == *applicant && loan.status == LoanStatus::Pending)
            .count() as u32)
    }

    fn commit_decision(&self, application: &LoanApplication) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        match guard.get(&application.id) {
            Some(stored) if stored.status == LoanStatus::Pending => {
                guard.insert(application.id.clone(), application.clone());
                Ok(())
            }
            Some(_) => Err(StoreError::Conflict),
            None => Err(StoreError::NotFound),
        }
    }

    fn list_for(
        &self,
        applicant: &ApplicantId,
        status: Option<LoanStatus>,
    ) -> Result<Vec<LoanApplication>, StoreError> {
        let guard = self.records.lock().expect("store mutex poisoned");
        let mut loans: Vec<_> = guard
            .values()
            .filter(|loan| loan.applicant_id == *applicant)
            .filter(|loan| status.map_or(true, |wanted| loan.status == wanted))
            .cloned()
            .collect();
        loans.sort_by(|a, b| b.id.0.cmp(&a.id.0));
        Ok(loans)
    }

    fn list_all(&self, status: Option<LoanStatus>) -> Result<Vec<LoanApplication>, StoreError> {
        let guard = self.records.lock().expect("store mutex poisoned");
        let mut loans: Vec<_> = guard
            .values()
            .filter(|loan| status.map_or(true, |wanted| loan.status == wanted))
            .cloned()
            .collect();
        loans.sort_by(|a, b| b.id.0.cmp(&a.id.0));
        Ok(loans)
    }
}

/// Store whose every call fails with a transient error.
pub(super) struct UnavailableStore;

impl LoanStore for UnavailableStore {
    fn insert(&self, _application: LoanApplication) -> Result<LoanApplication, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &LoanId) -> Result<Option<LoanApplication>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn count_pending_for(&self, _applicant: &ApplicantId) -> Result<u32, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn commit_decision(&self, _application: &LoanApplication) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn list_for(
        &self,
        _applicant: &ApplicantId,
        _status: Option<LoanStatus>,
    ) -> Result<Vec<LoanApplication>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn list_all(&self, _status: Option<LoanStatus>) -> Result<Vec<LoanApplication>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryAudit {
    events: Arc<Mutex<Vec<AuditEvent>>>,
}

impl MemoryAudit {
    pub(super) fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().expect("audit mutex poisoned").clone()
    }
}

impl AuditSink for MemoryAudit {
    fn record(&self, event: AuditEvent) -> Result<(), AuditError> {
        self.events
            .lock()
            .expect("audit mutex poisoned")
            .push(event);
        Ok(())
    }
}

/// Sink that refuses every event, to prove audit failures stay non-fatal.
pub(super) struct RejectingAudit;

impl AuditSink for RejectingAudit {
    fn record(&self, _event: AuditEvent) -> Result<(), AuditError> {
        Err(AuditError::Transport("sink offline".to_string()))
    }
}

pub(super) struct StaticIdentity {
    tokens: HashMap<String, Actor>,
}

impl StaticIdentity {
    pub(super) fn with_defaults() -> Self {
        let mut tokens = HashMap::new();
        tokens.insert("user-token".to_string(), applicant());
        tokens.insert("other-token".to_string(), other_applicant());
        tokens.insert("admin-token".to_string(), reviewer());
        Self { tokens }
    }
}

impl IdentityProvider for StaticIdentity {
    fn verify(&self, credential: &str) -> Result<Actor, IdentityError> {
        self.tokens
            .get(credential)
            .cloned()
            .ok_or(IdentityError::Unauthenticated)
    }
}

pub(super) fn build_service() -> (
    Arc<LoanApplicationService<MemoryStore, MemoryAudit>>,
    Arc<MemoryStore>,
    Arc<MemoryAudit>,
) {
    let store = Arc::new(MemoryStore::default());
    let audit = Arc::new(MemoryAudit::default());
    let service = Arc::new(LoanApplicationService::new(
        store.clone(),
        audit.clone(),
        decision_config(),
    ));
    (service, store, audit)
}

pub(super) fn build_router() -> (
    axum::Router,
    Arc<LoanApplicationService<MemoryStore, MemoryAudit>>,
    Arc<MemoryStore>,
) {
    let (service, store, _) = build_service();
    let router = loan_router(service.clone(), Arc::new(StaticIdentity::with_defaults()));
    (router, service, store)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
