use std::collections::HashMap;
use std::env;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use loan_engine::workflows::loans::{
    Actor, ApplicantId, AuditError, AuditEvent, AuditSink, IdentityError, IdentityProvider,
    LoanApplication, LoanId, LoanStatus, LoanStore, StoreError,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::warn;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryLoanStore {
    records: Arc<Mutex<HashMap<LoanId, LoanApplication>>>,
}

impl LoanStore for InMemoryLoanStore {
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
            // The row must still be undecided for the write to land; a
            // decision that raced in first wins.
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

#[derive(Default, Clone)]
pub(crate) struct InMemoryAuditSink {
    events: Arc<Mutex<Vec<AuditEvent>>>,
}

impl AuditSink for InMemoryAuditSink {
    fn record(&self, event: AuditEvent) -> Result<(), AuditError> {
        let mut guard = self.events.lock().expect("audit mutex poisoned");
        guard.push(event);
        Ok(())
    }
}

impl InMemoryAuditSink {
    pub(crate) fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().expect("audit mutex poisoned").clone()
    }
}

/// Bearer-token directory loaded from `APP_API_TOKENS`, formatted as
/// comma-separated `token:ROLE:subject` entries where ROLE is USER or ADMIN.
pub(crate) struct StaticTokenProvider {
    tokens: HashMap<String, Actor>,
}

impl StaticTokenProvider {
    pub(crate) fn from_env() -> Self {
        match env::var("APP_API_TOKENS") {
            Ok(raw) => match parse_token_entries(&raw) {
                Ok(tokens) if !tokens.is_empty() => Self { tokens },
                Ok(_) => {
                    warn!("APP_API_TOKENS is empty, falling back to demo tokens");
                    Self::demo_tokens()
                }
                Err(entry) => {
                    warn!(%entry, "APP_API_TOKENS entry malformed, falling back to demo tokens");
                    Self::demo_tokens()
                }
            },
            Err(_) => {
                warn!("APP_API_TOKENS not set, using demo tokens (not for production)");
                Self::demo_tokens()
            }
        }
    }

    pub(crate) fn demo_tokens() -> Self {
        let mut tokens = HashMap::new();
        tokens.insert("user-token".to_string(), Actor::applicant("user-1"));
        tokens.insert("admin-token".to_string(), Actor::reviewer("admin-1"));
        Self { tokens }
    }
}

fn parse_token_entries(raw: &str) -> Result<HashMap<String, Actor>, String> {
    let mut tokens = HashMap::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let mut parts = entry.splitn(3, ':');
        let (token, role, subject) = match (parts.next(), parts.next(), parts.next()) {
            (Some(token), Some(role), Some(subject))
                if !token.is_empty() && !subject.is_empty() =>
            {
                (token, role, subject)
            }
            _ => return Err(entry.to_string()),
        };
        let actor = match role {
            "USER" => Actor::applicant(subject),
            "ADMIN" => Actor::reviewer(subject),
            _ => return Err(entry.to_string()),
        };
        tokens.insert(token.to_string(), actor);
    }
    Ok(tokens)
}

impl IdentityProvider for StaticTokenProvider {
    fn verify(&self, credential: &str) -> Result<Actor, IdentityError> {
        self.tokens
            .get(credential)
            .cloned()
            .ok_or(IdentityError::Unauthenticated)
    }
}
