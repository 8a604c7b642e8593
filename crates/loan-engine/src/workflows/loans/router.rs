use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::decision::DecisionError;
use super::domain::{Actor, DecisionAction, LoanId, LoanStatus, LoanTerms};
use super::identity::IdentityProvider;
use super::lifecycle::TransitionError;
use super::repository::{LoanStore, StoreError};
use super::service::{LoanApplicationService, LoanServiceError};

/// Shared router state: the decision core plus the identity collaborator
/// that resolves bearer credentials to request-scoped actors.
pub struct LoanApi<S, A, I> {
    pub service: Arc<LoanApplicationService<S, A>>,
    pub identity: Arc<I>,
}

impl<S, A, I> Clone for LoanApi<S, A, I> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            identity: Arc::clone(&self.identity),
        }
    }
}

/// Router builder exposing the loan lifecycle endpoints.
pub fn loan_router<S, A, I>(
    service: Arc<LoanApplicationService<S, A>>,
    identity: Arc<I>,
) -> Router
where
    S: LoanStore + 'static,
    A: super::audit::AuditSink + 'static,
    I: IdentityProvider + 'static,
{
    let api = LoanApi { service, identity };
    Router::new()
        .route("/api/v1/loans", post(submit_handler::<S, A, I>))
        .route("/api/v1/loans/my", get(my_loans_handler::<S, A, I>))
        .route(
            "/api/v1/loans/my/:loan_id",
            get(my_loan_detail_handler::<S, A, I>),
        )
        .route("/api/v1/loans/pending", get(pending_handler::<S, A, I>))
        .route("/api/v1/loans/all", get(all_loans_handler::<S, A, I>))
        .route(
            "/api/v1/loans/:loan_id/decision",
            post(decide_handler::<S, A, I>),
        )
        .with_state(api)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct StatusFilterQuery {
    #[serde(default)]
    pub(crate) status_filter: Option<LoanStatus>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct DecisionRequest {
    #[serde(default)]
    pub(crate) action: Option<DecisionAction>,
}

pub(crate) async fn submit_handler<S, A, I>(
    State(api): State<LoanApi<S, A, I>>,
    headers: HeaderMap,
    axum::Json(terms): axum::Json<LoanTerms>,
) -> Response
where
    S: LoanStore + 'static,
    A: super::audit::AuditSink + 'static,
    I: IdentityProvider + 'static,
{
    let actor = match authenticate(api.identity.as_ref(), &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    match api.service.submit(&actor, terms) {
        Ok(application) => {
            (StatusCode::CREATED, axum::Json(application.view())).into_response()
        }
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn my_loans_handler<S, A, I>(
    State(api): State<LoanApi<S, A, I>>,
    headers: HeaderMap,
    Query(query): Query<StatusFilterQuery>,
) -> Response
where
    S: LoanStore + 'static,
    A: super::audit::AuditSink + 'static,
    I: IdentityProvider + 'static,
{
    let actor = match authenticate(api.identity.as_ref(), &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    match api.service.list_for(&actor, query.status_filter) {
        Ok(applications) => views_response(applications),
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn my_loan_detail_handler<S, A, I>(
    State(api): State<LoanApi<S, A, I>>,
    headers: HeaderMap,
    Path(loan_id): Path<String>,
) -> Response
where
    S: LoanStore + 'static,
    A: super::audit::AuditSink + 'static,
    I: IdentityProvider + 'static,
{
    let actor = match authenticate(api.identity.as_ref(), &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    match api.service.get_owned(&actor, &LoanId(loan_id)) {
        Ok(application) => (StatusCode::OK, axum::Json(application.view())).into_response(),
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn pending_handler<S, A, I>(
    State(api): State<LoanApi<S, A, I>>,
    headers: HeaderMap,
) -> Response
where
    S: LoanStore + 'static,
    A: super::audit::AuditSink + 'static,
    I: IdentityProvider + 'static,
{
    let actor = match authenticate(api.identity.as_ref(), &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    match api.service.list_pending(&actor) {
        Ok(applications) => views_response(applications),
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn all_loans_handler<S, A, I>(
    State(api): State<LoanApi<S, A, I>>,
    headers: HeaderMap,
    Query(query): Query<StatusFilterQuery>,
) -> Response
where
    S: LoanStore + 'static,
    A: super::audit::AuditSink + 'static,
    I: IdentityProvider + 'static,
{
    let actor = match authenticate(api.identity.as_ref(), &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    match api.service.list_all(&actor, query.status_filter) {
        Ok(applications) => views_response(applications),
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn decide_handler<S, A, I>(
    State(api): State<LoanApi<S, A, I>>,
    headers: HeaderMap,
    Path(loan_id): Path<String>,
    axum::Json(request): axum::Json<DecisionRequest>,
) -> Response
where
    S: LoanStore + 'static,
    A: super::audit::AuditSink + 'static,
    I: IdentityProvider + 'static,
{
    let actor = match authenticate(api.identity.as_ref(), &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    match api.service.decide(&actor, &LoanId(loan_id), request.action) {
        Ok(application) => (StatusCode::OK, axum::Json(application.view())).into_response(),
        Err(err) => service_error_response(err),
    }
}

fn authenticate<I>(identity: &I, headers: &HeaderMap) -> Result<Actor, Response>
where
    I: IdentityProvider,
{
    let credential = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim);

    let Some(credential) = credential else {
        return Err(unauthenticated_response());
    };

    identity
        .verify(credential)
        .map_err(|_| unauthenticated_response())
}

fn unauthenticated_response() -> Response {
    let payload = json!({
        "error": "missing or invalid bearer credential",
        "kind": "unauthenticated",
    });
    (StatusCode::UNAUTHORIZED, axum::Json(payload)).into_response()
}

fn views_response(applications: Vec<super::domain::LoanApplication>) -> Response {
    let views: Vec<_> = applications
        .iter()
        .map(super::domain::LoanApplication::view)
        .collect();
    (StatusCode::OK, axum::Json(views)).into_response()
}

/// Every rejected operation maps to a distinguishable status and `kind`.
pub(crate) fn service_error_response(err: LoanServiceError) -> Response {
    let (status, kind, extra) = match &err {
        LoanServiceError::Input(input) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "invalid_input",
            Some(("field", json!(input.field()))),
        ),
        LoanServiceError::PendingLimit(denied) => (
            StatusCode::CONFLICT,
            "pending_limit_exceeded",
            Some(("limit", json!(denied.limit))),
        ),
        LoanServiceError::Decision(DecisionError::RequiresManualReview { .. }) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "requires_manual_review",
            None,
        ),
        LoanServiceError::Decision(DecisionError::Transition(TransitionError::Unauthorized))
        | LoanServiceError::ReviewerRequired => (StatusCode::FORBIDDEN, "unauthorized", None),
        LoanServiceError::Decision(DecisionError::Transition(
            TransitionError::AlreadyDecided { .. },
        )) => (StatusCode::CONFLICT, "already_decided", None),
        LoanServiceError::Store(StoreError::NotFound) => {
            (StatusCode::NOT_FOUND, "not_found", None)
        }
        LoanServiceError::Store(StoreError::Conflict) => (StatusCode::CONFLICT, "conflict", None),
        LoanServiceError::Store(StoreError::Unavailable(_)) => (
            StatusCode::SERVICE_UNAVAILABLE,
            "storage_unavailable",
            None,
        ),
    };

    let mut payload = json!({
        "error": err.to_string(),
        "kind": kind,
    });
    if let Some((key, value)) = extra {
        payload[key] = value;
    }

    (status, axum::Json(payload)).into_response()
}
