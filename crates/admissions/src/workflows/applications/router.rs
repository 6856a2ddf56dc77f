use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use super::domain::{ApplicationId, PreRegistrationSubmission, SubmissionReceipt};
use super::lifecycle::DecisionNoteRequest;
use super::query::{ApplicationQuery, ListParams};
use super::repository::ApplicationRepository;
use super::service::{ApplicationServiceError, PreRegistrationService};
use crate::error::error_response;
use crate::store::RepositoryError;
use crate::workflows::registration::{PeriodRepository, RegistrationServiceError};

type SharedService<A, P> = Arc<PreRegistrationService<A, P>>;

/// Anonymous intake endpoint.
pub fn public_application_router<A, P>(service: SharedService<A, P>) -> Router
where
    A: ApplicationRepository + 'static,
    P: PeriodRepository + 'static,
{
    Router::new()
        .route(
            "/public/applications/pre-register",
            post(pre_register_handler::<A, P>),
        )
        .with_state(service)
}

/// Staff review endpoints. Callers layer authentication on top.
pub fn admin_application_router<A, P>(service: SharedService<A, P>) -> Router
where
    A: ApplicationRepository + 'static,
    P: PeriodRepository + 'static,
{
    Router::new()
        .route("/admin/applications", get(list_handler::<A, P>))
        .route(
            "/admin/applications/filter-options",
            get(filter_options_handler::<A, P>),
        )
        .route(
            "/admin/applications/:application_id",
            get(detail_handler::<A, P>),
        )
        .route(
            "/admin/applications/:application_id/approve",
            post(approve_handler::<A, P>),
        )
        .route(
            "/admin/applications/:application_id/reject",
            post(reject_handler::<A, P>),
        )
        .route(
            "/admin/applications/:application_id/request-changes",
            post(request_changes_handler::<A, P>),
        )
        .with_state(service)
}

pub(crate) async fn pre_register_handler<A, P>(
    State(service): State<SharedService<A, P>>,
    payload: Result<Json<PreRegistrationSubmission>, JsonRejection>,
) -> Response
where
    A: ApplicationRepository + 'static,
    P: PeriodRepository + 'static,
{
    let Json(submission) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            if let Err(err) = service.ensure_accepting() {
                return err.into_response();
            }
            return error_response(StatusCode::BAD_REQUEST, rejection.body_text());
        }
    };

    match service.submit(submission) {
        Ok(record) => {
            let receipt = SubmissionReceipt::from(&record.application);
            (StatusCode::CREATED, Json(receipt)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn list_handler<A, P>(
    State(service): State<SharedService<A, P>>,
    Query(params): Query<ListParams>,
) -> Response
where
    A: ApplicationRepository + 'static,
    P: PeriodRepository + 'static,
{
    let query = ApplicationQuery::from(params);
    match service.list(&query) {
        Ok(listing) => (StatusCode::OK, Json(listing)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn filter_options_handler<A, P>(
    State(service): State<SharedService<A, P>>,
) -> Response
where
    A: ApplicationRepository + 'static,
    P: PeriodRepository + 'static,
{
    match service.filter_options() {
        Ok(options) => (StatusCode::OK, Json(options)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn detail_handler<A, P>(
    State(service): State<SharedService<A, P>>,
    Path(application_id): Path<String>,
) -> Response
where
    A: ApplicationRepository + 'static,
    P: PeriodRepository + 'static,
{
    let Some(id) = parse_application_id(&application_id) else {
        return unknown_application(&application_id);
    };
    match service.get(&id) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn approve_handler<A, P>(
    State(service): State<SharedService<A, P>>,
    Path(application_id): Path<String>,
) -> Response
where
    A: ApplicationRepository + 'static,
    P: PeriodRepository + 'static,
{
    let Some(id) = parse_application_id(&application_id) else {
        return unknown_application(&application_id);
    };
    match service.approve(&id) {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn reject_handler<A, P>(
    State(service): State<SharedService<A, P>>,
    Path(application_id): Path<String>,
    payload: Result<Json<DecisionNoteRequest>, JsonRejection>,
) -> Response
where
    A: ApplicationRepository + 'static,
    P: PeriodRepository + 'static,
{
    let Some(id) = parse_application_id(&application_id) else {
        return unknown_application(&application_id);
    };
    let note = decision_note(payload);
    match service.reject(&id, note.as_deref()) {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn request_changes_handler<A, P>(
    State(service): State<SharedService<A, P>>,
    Path(application_id): Path<String>,
    payload: Result<Json<DecisionNoteRequest>, JsonRejection>,
) -> Response
where
    A: ApplicationRepository + 'static,
    P: PeriodRepository + 'static,
{
    let Some(id) = parse_application_id(&application_id) else {
        return unknown_application(&application_id);
    };
    let note = decision_note(payload);
    match service.request_changes(&id, note.as_deref()) {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(err) => err.into_response(),
    }
}

// An absent or unreadable body is treated as a missing note.
fn decision_note(payload: Result<Json<DecisionNoteRequest>, JsonRejection>) -> Option<String> {
    payload.ok().and_then(|Json(request)| request.note)
}

fn parse_application_id(raw: &str) -> Option<ApplicationId> {
    raw.parse().ok()
}

fn unknown_application(raw: &str) -> Response {
    error_response(StatusCode::NOT_FOUND, format!("application {raw} not found"))
}

impl IntoResponse for ApplicationServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApplicationServiceError::AdmissionClosed => StatusCode::FORBIDDEN,
            ApplicationServiceError::InvalidRange
            | ApplicationServiceError::InvalidState(_)
            | ApplicationServiceError::MissingNote => StatusCode::BAD_REQUEST,
            ApplicationServiceError::Validation(errors) => {
                let payload = json!({
                    "error": self.to_string(),
                    "fields": errors.0,
                });
                return (StatusCode::BAD_REQUEST, Json(payload)).into_response();
            }
            ApplicationServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ApplicationServiceError::NumberAllocationExhausted { .. } => StatusCode::CONFLICT,
            ApplicationServiceError::Window(RegistrationServiceError::NotFound(_)) => {
                StatusCode::NOT_FOUND
            }
            ApplicationServiceError::Window(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApplicationServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
            ApplicationServiceError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        error_response(status, self.to_string())
    }
}
