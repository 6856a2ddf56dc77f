use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde_json::json;

use super::domain::{NewPeriod, PeriodId, PeriodUpdate};
use super::repository::PeriodRepository;
use super::service::{RegistrationServiceError, RegistrationWindowService};
use crate::error::error_response;
use crate::store::RepositoryError;

/// Staff endpoints for managing registration periods. Callers layer authentication on top.
pub fn admin_period_router<P>(service: Arc<RegistrationWindowService<P>>) -> Router
where
    P: PeriodRepository + 'static,
{
    Router::new()
        .route(
            "/admin/registration-periods",
            get(list_handler::<P>).post(create_handler::<P>),
        )
        .route(
            "/admin/registration-periods/:period_id",
            patch(update_handler::<P>),
        )
        .route(
            "/admin/registration-periods/:period_id/open",
            post(open_handler::<P>),
        )
        .route(
            "/admin/registration-periods/:period_id/close",
            post(close_handler::<P>),
        )
        .with_state(service)
}

/// Anonymous endpoint the intake form polls to learn whether registration is open.
pub fn public_period_router<P>(service: Arc<RegistrationWindowService<P>>) -> Router
where
    P: PeriodRepository + 'static,
{
    Router::new()
        .route(
            "/public/registration-periods/active",
            get(active_handler::<P>),
        )
        .with_state(service)
}

pub(crate) async fn active_handler<P>(
    State(service): State<Arc<RegistrationWindowService<P>>>,
) -> Result<Json<serde_json::Value>, RegistrationServiceError>
where
    P: PeriodRepository + 'static,
{
    let period = service.active_period()?;
    Ok(Json(json!({ "period": period })))
}

pub(crate) async fn list_handler<P>(
    State(service): State<Arc<RegistrationWindowService<P>>>,
) -> Response
where
    P: PeriodRepository + 'static,
{
    match service.list_periods() {
        Ok(periods) => (StatusCode::OK, Json(periods)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn create_handler<P>(
    State(service): State<Arc<RegistrationWindowService<P>>>,
    payload: Result<Json<NewPeriod>, JsonRejection>,
) -> Response
where
    P: PeriodRepository + 'static,
{
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return malformed_body(rejection),
    };
    match service.create_period(request) {
        Ok(period) => (StatusCode::CREATED, Json(period)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn update_handler<P>(
    State(service): State<Arc<RegistrationWindowService<P>>>,
    Path(period_id): Path<String>,
    payload: Result<Json<PeriodUpdate>, JsonRejection>,
) -> Response
where
    P: PeriodRepository + 'static,
{
    let Some(id) = parse_period_id(&period_id) else {
        return unknown_period(&period_id);
    };
    let Json(update) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return malformed_body(rejection),
    };
    match service.update_period(&id, update) {
        Ok(period) => (StatusCode::OK, Json(period)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn open_handler<P>(
    State(service): State<Arc<RegistrationWindowService<P>>>,
    Path(period_id): Path<String>,
) -> Response
where
    P: PeriodRepository + 'static,
{
    let Some(id) = parse_period_id(&period_id) else {
        return unknown_period(&period_id);
    };
    match service.open_period(&id) {
        Ok(period) => (StatusCode::OK, Json(period)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn close_handler<P>(
    State(service): State<Arc<RegistrationWindowService<P>>>,
    Path(period_id): Path<String>,
) -> Response
where
    P: PeriodRepository + 'static,
{
    let Some(id) = parse_period_id(&period_id) else {
        return unknown_period(&period_id);
    };
    match service.close_period(&id) {
        Ok(period) => (StatusCode::OK, Json(period)).into_response(),
        Err(err) => err.into_response(),
    }
}

fn parse_period_id(raw: &str) -> Option<PeriodId> {
    raw.parse().ok()
}

// A malformed id cannot name an existing period.
fn unknown_period(raw: &str) -> Response {
    error_response(
        StatusCode::NOT_FOUND,
        format!("registration period {raw} not found"),
    )
}

fn malformed_body(rejection: JsonRejection) -> Response {
    error_response(StatusCode::BAD_REQUEST, rejection.body_text())
}

impl IntoResponse for RegistrationServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            RegistrationServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            RegistrationServiceError::InvalidWindow { .. }
            | RegistrationServiceError::BlankName => StatusCode::BAD_REQUEST,
            RegistrationServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
            RegistrationServiceError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        error_response(status, self.to_string())
    }
}
