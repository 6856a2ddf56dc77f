use crate::infra::{AppState, Services};
use admissions::auth::{auth_router, protect_admin};
use admissions::workflows::applications::{admin_application_router, public_application_router};
use admissions::workflows::registration::{admin_period_router, public_period_router};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde::Serialize;
use std::sync::atomic::Ordering;

#[derive(Debug, Serialize)]
pub(crate) struct ProbeStatus {
    pub(crate) status: &'static str,
}

/// Public intake, staff auth, staff review behind the admin session check, and probes.
pub(crate) fn with_admission_routes(services: &Services) -> Router {
    let admin = admin_period_router(services.window.clone())
        .merge(admin_application_router(services.applications.clone()));

    Router::new()
        .merge(public_period_router(services.window.clone()))
        .merge(public_application_router(services.applications.clone()))
        .merge(auth_router(services.auth.clone()))
        .merge(protect_admin(admin, services.auth.clone()))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<ProbeStatus> {
    Json(ProbeStatus { status: "ok" })
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    if state.readiness.load(Ordering::Acquire) {
        (StatusCode::OK, Json(ProbeStatus { status: "ready" }))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ProbeStatus {
                status: "initializing",
            }),
        )
    }
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
