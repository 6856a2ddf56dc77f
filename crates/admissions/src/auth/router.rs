use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use serde_json::json;

use super::service::{AuthService, LoginRequest, SessionUser};
use super::session::SessionClaims;
use super::AuthError;
use crate::error::error_response;

pub fn auth_router(service: Arc<AuthService>) -> Router {
    // route_layer only covers the routes registered before it.
    Router::new()
        .route("/auth/logout", post(logout_handler))
        .route("/auth/me", get(me_handler))
        .route_layer(middleware::from_fn_with_state(
            service.clone(),
            require_session,
        ))
        .route("/auth/login", post(login_handler))
        .with_state(service)
}

/// Wraps every route of `router` in the admin session check.
pub fn protect_admin(router: Router, service: Arc<AuthService>) -> Router {
    router.route_layer(middleware::from_fn_with_state(service, require_admin))
}

pub async fn require_session(
    State(service): State<Arc<AuthService>>,
    mut request: Request,
    next: Next,
) -> Response {
    match service.authenticate(request.headers()) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(err) => err.into_response(),
    }
}

pub async fn require_admin(
    State(service): State<Arc<AuthService>>,
    mut request: Request,
    next: Next,
) -> Response {
    match service.authorize_admin(request.headers()) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn login_handler(
    State(service): State<Arc<AuthService>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return error_response(StatusCode::BAD_REQUEST, rejection.body_text()),
    };

    match service.login(&request) {
        Ok(session) => {
            let body = json!({ "user": SessionUser::from(&session.claims) });
            (
                StatusCode::OK,
                [(header::SET_COOKIE, session.cookie)],
                Json(body),
            )
                .into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn logout_handler(State(service): State<Arc<AuthService>>) -> Response {
    (
        StatusCode::OK,
        [(header::SET_COOKIE, service.logout_cookie())],
        Json(json!({ "message": "Logged out successfully" })),
    )
        .into_response()
}

pub(crate) async fn me_handler(Extension(claims): Extension<SessionClaims>) -> Json<SessionUser> {
    Json(SessionUser::from(&claims))
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match &self {
            AuthError::InvalidCredentials
            | AuthError::MissingSession
            | AuthError::InvalidSession => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::Token { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        error_response(status, self.to_string())
    }
}
