use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::credentials::AdminCredentials;
use super::session::{self, Role, SessionClaims, SessionKeys};
use super::AuthError;
use crate::clock::Clock;
use crate::config::AuthConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Public view of the signed-in account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionUser {
    pub email: String,
    pub role: Role,
}

impl From<&SessionClaims> for SessionUser {
    fn from(claims: &SessionClaims) -> Self {
        Self {
            email: claims.email.clone(),
            role: claims.role,
        }
    }
}

/// Result of a successful login: the token and the `Set-Cookie` value carrying it.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub claims: SessionClaims,
    pub cookie: String,
}

pub struct AuthService {
    credentials: AdminCredentials,
    keys: SessionKeys,
    session_ttl: Duration,
    secure_cookies: bool,
    clock: Arc<dyn Clock>,
}

impl AuthService {
    pub fn new(config: &AuthConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            credentials: AdminCredentials::new(&config.admin_email, &config.admin_password),
            keys: SessionKeys::from_secret(config.jwt_secret.as_bytes()),
            session_ttl: config.session_ttl,
            secure_cookies: config.secure_cookies,
            clock,
        }
    }

    pub fn login(&self, request: &LoginRequest) -> Result<IssuedSession, AuthError> {
        if !self.credentials.verify(&request.email, &request.password) {
            warn!("staff login refused");
            return Err(AuthError::InvalidCredentials);
        }

        let now = self.clock.now();
        let ttl = i64::try_from(self.session_ttl.as_secs()).unwrap_or(i64::MAX);
        let email = self.credentials.email().to_string();
        let claims = SessionClaims {
            sub: email.clone(),
            email,
            role: Role::Admin,
            iat: now.timestamp(),
            exp: now.timestamp().saturating_add(ttl),
        };
        let token = self.keys.sign(&claims)?;
        let cookie = session::session_cookie(&token, self.session_ttl, self.secure_cookies);

        info!(email = %claims.email, "staff session issued");
        Ok(IssuedSession {
            token,
            claims,
            cookie,
        })
    }

    /// Resolve the session carried by the request's cookies.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<SessionClaims, AuthError> {
        let token = session::session_token(headers).ok_or(AuthError::MissingSession)?;
        self.keys.verify(&token, self.clock.now())
    }

    /// Like [`AuthService::authenticate`] but also requires the admin role.
    pub fn authorize_admin(&self, headers: &HeaderMap) -> Result<SessionClaims, AuthError> {
        let claims = self.authenticate(headers)?;
        if claims.role != Role::Admin {
            return Err(AuthError::Forbidden);
        }
        Ok(claims)
    }

    pub fn logout_cookie(&self) -> String {
        session::cleared_session_cookie(self.secure_cookies)
    }

    pub fn keys(&self) -> &SessionKeys {
        &self.keys
    }
}
