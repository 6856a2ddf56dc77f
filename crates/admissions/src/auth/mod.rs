//! Staff session authentication: credential check, signed cookie sessions and the
//! middleware that guards the admin routers.

pub mod credentials;
pub mod router;
pub mod service;
pub mod session;

pub use credentials::AdminCredentials;
pub use router::{auth_router, protect_admin, require_admin, require_session};
pub use service::{AuthService, IssuedSession, LoginRequest, SessionUser};
pub use session::{Role, SessionClaims, SessionKeys, SESSION_COOKIE};

/// Error raised while establishing or checking a staff session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("authentication required")]
    MissingSession,
    #[error("session is invalid or expired")]
    InvalidSession,
    #[error("administrator access required")]
    Forbidden,
    #[error("could not issue session token: {message}")]
    Token { message: String },
}
