//! Pre-registration intake and review for student admissions.
//!
//! The library exposes the registration window manager, the application lifecycle,
//! session authentication for staff, and the axum routers that surface them.

pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod store;
pub mod telemetry;
pub mod workflows;
