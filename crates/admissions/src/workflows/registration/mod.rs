//! Registration window manager: period CRUD plus the open/closed admission gate.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    parse_instant, NewPeriod, PeriodId, PeriodStatus, PeriodUpdate, RegistrationPeriod,
};
pub use repository::PeriodRepository;
pub use router::{admin_period_router, public_period_router};
pub use service::{RegistrationServiceError, RegistrationWindowService};
