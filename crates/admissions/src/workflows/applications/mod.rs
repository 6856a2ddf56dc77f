//! Pre-registration intake and the administrative decision lifecycle.

pub mod domain;
pub mod lifecycle;
pub mod numbering;
pub mod query;
pub mod repository;
pub mod router;
pub mod service;
pub mod validation;

#[cfg(test)]
mod tests;

pub use domain::{
    Application, ApplicationDetailView, ApplicationId, ApplicationNumber, ApplicationRecord,
    ApplicationStatus, PreRegistrationDetail, PreRegistrationSubmission, StudentGender,
    SubmissionReceipt,
};
pub use lifecycle::{Decision, DecisionNote, DecisionNoteRequest, LifecycleError};
pub use query::{
    ApplicationListing, ApplicationPage, ApplicationQuery, FilterOptions, ListParams, SortKey,
    SortOrder,
};
pub use repository::ApplicationRepository;
pub use router::{admin_application_router, public_application_router};
pub use service::{ApplicationServiceError, PreRegistrationService};
pub use validation::{FieldError, ValidationErrors};
