use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc};
use tracing::{info, warn};

use super::domain::{
    Application, ApplicationDetailView, ApplicationId, ApplicationNumber, ApplicationRecord,
    ApplicationStatus, PreRegistrationSubmission,
};
use super::lifecycle::{Decision, DecisionNote, LifecycleError};
use super::numbering;
use super::query::{ApplicationListing, ApplicationQuery, FilterOptions};
use super::repository::ApplicationRepository;
use super::validation::{validate_submission, ValidationErrors};
use crate::clock::Clock;
use crate::config::IntakeConfig;
use crate::store::RepositoryError;
use crate::workflows::registration::{
    PeriodId, PeriodRepository, RegistrationPeriod, RegistrationServiceError,
    RegistrationWindowService,
};

const DECISION_ATTEMPTS: u32 = 3;

/// Service composing the registration window, the lifecycle rules and the repository.
pub struct PreRegistrationService<A, P> {
    repository: Arc<A>,
    window: Arc<RegistrationWindowService<P>>,
    clock: Arc<dyn Clock>,
    config: IntakeConfig,
}

impl<A, P> PreRegistrationService<A, P>
where
    A: ApplicationRepository + 'static,
    P: PeriodRepository + 'static,
{
    pub fn new(
        repository: Arc<A>,
        window: Arc<RegistrationWindowService<P>>,
        clock: Arc<dyn Clock>,
        config: IntakeConfig,
    ) -> Self {
        Self {
            repository,
            window,
            clock,
            config,
        }
    }

    /// Accept a submission into the currently active period.
    ///
    /// Nothing is written unless the window is open, every field validates and the
    /// domicile range is ordered.
    pub fn submit(
        &self,
        submission: PreRegistrationSubmission,
    ) -> Result<ApplicationRecord, ApplicationServiceError> {
        let now = self.clock.now();
        let period = self.admitting_period(now)?;

        validate_submission(&submission)?;
        if submission.domicile_end_date < submission.domicile_start_date {
            return Err(ApplicationServiceError::InvalidRange);
        }

        let (applicant_email, detail) = submission.into_detail();
        let year = now.year();
        let millis = now.timestamp_millis();
        let mut number = self.initial_number(&period.id, year, millis)?;

        let max_attempts = self.config.max_number_attempts.max(1);
        for attempt in 1..=max_attempts {
            let record = ApplicationRecord {
                application: Application {
                    id: ApplicationId::generate(),
                    application_no: number.clone(),
                    applicant_email: applicant_email.clone(),
                    registration_period_id: period.id,
                    status: ApplicationStatus::Submitted,
                    decision_reason: None,
                    submitted_at: Some(now),
                    created_at: now,
                    updated_at: now,
                },
                pre_registration: Some(detail.clone()),
            };

            match self.repository.insert(record) {
                Ok(stored) => {
                    info!(
                        application_id = %stored.application.id,
                        application_no = %stored.application.application_no,
                        period_id = %period.id,
                        "pre-registration accepted"
                    );
                    return Ok(stored);
                }
                Err(RepositoryError::Conflict) => {
                    warn!(
                        application_no = %number,
                        attempt,
                        "application number taken at insert; regenerating"
                    );
                    number = numbering::randomized_fallback(year, millis);
                }
                Err(other) => return Err(other.into()),
            }
        }

        Err(ApplicationServiceError::NumberAllocationExhausted {
            attempts: max_attempts,
        })
    }

    /// Fails with `AdmissionClosed` unless a period admits submissions right now.
    ///
    /// Callers that reject a payload before reaching [`Self::submit`] check this first so
    /// a closed intake reads the same whatever was sent.
    pub fn ensure_accepting(&self) -> Result<(), ApplicationServiceError> {
        self.admitting_period(self.clock.now()).map(|_| ())
    }

    fn admitting_period(
        &self,
        now: DateTime<Utc>,
    ) -> Result<RegistrationPeriod, ApplicationServiceError> {
        match self.window.active_period_at(now)? {
            Some(period) => Ok(period),
            None => {
                warn!("pre-registration refused: no active registration period");
                Err(ApplicationServiceError::AdmissionClosed)
            }
        }
    }

    fn initial_number(
        &self,
        period: &PeriodId,
        year: i32,
        millis: i64,
    ) -> Result<ApplicationNumber, ApplicationServiceError> {
        let existing = self.repository.count_in_period(period)?;
        let candidate = numbering::sequential_candidate(year, existing);
        if self.repository.number_exists(&candidate)? {
            warn!(
                application_no = %candidate,
                "sequential application number taken; using timestamp"
            );
            return Ok(numbering::timestamp_fallback(year, millis));
        }
        Ok(candidate)
    }

    /// Approve an application. Approving twice is refused.
    pub fn approve(&self, id: &ApplicationId) -> Result<ApplicationRecord, ApplicationServiceError> {
        self.decide(id, Decision::Approve)
    }

    /// Reject with a mandatory note, from any status.
    pub fn reject(
        &self,
        id: &ApplicationId,
        note: Option<&str>,
    ) -> Result<ApplicationRecord, ApplicationServiceError> {
        let note = DecisionNote::parse(note)?;
        self.decide(id, Decision::Reject(note))
    }

    /// Send back for changes with a mandatory note, from any status.
    pub fn request_changes(
        &self,
        id: &ApplicationId,
        note: Option<&str>,
    ) -> Result<ApplicationRecord, ApplicationServiceError> {
        let note = DecisionNote::parse(note)?;
        self.decide(id, Decision::RequestChanges(note))
    }

    fn decide(
        &self,
        id: &ApplicationId,
        decision: Decision,
    ) -> Result<ApplicationRecord, ApplicationServiceError> {
        for attempt in 1..=DECISION_ATTEMPTS {
            let record = self.fetch_complete(id)?;
            let mut application = record.application;
            let previous = application.status;
            let next = decision.apply_to(previous)?;

            application.status = next;
            application.decision_reason = decision.reason().map(str::to_string);
            application.updated_at = self.clock.now();

            match self.repository.update(application, previous) {
                Ok(stored) => {
                    info!(
                        application_id = %id,
                        application_no = %stored.application.application_no,
                        decision = decision.label(),
                        from = previous.label(),
                        to = next.label(),
                        "application decision recorded"
                    );
                    return Ok(stored);
                }
                // Status moved since the read; re-check the decision against the new one.
                Err(RepositoryError::Conflict) => {
                    warn!(
                        application_id = %id,
                        attempt,
                        "application changed concurrently; retrying decision"
                    );
                }
                Err(RepositoryError::NotFound) => {
                    return Err(ApplicationServiceError::NotFound(*id));
                }
                Err(other) => return Err(other.into()),
            }
        }
        Err(ApplicationServiceError::Repository(RepositoryError::Conflict))
    }

    /// An application is only addressable once its detail exists.
    fn fetch_complete(
        &self,
        id: &ApplicationId,
    ) -> Result<ApplicationRecord, ApplicationServiceError> {
        match self.repository.fetch(id)? {
            Some(record) if record.pre_registration.is_some() => Ok(record),
            _ => Err(ApplicationServiceError::NotFound(*id)),
        }
    }

    /// Staff view of one application with its registration period.
    pub fn get(&self, id: &ApplicationId) -> Result<ApplicationDetailView, ApplicationServiceError> {
        let record = self.fetch_complete(id)?;
        let period_id = record.application.registration_period_id;
        let registration_period = match self.window.get_period(&period_id) {
            Ok(period) => Some(period),
            Err(RegistrationServiceError::NotFound(_)) => None,
            Err(other) => return Err(other.into()),
        };
        Ok(ApplicationDetailView {
            record,
            registration_period,
        })
    }

    pub fn list(
        &self,
        query: &ApplicationQuery,
    ) -> Result<ApplicationListing, ApplicationServiceError> {
        let page = self.repository.search(query)?;
        let filter_options = self.repository.filter_options()?;
        Ok(ApplicationListing {
            items: page.items,
            total: page.total,
            page: query.page,
            limit: query.limit,
            filter_options,
        })
    }

    pub fn filter_options(&self) -> Result<FilterOptions, ApplicationServiceError> {
        Ok(self.repository.filter_options()?)
    }
}

/// Error raised by the pre-registration service.
#[derive(Debug, thiserror::Error)]
pub enum ApplicationServiceError {
    #[error("registration is currently closed: no open registration period")]
    AdmissionClosed,
    #[error("domicileEndDate must be on or after domicileStartDate")]
    InvalidRange,
    #[error("application {0} not found")]
    NotFound(ApplicationId),
    #[error("{0}")]
    InvalidState(LifecycleError),
    #[error("a note is required for this decision")]
    MissingNote,
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error("could not allocate a unique application number after {attempts} attempts")]
    NumberAllocationExhausted { attempts: u32 },
    #[error(transparent)]
    Window(#[from] RegistrationServiceError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<LifecycleError> for ApplicationServiceError {
    fn from(value: LifecycleError) -> Self {
        match value {
            LifecycleError::MissingNote => Self::MissingNote,
            invalid @ LifecycleError::InvalidState { .. } => Self::InvalidState(invalid),
        }
    }
}
