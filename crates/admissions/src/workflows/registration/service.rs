use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use super::domain::{NewPeriod, PeriodId, PeriodStatus, PeriodUpdate, RegistrationPeriod};
use super::repository::PeriodRepository;
use crate::clock::Clock;
use crate::store::RepositoryError;

/// Registration window manager: gates intake to a single time-bounded period.
pub struct RegistrationWindowService<P> {
    repository: Arc<P>,
    clock: Arc<dyn Clock>,
}

impl<P> RegistrationWindowService<P>
where
    P: PeriodRepository + 'static,
{
    pub fn new(repository: Arc<P>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// The period admitting submissions right now, per the injected clock.
    pub fn active_period(&self) -> Result<Option<RegistrationPeriod>, RegistrationServiceError> {
        self.active_period_at(self.clock.now())
    }

    /// The period flagged open whose window contains `now`.
    ///
    /// Should more than one qualify, the most recently started wins, then the most
    /// recently created.
    pub fn active_period_at(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Option<RegistrationPeriod>, RegistrationServiceError> {
        let candidates = self.repository.admitting_at(now)?;
        Ok(candidates
            .into_iter()
            .filter(|period| period.admits_at(now))
            .max_by_key(RegistrationPeriod::recency_key))
    }

    /// All periods, most recent start first.
    pub fn list_periods(&self) -> Result<Vec<RegistrationPeriod>, RegistrationServiceError> {
        let mut periods = self.repository.list()?;
        periods.sort_by(|a, b| b.start_at.cmp(&a.start_at));
        Ok(periods)
    }

    pub fn get_period(&self, id: &PeriodId) -> Result<RegistrationPeriod, RegistrationServiceError> {
        self.repository
            .fetch(id)?
            .ok_or(RegistrationServiceError::NotFound(*id))
    }

    pub fn create_period(
        &self,
        request: NewPeriod,
    ) -> Result<RegistrationPeriod, RegistrationServiceError> {
        let name = require_name(&request.name)?;
        check_window(request.start_at, request.end_at)?;

        let now = self.clock.now();
        let period = RegistrationPeriod {
            id: PeriodId::generate(),
            name,
            start_at: request.start_at,
            end_at: request.end_at,
            status: PeriodStatus::Closed,
            created_at: now,
            updated_at: now,
        };

        let stored = self.repository.insert(period)?;
        info!(period_id = %stored.id, name = %stored.name, "registration period created");
        Ok(stored)
    }

    pub fn update_period(
        &self,
        id: &PeriodId,
        update: PeriodUpdate,
    ) -> Result<RegistrationPeriod, RegistrationServiceError> {
        let mut period = self.get_period(id)?;
        if update.is_empty() {
            return Ok(period);
        }

        if let Some(name) = update.name.as_deref() {
            require_name(name)?;
        }
        update.merge_into(&mut period);
        period.name = period.name.trim().to_string();
        check_window(period.start_at, period.end_at)?;
        period.updated_at = self.clock.now();

        self.repository
            .update(period)
            .map_err(|err| not_found_as(err, *id))
    }

    /// Closes whichever period is open and opens `id`, as one unit of work.
    pub fn open_period(&self, id: &PeriodId) -> Result<RegistrationPeriod, RegistrationServiceError> {
        let opened = self
            .repository
            .open_exclusive(id, self.clock.now())
            .map_err(|err| not_found_as(err, *id))?;
        info!(period_id = %opened.id, name = %opened.name, "registration period opened");
        Ok(opened)
    }

    /// Idempotent: closing a closed period succeeds.
    pub fn close_period(&self, id: &PeriodId) -> Result<RegistrationPeriod, RegistrationServiceError> {
        let closed = self
            .repository
            .set_status(id, PeriodStatus::Closed, self.clock.now())
            .map_err(|err| not_found_as(err, *id))?;
        info!(period_id = %closed.id, name = %closed.name, "registration period closed");
        Ok(closed)
    }
}

fn require_name(raw: &str) -> Result<String, RegistrationServiceError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(RegistrationServiceError::BlankName);
    }
    Ok(trimmed.to_string())
}

fn check_window(
    start_at: DateTime<Utc>,
    end_at: DateTime<Utc>,
) -> Result<(), RegistrationServiceError> {
    if end_at <= start_at {
        return Err(RegistrationServiceError::InvalidWindow { start_at, end_at });
    }
    Ok(())
}

fn not_found_as(err: RepositoryError, id: PeriodId) -> RegistrationServiceError {
    match err {
        RepositoryError::NotFound => RegistrationServiceError::NotFound(id),
        other => RegistrationServiceError::Repository(other),
    }
}

/// Error raised by the registration window manager.
#[derive(Debug, thiserror::Error)]
pub enum RegistrationServiceError {
    #[error("registration period {0} not found")]
    NotFound(PeriodId),
    #[error("registration period must end after it starts (start {start_at}, end {end_at})")]
    InvalidWindow {
        start_at: DateTime<Utc>,
        end_at: DateTime<Utc>,
    },
    #[error("registration period name must not be blank")]
    BlankName,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
