use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use super::RepositoryError;
use crate::workflows::applications::{
    Application, ApplicationId, ApplicationNumber, ApplicationPage, ApplicationQuery,
    ApplicationRecord, ApplicationRepository, ApplicationStatus, FilterOptions,
};
use crate::workflows::registration::{
    PeriodId, PeriodRepository, PeriodStatus, RegistrationPeriod,
};

type PeriodTable = HashMap<PeriodId, RegistrationPeriod>;

fn poisoned(table: &str) -> RepositoryError {
    RepositoryError::Unavailable(format!("{table} table lock poisoned"))
}

#[derive(Default)]
struct ApplicationTables {
    rows: HashMap<ApplicationId, ApplicationRecord>,
    // Unique index on the application number.
    numbers: HashMap<ApplicationNumber, ApplicationId>,
}

/// Process-local relational store. Each operation holds a table lock for its whole
/// duration, which is the transaction boundary the repositories require.
#[derive(Default, Clone)]
pub struct InMemoryStore {
    periods: Arc<Mutex<PeriodTable>>,
    applications: Arc<Mutex<ApplicationTables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn periods(&self) -> Result<MutexGuard<'_, PeriodTable>, RepositoryError> {
        self.periods.lock().map_err(|_| poisoned("registration_periods"))
    }

    fn applications(&self) -> Result<MutexGuard<'_, ApplicationTables>, RepositoryError> {
        self.applications.lock().map_err(|_| poisoned("applications"))
    }

    /// Number of periods currently flagged open.
    pub fn open_period_count(&self) -> Result<usize, RepositoryError> {
        Ok(self
            .periods()?
            .values()
            .filter(|period| period.status == PeriodStatus::Open)
            .count())
    }
}

impl PeriodRepository for InMemoryStore {
    fn insert(&self, period: RegistrationPeriod) -> Result<RegistrationPeriod, RepositoryError> {
        let mut periods = self.periods()?;
        if periods.contains_key(&period.id) {
            return Err(RepositoryError::Conflict);
        }
        periods.insert(period.id, period.clone());
        Ok(period)
    }

    fn update(&self, period: RegistrationPeriod) -> Result<RegistrationPeriod, RepositoryError> {
        let mut periods = self.periods()?;
        let Some(existing) = periods.get_mut(&period.id) else {
            return Err(RepositoryError::NotFound);
        };
        // Status only moves through open_exclusive and set_status.
        let status = existing.status;
        *existing = RegistrationPeriod { status, ..period };
        Ok(existing.clone())
    }

    fn fetch(&self, id: &PeriodId) -> Result<Option<RegistrationPeriod>, RepositoryError> {
        Ok(self.periods()?.get(id).cloned())
    }

    fn list(&self) -> Result<Vec<RegistrationPeriod>, RepositoryError> {
        Ok(self.periods()?.values().cloned().collect())
    }

    fn admitting_at(&self, now: DateTime<Utc>) -> Result<Vec<RegistrationPeriod>, RepositoryError> {
        Ok(self
            .periods()?
            .values()
            .filter(|period| period.admits_at(now))
            .cloned()
            .collect())
    }

    fn open_exclusive(
        &self,
        id: &PeriodId,
        now: DateTime<Utc>,
    ) -> Result<RegistrationPeriod, RepositoryError> {
        let mut periods = self.periods()?;
        if !periods.contains_key(id) {
            return Err(RepositoryError::NotFound);
        }

        for period in periods.values_mut() {
            if period.status == PeriodStatus::Open && period.id != *id {
                period.status = PeriodStatus::Closed;
                period.updated_at = now;
            }
        }

        let target = periods.get_mut(id).ok_or(RepositoryError::NotFound)?;
        target.status = PeriodStatus::Open;
        target.updated_at = now;
        Ok(target.clone())
    }

    fn set_status(
        &self,
        id: &PeriodId,
        status: PeriodStatus,
        now: DateTime<Utc>,
    ) -> Result<RegistrationPeriod, RepositoryError> {
        let mut periods = self.periods()?;
        let period = periods.get_mut(id).ok_or(RepositoryError::NotFound)?;
        period.status = status;
        period.updated_at = now;
        Ok(period.clone())
    }
}

impl ApplicationRepository for InMemoryStore {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        let mut tables = self.applications()?;
        let id = record.application.id;
        let number = record.application.application_no.clone();
        if tables.rows.contains_key(&id) || tables.numbers.contains_key(&number) {
            return Err(RepositoryError::Conflict);
        }
        tables.numbers.insert(number, id);
        tables.rows.insert(id, record.clone());
        Ok(record)
    }

    fn update(
        &self,
        application: Application,
        expected: ApplicationStatus,
    ) -> Result<ApplicationRecord, RepositoryError> {
        let mut tables = self.applications()?;
        let record = tables
            .rows
            .get_mut(&application.id)
            .ok_or(RepositoryError::NotFound)?;
        if record.application.application_no != application.application_no
            || record.application.status != expected
        {
            return Err(RepositoryError::Conflict);
        }
        record.application = application;
        Ok(record.clone())
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Ok(self.applications()?.rows.get(id).cloned())
    }

    fn count_in_period(&self, period: &PeriodId) -> Result<u64, RepositoryError> {
        Ok(self
            .applications()?
            .rows
            .values()
            .filter(|record| record.application.registration_period_id == *period)
            .count() as u64)
    }

    fn number_exists(&self, number: &ApplicationNumber) -> Result<bool, RepositoryError> {
        Ok(self.applications()?.numbers.contains_key(number))
    }

    fn search(&self, query: &ApplicationQuery) -> Result<ApplicationPage, RepositoryError> {
        let tables = self.applications()?;
        Ok(query.apply(tables.rows.values().cloned()))
    }

    fn filter_options(&self) -> Result<FilterOptions, RepositoryError> {
        let tables = self.applications()?;
        Ok(FilterOptions::collect(
            tables
                .rows
                .values()
                .filter_map(|record| record.pre_registration.as_ref()),
        ))
    }
}
