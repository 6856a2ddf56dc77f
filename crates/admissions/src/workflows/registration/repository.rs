use chrono::{DateTime, Utc};

use super::domain::{PeriodId, PeriodStatus, RegistrationPeriod};
use crate::store::RepositoryError;

/// Storage abstraction for registration periods.
///
/// Implementations must run `open_exclusive` as a single transaction: every period
/// flagged open is closed before the target is opened, and no reader observes the
/// intermediate state.
pub trait PeriodRepository: Send + Sync {
    fn insert(&self, period: RegistrationPeriod) -> Result<RegistrationPeriod, RepositoryError>;
    fn update(&self, period: RegistrationPeriod) -> Result<RegistrationPeriod, RepositoryError>;
    fn fetch(&self, id: &PeriodId) -> Result<Option<RegistrationPeriod>, RepositoryError>;
    fn list(&self) -> Result<Vec<RegistrationPeriod>, RepositoryError>;
    /// Periods flagged open whose window contains `now`.
    fn admitting_at(&self, now: DateTime<Utc>) -> Result<Vec<RegistrationPeriod>, RepositoryError>;
    fn open_exclusive(
        &self,
        id: &PeriodId,
        now: DateTime<Utc>,
    ) -> Result<RegistrationPeriod, RepositoryError>;
    fn set_status(
        &self,
        id: &PeriodId,
        status: PeriodStatus,
        now: DateTime<Utc>,
    ) -> Result<RegistrationPeriod, RepositoryError>;
}
