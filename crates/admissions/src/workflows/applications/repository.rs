use super::domain::{
    Application, ApplicationId, ApplicationNumber, ApplicationRecord, ApplicationStatus,
};
use super::query::{ApplicationPage, ApplicationQuery, FilterOptions};
use crate::store::RepositoryError;
use crate::workflows::registration::PeriodId;

/// Storage abstraction for applications and their pre-registration detail.
///
/// `insert` writes the application and its detail as one unit and must refuse a
/// duplicate application number with [`RepositoryError::Conflict`]; that constraint
/// is what keeps numbers unique under concurrent submissions.
pub trait ApplicationRepository: Send + Sync {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError>;
    /// Replaces the application row, keeping the stored detail. Refused with
    /// [`RepositoryError::Conflict`] unless the stored status is still `expected`.
    fn update(
        &self,
        application: Application,
        expected: ApplicationStatus,
    ) -> Result<ApplicationRecord, RepositoryError>;
    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError>;
    fn count_in_period(&self, period: &PeriodId) -> Result<u64, RepositoryError>;
    fn number_exists(&self, number: &ApplicationNumber) -> Result<bool, RepositoryError>;
    fn search(&self, query: &ApplicationQuery) -> Result<ApplicationPage, RepositoryError>;
    fn filter_options(&self) -> Result<FilterOptions, RepositoryError>;
}
