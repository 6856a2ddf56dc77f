use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::clock::FixedClock;
use crate::config::IntakeConfig;
use crate::store::{InMemoryStore, RepositoryError};
use crate::workflows::applications::{
    Application, ApplicationId, ApplicationNumber, ApplicationPage, ApplicationQuery,
    ApplicationRecord, ApplicationRepository, ApplicationStatus, FilterOptions,
    PreRegistrationService, PreRegistrationSubmission, StudentGender,
};
use crate::workflows::registration::{
    NewPeriod, PeriodId, RegistrationPeriod, RegistrationWindowService,
};

pub(super) fn at(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, 0, 0)
        .single()
        .expect("valid timestamp")
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn submission() -> PreRegistrationSubmission {
    PreRegistrationSubmission {
        applicant_email: "parent@example.com".to_string(),
        applicant_name: "Siti Rahma".to_string(),
        applicant_relationship: "Mother".to_string(),
        reason_living_abroad: "Diplomatic posting".to_string(),
        reason_to_apply: "Continuity of national curriculum".to_string(),
        assignment_city: "Kuala Lumpur".to_string(),
        assignment_country: "Malaysia".to_string(),
        domicile_start_date: date(2024, 1, 1),
        domicile_end_date: date(2024, 12, 31),
        permit_expiry_date: date(2026, 6, 30),
        program_choice: "Regular".to_string(),
        education_level: "SD".to_string(),
        grade_applied: "4".to_string(),
        student_name: "Ahmad Fauzi".to_string(),
        student_gender: StudentGender::Male,
        student_birth_date: date(2015, 3, 14),
        last_education_location: "SD Negeri 1 Bandung".to_string(),
        nisn: Some("0123456789".to_string()),
    }
}

pub(super) fn january_2025() -> NewPeriod {
    NewPeriod {
        name: "Intake January 2025".to_string(),
        start_at: at(2025, 1, 1, 0),
        end_at: at(2025, 2, 1, 0),
    }
}

pub(super) type MemoryService = PreRegistrationService<InMemoryStore, InMemoryStore>;

pub(super) struct Harness {
    pub(super) service: MemoryService,
    pub(super) window: Arc<RegistrationWindowService<InMemoryStore>>,
    pub(super) store: Arc<InMemoryStore>,
    pub(super) clock: Arc<FixedClock>,
    pub(super) period: RegistrationPeriod,
}

/// Service over an in-memory store with the January 2025 period open and the clock
/// at 15 January.
pub(super) fn open_harness() -> Harness {
    let harness = closed_harness();
    harness
        .window
        .open_period(&harness.period.id)
        .expect("period opens");
    let period = harness
        .window
        .get_period(&harness.period.id)
        .expect("period exists");
    Harness { period, ..harness }
}

/// Same as [`open_harness`] but the period is left closed.
pub(super) fn closed_harness() -> Harness {
    let store = Arc::new(InMemoryStore::new());
    let clock = Arc::new(FixedClock::new(at(2025, 1, 15, 9)));
    let window = Arc::new(RegistrationWindowService::new(store.clone(), clock.clone()));
    let period = window
        .create_period(january_2025())
        .expect("period created");
    let service = PreRegistrationService::new(
        store.clone(),
        window.clone(),
        clock.clone(),
        IntakeConfig::default(),
    );
    Harness {
        service,
        window,
        store,
        clock,
        period,
    }
}

pub(super) fn all_records(store: &InMemoryStore) -> ApplicationPage {
    let query = ApplicationQuery {
        limit: 100,
        ..ApplicationQuery::default()
    };
    ApplicationRepository::search(store, &query).expect("search succeeds")
}

/// Refuses every insert as a duplicate number.
pub(super) struct ConflictRepository;

impl ApplicationRepository for ConflictRepository {
    fn insert(&self, _record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        Err(RepositoryError::Conflict)
    }

    fn update(
        &self,
        _application: Application,
        _expected: ApplicationStatus,
    ) -> Result<ApplicationRecord, RepositoryError> {
        Err(RepositoryError::NotFound)
    }

    fn fetch(&self, _id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Ok(None)
    }

    fn count_in_period(&self, _period: &PeriodId) -> Result<u64, RepositoryError> {
        Ok(0)
    }

    fn number_exists(&self, _number: &ApplicationNumber) -> Result<bool, RepositoryError> {
        Ok(false)
    }

    fn search(&self, _query: &ApplicationQuery) -> Result<ApplicationPage, RepositoryError> {
        Ok(ApplicationPage::default())
    }

    fn filter_options(&self) -> Result<FilterOptions, RepositoryError> {
        Ok(FilterOptions::default())
    }
}

/// In-memory applications table with a one-shot fault injected ahead of it.
pub(super) struct FlakyRepository {
    pub(super) inner: InMemoryStore,
    fault: Fault,
    tripped: AtomicBool,
}

enum Fault {
    /// The first insert is refused as a duplicate number.
    ConflictOnFirstInsert,
    /// Another approval lands between the read and the first update.
    RivalApprovalBeforeUpdate,
}

impl FlakyRepository {
    pub(super) fn conflict_on_first_insert() -> Self {
        Self::with(Fault::ConflictOnFirstInsert)
    }

    pub(super) fn rival_approval_before_update() -> Self {
        Self::with(Fault::RivalApprovalBeforeUpdate)
    }

    fn with(fault: Fault) -> Self {
        Self {
            inner: InMemoryStore::new(),
            fault,
            tripped: AtomicBool::new(false),
        }
    }

    fn trip(&self) -> bool {
        !self.tripped.swap(true, Ordering::SeqCst)
    }
}

impl ApplicationRepository for FlakyRepository {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        if matches!(self.fault, Fault::ConflictOnFirstInsert) && self.trip() {
            return Err(RepositoryError::Conflict);
        }
        ApplicationRepository::insert(&self.inner, record)
    }

    fn update(
        &self,
        application: Application,
        expected: ApplicationStatus,
    ) -> Result<ApplicationRecord, RepositoryError> {
        if matches!(self.fault, Fault::RivalApprovalBeforeUpdate) && self.trip() {
            let mut rival = application.clone();
            rival.status = ApplicationStatus::Approved;
            rival.decision_reason = None;
            ApplicationRepository::update(&self.inner, rival, expected)?;
        }
        ApplicationRepository::update(&self.inner, application, expected)
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        ApplicationRepository::fetch(&self.inner, id)
    }

    fn count_in_period(&self, period: &PeriodId) -> Result<u64, RepositoryError> {
        ApplicationRepository::count_in_period(&self.inner, period)
    }

    fn number_exists(&self, number: &ApplicationNumber) -> Result<bool, RepositoryError> {
        ApplicationRepository::number_exists(&self.inner, number)
    }

    fn search(&self, query: &ApplicationQuery) -> Result<ApplicationPage, RepositoryError> {
        ApplicationRepository::search(&self.inner, query)
    }

    fn filter_options(&self) -> Result<FilterOptions, RepositoryError> {
        ApplicationRepository::filter_options(&self.inner)
    }
}

pub(super) struct UnavailableRepository;

fn offline() -> RepositoryError {
    RepositoryError::Unavailable("database offline".to_string())
}

impl ApplicationRepository for UnavailableRepository {
    fn insert(&self, _record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        Err(offline())
    }

    fn update(
        &self,
        _application: Application,
        _expected: ApplicationStatus,
    ) -> Result<ApplicationRecord, RepositoryError> {
        Err(offline())
    }

    fn fetch(&self, _id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Err(offline())
    }

    fn count_in_period(&self, _period: &PeriodId) -> Result<u64, RepositoryError> {
        Err(offline())
    }

    fn number_exists(&self, _number: &ApplicationNumber) -> Result<bool, RepositoryError> {
        Err(offline())
    }

    fn search(&self, _query: &ApplicationQuery) -> Result<ApplicationPage, RepositoryError> {
        Err(offline())
    }

    fn filter_options(&self) -> Result<FilterOptions, RepositoryError> {
        Err(offline())
    }
}

/// Service whose application table is `repository`, behind an open January window.
pub(super) fn service_over<A>(repository: A) -> PreRegistrationService<A, InMemoryStore>
where
    A: ApplicationRepository + 'static,
{
    shared_service_over(Arc::new(repository))
}

pub(super) fn shared_service_over<A>(
    repository: Arc<A>,
) -> PreRegistrationService<A, InMemoryStore>
where
    A: ApplicationRepository + 'static,
{
    let harness = open_harness();
    PreRegistrationService::new(
        repository,
        harness.window,
        harness.clock,
        IntakeConfig::default(),
    )
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 256 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
