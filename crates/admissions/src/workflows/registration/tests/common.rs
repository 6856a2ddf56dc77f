use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::clock::FixedClock;
use crate::store::{InMemoryStore, RepositoryError};
use crate::workflows::registration::{
    NewPeriod, PeriodId, PeriodRepository, PeriodStatus, RegistrationPeriod,
    RegistrationWindowService,
};

pub(super) fn at(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn january_2025() -> NewPeriod {
    NewPeriod {
        name: "Intake January 2025".to_string(),
        start_at: at(2025, 1, 1, 0),
        end_at: at(2025, 2, 1, 0),
    }
}

pub(super) fn build_service(
    now: DateTime<Utc>,
) -> (
    RegistrationWindowService<InMemoryStore>,
    Arc<InMemoryStore>,
    Arc<FixedClock>,
) {
    let store = Arc::new(InMemoryStore::new());
    let clock = Arc::new(FixedClock::new(now));
    let service = RegistrationWindowService::new(store.clone(), clock.clone());
    (service, store, clock)
}

/// Refuses every call as if the database were offline.
pub(super) struct UnavailableRepository;

fn offline() -> RepositoryError {
    RepositoryError::Unavailable("database offline".to_string())
}

impl PeriodRepository for UnavailableRepository {
    fn insert(&self, _period: RegistrationPeriod) -> Result<RegistrationPeriod, RepositoryError> {
        Err(offline())
    }

    fn update(&self, _period: RegistrationPeriod) -> Result<RegistrationPeriod, RepositoryError> {
        Err(offline())
    }

    fn fetch(&self, _id: &PeriodId) -> Result<Option<RegistrationPeriod>, RepositoryError> {
        Err(offline())
    }

    fn list(&self) -> Result<Vec<RegistrationPeriod>, RepositoryError> {
        Err(offline())
    }

    fn admitting_at(
        &self,
        _now: DateTime<Utc>,
    ) -> Result<Vec<RegistrationPeriod>, RepositoryError> {
        Err(offline())
    }

    fn open_exclusive(
        &self,
        _id: &PeriodId,
        _now: DateTime<Utc>,
    ) -> Result<RegistrationPeriod, RepositoryError> {
        Err(offline())
    }

    fn set_status(
        &self,
        _id: &PeriodId,
        _status: PeriodStatus,
        _now: DateTime<Utc>,
    ) -> Result<RegistrationPeriod, RepositoryError> {
        Err(offline())
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
