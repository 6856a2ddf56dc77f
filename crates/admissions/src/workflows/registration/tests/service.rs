use std::sync::Arc;
use std::thread;

use chrono::Duration;

use super::common::*;
use crate::clock::Clock;
use crate::store::InMemoryStore;
use crate::workflows::registration::{
    NewPeriod, PeriodId, PeriodRepository, PeriodStatus, PeriodUpdate, RegistrationServiceError,
    RegistrationWindowService,
};

#[test]
fn new_periods_start_closed_and_do_not_admit() {
    let (service, _, _) = build_service(at(2025, 1, 15, 9));
    let period = service.create_period(january_2025()).expect("period created");

    assert_eq!(period.status, PeriodStatus::Closed);
    assert!(service.active_period().expect("query succeeds").is_none());
}

#[test]
fn open_period_admits_only_inside_its_window() {
    let (service, _, clock) = build_service(at(2025, 1, 15, 9));
    let period = service.create_period(january_2025()).expect("period created");
    service.open_period(&period.id).expect("period opens");

    let active = service.active_period().expect("query succeeds");
    assert_eq!(active.map(|p| p.id), Some(period.id));

    clock.set(at(2024, 12, 31, 23));
    assert!(service.active_period().expect("query succeeds").is_none());

    // The end boundary is exclusive.
    clock.set(at(2025, 2, 1, 0));
    assert!(service.active_period().expect("query succeeds").is_none());

    clock.set(at(2025, 1, 1, 0));
    assert!(service.active_period().expect("query succeeds").is_some());
}

#[test]
fn closed_period_never_admits_even_inside_window() {
    let (service, _, _) = build_service(at(2025, 1, 15, 9));
    let period = service.create_period(january_2025()).expect("period created");
    service.open_period(&period.id).expect("period opens");
    let closed = service.close_period(&period.id).expect("period closes");

    assert_eq!(closed.status, PeriodStatus::Closed);
    assert!(service.active_period().expect("query succeeds").is_none());
}

#[test]
fn closing_twice_is_idempotent() {
    let (service, _, _) = build_service(at(2025, 1, 15, 9));
    let period = service.create_period(january_2025()).expect("period created");

    service.close_period(&period.id).expect("first close");
    let again = service.close_period(&period.id).expect("second close");
    assert_eq!(again.status, PeriodStatus::Closed);
}

#[test]
fn opening_a_second_period_closes_the_first() {
    let (service, store, _) = build_service(at(2025, 1, 15, 9));
    let first = service.create_period(january_2025()).expect("first created");
    let second = service
        .create_period(NewPeriod {
            name: "Intake February 2025".to_string(),
            start_at: at(2025, 1, 10, 0),
            end_at: at(2025, 3, 1, 0),
        })
        .expect("second created");

    service.open_period(&first.id).expect("first opens");
    service.open_period(&second.id).expect("second opens");

    let first = service.get_period(&first.id).expect("first exists");
    assert_eq!(first.status, PeriodStatus::Closed);
    assert_eq!(store.open_period_count().expect("count"), 1);
    assert_eq!(
        service.active_period().expect("query succeeds").map(|p| p.id),
        Some(second.id)
    );
}

#[test]
fn reopening_the_open_period_keeps_it_open() {
    let (service, store, _) = build_service(at(2025, 1, 15, 9));
    let period = service.create_period(january_2025()).expect("period created");
    service.open_period(&period.id).expect("opens");
    service.open_period(&period.id).expect("opens again");

    assert_eq!(store.open_period_count().expect("count"), 1);
}

#[test]
fn concurrent_opens_leave_exactly_one_open_period() {
    let (service, store, _) = build_service(at(2025, 1, 15, 9));
    let service = Arc::new(service);
    let ids: Vec<PeriodId> = (0..8)
        .map(|n| {
            service
                .create_period(NewPeriod {
                    name: format!("Intake {n}"),
                    ..january_2025()
                })
                .expect("period created")
                .id
        })
        .collect();

    let handles: Vec<_> = ids
        .iter()
        .copied()
        .map(|id| {
            let service = Arc::clone(&service);
            thread::spawn(move || service.open_period(&id).expect("open succeeds"))
        })
        .collect();
    for handle in handles {
        handle.join().expect("thread completes");
    }

    assert_eq!(store.open_period_count().expect("count"), 1);
    assert!(service.active_period().expect("query succeeds").is_some());
}

#[test]
fn active_period_prefers_the_latest_start_when_several_qualify() {
    // Two open periods can only exist if written around the service.
    let store = Arc::new(InMemoryStore::new());
    let clock = Arc::new(crate::clock::FixedClock::new(at(2025, 1, 15, 9)));
    let now = clock.now();
    let older = crate::workflows::registration::RegistrationPeriod {
        id: PeriodId::generate(),
        name: "Older".to_string(),
        start_at: at(2025, 1, 1, 0),
        end_at: at(2025, 2, 1, 0),
        status: PeriodStatus::Open,
        created_at: now,
        updated_at: now,
    };
    let newer = crate::workflows::registration::RegistrationPeriod {
        id: PeriodId::generate(),
        name: "Newer".to_string(),
        start_at: at(2025, 1, 10, 0),
        ..older.clone()
    };
    PeriodRepository::insert(&*store, older).expect("insert older");
    PeriodRepository::insert(&*store, newer.clone()).expect("insert newer");

    let service = RegistrationWindowService::new(store, clock);
    let active = service.active_period().expect("query succeeds");
    assert_eq!(active.map(|p| p.id), Some(newer.id));
}

#[test]
fn list_orders_by_start_descending() {
    let (service, _, _) = build_service(at(2025, 1, 15, 9));
    let january = service.create_period(january_2025()).expect("january");
    let march = service
        .create_period(NewPeriod {
            name: "Intake March 2025".to_string(),
            start_at: at(2025, 3, 1, 0),
            end_at: at(2025, 4, 1, 0),
        })
        .expect("march");

    let ids: Vec<_> = service
        .list_periods()
        .expect("list")
        .into_iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(ids, vec![march.id, january.id]);
}

#[test]
fn create_rejects_inverted_windows_and_blank_names() {
    let (service, _, _) = build_service(at(2025, 1, 15, 9));

    let inverted = NewPeriod {
        start_at: at(2025, 2, 1, 0),
        end_at: at(2025, 1, 1, 0),
        ..january_2025()
    };
    assert!(matches!(
        service.create_period(inverted),
        Err(RegistrationServiceError::InvalidWindow { .. })
    ));

    let blank = NewPeriod {
        name: "   ".to_string(),
        ..january_2025()
    };
    assert!(matches!(
        service.create_period(blank),
        Err(RegistrationServiceError::BlankName)
    ));
}

#[test]
fn update_changes_fields_but_never_status() {
    let (service, _, clock) = build_service(at(2025, 1, 15, 9));
    let period = service.create_period(january_2025()).expect("period created");
    service.open_period(&period.id).expect("opens");
    clock.advance(Duration::minutes(5));

    let updated = service
        .update_period(
            &period.id,
            PeriodUpdate {
                name: Some("  Intake Jan 2025 (extended) ".to_string()),
                end_at: Some(at(2025, 2, 15, 0)),
                ..PeriodUpdate::default()
            },
        )
        .expect("update succeeds");

    assert_eq!(updated.name, "Intake Jan 2025 (extended)");
    assert_eq!(updated.end_at, at(2025, 2, 15, 0));
    assert_eq!(updated.status, PeriodStatus::Open);
    assert_eq!(updated.updated_at, at(2025, 1, 15, 9) + Duration::minutes(5));
}

#[test]
fn update_rejects_a_window_that_would_invert() {
    let (service, _, _) = build_service(at(2025, 1, 15, 9));
    let period = service.create_period(january_2025()).expect("period created");

    let result = service.update_period(
        &period.id,
        PeriodUpdate {
            end_at: Some(at(2024, 12, 1, 0)),
            ..PeriodUpdate::default()
        },
    );
    assert!(matches!(
        result,
        Err(RegistrationServiceError::InvalidWindow { .. })
    ));
    assert_eq!(
        service.get_period(&period.id).expect("still there").end_at,
        at(2025, 2, 1, 0)
    );
}

#[test]
fn unknown_periods_are_not_found() {
    let (service, _, _) = build_service(at(2025, 1, 15, 9));
    let missing = PeriodId::generate();

    assert!(matches!(
        service.open_period(&missing),
        Err(RegistrationServiceError::NotFound(id)) if id == missing
    ));
    assert!(matches!(
        service.close_period(&missing),
        Err(RegistrationServiceError::NotFound(_))
    ));
    assert!(matches!(
        service.update_period(&missing, PeriodUpdate::default()),
        Err(RegistrationServiceError::NotFound(_))
    ));
}

#[test]
fn repository_failures_surface_as_repository_errors() {
    let service = RegistrationWindowService::new(
        Arc::new(UnavailableRepository),
        Arc::new(crate::clock::FixedClock::new(at(2025, 1, 15, 9))),
    );
    assert!(matches!(
        service.active_period(),
        Err(RegistrationServiceError::Repository(_))
    ));
}
