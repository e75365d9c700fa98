//! End-to-end scenarios over the public API: routine completion with expiry,
//! session status changes, nest access and archival.

use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};
use nest_core::session::{can_access_nest, MemorySessionRepository};
use nest_core::{
    CompletionStore, Confirmation, EarlyAccessDuration, EventBus, EventFilter, ExpiryPolicy,
    ManualClock, MemoryKeyValueStore, NestError, NestEvent, RoutineItem, Session, SessionManager,
    SessionStatus,
};

fn day1_0900() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap()
}

fn completion_store(clock: Arc<ManualClock>, policy: ExpiryPolicy) -> CompletionStore {
    CompletionStore::new(
        Arc::new(MemoryKeyValueStore::new()),
        clock,
        policy,
        EventBus::new(),
    )
}

#[test]
fn test_four_action_routine_half_done() {
    let clock = Arc::new(ManualClock::new(day1_0900()));
    let store = completion_store(clock, ExpiryPolicy::production());
    let routine = RoutineItem::new(
        "lockup",
        "Nightly lock-up",
        "security",
        vec![
            "Front door".to_string(),
            "Back door".to_string(),
            "Garage".to_string(),
            "Alarm".to_string(),
        ],
    );

    store.set_completed(&routine.id, 0, true).unwrap();
    store.set_completed(&routine.id, 2, true).unwrap();

    let progress = store.routine_progress(&routine);
    assert_eq!((progress.completed, progress.total), (2, 4));
    assert_eq!(store.completion_percentage(&routine), 0.5);
    assert!(!store.is_routine_completed(&routine));

    store.set_completed(&routine.id, 1, true).unwrap();
    store.set_completed(&routine.id, 3, true).unwrap();
    assert!(store.is_routine_completed(&routine));
}

#[test]
fn test_testing_interval_grid() {
    for minutes in [1_u32, 5, 30] {
        let clock = Arc::new(ManualClock::new(day1_0900()));
        let store = completion_store(clock.clone(), ExpiryPolicy::testing(minutes));
        store.set_completed("r", 0, true).unwrap();

        let limit = i64::from(minutes) * 60;
        clock.set(day1_0900() + Duration::seconds(limit));
        assert!(store.is_completed("r", 0), "valid at t = {}s", limit);

        clock.set(day1_0900() + Duration::seconds(limit + 1));
        assert!(!store.is_completed("r", 0), "expired at t = {}s", limit + 1);
    }
}

#[test]
fn test_production_rollover_in_local_time() {
    // UTC-8: 07:30 UTC on Jan 6 is 23:30 on Jan 5 locally.
    let offset = FixedOffset::west_opt(8 * 3600).unwrap();
    let done_at = Utc.with_ymd_and_hms(2026, 1, 6, 7, 30, 0).unwrap();
    let clock = Arc::new(ManualClock::with_offset(done_at, offset));
    let store = completion_store(clock.clone(), ExpiryPolicy::production());
    store.set_completed("bedtime", 0, true).unwrap();

    clock.set(done_at + Duration::minutes(29));
    assert!(store.is_completed("bedtime", 0));

    // Local midnight is 08:00 UTC.
    clock.set(Utc.with_ymd_and_hms(2026, 1, 6, 8, 0, 0).unwrap());
    assert!(!store.is_completed("bedtime", 0));
}

#[test]
fn test_early_access_gate_two_hours() {
    let start = day1_0900();
    let session = Session::draft("Morning", "nest", "owner", start, start + Duration::hours(6))
        .with_early_access(EarlyAccessDuration::TwoHours)
        .with_status(SessionStatus::Upcoming);

    assert!(!can_access_nest(&session, start - Duration::hours(3)));
    assert!(can_access_nest(&session, start - Duration::hours(1)));
    assert!(can_access_nest(&session, start));
}

#[test]
fn test_in_progress_session_archives_as_completed() {
    let clock = Arc::new(ManualClock::new(day1_0900() + Duration::hours(12)));
    let bus = EventBus::new();
    let manager = SessionManager::new(
        Arc::new(MemorySessionRepository::new()),
        clock.clone(),
        bus.clone(),
    );
    let mut events = bus.subscribe(EventFilter::All);

    let session = manager
        .create_session(
            Session::draft(
                "Long weekend",
                "nest-1",
                "owner-1",
                day1_0900(),
                day1_0900() + Duration::days(2),
            )
            .multi_day(true)
            .with_status(SessionStatus::InProgress),
        )
        .unwrap();

    let archived = manager.archive(&session.id).unwrap();
    assert_eq!(archived.status(), SessionStatus::Completed);
    assert_eq!(manager.status(&session.id).unwrap(), SessionStatus::Completed);

    let err = manager
        .set_status(&session.id, SessionStatus::InProgress, Confirmation::Confirmed)
        .unwrap_err();
    assert!(matches!(err, NestError::ArchivedSessionImmutable(_)));

    let received = events.drain();
    assert_eq!(
        received.last(),
        Some(&NestEvent::SessionArchived {
            session_id: session.id.clone()
        })
    );
}

#[test]
fn test_owner_flow_through_every_state() {
    let clock = Arc::new(ManualClock::new(day1_0900() - Duration::days(1)));
    let manager = SessionManager::new(
        Arc::new(MemorySessionRepository::new()),
        clock.clone(),
        EventBus::new(),
    );
    let session = manager
        .create_session(Session::draft(
            "Evening",
            "nest",
            "owner",
            day1_0900(),
            day1_0900() + Duration::hours(8),
        ))
        .unwrap();
    let id = session.id.as_str();

    assert_eq!(manager.buckets().upcoming.len(), 1);

    clock.set(day1_0900() + Duration::hours(1));
    assert_eq!(manager.buckets().in_progress.len(), 1);

    manager
        .set_status(id, SessionStatus::Extended, Confirmation::Unconfirmed)
        .unwrap();
    clock.set(day1_0900() + Duration::hours(10));
    assert_eq!(manager.status(id).unwrap(), SessionStatus::Extended);
    assert!(manager.can_access_nest(id).unwrap());

    assert!(manager
        .set_status(id, SessionStatus::Completed, Confirmation::Unconfirmed)
        .is_err());
    manager
        .set_status(id, SessionStatus::Completed, Confirmation::Confirmed)
        .unwrap();
    assert!(!manager.can_access_nest(id).unwrap());

    let buckets = manager.buckets();
    assert_eq!(buckets.past.len(), 1);
    assert!(buckets.in_progress.is_empty());
    assert!(buckets.upcoming.is_empty());
}
