use std::sync::Arc;

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

use turnstile_core::events::{
    Event, EventAttendee, EventAttendeeRepositoryTrait, EventRepositoryTrait,
};
use turnstile_core::people::{Person, PersonRepositoryTrait};
use turnstile_core::scans::{Scan, ScanMethod, ScanRepositoryTrait, ScanWrite};
use turnstile_core::sync::{
    ScanRecord, SyncRepositoryTrait, CYCLE_STATUS_FAILED, CYCLE_STATUS_SUCCESS, EPOCH_WATERMARK,
};
use turnstile_storage_sqlite::{
    create_pool, EventAttendeeRepository, EventRepository, PersonRepository, ScanRepository,
    SyncRepository, WriteHandle,
};

struct TestStore {
    // Held so the database file outlives the repositories.
    _dir: TempDir,
    people: PersonRepository,
    events: EventRepository,
    attendees: EventAttendeeRepository,
    scans: ScanRepository,
    sync: SyncRepository,
}

fn open_store() -> TestStore {
    let dir = TempDir::new().expect("temp dir");
    let db_path = dir.path().join("checkin.db");
    let url = db_path.to_str().expect("utf-8 path").to_string();

    let pool = create_pool(&url).expect("pool");
    let writer = WriteHandle::spawn(&url).expect("writer");

    TestStore {
        _dir: dir,
        people: PersonRepository::new(Arc::clone(&pool), writer.clone()),
        events: EventRepository::new(Arc::clone(&pool), writer.clone()),
        attendees: EventAttendeeRepository::new(Arc::clone(&pool), writer.clone()),
        scans: ScanRepository::new(Arc::clone(&pool), writer.clone()),
        sync: SyncRepository::new(pool, writer),
    }
}

fn person(id: &str, first: &str, last: &str) -> Person {
    Person {
        id: id.to_string(),
        first_name: first.to_string(),
        last_name: last.to_string(),
        direct_manager: "Dana Flores".to_string(),
        email: format!("{}.{}@example.com", first.to_lowercase(), last.to_lowercase()),
    }
}

fn event(id: i32, sprint: Option<&str>) -> Event {
    Event {
        id,
        location: "Lisbon".to_string(),
        sprint: sprint.map(str::to_string),
        date: NaiveDate::from_ymd_opt(2026, 7, 14).unwrap(),
        session: "morning".to_string(),
    }
}

fn scan_at(id: &str, event_id: i32, person_id: &str, timestamp: i64) -> Scan {
    Scan {
        id: id.to_string(),
        event_id,
        person_id: person_id.to_string(),
        timestamp,
        method: ScanMethod::Scan,
        uploaded: false,
        is_local: true,
    }
}

#[tokio::test]
async fn bulk_load_seeds_reference_data_idempotently() {
    let store = open_store();

    let loaded = store
        .people
        .bulk_load(vec![person("p-1", "Ana", "Silva"), person("p-2", "Ben", "Okafor")])
        .await
        .unwrap();
    assert_eq!(loaded, 2);

    store.events.bulk_load(vec![event(7, Some("Q3"))]).await.unwrap();
    store
        .attendees
        .bulk_load(vec![EventAttendee {
            event_id: 7,
            person_id: "p-1".to_string(),
        }])
        .await
        .unwrap();

    // Loading the same rows again must not duplicate anything.
    store
        .people
        .bulk_load(vec![person("p-1", "Ana", "Silva")])
        .await
        .unwrap();
    store
        .attendees
        .bulk_load(vec![EventAttendee {
            event_id: 7,
            person_id: "p-1".to_string(),
        }])
        .await
        .unwrap();

    assert_eq!(store.people.count_people().unwrap(), 2);
    assert_eq!(store.attendees.count_attendees().unwrap(), 1);
    assert_eq!(
        store.people.get_person("p-1").unwrap().unwrap().display_name(),
        "Ana Silva"
    );
    assert_eq!(store.events.get_event(7).unwrap().unwrap().sprint.as_deref(), Some("Q3"));
    assert!(store.attendees.is_invited(7, "p-1").unwrap());
    assert!(!store.attendees.is_invited(7, "p-2").unwrap());
}

#[tokio::test]
async fn duplicate_window_suppresses_rapid_rescans() {
    let store = open_store();

    let first = scan_at("s-1", 7, "p-1", 1_000_000);
    assert!(matches!(
        store.scans.insert_unless_duplicate(first, 5_000).await.unwrap(),
        ScanWrite::Inserted(_)
    ));

    // 3s later, same pair: inside the window.
    let rescan = scan_at("s-2", 7, "p-1", 1_003_000);
    assert_eq!(
        store.scans.insert_unless_duplicate(rescan, 5_000).await.unwrap(),
        ScanWrite::DuplicateSuppressed
    );

    // Same moment, different person: unaffected.
    let other = scan_at("s-3", 7, "p-2", 1_003_000);
    assert!(matches!(
        store.scans.insert_unless_duplicate(other, 5_000).await.unwrap(),
        ScanWrite::Inserted(_)
    ));

    // Same pair well outside the window.
    let later = scan_at("s-4", 7, "p-1", 1_010_000);
    assert!(matches!(
        store.scans.insert_unless_duplicate(later, 5_000).await.unwrap(),
        ScanWrite::Inserted(_)
    ));

    assert_eq!(store.scans.list_for_event(7).unwrap().len(), 3);
}

#[tokio::test]
async fn pending_backlog_spans_events_and_excludes_uploaded() {
    let store = open_store();

    store.scans.upsert(scan_at("s-1", 7, "p-1", 1_000)).await.unwrap();
    store.scans.upsert(scan_at("s-2", 8, "p-2", 2_000)).await.unwrap();
    let mut synced = scan_at("s-3", 7, "p-3", 3_000);
    synced.uploaded = true;
    store.scans.upsert(synced).await.unwrap();

    let pending = store.scans.list_pending().unwrap();
    let ids: Vec<&str> = pending.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["s-1", "s-2"]);
    assert_eq!(store.scans.count_pending_local().unwrap(), 2);
}

#[tokio::test]
async fn recent_local_scans_exclude_manual_and_remote_rows() {
    let store = open_store();

    store.scans.upsert(scan_at("s-1", 7, "p-1", 1_000)).await.unwrap();
    store.scans.upsert(scan_at("s-2", 7, "p-2", 2_000)).await.unwrap();

    let mut manual = scan_at("s-3", 7, "p-3", 3_000);
    manual.method = ScanMethod::Manual;
    store.scans.upsert(manual).await.unwrap();

    let mut remote = scan_at("s-4", 7, "p-4", 4_000);
    remote.is_local = false;
    remote.uploaded = true;
    store.scans.upsert(remote).await.unwrap();

    let recent = store.scans.recent_local_scans(7, 10).unwrap();
    let ids: Vec<&str> = recent.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["s-2", "s-1"]);
}

#[tokio::test]
async fn apply_sync_success_merges_atomically_and_advances_watermark() {
    let store = open_store();
    assert_eq!(store.sync.last_sync(7).unwrap(), EPOCH_WATERMARK);

    let mine = scan_at("s-mine", 7, "p-1", 1_000);
    store.scans.upsert(mine.clone()).await.unwrap();

    let peer = ScanRecord {
        id: "s-peer".to_string(),
        event_id: 7,
        person_id: "p-2".to_string(),
        timestamp: 2_000,
        method: ScanMethod::Manual,
    };
    let adopted = store
        .sync
        .apply_sync_success(
            7,
            vec!["s-mine".to_string()],
            vec![ScanRecord::from(&mine), peer],
            "2026-07-14T10:30:00.000Z".to_string(),
        )
        .await
        .unwrap();
    assert_eq!(adopted, 1);

    // Our own row is now uploaded but still marked local.
    let mine_after = store.scans.get_scan("s-mine").unwrap().unwrap();
    assert!(mine_after.uploaded);
    assert!(mine_after.is_local);

    // The peer row arrived as synced, non-local.
    let peer_after = store.scans.get_scan("s-peer").unwrap().unwrap();
    assert!(peer_after.uploaded);
    assert!(!peer_after.is_local);
    assert_eq!(peer_after.method, ScanMethod::Manual);

    assert_eq!(store.sync.last_sync(7).unwrap(), "2026-07-14T10:30:00.000Z");
    // Other events keep their own watermark.
    assert_eq!(store.sync.last_sync(8).unwrap(), EPOCH_WATERMARK);
}

#[tokio::test]
async fn cycle_outcomes_drive_failure_count_and_retry_hint() {
    let store = open_store();

    store
        .sync
        .mark_cycle_outcome(CYCLE_STATUS_FAILED.to_string(), 120, Some("timeout".to_string()))
        .await
        .unwrap();
    store
        .sync
        .mark_cycle_outcome(CYCLE_STATUS_FAILED.to_string(), 95, Some("timeout".to_string()))
        .await
        .unwrap();

    let status = store.sync.engine_status().unwrap();
    assert_eq!(status.consecutive_failures, 2);
    assert_eq!(status.last_error.as_deref(), Some("timeout"));
    assert_eq!(status.last_cycle_status.as_deref(), Some(CYCLE_STATUS_FAILED));
    assert!(status.next_retry_at.is_some());

    store
        .sync
        .mark_cycle_outcome(CYCLE_STATUS_SUCCESS.to_string(), 80, None)
        .await
        .unwrap();

    let status = store.sync.engine_status().unwrap();
    assert_eq!(status.consecutive_failures, 0);
    assert_eq!(status.last_error, None);
    assert_eq!(status.next_retry_at, None);
    assert_eq!(status.last_cycle_status.as_deref(), Some(CYCLE_STATUS_SUCCESS));
    assert_eq!(status.last_cycle_duration_ms, Some(80));
}
