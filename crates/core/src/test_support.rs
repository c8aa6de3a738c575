//! In-memory repository fixtures for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};

use crate::errors::Result;
use crate::events::{Event, EventAttendee, EventAttendeeRepositoryTrait, EventRepositoryTrait};
use crate::people::{Person, PersonRepositoryTrait};
use crate::scans::{Scan, ScanRepositoryTrait, ScanWrite};
use crate::sync::{
    backoff_seconds, ScanRecord, SyncEngineStatus, SyncRepositoryTrait, EPOCH_WATERMARK,
};

pub fn sample_person(id: &str, first_name: &str, last_name: &str) -> Person {
    Person {
        id: id.to_string(),
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        direct_manager: "Charles Babbage".to_string(),
        email: format!("{}@example.test", first_name.to_lowercase()),
    }
}

pub fn sample_event(id: i32, sprint: Option<&str>) -> Event {
    Event {
        id,
        location: "HQ".to_string(),
        sprint: sprint.map(str::to_string),
        date: NaiveDate::from_ymd_opt(2026, 8, 28).unwrap(),
        session: "Kickoff".to_string(),
    }
}

/// In-memory stand-in for the local store, implementing every repository
/// trait the recorder, engine and services consume.
#[derive(Default)]
pub struct MemoryStore {
    people: Mutex<HashMap<String, Person>>,
    events: Mutex<HashMap<i32, Event>>,
    attendees: Mutex<Vec<EventAttendee>>,
    scans: Mutex<HashMap<String, Scan>>,
    watermarks: Mutex<HashMap<i32, String>>,
    engine_state: Mutex<SyncEngineStatus>,
}

impl MemoryStore {
    pub fn add_person(&self, person: Person) {
        self.people.lock().unwrap().insert(person.id.clone(), person);
    }

    pub fn add_event(&self, event: Event) {
        self.events.lock().unwrap().insert(event.id, event);
    }

    pub fn add_attendee(&self, event_id: i32, person_id: &str) {
        self.attendees.lock().unwrap().push(EventAttendee {
            event_id,
            person_id: person_id.to_string(),
        });
    }

    pub fn add_scan(&self, scan: Scan) {
        self.scans.lock().unwrap().insert(scan.id.clone(), scan);
    }

    pub fn scan_count(&self) -> usize {
        self.scans.lock().unwrap().len()
    }
}

#[async_trait]
impl PersonRepositoryTrait for MemoryStore {
    fn get_person(&self, person_id: &str) -> Result<Option<Person>> {
        Ok(self.people.lock().unwrap().get(person_id).cloned())
    }

    fn get_people_by_ids(&self, ids: &[String]) -> Result<Vec<Person>> {
        let people = self.people.lock().unwrap();
        Ok(ids.iter().filter_map(|id| people.get(id).cloned()).collect())
    }

    fn count_people(&self) -> Result<i64> {
        Ok(self.people.lock().unwrap().len() as i64)
    }

    async fn bulk_load(&self, people: Vec<Person>) -> Result<usize> {
        let count = people.len();
        let mut map = self.people.lock().unwrap();
        for person in people {
            map.insert(person.id.clone(), person);
        }
        Ok(count)
    }
}

#[async_trait]
impl EventRepositoryTrait for MemoryStore {
    fn get_event(&self, event_id: i32) -> Result<Option<Event>> {
        Ok(self.events.lock().unwrap().get(&event_id).cloned())
    }

    fn list_events(&self) -> Result<Vec<Event>> {
        Ok(self.events.lock().unwrap().values().cloned().collect())
    }

    fn count_events(&self) -> Result<i64> {
        Ok(self.events.lock().unwrap().len() as i64)
    }

    async fn bulk_load(&self, events: Vec<Event>) -> Result<usize> {
        let count = events.len();
        let mut map = self.events.lock().unwrap();
        for event in events {
            map.insert(event.id, event);
        }
        Ok(count)
    }
}

#[async_trait]
impl EventAttendeeRepositoryTrait for MemoryStore {
    fn is_invited(&self, event_id: i32, person_id: &str) -> Result<bool> {
        Ok(self
            .attendees
            .lock()
            .unwrap()
            .iter()
            .any(|link| link.event_id == event_id && link.person_id == person_id))
    }

    fn list_for_event(&self, event_id: i32) -> Result<Vec<EventAttendee>> {
        Ok(self
            .attendees
            .lock()
            .unwrap()
            .iter()
            .filter(|link| link.event_id == event_id)
            .cloned()
            .collect())
    }

    fn count_attendees(&self) -> Result<i64> {
        Ok(self.attendees.lock().unwrap().len() as i64)
    }

    async fn bulk_load(&self, attendees: Vec<EventAttendee>) -> Result<usize> {
        let count = attendees.len();
        self.attendees.lock().unwrap().extend(attendees);
        Ok(count)
    }
}

#[async_trait]
impl ScanRepositoryTrait for MemoryStore {
    fn get_scan(&self, scan_id: &str) -> Result<Option<Scan>> {
        Ok(self.scans.lock().unwrap().get(scan_id).cloned())
    }

    fn get_scans_by_ids(&self, ids: &[String]) -> Result<Vec<Scan>> {
        let scans = self.scans.lock().unwrap();
        Ok(ids.iter().filter_map(|id| scans.get(id).cloned()).collect())
    }

    fn list_for_event(&self, event_id: i32) -> Result<Vec<Scan>> {
        Ok(self
            .scans
            .lock()
            .unwrap()
            .values()
            .filter(|scan| scan.event_id == event_id)
            .cloned()
            .collect())
    }

    fn list_pending(&self) -> Result<Vec<Scan>> {
        let mut pending: Vec<Scan> = self
            .scans
            .lock()
            .unwrap()
            .values()
            .filter(|scan| !scan.uploaded)
            .cloned()
            .collect();
        pending.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(pending)
    }

    fn count_pending_local(&self) -> Result<i64> {
        Ok(self
            .scans
            .lock()
            .unwrap()
            .values()
            .filter(|scan| !scan.uploaded && scan.is_local)
            .count() as i64)
    }

    fn recent_local_scans(&self, event_id: i32, limit: i64) -> Result<Vec<Scan>> {
        let mut recent: Vec<Scan> = self
            .scans
            .lock()
            .unwrap()
            .values()
            .filter(|scan| {
                scan.event_id == event_id
                    && scan.is_local
                    && scan.method == crate::scans::ScanMethod::Scan
            })
            .cloned()
            .collect();
        recent.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        recent.truncate(limit as usize);
        Ok(recent)
    }

    async fn upsert(&self, scan: Scan) -> Result<()> {
        self.scans.lock().unwrap().insert(scan.id.clone(), scan);
        Ok(())
    }

    async fn insert_unless_duplicate(&self, scan: Scan, window_ms: i64) -> Result<ScanWrite> {
        let mut scans = self.scans.lock().unwrap();
        let cutoff = scan.timestamp - window_ms;
        let duplicate = scans.values().any(|existing| {
            existing.event_id == scan.event_id
                && existing.person_id == scan.person_id
                && existing.timestamp > cutoff
        });
        if duplicate {
            return Ok(ScanWrite::DuplicateSuppressed);
        }
        scans.insert(scan.id.clone(), scan.clone());
        Ok(ScanWrite::Inserted(scan))
    }
}

#[async_trait]
impl SyncRepositoryTrait for MemoryStore {
    fn last_sync(&self, event_id: i32) -> Result<String> {
        Ok(self
            .watermarks
            .lock()
            .unwrap()
            .get(&event_id)
            .cloned()
            .unwrap_or_else(|| EPOCH_WATERMARK.to_string()))
    }

    fn engine_status(&self) -> Result<SyncEngineStatus> {
        Ok(self.engine_state.lock().unwrap().clone())
    }

    async fn apply_sync_success(
        &self,
        event_id: i32,
        pushed_ids: Vec<String>,
        updates: Vec<ScanRecord>,
        server_time: String,
    ) -> Result<usize> {
        let mut scans = self.scans.lock().unwrap();
        for id in &pushed_ids {
            if let Some(scan) = scans.get_mut(id) {
                scan.uploaded = true;
            }
        }

        let mut adopted = 0;
        for update in updates {
            match scans.get_mut(&update.id) {
                Some(existing) => {
                    existing.event_id = update.event_id;
                    existing.person_id = update.person_id;
                    existing.timestamp = update.timestamp;
                    existing.method = update.method;
                    existing.uploaded = true;
                }
                None => {
                    let scan = update.into_remote_scan();
                    scans.insert(scan.id.clone(), scan);
                    adopted += 1;
                }
            }
        }

        self.watermarks.lock().unwrap().insert(event_id, server_time);
        Ok(adopted)
    }

    async fn mark_cycle_outcome(
        &self,
        status: String,
        duration_ms: i64,
        error: Option<String>,
    ) -> Result<()> {
        let mut state = self.engine_state.lock().unwrap();
        let now = Utc::now();
        match error {
            Some(message) => {
                state.consecutive_failures += 1;
                state.next_retry_at = Some(
                    (now + Duration::seconds(backoff_seconds(state.consecutive_failures)))
                        .to_rfc3339(),
                );
                state.last_error = Some(message);
            }
            None => {
                state.consecutive_failures = 0;
                state.next_retry_at = None;
                state.last_error = None;
                state.last_push_at = Some(now.to_rfc3339());
                state.last_pull_at = Some(now.to_rfc3339());
            }
        }
        state.last_cycle_status = Some(status);
        state.last_cycle_duration_ms = Some(duration_ms);
        Ok(())
    }
}
