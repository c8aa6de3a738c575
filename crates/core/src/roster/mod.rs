//! Read-only roster queries composed from the repositories: who is expected,
//! who has arrived, who is still missing.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::events::EventAttendeeRepositoryTrait;
use crate::people::{Person, PersonRepositoryTrait};
use crate::scans::{Scan, ScanMethod, ScanRepositoryTrait};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantStatus {
    pub person: Person,
    pub checked_in: bool,
    pub check_in_time: Option<i64>,
    pub check_in_method: Option<ScanMethod>,
}

/// A recent device-local check-in with the name resolved for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentCheckIn {
    pub scan: Scan,
    pub display_name: String,
}

pub struct RosterService {
    people: Arc<dyn PersonRepositoryTrait>,
    attendees: Arc<dyn EventAttendeeRepositoryTrait>,
    scans: Arc<dyn ScanRepositoryTrait>,
}

impl RosterService {
    pub fn new(
        people: Arc<dyn PersonRepositoryTrait>,
        attendees: Arc<dyn EventAttendeeRepositoryTrait>,
        scans: Arc<dyn ScanRepositoryTrait>,
    ) -> Self {
        Self {
            people,
            attendees,
            scans,
        }
    }

    /// Every expected person for the event with their check-in status.
    /// When the same person was scanned more than once the earliest scan is
    /// reported as "the" check-in.
    pub fn event_roster(
        &self,
        event_id: i32,
        filter: Option<&str>,
    ) -> Result<Vec<ParticipantStatus>> {
        let links = self.attendees.list_for_event(event_id)?;
        let person_ids: Vec<String> = links.into_iter().map(|link| link.person_id).collect();
        let people = self.people.get_people_by_ids(&person_ids)?;

        let mut first_scan: HashMap<String, Scan> = HashMap::new();
        for scan in self.scans.list_for_event(event_id)? {
            match first_scan.get(&scan.person_id) {
                Some(existing) if existing.timestamp <= scan.timestamp => {}
                _ => {
                    first_scan.insert(scan.person_id.clone(), scan);
                }
            }
        }

        let mut roster: Vec<ParticipantStatus> = people
            .into_iter()
            .filter(|person| filter.map_or(true, |term| person.matches_filter(term)))
            .map(|person| {
                let scan = first_scan.get(&person.id);
                ParticipantStatus {
                    checked_in: scan.is_some(),
                    check_in_time: scan.map(|s| s.timestamp),
                    check_in_method: scan.map(|s| s.method),
                    person,
                }
            })
            .collect();
        roster.sort_by(|a, b| a.person.last_name.cmp(&b.person.last_name));
        Ok(roster)
    }

    /// Expected attendees without any scan row for the event.
    pub fn missing_attendees(&self, event_id: i32, filter: Option<&str>) -> Result<Vec<Person>> {
        Ok(self
            .event_roster(event_id, filter)?
            .into_iter()
            .filter(|status| !status.checked_in)
            .map(|status| status.person)
            .collect())
    }

    pub fn missing_count(&self, event_id: i32) -> Result<usize> {
        Ok(self.missing_attendees(event_id, None)?.len())
    }

    /// The device's own latest badge scans, newest first, names resolved.
    pub fn recent_check_ins(&self, event_id: i32, limit: i64) -> Result<Vec<RecentCheckIn>> {
        let scans = self.scans.recent_local_scans(event_id, limit)?;
        let ids: Vec<String> = scans.iter().map(|scan| scan.person_id.clone()).collect();
        let names: HashMap<String, String> = self
            .people
            .get_people_by_ids(&ids)?
            .into_iter()
            .map(|person| (person.id.clone(), person.display_name()))
            .collect();

        Ok(scans
            .into_iter()
            .map(|scan| RecentCheckIn {
                display_name: names
                    .get(&scan.person_id)
                    .cloned()
                    .unwrap_or_else(|| "Unknown".to_string()),
                scan,
            })
            .collect())
    }

    /// Local scans still awaiting upload, for the pending indicator.
    pub fn pending_upload_count(&self) -> Result<i64> {
        self.scans.count_pending_local()
    }
}
