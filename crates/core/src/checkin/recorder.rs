//! The scan recorder: validates a badge read against local reference data and
//! commits a scan row.

use std::sync::Arc;

use log::{debug, info};

use crate::errors::{Result, ValidationError};
use crate::events::{EventAttendeeRepositoryTrait, EventRepositoryTrait};
use crate::people::PersonRepositoryTrait;
use crate::scans::{Scan, ScanMethod, ScanRepositoryTrait, ScanWrite};

use super::badge::{is_canonical_badge_id, BadgePayload};

/// Rolling window that absorbs rapid repeated reads of the same badge by the
/// scanning hardware. A heuristic, not a uniqueness guarantee.
pub const DUPLICATE_SCAN_WINDOW_MS: i64 = 5_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckInOutcome {
    Recorded {
        scan: Scan,
        /// The attendee's display name, for confirmation feedback.
        display_name: String,
    },
    /// The badge was re-read inside the duplicate window; silently dropped.
    DuplicateIgnored,
}

pub struct ScanRecorder {
    people: Arc<dyn PersonRepositoryTrait>,
    events: Arc<dyn EventRepositoryTrait>,
    attendees: Arc<dyn EventAttendeeRepositoryTrait>,
    scans: Arc<dyn ScanRepositoryTrait>,
}

impl ScanRecorder {
    pub fn new(
        people: Arc<dyn PersonRepositoryTrait>,
        events: Arc<dyn EventRepositoryTrait>,
        attendees: Arc<dyn EventAttendeeRepositoryTrait>,
        scans: Arc<dyn ScanRepositoryTrait>,
    ) -> Self {
        Self {
            people,
            events,
            attendees,
            scans,
        }
    }

    /// Runs the full validation pipeline for a decoded QR payload and commits
    /// a `method = scan` row. Each stage short-circuits with its own
    /// user-facing error.
    pub async fn record_badge_scan(
        &self,
        event_id: i32,
        decoded_text: &str,
    ) -> Result<CheckInOutcome> {
        let badge = BadgePayload::parse(decoded_text);

        if !is_canonical_badge_id(&badge.person_id) {
            return Err(ValidationError::OutdatedBadge.into());
        }

        if let Some(event) = self.events.get_event(event_id)? {
            if let Some(sprint) = event.sprint.as_deref() {
                if badge.sprint_tag != sprint {
                    return Err(ValidationError::WrongSprint(badge.sprint_tag).into());
                }
            }
        }

        let person = self
            .people
            .get_person(&badge.person_id)?
            .ok_or(ValidationError::AttendeeNotFound)?;

        if !self.attendees.is_invited(event_id, &person.id)? {
            return Err(ValidationError::NotInvited(person.first_name.clone()).into());
        }

        let scan = Scan::new_local(event_id, person.id.clone(), ScanMethod::Scan);
        match self
            .scans
            .insert_unless_duplicate(scan, DUPLICATE_SCAN_WINDOW_MS)
            .await?
        {
            ScanWrite::Inserted(scan) => {
                info!(
                    "Checked in {} for event {} (scan {})",
                    person.display_name(),
                    event_id,
                    scan.id
                );
                Ok(CheckInOutcome::Recorded {
                    scan,
                    display_name: person.display_name(),
                })
            }
            ScanWrite::DuplicateSuppressed => {
                debug!(
                    "Suppressed duplicate read of {} for event {}",
                    person.id, event_id
                );
                Ok(CheckInOutcome::DuplicateIgnored)
            }
        }
    }

    /// Operator-confirmed check-in. Skips the badge format and sprint gates
    /// and the duplicate window, but the person must still be known and on
    /// the guest list. Always commits with `method = manual`.
    pub async fn record_manual_check_in(
        &self,
        event_id: i32,
        person_id: &str,
    ) -> Result<CheckInOutcome> {
        let person = self
            .people
            .get_person(person_id)?
            .ok_or(ValidationError::AttendeeNotFound)?;

        if !self.attendees.is_invited(event_id, &person.id)? {
            return Err(ValidationError::NotInvited(person.first_name.clone()).into());
        }

        let scan = Scan::new_local(event_id, person.id.clone(), ScanMethod::Manual);
        self.scans.upsert(scan.clone()).await?;
        info!(
            "Manually checked in {} for event {}",
            person.display_name(),
            event_id
        );
        Ok(CheckInOutcome::Recorded {
            scan,
            display_name: person.display_name(),
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::errors::Error;
    use crate::test_support::{sample_event, sample_person, MemoryStore};

    fn recorder(store: &Arc<MemoryStore>) -> ScanRecorder {
        ScanRecorder::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
        )
    }

    fn seeded_store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::default());
        store.add_person(sample_person(
            "123e4567-e89b-12d3-a456-426614174000",
            "Ada",
            "Lovelace",
        ));
        store.add_event(sample_event(7, Some("falcon")));
        store.add_attendee(7, "123e4567-e89b-12d3-a456-426614174000");
        store
    }

    #[tokio::test]
    async fn valid_badge_records_a_scan() {
        let store = seeded_store();
        let outcome = recorder(&store)
            .record_badge_scan(7, "123e4567-e89b-12d3-a456-426614174000|HQ|falcon")
            .await
            .unwrap();

        match outcome {
            CheckInOutcome::Recorded { scan, display_name } => {
                assert_eq!(display_name, "Ada Lovelace");
                assert_eq!(scan.event_id, 7);
                assert_eq!(scan.method, ScanMethod::Scan);
                assert!(scan.is_local);
                assert!(!scan.uploaded);
            }
            CheckInOutcome::DuplicateIgnored => panic!("expected a recorded scan"),
        }
        assert_eq!(store.scan_count(), 1);
    }

    #[tokio::test]
    async fn malformed_badge_is_rejected_as_outdated() {
        let store = seeded_store();
        let err = recorder(&store)
            .record_badge_scan(7, "EMP-004211|HQ|falcon")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::OutdatedBadge)
        ));
        assert_eq!(store.scan_count(), 0);
    }

    #[tokio::test]
    async fn sprint_mismatch_names_the_badge_sprint() {
        let store = seeded_store();
        let err = recorder(&store)
            .record_badge_scan(7, "123e4567-e89b-12d3-a456-426614174000|HQ|heron")
            .await
            .unwrap_err();
        match err {
            Error::Validation(ValidationError::WrongSprint(sprint)) => {
                assert_eq!(sprint, "heron");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn sprint_gate_is_skipped_for_events_without_sprint() {
        let store = Arc::new(MemoryStore::default());
        store.add_person(sample_person(
            "123e4567-e89b-12d3-a456-426614174000",
            "Ada",
            "Lovelace",
        ));
        store.add_event(sample_event(9, None));
        store.add_attendee(9, "123e4567-e89b-12d3-a456-426614174000");

        let outcome = recorder(&store)
            .record_badge_scan(9, "123e4567-e89b-12d3-a456-426614174000|HQ|whatever")
            .await
            .unwrap();
        assert!(matches!(outcome, CheckInOutcome::Recorded { .. }));
    }

    #[tokio::test]
    async fn unknown_person_is_rejected() {
        let store = seeded_store();
        let err = recorder(&store)
            .record_badge_scan(7, "00000000-0000-4000-8000-000000000000|HQ|falcon")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::AttendeeNotFound)
        ));
    }

    #[tokio::test]
    async fn uninvited_person_is_rejected_regardless_of_history() {
        let store = seeded_store();
        store.add_person(sample_person(
            "99999999-9999-4999-8999-999999999999",
            "Grace",
            "Hopper",
        ));

        let err = recorder(&store)
            .record_badge_scan(7, "99999999-9999-4999-8999-999999999999|HQ|falcon")
            .await
            .unwrap_err();
        match err {
            Error::Validation(ValidationError::NotInvited(name)) => assert_eq!(name, "Grace"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn rapid_rescan_is_silently_ignored() {
        let store = seeded_store();
        let recorder = recorder(&store);
        let payload = "123e4567-e89b-12d3-a456-426614174000|HQ|falcon";

        let first = recorder.record_badge_scan(7, payload).await.unwrap();
        assert!(matches!(first, CheckInOutcome::Recorded { .. }));

        let second = recorder.record_badge_scan(7, payload).await.unwrap();
        assert_eq!(second, CheckInOutcome::DuplicateIgnored);
        assert_eq!(store.scan_count(), 1);
    }

    #[tokio::test]
    async fn manual_check_in_skips_badge_gates() {
        let store = seeded_store();
        let outcome = recorder(&store)
            .record_manual_check_in(7, "123e4567-e89b-12d3-a456-426614174000")
            .await
            .unwrap();

        match outcome {
            CheckInOutcome::Recorded { scan, .. } => {
                assert_eq!(scan.method, ScanMethod::Manual);
                assert!(!scan.uploaded);
            }
            CheckInOutcome::DuplicateIgnored => panic!("manual check-in has no dedupe window"),
        }
    }

    #[tokio::test]
    async fn manual_check_in_still_requires_invitation() {
        let store = seeded_store();
        store.add_person(sample_person(
            "99999999-9999-4999-8999-999999999999",
            "Grace",
            "Hopper",
        ));

        let err = recorder(&store)
            .record_manual_check_in(7, "99999999-9999-4999-8999-999999999999")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::NotInvited(_))
        ));
    }
}
