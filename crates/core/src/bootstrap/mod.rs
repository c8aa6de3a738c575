//! One-time seeding of reference data from the central store.

use std::sync::Arc;

use log::info;
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::events::{EventAttendeeRepositoryTrait, EventRepositoryTrait};
use crate::people::PersonRepositoryTrait;
use crate::sync::SeedSource;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapSummary {
    pub people_loaded: usize,
    pub events_loaded: usize,
    pub attendees_loaded: usize,
}

pub struct BootstrapService {
    source: Arc<dyn SeedSource>,
    people: Arc<dyn PersonRepositoryTrait>,
    events: Arc<dyn EventRepositoryTrait>,
    attendees: Arc<dyn EventAttendeeRepositoryTrait>,
}

impl BootstrapService {
    pub fn new(
        source: Arc<dyn SeedSource>,
        people: Arc<dyn PersonRepositoryTrait>,
        events: Arc<dyn EventRepositoryTrait>,
        attendees: Arc<dyn EventAttendeeRepositoryTrait>,
    ) -> Self {
        Self {
            source,
            people,
            events,
            attendees,
        }
    }

    /// Seeds each empty reference table from the central store. Tables that
    /// already hold rows are skipped; each load is atomic, so a failed fetch
    /// or write leaves that table exactly as it was.
    pub async fn run(&self) -> Result<BootstrapSummary> {
        let mut summary = BootstrapSummary::default();

        if self.people.count_people()? == 0 {
            let people = self.source.fetch_people().await?;
            summary.people_loaded = self.people.bulk_load(people).await?;
            info!("Seeded {} people", summary.people_loaded);
        }

        if self.events.count_events()? == 0 {
            let events = self.source.fetch_events().await?;
            summary.events_loaded = self.events.bulk_load(events).await?;
            info!("Seeded {} events", summary.events_loaded);
        }

        if self.attendees.count_attendees()? == 0 {
            let attendees = self.source.fetch_event_attendees().await?;
            summary.attendees_loaded = self.attendees.bulk_load(attendees).await?;
            info!("Seeded {} attendee links", summary.attendees_loaded);
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::events::{Event, EventAttendee};
    use crate::people::Person;
    use crate::test_support::{sample_event, sample_person, MemoryStore};
    use async_trait::async_trait;

    struct StaticSeed;

    #[async_trait]
    impl SeedSource for StaticSeed {
        async fn fetch_people(&self) -> Result<Vec<Person>> {
            Ok(vec![
                sample_person("123e4567-e89b-12d3-a456-426614174000", "Ada", "Lovelace"),
                sample_person("99999999-9999-4999-8999-999999999999", "Grace", "Hopper"),
            ])
        }

        async fn fetch_events(&self) -> Result<Vec<Event>> {
            Ok(vec![sample_event(1, Some("falcon"))])
        }

        async fn fetch_event_attendees(&self) -> Result<Vec<EventAttendee>> {
            Ok(vec![EventAttendee {
                event_id: 1,
                person_id: "123e4567-e89b-12d3-a456-426614174000".to_string(),
            }])
        }
    }

    #[tokio::test]
    async fn seeds_empty_tables_and_skips_populated_ones() {
        let store = Arc::new(MemoryStore::default());
        let service = BootstrapService::new(
            Arc::new(StaticSeed),
            store.clone(),
            store.clone(),
            store.clone(),
        );

        let summary = service.run().await.unwrap();
        assert_eq!(summary.people_loaded, 2);
        assert_eq!(summary.events_loaded, 1);
        assert_eq!(summary.attendees_loaded, 1);

        // A second run finds every table populated and loads nothing.
        let summary = service.run().await.unwrap();
        assert_eq!(summary, BootstrapSummary::default());
    }
}
