//! In-process implementations of the core boundary traits, for embedded
//! deployments and cross-crate tests that do not want an HTTP hop.

use async_trait::async_trait;

use turnstile_core::events::{Event, EventAttendee};
use turnstile_core::people::Person;
use turnstile_core::sync::{SeedSource, SyncRequest, SyncResponse, SyncTransport};
use turnstile_core::Result;

use crate::store::CentralStore;

#[async_trait]
impl SyncTransport for CentralStore {
    async fn sync_scans(&self, request: SyncRequest) -> Result<SyncResponse> {
        self.sync_batch(&request)
    }
}

#[async_trait]
impl SeedSource for CentralStore {
    async fn fetch_people(&self) -> Result<Vec<Person>> {
        self.list_people()
    }

    async fn fetch_events(&self) -> Result<Vec<Event>> {
        self.list_events()
    }

    async fn fetch_event_attendees(&self) -> Result<Vec<EventAttendee>> {
        self.list_event_attendees()
    }
}
