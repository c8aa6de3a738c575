//! Boundary traits for the central store.
//!
//! The HTTP transport lives in the device-sync crate; the central crate
//! provides in-process implementations for embedded use and tests.

use async_trait::async_trait;

use crate::errors::Result;
use crate::events::{Event, EventAttendee};
use crate::people::Person;

use super::model::{SyncRequest, SyncResponse};

/// The batch sync endpoint (`POST scans/sync`): idempotent upsert of the
/// pushed scans plus the delta past the supplied watermark, in one call.
#[async_trait]
pub trait SyncTransport: Send + Sync {
    async fn sync_scans(&self, request: SyncRequest) -> Result<SyncResponse>;
}

/// Bootstrap reads, consumed once per entity while the local table is empty.
#[async_trait]
pub trait SeedSource: Send + Sync {
    async fn fetch_people(&self) -> Result<Vec<Person>>;

    async fn fetch_events(&self) -> Result<Vec<Event>>;

    async fn fetch_event_attendees(&self) -> Result<Vec<EventAttendee>>;
}
