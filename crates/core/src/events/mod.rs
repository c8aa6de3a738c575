//! Event and guest-list reference data.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Server-assigned identifier; the scanning client never creates events.
    pub id: i32,
    pub location: String,
    /// Cohort label printed on badges. Events without one skip the sprint gate.
    pub sprint: Option<String>,
    pub date: NaiveDate,
    pub session: String,
}

/// "Person is expected at Event" link, unique per pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventAttendee {
    pub event_id: i32,
    pub person_id: String,
}

#[async_trait]
pub trait EventRepositoryTrait: Send + Sync {
    fn get_event(&self, event_id: i32) -> Result<Option<Event>>;

    fn list_events(&self) -> Result<Vec<Event>>;

    fn count_events(&self) -> Result<i64>;

    async fn bulk_load(&self, events: Vec<Event>) -> Result<usize>;
}

#[async_trait]
pub trait EventAttendeeRepositoryTrait: Send + Sync {
    fn is_invited(&self, event_id: i32, person_id: &str) -> Result<bool>;

    fn list_for_event(&self, event_id: i32) -> Result<Vec<EventAttendee>>;

    fn count_attendees(&self) -> Result<i64>;

    async fn bulk_load(&self, attendees: Vec<EventAttendee>) -> Result<usize>;
}
