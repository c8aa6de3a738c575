//! Wire DTOs for the central store REST API. All bodies are snake_case.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use turnstile_core::events::{Event, EventAttendee};
use turnstile_core::people::Person;

/// Error body the central store attaches to non-2xx responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonRow {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub direct_manager: String,
    pub email: String,
}

impl From<PersonRow> for Person {
    fn from(row: PersonRow) -> Self {
        Person {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            direct_manager: row.direct_manager,
            email: row.email,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRow {
    pub id: i32,
    pub location: String,
    pub sprint: Option<String>,
    pub date: NaiveDate,
    pub session: String,
}

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        Event {
            id: row.id,
            location: row.location,
            sprint: row.sprint,
            date: row.date,
            session: row.session,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventAttendeeRow {
    pub event_id: i32,
    pub person_id: String,
}

impl From<EventAttendeeRow> for EventAttendee {
    fn from(row: EventAttendeeRow) -> Self {
        EventAttendee {
            event_id: row.event_id,
            person_id: row.person_id,
        }
    }
}
