use chrono::NaiveDate;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use turnstile_core::events::{Event, EventAttendee};

#[derive(
    Queryable,
    Identifiable,
    Insertable,
    AsChangeset,
    Selectable,
    Debug,
    Clone,
    Serialize,
    Deserialize,
)]
#[diesel(table_name = crate::schema::events)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct EventDB {
    pub id: i32,
    pub location: String,
    pub sprint: Option<String>,
    pub date: NaiveDate,
    pub session: String,
}

impl From<EventDB> for Event {
    fn from(db: EventDB) -> Self {
        Event {
            id: db.id,
            location: db.location,
            sprint: db.sprint,
            date: db.date,
            session: db.session,
        }
    }
}

impl From<Event> for EventDB {
    fn from(event: Event) -> Self {
        EventDB {
            id: event.id,
            location: event.location,
            sprint: event.sprint,
            date: event.date,
            session: event.session,
        }
    }
}

#[derive(Queryable, Identifiable, Selectable, Debug, Clone, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::event_attendees)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct EventAttendeeDB {
    pub id: i32,
    pub event_id: i32,
    pub person_id: String,
}

/// Insert form without the autoincrement id.
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::event_attendees)]
pub struct NewEventAttendeeDB {
    pub event_id: i32,
    pub person_id: String,
}

impl From<EventAttendeeDB> for EventAttendee {
    fn from(db: EventAttendeeDB) -> Self {
        EventAttendee {
            event_id: db.event_id,
            person_id: db.person_id,
        }
    }
}

impl From<EventAttendee> for NewEventAttendeeDB {
    fn from(attendee: EventAttendee) -> Self {
        NewEventAttendeeDB {
            event_id: attendee.event_id,
            person_id: attendee.person_id,
        }
    }
}
