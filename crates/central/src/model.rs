//! Database models for the authoritative store.

use chrono::NaiveDate;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use turnstile_core::events::{Event, EventAttendee};
use turnstile_core::people::Person;
use turnstile_core::scans::ScanMethod;
use turnstile_core::sync::ScanRecord;
use turnstile_core::Result;

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
#[diesel(table_name = crate::schema::people)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CentralPersonDB {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub direct_manager: String,
    pub email: String,
}

impl From<CentralPersonDB> for Person {
    fn from(db: CentralPersonDB) -> Self {
        Person {
            id: db.id,
            first_name: db.first_name,
            last_name: db.last_name,
            direct_manager: db.direct_manager,
            email: db.email,
        }
    }
}

impl From<Person> for CentralPersonDB {
    fn from(person: Person) -> Self {
        CentralPersonDB {
            id: person.id,
            first_name: person.first_name,
            last_name: person.last_name,
            direct_manager: person.direct_manager,
            email: person.email,
        }
    }
}

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
pub struct CentralEventDB {
    pub id: i32,
    pub location: String,
    pub sprint: Option<String>,
    pub date: NaiveDate,
    pub session: String,
}

impl From<CentralEventDB> for Event {
    fn from(db: CentralEventDB) -> Self {
        Event {
            id: db.id,
            location: db.location,
            sprint: db.sprint,
            date: db.date,
            session: db.session,
        }
    }
}

impl From<Event> for CentralEventDB {
    fn from(event: Event) -> Self {
        CentralEventDB {
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
pub struct CentralAttendeeDB {
    pub id: i32,
    pub event_id: i32,
    pub person_id: String,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::event_attendees)]
pub struct NewCentralAttendeeDB {
    pub event_id: i32,
    pub person_id: String,
}

impl From<CentralAttendeeDB> for EventAttendee {
    fn from(db: CentralAttendeeDB) -> Self {
        EventAttendee {
            event_id: db.event_id,
            person_id: db.person_id,
        }
    }
}

impl From<EventAttendee> for NewCentralAttendeeDB {
    fn from(attendee: EventAttendee) -> Self {
        NewCentralAttendeeDB {
            event_id: attendee.event_id,
            person_id: attendee.person_id,
        }
    }
}

/// One accepted scan row. `received_at` is the server receipt stamp, the
/// ordering key for the pull delta; the client `timestamp` is payload only.
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
#[diesel(table_name = crate::schema::scans)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CentralScanDB {
    pub id: String,
    pub event_id: i32,
    pub person_id: String,
    pub timestamp: i64,
    pub method: String,
    pub received_at: String,
}

impl CentralScanDB {
    pub fn from_record(record: ScanRecord, received_at: String) -> Self {
        CentralScanDB {
            id: record.id,
            event_id: record.event_id,
            person_id: record.person_id,
            timestamp: record.timestamp,
            method: record.method.as_str().to_string(),
            received_at,
        }
    }

    pub fn into_record(self) -> Result<ScanRecord> {
        Ok(ScanRecord {
            id: self.id,
            event_id: self.event_id,
            person_id: self.person_id,
            timestamp: self.timestamp,
            method: ScanMethod::parse(&self.method)?,
        })
    }
}
