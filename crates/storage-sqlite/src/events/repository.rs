use std::sync::Arc;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;

use turnstile_core::events::{
    Event, EventAttendee, EventAttendeeRepositoryTrait, EventRepositoryTrait,
};
use turnstile_core::Result;

use super::model::{EventAttendeeDB, EventDB, NewEventAttendeeDB};
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::{event_attendees, events};

pub struct EventRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl EventRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        EventRepository { pool, writer }
    }
}

#[async_trait]
impl EventRepositoryTrait for EventRepository {
    fn get_event(&self, event_id: i32) -> Result<Option<Event>> {
        let mut conn = get_connection(&self.pool)?;
        let event_db = events::table
            .find(event_id)
            .first::<EventDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(event_db.map(Event::from))
    }

    fn list_events(&self) -> Result<Vec<Event>> {
        let mut conn = get_connection(&self.pool)?;
        let events_db = events::table
            .order(events::date.asc())
            .load::<EventDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(events_db.into_iter().map(Event::from).collect())
    }

    fn count_events(&self) -> Result<i64> {
        let mut conn = get_connection(&self.pool)?;
        events::table
            .count()
            .get_result(&mut conn)
            .map_err(|e| StorageError::from(e).into())
    }

    async fn bulk_load(&self, rows: Vec<Event>) -> Result<usize> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let loaded = conn.immediate_transaction::<_, StorageError, _>(|tx| {
                    let mut loaded = 0usize;
                    for event in rows {
                        let event_db = EventDB::from(event);
                        diesel::insert_into(events::table)
                            .values(&event_db)
                            .on_conflict(events::id)
                            .do_update()
                            .set(&event_db)
                            .execute(tx)?;
                        loaded += 1;
                    }
                    Ok(loaded)
                })?;
                Ok(loaded)
            })
            .await
    }
}

pub struct EventAttendeeRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl EventAttendeeRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        EventAttendeeRepository { pool, writer }
    }
}

#[async_trait]
impl EventAttendeeRepositoryTrait for EventAttendeeRepository {
    fn is_invited(&self, event_id: i32, person_id: &str) -> Result<bool> {
        let mut conn = get_connection(&self.pool)?;
        let found: i64 = event_attendees::table
            .filter(event_attendees::event_id.eq(event_id))
            .filter(event_attendees::person_id.eq(person_id))
            .count()
            .get_result(&mut conn)
            .map_err(StorageError::from)?;
        Ok(found > 0)
    }

    fn list_for_event(&self, event_id: i32) -> Result<Vec<EventAttendee>> {
        let mut conn = get_connection(&self.pool)?;
        let attendees_db = event_attendees::table
            .filter(event_attendees::event_id.eq(event_id))
            .load::<EventAttendeeDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(attendees_db.into_iter().map(EventAttendee::from).collect())
    }

    fn count_attendees(&self) -> Result<i64> {
        let mut conn = get_connection(&self.pool)?;
        event_attendees::table
            .count()
            .get_result(&mut conn)
            .map_err(|e| StorageError::from(e).into())
    }

    async fn bulk_load(&self, rows: Vec<EventAttendee>) -> Result<usize> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let loaded = conn.immediate_transaction::<_, StorageError, _>(|tx| {
                    let mut loaded = 0usize;
                    for attendee in rows {
                        // Re-seeding the same pair is a no-op, not an error.
                        diesel::insert_into(event_attendees::table)
                            .values(NewEventAttendeeDB::from(attendee))
                            .on_conflict((
                                event_attendees::event_id,
                                event_attendees::person_id,
                            ))
                            .do_nothing()
                            .execute(tx)?;
                        loaded += 1;
                    }
                    Ok(loaded)
                })?;
                Ok(loaded)
            })
            .await
    }
}
