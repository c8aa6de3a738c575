//! The authoritative relational store and its sync contract.

use std::sync::Arc;

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool, PooledConnection};
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use log::debug;

use turnstile_core::events::{Event, EventAttendee};
use turnstile_core::people::Person;
use turnstile_core::sync::{ScanRecord, SyncRequest, SyncResponse};
use turnstile_core::Result;

use crate::errors::CentralError;
use crate::model::{
    CentralAttendeeDB, CentralEventDB, CentralPersonDB, CentralScanDB, NewCentralAttendeeDB,
};
use crate::schema::{event_attendees, events, people, scans, sync_clock};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

type DbPool = Pool<ConnectionManager<SqliteConnection>>;
type DbConnection = PooledConnection<ConnectionManager<SqliteConnection>>;

#[derive(Debug, Clone, Copy)]
struct ConnectionPragmas;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionPragmas {
    fn on_acquire(
        &self,
        conn: &mut SqliteConnection,
    ) -> std::result::Result<(), diesel::r2d2::Error> {
        conn.batch_execute(
            "PRAGMA journal_mode = WAL; PRAGMA busy_timeout = 5000; PRAGMA foreign_keys = ON;",
        )
        .map_err(diesel::r2d2::Error::QueryError)
    }
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn bump_millis(stamp: &str) -> std::result::Result<String, CentralError> {
    let parsed = DateTime::parse_from_rfc3339(stamp)
        .map_err(|e| CentralError::Clock(format!("Unreadable clock value '{}': {}", stamp, e)))?;
    Ok((parsed.with_timezone(&Utc) + Duration::milliseconds(1))
        .to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Authoritative store shared by every scanning device.
///
/// Contract: scans are upserted by their client-generated id (duplicates are
/// no-ops, never errors), ordered for pull purposes by server receipt time,
/// and the pull delta is everything received after the caller's watermark.
#[derive(Clone)]
pub struct CentralStore {
    pool: Arc<DbPool>,
}

impl CentralStore {
    pub fn new(database_url: &str) -> Result<Self> {
        let manager = ConnectionManager::<SqliteConnection>::new(database_url);
        let pool = Pool::builder()
            .max_size(4)
            .connection_customizer(Box::new(ConnectionPragmas))
            .build(manager)
            .map_err(CentralError::from)?;

        let mut conn = pool.get().map_err(CentralError::from)?;
        conn.run_pending_migrations(MIGRATIONS)
            .map(|_| ())
            .map_err(|e| CentralError::Migration(e.to_string()))?;

        Ok(CentralStore {
            pool: Arc::new(pool),
        })
    }

    fn conn(&self) -> Result<DbConnection> {
        self.pool.get().map_err(|e| CentralError::Pool(e).into())
    }

    // Seed writers, used by upstream import jobs and test fixtures.

    pub fn seed_people(&self, rows: Vec<Person>) -> Result<usize> {
        let mut conn = self.conn()?;
        let count = conn.immediate_transaction::<_, CentralError, _>(|tx| {
            let mut count = 0usize;
            for person in rows {
                let row = CentralPersonDB::from(person);
                diesel::insert_into(people::table)
                    .values(&row)
                    .on_conflict(people::id)
                    .do_update()
                    .set(&row)
                    .execute(tx)?;
                count += 1;
            }
            Ok(count)
        })?;
        Ok(count)
    }

    pub fn seed_events(&self, rows: Vec<Event>) -> Result<usize> {
        let mut conn = self.conn()?;
        let count = conn.immediate_transaction::<_, CentralError, _>(|tx| {
            let mut count = 0usize;
            for event in rows {
                let row = CentralEventDB::from(event);
                diesel::insert_into(events::table)
                    .values(&row)
                    .on_conflict(events::id)
                    .do_update()
                    .set(&row)
                    .execute(tx)?;
                count += 1;
            }
            Ok(count)
        })?;
        Ok(count)
    }

    pub fn seed_attendees(&self, rows: Vec<EventAttendee>) -> Result<usize> {
        let mut conn = self.conn()?;
        let count = conn.immediate_transaction::<_, CentralError, _>(|tx| {
            let mut count = 0usize;
            for attendee in rows {
                diesel::insert_into(event_attendees::table)
                    .values(NewCentralAttendeeDB::from(attendee))
                    .on_conflict((event_attendees::event_id, event_attendees::person_id))
                    .do_nothing()
                    .execute(tx)?;
                count += 1;
            }
            Ok(count)
        })?;
        Ok(count)
    }

    // Bootstrap reads.

    pub fn list_people(&self) -> Result<Vec<Person>> {
        let mut conn = self.conn()?;
        let rows = people::table
            .load::<CentralPersonDB>(&mut conn)
            .map_err(CentralError::from)?;
        Ok(rows.into_iter().map(Person::from).collect())
    }

    pub fn list_events(&self) -> Result<Vec<Event>> {
        let mut conn = self.conn()?;
        let rows = events::table
            .load::<CentralEventDB>(&mut conn)
            .map_err(CentralError::from)?;
        Ok(rows.into_iter().map(Event::from).collect())
    }

    pub fn list_event_attendees(&self) -> Result<Vec<EventAttendee>> {
        let mut conn = self.conn()?;
        let rows = event_attendees::table
            .load::<CentralAttendeeDB>(&mut conn)
            .map_err(CentralError::from)?;
        Ok(rows.into_iter().map(EventAttendee::from).collect())
    }

    pub fn scan_count(&self) -> Result<i64> {
        let mut conn = self.conn()?;
        scans::table
            .count()
            .get_result(&mut conn)
            .map_err(|e| CentralError::from(e).into())
    }

    // Scan ingestion.

    /// Issues the next server timestamp. Must run inside the write
    /// transaction: the stamp is strictly greater than every stamp issued
    /// before it, even within the same wall-clock millisecond, so a row
    /// committed after a pull can never sit at or behind that pull's
    /// `server_time`.
    fn next_server_time(tx: &mut SqliteConnection) -> std::result::Result<String, CentralError> {
        let last: String = sync_clock::table
            .find(1)
            .select(sync_clock::last_issued)
            .first(tx)?;
        let now = now_rfc3339();
        let issued = if now > last { now } else { bump_millis(&last)? };
        diesel::update(sync_clock::table.find(1))
            .set(sync_clock::last_issued.eq(&issued))
            .execute(tx)?;
        Ok(issued)
    }

    fn validate_record(
        tx: &mut SqliteConnection,
        record: &ScanRecord,
    ) -> std::result::Result<(), CentralError> {
        if record.id.is_empty() || record.person_id.is_empty() {
            return Err(CentralError::InvalidScan(
                "Missing required fields: id, person_id".to_string(),
            ));
        }
        let event_known: i64 = events::table
            .filter(events::id.eq(record.event_id))
            .count()
            .get_result(tx)?;
        if event_known == 0 {
            return Err(CentralError::InvalidScan(format!(
                "Unknown event {}",
                record.event_id
            )));
        }
        let person_known: i64 = people::table
            .filter(people::id.eq(&record.person_id))
            .count()
            .get_result(tx)?;
        if person_known == 0 {
            return Err(CentralError::InvalidScan(format!(
                "Unknown person {}",
                record.person_id
            )));
        }
        Ok(())
    }

    fn upsert_records(
        tx: &mut SqliteConnection,
        records: &[ScanRecord],
        received_at: &str,
    ) -> std::result::Result<usize, CentralError> {
        for record in records {
            Self::validate_record(tx, record)?;
        }
        let mut inserted = 0usize;
        for record in records {
            // Replays of an already-stored id keep the original row, so a
            // re-pushed batch can never duplicate or reorder history.
            inserted += diesel::insert_into(scans::table)
                .values(CentralScanDB::from_record(
                    record.clone(),
                    received_at.to_string(),
                ))
                .on_conflict(scans::id)
                .do_nothing()
                .execute(tx)?;
        }
        Ok(inserted)
    }

    /// Idempotent batch upsert keyed by client-generated scan id. Rejects the
    /// whole batch before writing anything if any row references an unknown
    /// event or person.
    pub fn upsert_scans(&self, records: &[ScanRecord]) -> Result<usize> {
        let mut conn = self.conn()?;
        let inserted = conn.immediate_transaction::<_, CentralError, _>(|tx| {
            let received_at = Self::next_server_time(tx)?;
            Self::upsert_records(tx, records, &received_at)
        })?;
        Ok(inserted)
    }

    /// Everything received for `event_id` after `watermark`, plus the server
    /// time the caller should adopt as its next watermark.
    pub fn delta_since(&self, event_id: i32, watermark: &str) -> Result<SyncResponse> {
        let mut conn = self.conn()?;
        let watermark = watermark.to_string();
        let (rows, server_time) = conn.immediate_transaction::<_, CentralError, _>(|tx| {
            // Issued under the write lock: every stored row is stamped
            // strictly before `server_time` and every later write strictly
            // after it, so nothing can fall behind the returned watermark.
            let server_time = Self::next_server_time(tx)?;
            let rows = scans::table
                .filter(scans::event_id.eq(event_id))
                .filter(scans::received_at.gt(&watermark))
                .order(scans::received_at.asc())
                .load::<CentralScanDB>(tx)?;
            Ok((rows, server_time))
        })?;

        let updates = rows
            .into_iter()
            .map(CentralScanDB::into_record)
            .collect::<Result<Vec<_>>>()?;
        Ok(SyncResponse {
            updates,
            server_time,
        })
    }

    /// The `POST scans/sync` semantic: upsert the pushed batch and compute
    /// the delta past the caller's watermark in one transaction, so a
    /// concurrent push can never fall between the two steps.
    pub fn sync_batch(&self, request: &SyncRequest) -> Result<SyncResponse> {
        let mut conn = self.conn()?;
        let (rows, server_time) = conn.immediate_transaction::<_, CentralError, _>(|tx| {
            let server_time = Self::next_server_time(tx)?;
            let inserted = Self::upsert_records(tx, &request.scans, &server_time)?;
            debug!(
                "Sync for event {}: {} pushed, {} new",
                request.event_id,
                request.scans.len(),
                inserted
            );
            let rows = scans::table
                .filter(scans::event_id.eq(request.event_id))
                .filter(scans::received_at.gt(&request.last_sync))
                .order(scans::received_at.asc())
                .load::<CentralScanDB>(tx)?;
            Ok((rows, server_time))
        })?;

        let updates = rows
            .into_iter()
            .map(CentralScanDB::into_record)
            .collect::<Result<Vec<_>>>()?;
        Ok(SyncResponse {
            updates,
            server_time,
        })
    }

    /// Legacy single-scan ingestion (`POST scans`). Returns the stored row.
    pub fn insert_scan(&self, record: ScanRecord) -> Result<ScanRecord> {
        let mut conn = self.conn()?;
        let stored = conn.immediate_transaction::<_, CentralError, _>(|tx| {
            let received_at = Self::next_server_time(tx)?;
            Self::validate_record(tx, &record)?;
            diesel::insert_into(scans::table)
                .values(CentralScanDB::from_record(record.clone(), received_at))
                .on_conflict(scans::id)
                .do_nothing()
                .execute(tx)?;
            let stored = scans::table.find(&record.id).first::<CentralScanDB>(tx)?;
            Ok(stored)
        })?;
        stored.into_record()
    }
}
