use std::sync::Arc;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;
use log::debug;

use turnstile_core::scans::{Scan, ScanMethod, ScanRepositoryTrait, ScanWrite};
use turnstile_core::Result;

use super::model::ScanDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::scans;

pub struct ScanRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl ScanRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        ScanRepository { pool, writer }
    }
}

fn into_domain(rows: Vec<ScanDB>) -> Result<Vec<Scan>> {
    rows.into_iter().map(Scan::try_from).collect()
}

#[async_trait]
impl ScanRepositoryTrait for ScanRepository {
    fn get_scan(&self, scan_id: &str) -> Result<Option<Scan>> {
        let mut conn = get_connection(&self.pool)?;
        let scan_db = scans::table
            .find(scan_id)
            .first::<ScanDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        scan_db.map(Scan::try_from).transpose()
    }

    fn get_scans_by_ids(&self, ids: &[String]) -> Result<Vec<Scan>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = get_connection(&self.pool)?;
        let rows = scans::table
            .filter(scans::id.eq_any(ids))
            .load::<ScanDB>(&mut conn)
            .map_err(StorageError::from)?;
        into_domain(rows)
    }

    fn list_for_event(&self, event_id: i32) -> Result<Vec<Scan>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = scans::table
            .filter(scans::event_id.eq(event_id))
            .order(scans::timestamp.asc())
            .load::<ScanDB>(&mut conn)
            .map_err(StorageError::from)?;
        into_domain(rows)
    }

    fn list_pending(&self) -> Result<Vec<Scan>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = scans::table
            .filter(scans::uploaded.eq(false))
            .order(scans::timestamp.asc())
            .load::<ScanDB>(&mut conn)
            .map_err(StorageError::from)?;
        into_domain(rows)
    }

    fn count_pending_local(&self) -> Result<i64> {
        let mut conn = get_connection(&self.pool)?;
        scans::table
            .filter(scans::uploaded.eq(false))
            .filter(scans::is_local.eq(true))
            .count()
            .get_result(&mut conn)
            .map_err(|e| StorageError::from(e).into())
    }

    fn recent_local_scans(&self, event_id: i32, limit: i64) -> Result<Vec<Scan>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = scans::table
            .filter(scans::event_id.eq(event_id))
            .filter(scans::is_local.eq(true))
            .filter(scans::method.eq(ScanMethod::Scan.as_str()))
            .order(scans::timestamp.desc())
            .limit(limit)
            .load::<ScanDB>(&mut conn)
            .map_err(StorageError::from)?;
        into_domain(rows)
    }

    async fn upsert(&self, scan: Scan) -> Result<()> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                let scan_db = ScanDB::from(scan);
                diesel::insert_into(scans::table)
                    .values(&scan_db)
                    .on_conflict(scans::id)
                    .do_update()
                    .set(&scan_db)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    async fn insert_unless_duplicate(&self, scan: Scan, window_ms: i64) -> Result<ScanWrite> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<ScanWrite> {
                let outcome = conn.immediate_transaction::<_, StorageError, _>(|tx| {
                    // The window check runs on the writer connection right
                    // before the insert, so a concurrent scan of the same
                    // badge cannot land between check and commit.
                    let duplicates: i64 = scans::table
                        .filter(scans::event_id.eq(scan.event_id))
                        .filter(scans::person_id.eq(&scan.person_id))
                        .filter(scans::timestamp.ge(scan.timestamp - window_ms))
                        .filter(scans::timestamp.le(scan.timestamp + window_ms))
                        .count()
                        .get_result(tx)?;
                    if duplicates > 0 {
                        debug!(
                            "Suppressed duplicate scan for person {} at event {}",
                            scan.person_id, scan.event_id
                        );
                        return Ok(ScanWrite::DuplicateSuppressed);
                    }

                    diesel::insert_into(scans::table)
                        .values(ScanDB::from(scan.clone()))
                        .execute(tx)?;
                    Ok(ScanWrite::Inserted(scan))
                })?;
                Ok(outcome)
            })
            .await
    }
}
