use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, SecondsFormat, Utc};
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;
use log::debug;

use turnstile_core::sync::{
    backoff_seconds, ScanRecord, SyncEngineStatus, SyncRepositoryTrait, CYCLE_STATUS_SUCCESS,
    EPOCH_WATERMARK,
};
use turnstile_core::Result;

use super::model::{SyncCursorDB, SyncEngineStateDB};
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::scans::ScanDB;
use crate::schema::{scans, sync_cursor, sync_engine_state};

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn load_engine_state(conn: &mut SqliteConnection) -> std::result::Result<SyncEngineStateDB, diesel::result::Error> {
    Ok(sync_engine_state::table
        .find(1)
        .first::<SyncEngineStateDB>(conn)
        .optional()?
        .unwrap_or_else(SyncEngineStateDB::fresh))
}

pub struct SyncRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl SyncRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        SyncRepository { pool, writer }
    }
}

#[async_trait]
impl SyncRepositoryTrait for SyncRepository {
    fn last_sync(&self, event_id: i32) -> Result<String> {
        let mut conn = get_connection(&self.pool)?;
        let cursor = sync_cursor::table
            .find(event_id)
            .first::<SyncCursorDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(cursor.map_or_else(|| EPOCH_WATERMARK.to_string(), |c| c.last_sync))
    }

    fn engine_status(&self) -> Result<SyncEngineStatus> {
        let mut conn = get_connection(&self.pool)?;
        let state = load_engine_state(&mut conn).map_err(StorageError::from)?;
        Ok(SyncEngineStatus::from(state))
    }

    async fn apply_sync_success(
        &self,
        event_id: i32,
        pushed_ids: Vec<String>,
        updates: Vec<ScanRecord>,
        server_time: String,
    ) -> Result<usize> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let adopted = conn.immediate_transaction::<_, StorageError, _>(|tx| {
                    if !pushed_ids.is_empty() {
                        diesel::update(scans::table.filter(scans::id.eq_any(&pushed_ids)))
                            .set(scans::uploaded.eq(true))
                            .execute(tx)?;
                    }

                    let mut adopted = 0usize;
                    for record in updates {
                        let existing: i64 = scans::table
                            .filter(scans::id.eq(&record.id))
                            .count()
                            .get_result(tx)?;
                        if existing > 0 {
                            // Known row, possibly our own push echoed back.
                            // Refresh server-owned fields but keep is_local.
                            diesel::update(scans::table.find(&record.id))
                                .set((
                                    scans::event_id.eq(record.event_id),
                                    scans::person_id.eq(&record.person_id),
                                    scans::timestamp.eq(record.timestamp),
                                    scans::method.eq(record.method.as_str()),
                                    scans::uploaded.eq(true),
                                ))
                                .execute(tx)?;
                        } else {
                            diesel::insert_into(scans::table)
                                .values(ScanDB::from(record.into_remote_scan()))
                                .execute(tx)?;
                            adopted += 1;
                        }
                    }

                    let cursor = SyncCursorDB {
                        event_id,
                        last_sync: server_time,
                        updated_at: now_rfc3339(),
                    };
                    diesel::insert_into(sync_cursor::table)
                        .values(&cursor)
                        .on_conflict(sync_cursor::event_id)
                        .do_update()
                        .set(&cursor)
                        .execute(tx)?;

                    Ok(adopted)
                })?;
                debug!("Sync merge for event {} adopted {} peer scans", event_id, adopted);
                Ok(adopted)
            })
            .await
    }

    async fn mark_cycle_outcome(
        &self,
        status: String,
        duration_ms: i64,
        error: Option<String>,
    ) -> Result<()> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                conn.immediate_transaction::<_, StorageError, _>(|tx| {
                    let mut state = load_engine_state(tx)?;
                    let now = now_rfc3339();

                    if status == CYCLE_STATUS_SUCCESS {
                        state.last_push_at = Some(now.clone());
                        state.last_pull_at = Some(now);
                        state.last_error = None;
                        state.consecutive_failures = 0;
                        state.next_retry_at = None;
                    } else {
                        state.consecutive_failures += 1;
                        state.last_error = error;
                        let delay = backoff_seconds(state.consecutive_failures);
                        state.next_retry_at = Some(
                            (Utc::now() + Duration::seconds(delay))
                                .to_rfc3339_opts(SecondsFormat::Millis, true),
                        );
                    }
                    state.last_cycle_status = Some(status);
                    state.last_cycle_duration_ms = Some(duration_ms);

                    diesel::insert_into(sync_engine_state::table)
                        .values(&state)
                        .on_conflict(sync_engine_state::id)
                        .do_update()
                        .set(&state)
                        .execute(tx)?;
                    Ok(())
                })?;
                Ok(())
            })
            .await
    }
}
