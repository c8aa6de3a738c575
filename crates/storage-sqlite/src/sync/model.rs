//! Database models for sync bookkeeping tables.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use turnstile_core::sync::SyncEngineStatus;

/// Per-event pull watermark. `last_sync` holds the `server_time` of the last
/// successful cycle, never a device clock reading.
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
#[diesel(primary_key(event_id))]
#[diesel(table_name = crate::schema::sync_cursor)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SyncCursorDB {
    pub event_id: i32,
    pub last_sync: String,
    pub updated_at: String,
}

/// Single-row engine bookkeeping, diagnostic only.
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
#[diesel(table_name = crate::schema::sync_engine_state)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct SyncEngineStateDB {
    pub id: i32,
    pub last_push_at: Option<String>,
    pub last_pull_at: Option<String>,
    pub last_error: Option<String>,
    pub consecutive_failures: i32,
    pub next_retry_at: Option<String>,
    pub last_cycle_status: Option<String>,
    pub last_cycle_duration_ms: Option<i64>,
}

impl SyncEngineStateDB {
    pub fn fresh() -> Self {
        SyncEngineStateDB {
            id: 1,
            last_push_at: None,
            last_pull_at: None,
            last_error: None,
            consecutive_failures: 0,
            next_retry_at: None,
            last_cycle_status: None,
            last_cycle_duration_ms: None,
        }
    }
}

impl From<SyncEngineStateDB> for SyncEngineStatus {
    fn from(db: SyncEngineStateDB) -> Self {
        SyncEngineStatus {
            last_push_at: db.last_push_at,
            last_pull_at: db.last_pull_at,
            last_error: db.last_error,
            consecutive_failures: db.consecutive_failures,
            next_retry_at: db.next_retry_at,
            last_cycle_status: db.last_cycle_status,
            last_cycle_duration_ms: db.last_cycle_duration_ms,
        }
    }
}
