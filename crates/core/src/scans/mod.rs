//! Scan records: the only mutable, high-churn entity in the local store.

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{DatabaseError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanMethod {
    Scan,
    Manual,
}

impl ScanMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scan => "scan",
            Self::Manual => "manual",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "scan" => Ok(Self::Scan),
            "manual" => Ok(Self::Manual),
            other => Err(
                DatabaseError::Internal(format!("Unknown scan method '{}'", other)).into(),
            ),
        }
    }
}

/// A single check-in record.
///
/// `uploaded` (accepted by the central store) and `is_local` (produced on this
/// device rather than merged in from a peer) are deliberately independent
/// flags: local+unsynced, local+synced and remote+synced are all valid states.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scan {
    /// Client-generated at scan time so offline creation never collides.
    pub id: String,
    pub event_id: i32,
    pub person_id: String,
    /// Client wall-clock at the scan moment, epoch milliseconds.
    pub timestamp: i64,
    pub method: ScanMethod,
    pub uploaded: bool,
    pub is_local: bool,
}

impl Scan {
    /// Fresh locally-produced scan: new UUID, current wall-clock, unsynced.
    pub fn new_local(event_id: i32, person_id: impl Into<String>, method: ScanMethod) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            event_id,
            person_id: person_id.into(),
            timestamp: Utc::now().timestamp_millis(),
            method,
            uploaded: false,
            is_local: true,
        }
    }
}

/// Outcome of a guarded scan insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanWrite {
    Inserted(Scan),
    /// A scan for the same `(event_id, person_id)` pair landed inside the
    /// dedupe window; nothing was written.
    DuplicateSuppressed,
}

#[async_trait]
pub trait ScanRepositoryTrait: Send + Sync {
    fn get_scan(&self, scan_id: &str) -> Result<Option<Scan>>;

    fn get_scans_by_ids(&self, ids: &[String]) -> Result<Vec<Scan>>;

    fn list_for_event(&self, event_id: i32) -> Result<Vec<Scan>>;

    /// The push backlog: every scan with `uploaded = false`, across all
    /// events. This is a different set from "scans since last sync".
    fn list_pending(&self) -> Result<Vec<Scan>>;

    /// Unsynced scans produced on this device, for the pending indicator.
    fn count_pending_local(&self) -> Result<i64>;

    /// Latest device-local badge scans for an event, newest first. Manual
    /// check-ins and rows merged in from peers are excluded.
    fn recent_local_scans(&self, event_id: i32, limit: i64) -> Result<Vec<Scan>>;

    /// Insert if absent, else replace, keyed by `Scan.id`.
    async fn upsert(&self, scan: Scan) -> Result<()>;

    /// Insert unless another scan for the same pair exists with a timestamp
    /// within `window_ms` of the new one. The window is re-checked inside the
    /// write transaction, so interleaved scans cannot slip past it.
    async fn insert_unless_duplicate(&self, scan: Scan, window_ms: i64) -> Result<ScanWrite>;
}
