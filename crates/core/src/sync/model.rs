//! Sync wire contract and bookkeeping models.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::scans::{Scan, ScanMethod};

/// Watermark value for an event that has never synced: the Unix epoch in the
/// RFC3339 rendering the central store emits for `server_time`.
pub const EPOCH_WATERMARK: &str = "1970-01-01T00:00:00.000Z";

/// One scan row as exchanged with the central store. Timestamps are always
/// integer epoch milliseconds on the wire; the device-only `uploaded` and
/// `is_local` flags never leave the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRecord {
    pub id: String,
    pub event_id: i32,
    pub person_id: String,
    pub timestamp: i64,
    pub method: ScanMethod,
}

impl From<&Scan> for ScanRecord {
    fn from(scan: &Scan) -> Self {
        Self {
            id: scan.id.clone(),
            event_id: scan.event_id,
            person_id: scan.person_id.clone(),
            timestamp: scan.timestamp,
            method: scan.method,
        }
    }
}

impl ScanRecord {
    /// A record adopted from a peer device: already accepted by the central
    /// store, not produced locally.
    pub fn into_remote_scan(self) -> Scan {
        Scan {
            id: self.id,
            event_id: self.event_id,
            person_id: self.person_id,
            timestamp: self.timestamp,
            method: self.method,
            uploaded: true,
            is_local: false,
        }
    }
}

/// `POST scans/sync` request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRequest {
    pub scans: Vec<ScanRecord>,
    pub last_sync: String,
    pub event_id: i32,
}

/// `POST scans/sync` response body: the authoritative delta past the supplied
/// watermark plus the server clock the next watermark is taken from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResponse {
    pub updates: Vec<ScanRecord>,
    pub server_time: String,
}

/// Result of one completed (or rejected) sync cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSummary {
    pub pushed_count: usize,
    /// Updates that were not part of our own push batch.
    pub pulled_count: usize,
    pub duration_ms: i64,
    pub status: String,
}

/// Lightweight engine bookkeeping surfaced to the UI ("sync failed, will
/// retry" state and retry hints).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncEngineStatus {
    pub last_push_at: Option<String>,
    pub last_pull_at: Option<String>,
    pub last_error: Option<String>,
    pub consecutive_failures: i32,
    pub next_retry_at: Option<String>,
    pub last_cycle_status: Option<String>,
    pub last_cycle_duration_ms: Option<i64>,
}

/// Persistence seam for sync bookkeeping and the merge step.
#[async_trait]
pub trait SyncRepositoryTrait: Send + Sync {
    /// Per-event pull watermark, `EPOCH_WATERMARK` when never synced.
    fn last_sync(&self, event_id: i32) -> Result<String>;

    fn engine_status(&self) -> Result<SyncEngineStatus>;

    /// Applies a successful sync response in one transaction: marks the
    /// pushed batch uploaded, merges the returned delta (preserving the
    /// local `is_local` flag on rows we already had), and advances the
    /// watermark to `server_time`. Returns the number of newly adopted rows.
    async fn apply_sync_success(
        &self,
        event_id: i32,
        pushed_ids: Vec<String>,
        updates: Vec<ScanRecord>,
        server_time: String,
    ) -> Result<usize>;

    /// Records cycle bookkeeping. On failure the consecutive-failure count
    /// grows and a backoff-based retry hint is stored; scans and watermarks
    /// are never touched from here.
    async fn mark_cycle_outcome(
        &self,
        status: String,
        duration_ms: i64,
        error: Option<String>,
    ) -> Result<()>;
}

/// Retry policy classification for central-store failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncRetryClass {
    Retryable,
    Permanent,
}

/// Classify an HTTP status into retry behavior.
pub fn classify_http_status(status: u16) -> SyncRetryClass {
    match status {
        408 | 423 | 425 | 429 => SyncRetryClass::Retryable,
        500..=599 => SyncRetryClass::Retryable,
        _ => SyncRetryClass::Permanent,
    }
}

/// Exponential backoff in seconds with a cap, driven by the stored
/// consecutive-failure count.
pub fn backoff_seconds(consecutive_failures: i32) -> i64 {
    const MAX_EXPONENT: i32 = 8;
    const BASE_DELAY_SECONDS: i64 = 5;

    let capped = consecutive_failures.clamp(0, MAX_EXPONENT) as u32;
    2_i64.pow(capped) * BASE_DELAY_SECONDS
}
