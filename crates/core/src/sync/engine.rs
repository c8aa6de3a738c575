//! The device-side sync engine: push the backlog, pull the delta, merge,
//! advance the watermark.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use log::{debug, info, warn};

use crate::errors::{Error, Result, SyncError};
use crate::scans::ScanRepositoryTrait;

use super::model::{ScanRecord, SyncRepositoryTrait, SyncRequest, SyncSummary};
use super::transport::SyncTransport;

pub const CYCLE_STATUS_SUCCESS: &str = "success";
pub const CYCLE_STATUS_FAILED: &str = "failed";

pub struct SyncEngine {
    scans: Arc<dyn ScanRepositoryTrait>,
    sync: Arc<dyn SyncRepositoryTrait>,
    transport: Arc<dyn SyncTransport>,
    in_flight: Mutex<HashSet<i32>>,
}

/// Releases the per-event in-flight slot when the cycle ends, however it ends.
struct CycleGuard<'a> {
    in_flight: &'a Mutex<HashSet<i32>>,
    event_id: i32,
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut set) = self.in_flight.lock() {
            set.remove(&self.event_id);
        }
    }
}

impl SyncEngine {
    pub fn new(
        scans: Arc<dyn ScanRepositoryTrait>,
        sync: Arc<dyn SyncRepositoryTrait>,
        transport: Arc<dyn SyncTransport>,
    ) -> Self {
        Self {
            scans,
            sync,
            transport,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    fn acquire_cycle(&self, event_id: i32) -> Result<CycleGuard<'_>> {
        let mut set = self
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if !set.insert(event_id) {
            return Err(SyncError::CycleInProgress(event_id).into());
        }
        Ok(CycleGuard {
            in_flight: &self.in_flight,
            event_id,
        })
    }

    /// Records a failed cycle for the retry surface. Bookkeeping must not
    /// mask the original error, so its own failure is only logged.
    async fn record_failed_cycle(&self, started_at: Instant, err: &Error) {
        if let Err(bookkeeping_err) = self
            .sync
            .mark_cycle_outcome(
                CYCLE_STATUS_FAILED.to_string(),
                started_at.elapsed().as_millis() as i64,
                Some(err.to_string()),
            )
            .await
        {
            warn!("Failed to record sync cycle outcome: {}", bookkeeping_err);
        }
    }

    /// Runs one sync cycle for an event.
    ///
    /// The push batch is every scan with `uploaded = false`, regardless of
    /// event; the pull watermark is per event. Any transport or server error
    /// aborts the call with scans and watermark untouched, so the backlog is
    /// simply retried wholesale on the next attempt.
    pub async fn sync_event(&self, event_id: i32) -> Result<SyncSummary> {
        let _guard = self.acquire_cycle(event_id)?;
        let started_at = Instant::now();

        let pending = self.scans.list_pending()?;
        let last_sync = self.sync.last_sync(event_id)?;
        let pushed_ids: Vec<String> = pending.iter().map(|scan| scan.id.clone()).collect();
        debug!(
            "Sync cycle for event {}: pushing {} scans (watermark {})",
            event_id,
            pending.len(),
            last_sync
        );

        let request = SyncRequest {
            scans: pending.iter().map(ScanRecord::from).collect(),
            last_sync,
            event_id,
        };

        let response = match self.transport.sync_scans(request).await {
            Ok(response) => response,
            Err(err) => {
                warn!("Sync cycle for event {} failed: {}", event_id, err);
                self.record_failed_cycle(started_at, &err).await;
                return Err(err);
            }
        };

        let pushed_set: HashSet<&str> = pushed_ids.iter().map(String::as_str).collect();
        let pulled_count = response
            .updates
            .iter()
            .filter(|update| !pushed_set.contains(update.id.as_str()))
            .count();

        if let Err(err) = self
            .sync
            .apply_sync_success(
                event_id,
                pushed_ids,
                response.updates,
                response.server_time.clone(),
            )
            .await
        {
            warn!("Sync merge for event {} failed: {}", event_id, err);
            self.record_failed_cycle(started_at, &err).await;
            return Err(err);
        }

        let duration_ms = started_at.elapsed().as_millis() as i64;
        self.sync
            .mark_cycle_outcome(CYCLE_STATUS_SUCCESS.to_string(), duration_ms, None)
            .await?;

        info!(
            "Synced event {}: pushed {}, received {} new (watermark {})",
            event_id,
            pending.len(),
            pulled_count,
            response.server_time
        );

        Ok(SyncSummary {
            pushed_count: pending.len(),
            pulled_count,
            duration_ms,
            status: CYCLE_STATUS_SUCCESS.to_string(),
        })
    }
}
