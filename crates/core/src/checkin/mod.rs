//! Badge decoding and the scan validation pipeline.

mod badge;
mod recorder;

pub use badge::{is_canonical_badge_id, BadgePayload};
pub use recorder::{CheckInOutcome, ScanRecorder, DUPLICATE_SCAN_WINDOW_MS};
