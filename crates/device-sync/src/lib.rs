//! HTTP boundary to the central check-in store.
//!
//! Wraps the REST endpoints (seed reads, single-scan push, batch sync) and
//! implements the core `SyncTransport`/`SeedSource` traits on top of them.

pub mod client;
pub mod error;
pub mod types;

pub use client::SyncApiClient;
pub use error::{DeviceSyncError, Result};
