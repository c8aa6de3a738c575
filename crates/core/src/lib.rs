//! Domain core for the turnstile check-in system: models, repository seams,
//! the scan recorder and the offline-first sync engine.
//!
//! Persistence lives in `turnstile-storage-sqlite`, the HTTP boundary in
//! `turnstile-device-sync`, and the authoritative store in
//! `turnstile-central`; this crate only talks to them through traits.

pub mod bootstrap;
pub mod checkin;
pub mod errors;
pub mod events;
pub mod people;
pub mod roster;
pub mod scans;
pub mod sync;

#[cfg(test)]
pub(crate) mod test_support;

pub use errors::{DatabaseError, Error, Result, SyncError, ValidationError};
