//! Authoritative central store for the check-in system.
//!
//! Guarantees the contract the device-side sync engine depends on: idempotent
//! scan upsert by client-generated id, server-receipt ordering, and a
//! watermark delta that never re-delivers a row already handed out.

pub mod errors;
pub mod model;
pub mod schema;
pub mod store;
pub mod transport;

pub use errors::CentralError;
pub use store::CentralStore;
