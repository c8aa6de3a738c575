//! SQLite-backed local store for the check-in device.
//!
//! Reads go through an r2d2 pool; all writes are funneled through a single
//! writer thread so SQLite never sees two concurrent write transactions.

pub mod db;
pub mod errors;
pub mod events;
pub mod people;
pub mod scans;
pub mod schema;
pub mod sync;

pub use db::{create_pool, get_connection, run_migrations, DbPool, WriteHandle, MIGRATIONS};
pub use errors::StorageError;
pub use events::{EventAttendeeRepository, EventRepository};
pub use people::PersonRepository;
pub use scans::ScanRepository;
pub use sync::SyncRepository;
