//! Connection pool, embedded migrations and the serialized write handle.
//!
//! SQLite allows one writer at a time; every mutation in this crate goes
//! through [`WriteHandle`], a dedicated thread owning its own connection, so
//! writes are serialized and each `exec` closure observes a quiesced store.

use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool, PooledConnection};
use diesel::sqlite::SqliteConnection;
use diesel::Connection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use log::debug;
use tokio::sync::oneshot;

use turnstile_core::Result;

use crate::errors::StorageError;

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;
pub type DbConnection = PooledConnection<ConnectionManager<SqliteConnection>>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

const CONNECTION_PRAGMAS: &str =
    "PRAGMA journal_mode = WAL; PRAGMA busy_timeout = 5000; PRAGMA foreign_keys = ON;";

#[derive(Debug, Clone, Copy)]
struct ConnectionPragmas;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionPragmas {
    fn on_acquire(
        &self,
        conn: &mut SqliteConnection,
    ) -> std::result::Result<(), diesel::r2d2::Error> {
        conn.batch_execute(CONNECTION_PRAGMAS)
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Builds the read pool and applies pending migrations.
pub fn create_pool(database_url: &str) -> Result<Arc<DbPool>> {
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    let pool = Pool::builder()
        .max_size(8)
        .connection_customizer(Box::new(ConnectionPragmas))
        .build(manager)
        .map_err(StorageError::from)?;

    let mut conn = pool.get().map_err(StorageError::from)?;
    run_migrations(&mut conn)?;
    debug!("Local store ready at {}", database_url);
    Ok(Arc::new(pool))
}

pub fn run_migrations(conn: &mut SqliteConnection) -> Result<()> {
    conn.run_pending_migrations(MIGRATIONS)
        .map(|_| ())
        .map_err(|e| StorageError::Migration(e.to_string()).into())
}

pub fn get_connection(pool: &DbPool) -> Result<DbConnection> {
    pool.get().map_err(|e| StorageError::Pool(e).into())
}

type WriteJob = Box<dyn FnOnce(&mut SqliteConnection) + Send + 'static>;

/// Handle to the single writer thread. Cheap to clone; repositories hold one
/// next to the read pool.
#[derive(Clone)]
pub struct WriteHandle {
    sender: mpsc::Sender<WriteJob>,
}

impl WriteHandle {
    /// Opens a dedicated write connection and starts the writer thread.
    pub fn spawn(database_url: &str) -> Result<Self> {
        let mut conn = SqliteConnection::establish(database_url).map_err(StorageError::from)?;
        conn.batch_execute(CONNECTION_PRAGMAS)
            .map_err(|e| StorageError::Diesel(e))?;

        let (sender, receiver) = mpsc::channel::<WriteJob>();
        thread::Builder::new()
            .name("turnstile-writer".to_string())
            .spawn(move || {
                for job in receiver {
                    job(&mut conn);
                }
            })
            .map_err(|e| StorageError::Writer(e.to_string()))?;

        Ok(Self { sender })
    }

    /// Runs a closure on the writer connection and awaits its result.
    pub async fn exec<T, F>(&self, job: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(Box::new(move |conn| {
                let _ = tx.send(job(conn));
            }))
            .map_err(|_| StorageError::Writer("writer thread stopped".to_string()))
            .map_err(turnstile_core::Error::from)?;

        rx.await
            .map_err(|_| StorageError::Writer("write result dropped".to_string()))
            .map_err(turnstile_core::Error::from)?
    }
}
