//! SQLite persistence for the local store.
//!
//! A single rusqlite connection behind `Arc<Mutex<_>>`; SQLite serializes
//! writes anyway, and every call is short.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

pub mod appointment_repo;
pub mod error;
pub mod migrations;

pub use error::DatabaseError;

/// Cheap to clone; clones share the connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Opens or creates the database file, then applies pending migrations.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DatabaseError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        migrations::run_all(&conn)?;

        log::info!("Database opened: {}", crate::sanitize::redact_path(path));

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        migrations::run_all(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T, DatabaseError>
    where
        F: FnOnce(&Connection) -> Result<T, DatabaseError>,
    {
        let conn = self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        f(&conn)
    }

    /// Round-trips a trivial query.
    pub fn ping(&self) -> Result<(), DatabaseError> {
        self.with_conn(|conn| {
            conn.query_row("SELECT 1", [], |r| r.get::<_, i64>(0))?;
            Ok(())
        })
    }
}

/// `~/.booking/data/booking.db`
pub fn default_database_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".booking").join("data").join("booking.db"))
}
