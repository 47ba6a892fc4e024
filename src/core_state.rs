//! Shared application state.
//!
//! `CoreState` owns the single SQLite connection. Handlers lock it, run
//! synchronous repository code, and drop the guard before any `.await`.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use rusqlite::Connection;

use crate::db;

// ═══════════════════════════════════════════════════════════
// CoreState
// ═══════════════════════════════════════════════════════════

/// Wrapped in `Arc` at startup and shared by every request handler.
pub struct CoreState {
    db: Mutex<Connection>,
    /// `None` for in-memory databases.
    db_path: Option<PathBuf>,
}

impl CoreState {
    /// Open (or create) the database at `path` and run migrations.
    pub fn open(path: &Path) -> Result<Self, CoreError> {
        let conn = db::open_database(path)?;
        tracing::info!(path = %path.display(), "Database opened");
        Ok(Self {
            db: Mutex::new(conn),
            db_path: Some(path.to_path_buf()),
        })
    }

    /// Fresh in-memory database, used by tests and ephemeral runs.
    pub fn in_memory() -> Result<Self, CoreError> {
        let conn = db::open_memory_database()?;
        Ok(Self {
            db: Mutex::new(conn),
            db_path: None,
        })
    }

    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Exclusive access to the connection.
    pub fn lock_db(&self) -> Result<MutexGuard<'_, Connection>, CoreError> {
        self.db.lock().map_err(|_| CoreError::LockPoisoned)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Internal lock error")]
    LockPoisoned,
    #[error("Database error: {0}")]
    Database(#[from] db::DatabaseError),
}
