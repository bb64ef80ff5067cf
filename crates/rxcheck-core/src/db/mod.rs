//! Database layer for rxcheck.
//!
//! Stores versioned formulary snapshots (so a deployment can switch datasets
//! without a rebuild and every check can be traced to the data it ran
//! against) and the audit log of prescriptions saved over warnings.

mod acknowledgements;
mod formulary;
mod schema;

pub use acknowledgements::*;
pub use formulary::*;
pub use schema::*;

use rusqlite::Connection;
use std::path::Path;
use thiserror::Error;

use crate::config::ConfigError;

/// Database errors.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid formulary: {0}")]
    Config(#[from] ConfigError),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Version {0} already stored with different content")]
    Conflict(String),

    #[error("Stored payload for {0} does not match its fingerprint")]
    Integrity(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// Database connection wrapper.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open database at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    fn initialize(&self) -> DbResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Get raw connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}
