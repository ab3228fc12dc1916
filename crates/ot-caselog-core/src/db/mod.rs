//! Database layer for the case log.

mod cases;
mod preferences;
mod schema;

pub use schema::*;

use rusqlite::Connection;
use std::path::Path;
use thiserror::Error;

use crate::models::{CaseDetails, CaseRecord};

/// Database errors.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// Persistence of case records, keyed by (user id, case id).
///
/// Implementations assign identity and timestamps; callers hand over
/// already-validated [`CaseDetails`].
pub trait CaseStore {
    /// Insert a new case, assigning its ID and timestamps.
    fn create_case(&self, user_id: &str, details: CaseDetails) -> DbResult<CaseRecord>;

    /// Fetch one case owned by `user_id`.
    fn get_case(&self, user_id: &str, case_id: &str) -> DbResult<Option<CaseRecord>>;

    /// All cases owned by `user_id`, newest first by creation time.
    fn list_cases(&self, user_id: &str) -> DbResult<Vec<CaseRecord>>;

    /// Replace every editable field of an existing case.
    ///
    /// Returns [`DbError::NotFound`] if the case does not exist for this user.
    fn update_case(
        &self,
        user_id: &str,
        case_id: &str,
        details: CaseDetails,
    ) -> DbResult<CaseRecord>;
}

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

    /// Initialize schema.
    fn initialize(&self) -> DbResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Get raw connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}
