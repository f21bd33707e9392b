//! # Database State
//!
//! Wraps the [`Database`] handle opened at startup.

use khata_db::Database;

#[derive(Debug, Clone)]
pub struct DbState {
    db: Database,
}

impl DbState {
    /// Creates a new DbState wrapping the database connection.
    pub fn new(db: Database) -> Self {
        DbState { db }
    }

    /// Returns a reference to the inner Database.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let invoices = db_state.inner().invoices().list().await?;
    /// ```
    pub fn inner(&self) -> &Database {
        &self.db
    }
}
