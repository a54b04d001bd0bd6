//! Catalog error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from catalog operations.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// SQLite error from rusqlite.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// IO error when creating the database directory.
    #[error("IO error for path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A migration failed to apply.
    #[error("Migration failed at version {version}: {reason}")]
    Migration { version: u32, reason: String },

    /// No catalog entry with the given id.
    #[error("Video {0} not found")]
    NotFound(i64),

    /// The database lock was poisoned.
    #[error("Database lock poisoned")]
    LockPoisoned,
}
