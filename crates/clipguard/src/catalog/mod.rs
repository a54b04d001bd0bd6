//! Catalog of persisted video/metadata pairs.
//!
//! The pipeline only talks to the [`Catalog`] trait. [`Database`] is the
//! SQLite-backed implementation: a single rusqlite connection behind a
//! `Mutex`, so concurrent jobs serialize their writes.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use rusqlite::Connection;

pub mod error;
pub mod maintenance;
pub mod migrations;
pub mod video_repo;

pub use error::CatalogError;
pub use maintenance::{delete_with_files, open_configured, video_info, VideoInfo};
pub use video_repo::VideoRecord;

use crate::pipeline::context::AccountId;

/// Catalog operations the pipeline and its callers depend on.
pub trait Catalog: Send + Sync {
    /// Records a processed video and its metadata. This is the commit point
    /// of a successful run. Returns the catalog id of the video.
    fn register_processed_artifact(
        &self,
        account: AccountId,
        video_name: &str,
        meta_name: &str,
    ) -> Result<i64, CatalogError>;

    fn list_artifacts(&self, account: AccountId) -> Result<Vec<VideoRecord>, CatalogError>;

    fn delete_artifact(&self, video_id: i64) -> Result<(), CatalogError>;
}

/// Thread-safe database handle wrapping a single rusqlite connection.
///
/// Cloning is cheap (inner `Arc`). WAL mode is enabled for file databases.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Opens (or creates) the database at the given path and runs all
    /// pending migrations.
    pub fn open(path: &Path) -> Result<Self, CatalogError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CatalogError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;

        migrations::run_all(&conn)?;

        log::info!("Catalog opened at {}", path.display());

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Opens an in-memory database for testing. Runs all migrations.
    pub fn open_in_memory() -> Result<Self, CatalogError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;

        migrations::run_all(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Provides locked access to the underlying connection.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, CatalogError>
    where
        F: FnOnce(&Connection) -> Result<T, CatalogError>,
    {
        let conn = self.conn.lock().map_err(|_| CatalogError::LockPoisoned)?;
        f(&conn)
    }
}

impl Catalog for Database {
    fn register_processed_artifact(
        &self,
        account: AccountId,
        video_name: &str,
        meta_name: &str,
    ) -> Result<i64, CatalogError> {
        let now = Utc::now().to_rfc3339();
        video_repo::upsert(self, account.0, video_name, meta_name, &now)
    }

    fn list_artifacts(&self, account: AccountId) -> Result<Vec<VideoRecord>, CatalogError> {
        video_repo::list_by_account(self, account.0)
    }

    fn delete_artifact(&self, video_id: i64) -> Result<(), CatalogError> {
        if video_repo::delete(self, video_id)? {
            Ok(())
        } else {
            Err(CatalogError::NotFound(video_id))
        }
    }
}

/// Returns the default catalog path: `~/.clipguard/data/catalog.db`.
pub fn default_database_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".clipguard").join("data").join("catalog.db"))
}
