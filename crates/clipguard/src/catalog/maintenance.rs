//! Operations that span the catalog and the artifact store.

use std::path::PathBuf;

use serde::Serialize;

use crate::config::Config;
use crate::error::{ConfigError, Result, StorageError};
use crate::metadata::Metadata;
use crate::pipeline::context::AccountId;
use crate::storage::ArtifactStore;

use super::{default_database_path, video_repo, Catalog, CatalogError, Database, VideoRecord};

/// A persisted video together with its stamped metadata.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoInfo {
    pub record: VideoRecord,
    pub video_path: PathBuf,
    pub metadata: Metadata,
}

/// Opens the catalog named by `config.database_path`, falling back to
/// [`default_database_path`].
pub fn open_configured(config: &Config) -> Result<Database> {
    let path = match &config.database_path {
        Some(path) => PathBuf::from(path),
        None => default_database_path().ok_or_else(|| ConfigError::Validation {
            message: "database_path is not set and no home directory was found".to_string(),
        })?,
    };
    Ok(Database::open(&path)?)
}

/// Looks up a catalog entry and reads its metadata document from storage.
pub fn video_info(db: &Database, store: &ArtifactStore, id: i64) -> Result<VideoInfo> {
    let record = video_repo::find_by_id(db, id)?.ok_or(CatalogError::NotFound(id))?;
    let account = AccountId(record.account_id);

    let metadata_path = store.metadata_path(account, &record.video_name);
    let raw = std::fs::read(&metadata_path).map_err(|e| StorageError::ReadFile {
        path: metadata_path.clone(),
        source: e,
    })?;
    let metadata = Metadata::from_bytes(&raw)?;

    Ok(VideoInfo {
        video_path: store.video_path(account, &record.video_name),
        record,
        metadata,
    })
}

/// Removes a catalog entry and both of its stored files.
pub fn delete_with_files(db: &Database, store: &ArtifactStore, id: i64) -> Result<VideoRecord> {
    let record = video_repo::find_by_id(db, id)?.ok_or(CatalogError::NotFound(id))?;
    store.remove(AccountId(record.account_id), &record.video_name)?;
    db.delete_artifact(id)?;
    log::info!("Deleted video {} ({})", record.video_name, id);
    Ok(record)
}
