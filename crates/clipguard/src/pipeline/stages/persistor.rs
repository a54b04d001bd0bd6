use std::sync::Arc;

use chrono::Utc;

use crate::catalog::Catalog;
use crate::error::{StageError, StorageError};
use crate::metadata::Metadata;
use crate::pipeline::context::{EditingContext, PersistedArtifacts};
use crate::pipeline::stage::Stage;
use crate::storage::{metadata_name, ArtifactStore};

/// Moves the anonymized video and its stamped metadata into durable storage
/// and records them in the catalog.
///
/// Catalog registration is the commit point. Both files are staged beside
/// their final paths first and only renamed into place once the catalog
/// accepted the pair, so a failed run never touches artifacts that an
/// earlier run of the same video committed.
pub struct Persistor {
    store: ArtifactStore,
    catalog: Arc<dyn Catalog>,
}

impl Persistor {
    pub fn new(store: ArtifactStore, catalog: Arc<dyn Catalog>) -> Self {
        Self { store, catalog }
    }
}

impl Stage for Persistor {
    fn name(&self) -> &'static str {
        "Persistor"
    }

    fn execute(&self, ctx: &mut EditingContext) -> Result<(), StageError> {
        let video = ctx
            .anonymized_video
            .clone()
            .ok_or(StageError::MissingArtifact("anonymized video"))?;
        let metadata_file = ctx
            .decrypted_metadata
            .clone()
            .ok_or(StageError::MissingArtifact("decrypted metadata"))?;

        let raw = std::fs::read(&metadata_file).map_err(|e| StorageError::ReadFile {
            path: metadata_file.clone(),
            source: e,
        })?;
        let mut metadata = Metadata::from_bytes(&raw)?;
        metadata.stamp_editing_date(Utc::now());
        let document = metadata.to_json()?;

        let account = ctx.job.account;
        let name = ctx.job.video_name.as_str();

        // Staged files are dropped, and thereby removed, on every early return
        let staged_video = self.store.stage_video(&video, account, name)?;
        let staged_metadata = self.store.stage_metadata(document.as_bytes(), account, name)?;

        let video_id = self
            .catalog
            .register_processed_artifact(account, name, &metadata_name(name))?;

        let video_path = staged_video.commit()?;
        let metadata_path = staged_metadata.commit()?;

        tracing::info!(video_id, "Persisted video");
        ctx.persisted = Some(PersistedArtifacts {
            video_path,
            metadata_path,
            video_id,
        });
        Ok(())
    }
}
