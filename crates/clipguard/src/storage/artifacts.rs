use std::path::{Path, PathBuf};

use crate::error::StorageError;
use crate::metadata::METADATA_EXTENSION;
use crate::pipeline::context::AccountId;
use crate::sanitize;

/// File extension of persisted, anonymized videos.
pub const VIDEO_EXTENSION: &str = "mp4";

/// Suffix appended to the video name to form the metadata name.
const META_SUFFIX: &str = "_meta";

/// Move a file from `src` to `dst`. Uses `rename` first (atomic on the same
/// filesystem) and falls back to copy + delete across devices.
pub(crate) fn move_file(src: &Path, dst: &Path) -> Result<(), StorageError> {
    if std::fs::rename(src, dst).is_ok() {
        return Ok(());
    }

    std::fs::copy(src, dst).map_err(|e| StorageError::MoveFile {
        from: src.to_path_buf(),
        to: dst.to_path_buf(),
        source: e,
    })?;
    std::fs::remove_file(src).map_err(|e| StorageError::MoveFile {
        from: src.to_path_buf(),
        to: dst.to_path_buf(),
        source: e,
    })?;
    Ok(())
}

pub(crate) fn ensure_directory(path: &Path) -> Result<(), StorageError> {
    if !path.exists() {
        std::fs::create_dir_all(path).map_err(|e| StorageError::CreateDirectory {
            path: path.to_path_buf(),
            source: e,
        })?;
    }
    Ok(())
}

/// Catalog name of the metadata belonging to `video_name`.
pub fn metadata_name(video_name: &str) -> String {
    format!("{}{}", video_name, META_SUFFIX)
}

/// Durable storage for finished artifacts.
///
/// Videos and metadata live under two separate roots and are named
/// deterministically from the account id and the video name:
/// `<video_dir>/<account>_<video>.mp4` and
/// `<metadata_dir>/<account>_<video>_meta.json`.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    video_directory: PathBuf,
    metadata_directory: PathBuf,
}

impl ArtifactStore {
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(video_directory: P, metadata_directory: Q) -> Self {
        Self {
            video_directory: video_directory.as_ref().to_path_buf(),
            metadata_directory: metadata_directory.as_ref().to_path_buf(),
        }
    }

    pub fn video_directory(&self) -> &Path {
        &self.video_directory
    }

    pub fn metadata_directory(&self) -> &Path {
        &self.metadata_directory
    }

    pub fn video_path(&self, account: AccountId, video_name: &str) -> PathBuf {
        self.video_directory
            .join(format!("{}_{}.{}", account, video_name, VIDEO_EXTENSION))
    }

    pub fn metadata_path(&self, account: AccountId, video_name: &str) -> PathBuf {
        self.metadata_directory.join(format!(
            "{}_{}.{}",
            account,
            metadata_name(video_name),
            METADATA_EXTENSION
        ))
    }

    /// Copies the finished video next to its final path without replacing
    /// anything yet.
    pub fn stage_video(
        &self,
        source: &Path,
        account: AccountId,
        video_name: &str,
    ) -> Result<StagedFile, StorageError> {
        ensure_directory(&self.video_directory)?;
        let staged = StagedFile::new(self.video_path(account, video_name));

        std::fs::copy(source, &staged.staging).map_err(|e| StorageError::MoveFile {
            from: source.to_path_buf(),
            to: staged.staging.clone(),
            source: e,
        })?;
        Ok(staged)
    }

    /// Writes the metadata document next to its final path without replacing
    /// anything yet.
    pub fn stage_metadata(
        &self,
        contents: &[u8],
        account: AccountId,
        video_name: &str,
    ) -> Result<StagedFile, StorageError> {
        ensure_directory(&self.metadata_directory)?;
        let staged = StagedFile::new(self.metadata_path(account, video_name));

        std::fs::write(&staged.staging, contents).map_err(|e| StorageError::WriteFile {
            path: staged.staging.clone(),
            source: e,
        })?;
        Ok(staged)
    }

    /// Copies the finished video into place, replacing any previous version.
    pub fn store_video(
        &self,
        source: &Path,
        account: AccountId,
        video_name: &str,
    ) -> Result<PathBuf, StorageError> {
        self.stage_video(source, account, video_name)?.commit()
    }

    /// Writes the metadata document into place, replacing any previous version.
    pub fn store_metadata(
        &self,
        contents: &[u8],
        account: AccountId,
        video_name: &str,
    ) -> Result<PathBuf, StorageError> {
        self.stage_metadata(contents, account, video_name)?.commit()
    }

    /// Removes both artifacts of a video. Missing files are not an error.
    pub fn remove(&self, account: AccountId, video_name: &str) -> Result<(), StorageError> {
        remove_if_exists(&self.video_path(account, video_name))?;
        remove_if_exists(&self.metadata_path(account, video_name))
    }
}

pub(crate) fn remove_if_exists(path: &Path) -> Result<(), StorageError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StorageError::RemoveFile {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// An artifact written to a hidden sibling of its final path.
///
/// Readers of the final path keep seeing the previous version until
/// [`commit`](Self::commit). Dropping an uncommitted file deletes it.
#[derive(Debug)]
pub struct StagedFile {
    staging: PathBuf,
    destination: PathBuf,
    committed: bool,
}

impl StagedFile {
    fn new(destination: PathBuf) -> Self {
        let name = destination
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let staging =
            destination.with_file_name(format!(".{}.{}.partial", name, uuid::Uuid::new_v4()));
        Self {
            staging,
            destination,
            committed: false,
        }
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Renames the staged file over its final path.
    pub fn commit(mut self) -> Result<PathBuf, StorageError> {
        move_file(&self.staging, &self.destination)?;
        self.committed = true;
        Ok(self.destination.clone())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        if let Err(e) = remove_if_exists(&self.staging) {
            tracing::warn!(
                file = %sanitize::redact_path(&self.staging),
                error = %e,
                "Failed to remove staging file"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(tmp: &TempDir) -> ArtifactStore {
        ArtifactStore::new(tmp.path().join("videos"), tmp.path().join("meta"))
    }

    #[test]
    fn test_paths_are_deterministic() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);

        assert_eq!(
            store.video_path(AccountId(42), "clip1"),
            tmp.path().join("videos/42_clip1.mp4")
        );
        assert_eq!(
            store.metadata_path(AccountId(42), "clip1"),
            tmp.path().join("meta/42_clip1_meta.json")
        );
    }

    #[test]
    fn test_store_video_creates_directory_and_copies() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        let source = tmp.path().join("anon.mp4");
        std::fs::write(&source, b"anonymized").unwrap();

        let path = store.store_video(&source, AccountId(7), "drive").unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"anonymized");
        // Source stays in the scratch workspace
        assert!(source.exists());
    }

    #[test]
    fn test_store_replaces_existing_files() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);

        store.store_metadata(b"first", AccountId(1), "v").unwrap();
        let path = store.store_metadata(b"second", AccountId(1), "v").unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"second");
        let leftovers = std::fs::read_dir(store.metadata_directory())
            .unwrap()
            .count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn test_store_video_missing_source() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);

        let result = store.store_video(&tmp.path().join("nope.mp4"), AccountId(1), "v");
        assert!(matches!(result, Err(StorageError::MoveFile { .. })));
        assert!(!store.video_path(AccountId(1), "v").exists());
    }

    #[test]
    fn test_remove_tolerates_missing_files() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);

        store.store_metadata(b"{}", AccountId(3), "v").unwrap();
        store.remove(AccountId(3), "v").unwrap();

        assert!(!store.metadata_path(AccountId(3), "v").exists());
        store.remove(AccountId(3), "v").unwrap();
    }

    #[test]
    fn test_uncommitted_stage_leaves_final_path_alone() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        store.store_metadata(b"committed", AccountId(5), "v").unwrap();

        let staged = store.stage_metadata(b"pending", AccountId(5), "v").unwrap();
        assert_eq!(staged.destination(), store.metadata_path(AccountId(5), "v"));
        assert_eq!(std::fs::read_dir(store.metadata_directory()).unwrap().count(), 2);
        drop(staged);

        assert_eq!(
            std::fs::read(store.metadata_path(AccountId(5), "v")).unwrap(),
            b"committed"
        );
        assert_eq!(std::fs::read_dir(store.metadata_directory()).unwrap().count(), 1);
    }

    #[test]
    fn test_committed_stage_replaces_final_path() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        let source = tmp.path().join("anon.mp4");
        std::fs::write(&source, b"second").unwrap();
        std::fs::create_dir_all(store.video_directory()).unwrap();
        std::fs::write(store.video_path(AccountId(5), "v"), b"first").unwrap();

        let staged = store.stage_video(&source, AccountId(5), "v").unwrap();
        assert_eq!(std::fs::read(store.video_path(AccountId(5), "v")).unwrap(), b"first");

        let path = staged.commit().unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"second");
        assert_eq!(std::fs::read_dir(store.video_directory()).unwrap().count(), 1);
    }

    #[test]
    fn test_metadata_name() {
        assert_eq!(metadata_name("1487198226374"), "1487198226374_meta");
    }
}
