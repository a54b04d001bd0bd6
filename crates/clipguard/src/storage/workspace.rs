//! Per-job scratch space for transient artifacts.

use std::io::Read;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::StorageError;
use crate::storage::artifacts::ensure_directory;

/// Scratch directory owned by a single job.
///
/// Every intermediate artifact (uploaded ciphertext, decrypted video,
/// anonymized video) is written here. The directory and its contents are
/// removed when the workspace is closed or dropped.
pub struct JobWorkspace {
    temp_dir: TempDir,
}

impl JobWorkspace {
    /// Creates a fresh workspace under `scratch_root`.
    pub fn create(scratch_root: &Path, job_id: &str) -> Result<Self, StorageError> {
        ensure_directory(scratch_root)?;
        let temp_dir = tempfile::Builder::new()
            .prefix(&format!("job-{}-", job_id))
            .tempdir_in(scratch_root)
            .map_err(|e| StorageError::CreateDirectory {
                path: scratch_root.to_path_buf(),
                source: e,
            })?;
        Ok(Self { temp_dir })
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    /// Drains `reader` into a file named `name` inside the workspace.
    pub fn ingest<R: Read + ?Sized>(&self, name: &str, reader: &mut R) -> Result<PathBuf, StorageError> {
        let path = self.file(name);
        let mut file = std::fs::File::create(&path).map_err(|e| StorageError::WriteFile {
            path: path.clone(),
            source: e,
        })?;
        std::io::copy(reader, &mut file).map_err(|e| StorageError::WriteFile {
            path: path.clone(),
            source: e,
        })?;
        Ok(path)
    }

    /// Removes the workspace, reporting failures instead of ignoring them.
    pub fn close(self) -> Result<(), StorageError> {
        let path = self.temp_dir.path().to_path_buf();
        self.temp_dir
            .close()
            .map_err(|e| StorageError::RemoveFile { path, source: e })
    }
}

impl std::fmt::Debug for JobWorkspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobWorkspace")
            .field("path", &self.temp_dir.path())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_lives_under_scratch_root() {
        let root = TempDir::new().unwrap();
        let ws = JobWorkspace::create(&root.path().join("scratch"), "abc").unwrap();

        assert!(ws.path().starts_with(root.path().join("scratch")));
        assert!(ws
            .path()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("job-abc-"));
    }

    #[test]
    fn test_ingest_copies_stream() {
        let root = TempDir::new().unwrap();
        let ws = JobWorkspace::create(root.path(), "j").unwrap();

        let mut reader: &[u8] = b"encrypted bytes";
        let path = ws.ingest("video.enc", &mut reader).unwrap();

        assert!(path.starts_with(ws.path()));
        assert_eq!(std::fs::read(&path).unwrap(), b"encrypted bytes");
    }

    #[test]
    fn test_close_removes_everything() {
        let root = TempDir::new().unwrap();
        let ws = JobWorkspace::create(root.path(), "j").unwrap();
        std::fs::write(ws.file("decrypted.mp4"), b"plain").unwrap();
        let path = ws.path().to_path_buf();

        ws.close().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_drop_removes_everything() {
        let root = TempDir::new().unwrap();
        let path = {
            let ws = JobWorkspace::create(root.path(), "j").unwrap();
            std::fs::write(ws.file("x"), b"x").unwrap();
            ws.path().to_path_buf()
        };
        assert!(!path.exists());
    }
}
