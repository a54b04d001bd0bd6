use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use secrecy::SecretSlice;

use crate::error::{StorageError, WorkerError};
use crate::pipeline::chain::ChainType;
use crate::pipeline::context::AccountId;
use crate::storage::JobWorkspace;

const ENCRYPTED_VIDEO_FILE: &str = "video.enc";
const ENCRYPTED_METADATA_FILE: &str = "metadata.enc";

/// An upload as handed over by the request layer.
pub struct JobSubmission {
    pub account: AccountId,
    /// Chain classification, e.g. `"normal"`.
    pub chain: String,
    pub video_name: String,
    pub video: Box<dyn Read + Send>,
    pub metadata: Box<dyn Read + Send>,
    pub key: Box<dyn Read + Send>,
}

impl JobSubmission {
    pub fn new(
        account: AccountId,
        chain: impl Into<String>,
        video_name: impl Into<String>,
        video: impl Read + Send + 'static,
        metadata: impl Read + Send + 'static,
        key: impl Read + Send + 'static,
    ) -> Self {
        Self {
            account,
            chain: chain.into(),
            video_name: video_name.into(),
            video: Box::new(video),
            metadata: Box::new(metadata),
            key: Box::new(key),
        }
    }
}

impl fmt::Debug for JobSubmission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobSubmission")
            .field("account", &self.account)
            .field("chain", &self.chain)
            .field("video_name", &self.video_name)
            .finish_non_exhaustive()
    }
}

/// A validated job whose uploads are already in its workspace.
pub struct Job {
    pub id: String,
    pub account: AccountId,
    pub video_name: String,
    pub chain: ChainType,
    pub workspace: JobWorkspace,
    pub encrypted_video: PathBuf,
    pub encrypted_metadata: PathBuf,
    /// Key material exactly as uploaded; decoded by the Decryptor.
    pub key: SecretSlice<u8>,
    pub submitted_at: DateTime<Utc>,
}

impl Job {
    /// Drains the submission's streams into a fresh workspace under
    /// `scratch_root`. The key is kept in memory only.
    pub fn intake(
        submission: JobSubmission,
        chain: ChainType,
        scratch_root: &Path,
    ) -> Result<Self, WorkerError> {
        let JobSubmission {
            account,
            video_name,
            mut video,
            mut metadata,
            mut key,
            ..
        } = submission;

        let id = uuid::Uuid::new_v4().to_string();
        let submitted_at = Utc::now();
        let workspace = JobWorkspace::create(scratch_root, &id).map_err(WorkerError::Intake)?;

        let encrypted_video = workspace
            .ingest(ENCRYPTED_VIDEO_FILE, &mut video)
            .map_err(WorkerError::Intake)?;
        let encrypted_metadata = workspace
            .ingest(ENCRYPTED_METADATA_FILE, &mut metadata)
            .map_err(WorkerError::Intake)?;

        let mut key_material = Vec::new();
        key.read_to_end(&mut key_material).map_err(|e| {
            WorkerError::Intake(StorageError::ReadFile {
                path: PathBuf::from("<key stream>"),
                source: e,
            })
        })?;

        Ok(Self {
            id,
            account,
            video_name,
            chain,
            workspace,
            encrypted_video,
            encrypted_metadata,
            key: SecretSlice::from(key_material),
            submitted_at,
        })
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("id", &self.id)
            .field("account", &self.account)
            .field("video_name", &self.video_name)
            .field("chain", &self.chain)
            .field("workspace", &self.workspace)
            .field("submitted_at", &self.submitted_at)
            .finish_non_exhaustive()
    }
}

/// Rejects names that could escape the storage roots or collide with
/// nothing meaningful once embedded in a file name.
pub fn validate_video_name(name: &str) -> Result<(), WorkerError> {
    let reject = |reason: &str| {
        Err(WorkerError::InvalidVideoName {
            name: name.to_string(),
            reason: reason.to_string(),
        })
    };

    if name.trim().is_empty() {
        return reject("must not be empty");
    }
    if name.contains('/') || name.contains('\\') {
        return reject("must not contain path separators");
    }
    if name.contains("..") {
        return reject("must not contain '..'");
    }
    if name.chars().all(|c| c == '.') {
        return reject("must not consist of dots only");
    }
    if name.chars().any(char::is_control) {
        return reject("must not contain control characters");
    }
    Ok(())
}
