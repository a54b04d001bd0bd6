use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::worker::job::Job;

/// Opaque identity of the account a video belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub i64);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where the Persistor put the finished artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedArtifacts {
    pub video_path: PathBuf,
    pub metadata_path: PathBuf,
    pub video_id: i64,
}

/// Artifacts a single job accumulates while passing through its stages.
///
/// Owned by exactly one [`PipelineRun`](super::runner::PipelineRun) and
/// handed to each stage as `&mut` in turn. Every intermediate path points
/// into the job's workspace and disappears with it.
pub struct EditingContext {
    // Input: identity, uploaded ciphertext, key material
    pub job: Job,

    // Decryptor result
    pub decrypted_video: Option<PathBuf>,
    pub decrypted_metadata: Option<PathBuf>,

    // Anonymizer result, overwritten by each anonymizer in the chain
    pub anonymized_video: Option<PathBuf>,

    // Persistor result
    pub persisted: Option<PersistedArtifacts>,
}

impl EditingContext {
    pub fn new(job: Job) -> Self {
        Self {
            job,
            decrypted_video: None,
            decrypted_metadata: None,
            anonymized_video: None,
            persisted: None,
        }
    }
}

impl fmt::Debug for EditingContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditingContext")
            .field("job_id", &self.job.id)
            .field("account", &self.job.account)
            .field("video_name", &self.job.video_name)
            .field("decrypted_video", &self.decrypted_video)
            .field("decrypted_metadata", &self.decrypted_metadata)
            .field("anonymized_video", &self.anonymized_video)
            .field("persisted", &self.persisted)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_id_display_and_json() {
        assert_eq!(AccountId(42).to_string(), "42");
        assert_eq!(serde_json::to_string(&AccountId(42)).unwrap(), "42");
    }
}
