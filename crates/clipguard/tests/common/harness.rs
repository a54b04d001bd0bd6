//! Test harness for isolated pipeline runs.
//!
//! Every harness owns a temp directory holding the video, metadata and
//! scratch roots, plus an in-memory catalog wrapped so tests can see each
//! registration call.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crossbeam_channel::{Receiver, Sender};
use tempfile::TempDir;

use clipguard::anonymize::Anonymizer;
use clipguard::error::AnonymizeError;
use clipguard::pipeline::{AnonymizerSet, StageFactory};
use clipguard::{AccountId, ArtifactStore, Catalog, CatalogError, Database, VideoRecord, WorkerPool};

/// Marker appended by [`MarkingAnonymizer`] so tests can tell anonymized
/// output from raw input.
pub fn anonymized_marker(label: &str) -> String {
    format!("|anonymized:{}", label)
}

/// Copies its input and appends a marker. Counts invocations.
pub struct MarkingAnonymizer {
    label: &'static str,
    calls: AtomicUsize,
}

impl MarkingAnonymizer {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Anonymizer for MarkingAnonymizer {
    fn label(&self) -> &str {
        self.label
    }

    fn anonymize(&self, input: &Path, output: &Path, _workspace: &Path) -> Result<(), AnonymizeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut data = std::fs::read(input).expect("anonymizer input readable");
        data.extend_from_slice(anonymized_marker(self.label).as_bytes());
        std::fs::write(output, data).expect("anonymizer output writable");
        Ok(())
    }
}

/// Always fails like a tool that cannot read the codec.
pub struct BrokenAnonymizer;

impl Anonymizer for BrokenAnonymizer {
    fn label(&self) -> &str {
        "broken"
    }

    fn anonymize(&self, _: &Path, _: &Path, _: &Path) -> Result<(), AnonymizeError> {
        Err(AnonymizeError::NonZeroExit {
            program: "blur".to_string(),
            status: "exit status: 1".to_string(),
            stderr: "unsupported codec".to_string(),
        })
    }
}

/// Blocks inside `anonymize` until released, announcing when it starts.
pub struct GatedAnonymizer {
    started: Sender<()>,
    release: Receiver<()>,
}

/// Test side of a [`GatedAnonymizer`].
pub struct Gate {
    pub started: Receiver<()>,
    release: Sender<()>,
}

impl Gate {
    /// Lets one blocked job continue.
    pub fn open_once(&self) {
        self.release.send(()).expect("gate receiver alive");
    }
}

impl GatedAnonymizer {
    pub fn new() -> (Self, Gate) {
        let (started_tx, started_rx) = crossbeam_channel::unbounded();
        let (release_tx, release_rx) = crossbeam_channel::unbounded();
        (
            Self {
                started: started_tx,
                release: release_rx,
            },
            Gate {
                started: started_rx,
                release: release_tx,
            },
        )
    }
}

impl Anonymizer for GatedAnonymizer {
    fn label(&self) -> &str {
        "gated"
    }

    fn anonymize(&self, input: &Path, output: &Path, _: &Path) -> Result<(), AnonymizeError> {
        let _ = self.started.send(());
        let _ = self.release.recv();
        std::fs::copy(input, output).expect("gated copy");
        Ok(())
    }
}

/// One call to `register_processed_artifact`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub account: AccountId,
    pub video_name: String,
    pub meta_name: String,
}

/// SQLite catalog that also remembers every registration call.
pub struct RecordingCatalog {
    inner: Database,
    registrations: Mutex<Vec<Registration>>,
}

impl RecordingCatalog {
    pub fn new() -> Self {
        Self {
            inner: Database::open_in_memory().expect("in-memory catalog"),
            registrations: Mutex::new(Vec::new()),
        }
    }

    pub fn registrations(&self) -> Vec<Registration> {
        self.registrations.lock().unwrap().clone()
    }
}

impl Catalog for RecordingCatalog {
    fn register_processed_artifact(
        &self,
        account: AccountId,
        video_name: &str,
        meta_name: &str,
    ) -> Result<i64, CatalogError> {
        self.registrations.lock().unwrap().push(Registration {
            account,
            video_name: video_name.to_string(),
            meta_name: meta_name.to_string(),
        });
        self.inner
            .register_processed_artifact(account, video_name, meta_name)
    }

    fn list_artifacts(&self, account: AccountId) -> Result<Vec<VideoRecord>, CatalogError> {
        self.inner.list_artifacts(account)
    }

    fn delete_artifact(&self, video_id: i64) -> Result<(), CatalogError> {
        self.inner.delete_artifact(video_id)
    }
}

/// Isolated environment: storage roots, scratch root and catalog.
pub struct TestHarness {
    temp_dir: TempDir,
    pub video_dir: PathBuf,
    pub metadata_dir: PathBuf,
    pub scratch_dir: PathBuf,
    pub catalog: Arc<RecordingCatalog>,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();

        Self {
            video_dir: base.join("videos"),
            metadata_dir: base.join("metadata"),
            scratch_dir: base.join("scratch"),
            catalog: Arc::new(RecordingCatalog::new()),
            temp_dir,
        }
    }

    pub fn temp_path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn store(&self) -> ArtifactStore {
        ArtifactStore::new(&self.video_dir, &self.metadata_dir)
    }

    /// Pool whose three anonymizer strengths all use `anonymizer`.
    pub fn pool_with(&self, anonymizer: Arc<dyn Anonymizer>, workers: usize) -> WorkerPool {
        let set = AnonymizerSet::new(anonymizer.clone(), anonymizer.clone(), anonymizer);
        self.pool_with_set(set, workers)
    }

    pub fn pool_with_set(&self, anonymizers: AnonymizerSet, workers: usize) -> WorkerPool {
        let factory = StageFactory::new(self.store(), self.catalog.clone(), anonymizers);
        WorkerPool::new(Arc::new(factory), self.scratch_dir.clone(), workers)
    }

    /// Pool with a [`MarkingAnonymizer`] labelled `"blur"`.
    pub fn pool(&self, workers: usize) -> WorkerPool {
        self.pool_with(Arc::new(MarkingAnonymizer::new("blur")), workers)
    }

    /// File names currently in `dir`; empty if it does not exist.
    pub fn files_in(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = match std::fs::read_dir(dir) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().to_string())
                .collect(),
            Err(_) => Vec::new(),
        };
        names.sort();
        names
    }

    pub fn stored_videos(&self) -> Vec<String> {
        Self::files_in(&self.video_dir)
    }

    pub fn stored_metadata(&self) -> Vec<String> {
        Self::files_in(&self.metadata_dir)
    }

    /// Leftover job workspaces under the scratch root.
    pub fn scratch_entries(&self) -> Vec<String> {
        Self::files_in(&self.scratch_dir)
    }
}

/// Shuts the pool down and joins its workers.
pub fn stop(pool: WorkerPool) {
    pool.shutdown();
    pool.wait();
}
