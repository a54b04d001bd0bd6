pub mod anonymize;
pub mod catalog;
pub mod config;
pub mod crypto;
pub mod error;
pub mod logging;
pub mod metadata;
pub mod pipeline;
pub mod sanitize;
pub mod storage;
pub mod worker;

pub use catalog::{Catalog, CatalogError, Database, VideoInfo, VideoRecord};
pub use config::{load_config, Config};
pub use crypto::VideoCipher;
pub use error::{ClipguardError, ConfigError, Result, StageError, StorageError, WorkerError};
pub use metadata::{Metadata, TriggerType};
pub use pipeline::{AccountId, ChainType, Completion, JobHandle, WaitError};
pub use storage::ArtifactStore;
pub use worker::{JobSubmission, WorkerPool};
