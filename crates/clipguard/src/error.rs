use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClipguardError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Stage error: {0}")]
    Stage(#[from] StageError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] crate::catalog::CatalogError),

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },

    #[error("Invalid anonymizer '{name}': {reason}")]
    InvalidAnonymizer { name: String, reason: String },
}

/// Expected failure of a single stage. Aborts the rest of the chain.
#[derive(Error, Debug)]
pub enum StageError {
    #[error("Required artifact '{0}' is missing from the editing context")]
    MissingArtifact(&'static str),

    #[error("Decryption failed: {0}")]
    Decrypt(#[from] CryptoError),

    #[error("Anonymization failed: {0}")]
    Anonymize(#[from] AnonymizeError),

    #[error("Invalid metadata: {0}")]
    Metadata(#[from] MetadataError),

    #[error("Storage failed: {0}")]
    Storage(#[from] StorageError),

    #[error("Catalog registration failed: {0}")]
    Catalog(#[from] crate::catalog::CatalogError),
}

#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Invalid symmetric key: {0}")]
    InvalidKey(String),

    #[error("Ciphertext is malformed: {0}")]
    MalformedCiphertext(String),

    #[error("Authentication failed, wrong key or corrupted data")]
    Authentication,

    #[error("Encryption failed: {0}")]
    Encryption(String),
}

#[derive(Error, Debug)]
pub enum AnonymizeError {
    #[error("Failed to launch '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' exited with {status}: {stderr}")]
    NonZeroExit {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("'{program}' produced no output at '{path}'")]
    MissingOutput { program: String, path: PathBuf },
}

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Failed to parse metadata JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Metadata is not valid UTF-8")]
    NotUtf8,
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to move file from '{from}' to '{to}': {source}")]
    MoveFile {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to remove file '{path}': {source}")]
    RemoveFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors surfaced synchronously by [`crate::worker::WorkerPool::submit`].
#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Unknown chain type: '{0}'")]
    UnknownChain(String),

    #[error("Invalid video name '{name}': {reason}")]
    InvalidVideoName { name: String, reason: String },

    #[error("A job for account {account} and video '{video}' is already in progress")]
    DuplicateJob { account: String, video: String },

    #[error("Failed to receive upload: {0}")]
    Intake(#[source] StorageError),

    #[error("Worker channel closed unexpectedly")]
    ChannelClosed,
}

pub type Result<T> = std::result::Result<T, ClipguardError>;
