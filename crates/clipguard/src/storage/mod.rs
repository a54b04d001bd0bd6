pub mod artifacts;
pub mod workspace;

pub use artifacts::{metadata_name, ArtifactStore, StagedFile, VIDEO_EXTENSION};
pub use workspace::JobWorkspace;
