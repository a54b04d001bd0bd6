use std::fmt;

use crate::error::StageError;

use super::context::EditingContext;

/// One transformation step of a processing chain.
///
/// A stage reads only what earlier stages put into the context and either
/// fills its own output slots or returns the reason it could not. A panic
/// is treated as a fatal error and fails the job.
pub trait Stage: Send + Sync {
    /// Stable label used in failure notifications.
    fn name(&self) -> &'static str;

    fn execute(&self, ctx: &mut EditingContext) -> Result<(), StageError>;
}

/// Anonymization strength, each backed by its own external tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnonymizerKind {
    Lightweight,
    Full,
    Extended,
}

impl AnonymizerKind {
    pub fn label(self) -> &'static str {
        match self {
            AnonymizerKind::Lightweight => "lightweight",
            AnonymizerKind::Full => "full",
            AnonymizerKind::Extended => "extended",
        }
    }
}

/// The closed set of stages a chain can be assembled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    Passthrough,
    Decryptor,
    Anonymizer(AnonymizerKind),
    Persistor,
}

impl StageKind {
    pub fn name(self) -> &'static str {
        match self {
            StageKind::Passthrough => "Passthrough",
            StageKind::Decryptor => "Decryptor",
            StageKind::Anonymizer(_) => "Anonymizer",
            StageKind::Persistor => "Persistor",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageKind::Anonymizer(kind) => write!(f, "{}({})", self.name(), kind.label()),
            _ => f.write_str(self.name()),
        }
    }
}
