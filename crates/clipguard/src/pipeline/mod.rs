pub mod chain;
pub mod completion;
pub mod context;
pub mod runner;
pub mod stage;
pub mod stages;

pub use chain::{build_chain, AnonymizerSet, ChainType, StageFactory};
pub use completion::{Completion, CompletionSender, JobHandle, WaitError, SUCCESS_MESSAGE};
pub use context::{AccountId, EditingContext, PersistedArtifacts};
pub use runner::{PipelineRun, RunState};
pub use stage::{AnonymizerKind, Stage, StageKind};
