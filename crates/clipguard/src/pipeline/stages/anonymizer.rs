use std::sync::Arc;

use crate::anonymize::Anonymizer;
use crate::error::StageError;
use crate::pipeline::context::EditingContext;
use crate::pipeline::stage::{AnonymizerKind, Stage};

/// Suppresses identifying content in the decrypted video.
///
/// When a chain runs several anonymizers, each one works on the output of
/// the previous one.
pub struct AnonymizerStage {
    kind: AnonymizerKind,
    anonymizer: Arc<dyn Anonymizer>,
}

impl AnonymizerStage {
    pub fn new(kind: AnonymizerKind, anonymizer: Arc<dyn Anonymizer>) -> Self {
        Self { kind, anonymizer }
    }

    pub fn kind(&self) -> AnonymizerKind {
        self.kind
    }
}

impl Stage for AnonymizerStage {
    fn name(&self) -> &'static str {
        "Anonymizer"
    }

    fn execute(&self, ctx: &mut EditingContext) -> Result<(), StageError> {
        let input = ctx
            .anonymized_video
            .clone()
            .or_else(|| ctx.decrypted_video.clone())
            .ok_or(StageError::MissingArtifact("decrypted video"))?;
        let output = ctx
            .job
            .workspace
            .file(&format!("anonymized-{}.mp4", self.kind.label()));

        self.anonymizer
            .anonymize(&input, &output, ctx.job.workspace.path())?;

        tracing::debug!(anonymizer = self.anonymizer.label(), "Anonymized video");
        ctx.anonymized_video = Some(output);
        Ok(())
    }
}

impl std::fmt::Debug for AnonymizerStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnonymizerStage")
            .field("kind", &self.kind)
            .field("anonymizer", &self.anonymizer.label())
            .finish()
    }
}
