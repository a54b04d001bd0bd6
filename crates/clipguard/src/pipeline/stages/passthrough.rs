use crate::error::StageError;
use crate::pipeline::context::EditingContext;
use crate::pipeline::stage::Stage;

/// Identity stage of the empty chain: forwards the uploads untouched into
/// every output slot so the job can complete without processing.
#[derive(Debug, Default)]
pub struct Passthrough;

impl Stage for Passthrough {
    fn name(&self) -> &'static str {
        "Passthrough"
    }

    fn execute(&self, ctx: &mut EditingContext) -> Result<(), StageError> {
        if !ctx.job.encrypted_video.is_file() {
            return Err(StageError::MissingArtifact("encrypted video"));
        }
        if !ctx.job.encrypted_metadata.is_file() {
            return Err(StageError::MissingArtifact("encrypted metadata"));
        }

        ctx.decrypted_video = Some(ctx.job.encrypted_video.clone());
        ctx.decrypted_metadata = Some(ctx.job.encrypted_metadata.clone());
        ctx.anonymized_video = Some(ctx.job.encrypted_video.clone());
        Ok(())
    }
}
