use std::path::Path;

use secrecy::ExposeSecret;

use crate::crypto::{decode_key, VideoCipher};
use crate::error::{StageError, StorageError};
use crate::pipeline::context::EditingContext;
use crate::pipeline::stage::Stage;

const DECRYPTED_VIDEO_FILE: &str = "decrypted.mp4";
const DECRYPTED_METADATA_FILE: &str = "decrypted_meta.json";

/// Opens the uploaded video and metadata with the job's symmetric key.
#[derive(Debug, Default)]
pub struct Decryptor;

impl Stage for Decryptor {
    fn name(&self) -> &'static str {
        "Decryptor"
    }

    fn execute(&self, ctx: &mut EditingContext) -> Result<(), StageError> {
        let key = decode_key(ctx.job.key.expose_secret())?;
        let cipher = VideoCipher::new(&key)?;

        let video = decrypt_file(&cipher, &ctx.job.encrypted_video)?;
        let metadata = decrypt_file(&cipher, &ctx.job.encrypted_metadata)?;

        let video_path = ctx.job.workspace.file(DECRYPTED_VIDEO_FILE);
        write_file(&video_path, &video)?;
        let metadata_path = ctx.job.workspace.file(DECRYPTED_METADATA_FILE);
        write_file(&metadata_path, &metadata)?;

        tracing::debug!(
            video_bytes = video.len(),
            metadata_bytes = metadata.len(),
            "Decrypted upload"
        );

        ctx.decrypted_video = Some(video_path);
        ctx.decrypted_metadata = Some(metadata_path);
        Ok(())
    }
}

fn decrypt_file(cipher: &VideoCipher, path: &Path) -> Result<Vec<u8>, StageError> {
    let sealed = std::fs::read(path).map_err(|e| StorageError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(cipher.decrypt(&sealed)?)
}

fn write_file(path: &Path, contents: &[u8]) -> Result<(), StorageError> {
    std::fs::write(path, contents).map_err(|e| StorageError::WriteFile {
        path: path.to_path_buf(),
        source: e,
    })
}
