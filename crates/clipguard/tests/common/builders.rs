//! Builders for encrypted uploads and config files.

#![allow(dead_code)]

use std::io::Cursor;
use std::path::Path;

use clipguard::crypto::VideoCipher;
use clipguard::{AccountId, JobSubmission, Metadata, TriggerType};

pub const TEST_KEY_HEX: &str = "8f3c1a9e0b7d46f2a5c8e1d03b9f7a6c2e4d8b1f0a3c5e7d9b2f4a6c8e0d1b3f";

/// Builder for an upload as a capturing device would send it.
pub struct UploadBuilder {
    account: AccountId,
    chain: String,
    video_name: String,
    video: Vec<u8>,
    metadata: Metadata,
    key: Vec<u8>,
    seal_key: String,
}

impl UploadBuilder {
    pub fn new() -> Self {
        Self {
            account: AccountId(42),
            chain: "normal".to_string(),
            video_name: "clip1".to_string(),
            video: b"\x00\x00\x00\x18ftypmp42 raw dashcam frames".to_vec(),
            metadata: Metadata::new(
                "2017-02-15 23:37:06",
                TriggerType::Automatic,
                vec![0.12, 1.8, 2.45, 0.3],
            ),
            key: TEST_KEY_HEX.as_bytes().to_vec(),
            seal_key: TEST_KEY_HEX.to_string(),
        }
    }

    pub fn account(mut self, account: i64) -> Self {
        self.account = AccountId(account);
        self
    }

    pub fn chain(mut self, chain: &str) -> Self {
        self.chain = chain.to_string();
        self
    }

    pub fn name(mut self, name: &str) -> Self {
        self.video_name = name.to_string();
        self
    }

    pub fn video(mut self, bytes: &[u8]) -> Self {
        self.video = bytes.to_vec();
        self
    }

    pub fn metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Sends key material that is not a valid AES-256 key.
    pub fn corrupt_key(mut self) -> Self {
        self.key = b"0123-not-a-key".to_vec();
        self
    }

    /// Sends a well-formed key that does not match the one used to seal.
    pub fn wrong_key(mut self) -> Self {
        self.key = "ab".repeat(32).into_bytes();
        self
    }

    /// Sends the key as 32 raw bytes instead of hex.
    pub fn raw_key(mut self) -> Self {
        self.key = (0..32)
            .map(|i| u8::from_str_radix(&self.seal_key[i * 2..i * 2 + 2], 16).unwrap())
            .collect();
        self
    }

    pub fn plaintext_video(&self) -> &[u8] {
        &self.video
    }

    pub fn build(self) -> JobSubmission {
        let cipher = VideoCipher::from_hex_key(&self.seal_key).unwrap();
        let video = cipher.encrypt(&self.video).unwrap();
        let metadata = cipher
            .encrypt(self.metadata.to_json().unwrap().as_bytes())
            .unwrap();

        JobSubmission::new(
            self.account,
            self.chain,
            self.video_name,
            Cursor::new(video),
            Cursor::new(metadata),
            Cursor::new(self.key),
        )
    }
}

/// Builder for config files.
pub struct ConfigBuilder {
    value: serde_json::Value,
}

impl ConfigBuilder {
    pub fn new(root: &Path) -> Self {
        Self {
            value: serde_json::json!({
                "version": "1.0",
                "video_directory": root.join("videos").to_string_lossy(),
                "metadata_directory": root.join("metadata").to_string_lossy(),
                "scratch_directory": root.join("scratch").to_string_lossy(),
                "database_path": root.join("catalog.db").to_string_lossy(),
                "worker_count": 2
            }),
        }
    }

    pub fn set(mut self, key: &str, value: serde_json::Value) -> Self {
        self.value[key] = value;
        self
    }

    pub fn anonymizer(mut self, strength: &str, program: &str, args: &[&str]) -> Self {
        self.value["anonymizers"][strength] = serde_json::json!({
            "program": program,
            "args": args,
        });
        self
    }

    pub fn write(self, path: &Path) {
        std::fs::write(path, serde_json::to_string_pretty(&self.value).unwrap()).unwrap();
    }
}
