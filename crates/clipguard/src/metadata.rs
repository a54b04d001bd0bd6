//! Recording metadata that travels alongside each uploaded video.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MetadataError;

/// File extension of persisted metadata documents.
pub const METADATA_EXTENSION: &str = "json";

/// How the recording was started on the capturing device.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TriggerType {
    #[serde(alias = "MANUAL", alias = "Manual")]
    Manual,
    #[serde(alias = "AUTOMATIC", alias = "Automatic", alias = "auto")]
    Automatic,
}

impl std::fmt::Display for TriggerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TriggerType::Manual => write!(f, "manual"),
            TriggerType::Automatic => write!(f, "automatic"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    /// Creation date as reported by the device.
    pub date: String,
    pub trigger_type: TriggerType,
    /// Acceleration samples recorded around the trigger.
    #[serde(default)]
    pub g_force: Vec<f32>,
    /// Set once the video has been fully edited and persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editing_date: Option<DateTime<Utc>>,
}

impl Metadata {
    pub fn new(date: impl Into<String>, trigger_type: TriggerType, g_force: Vec<f32>) -> Self {
        Self {
            date: date.into(),
            trigger_type,
            g_force,
            editing_date: None,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, MetadataError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MetadataError> {
        let text = std::str::from_utf8(bytes).map_err(|_| MetadataError::NotUtf8)?;
        Self::from_json(text)
    }

    pub fn to_json(&self) -> Result<String, MetadataError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Records the moment editing finished.
    pub fn stamp_editing_date(&mut self, at: DateTime<Utc>) {
        self.editing_date = Some(at);
    }
}
