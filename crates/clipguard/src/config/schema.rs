use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    /// Root for anonymized videos.
    pub video_directory: String,
    /// Root for stamped metadata documents.
    pub metadata_directory: String,
    /// Parent directory of per-job workspaces. Defaults to the system temp dir.
    #[serde(default)]
    pub scratch_directory: Option<String>,
    /// SQLite catalog file. Defaults to `~/.clipguard/data/catalog.db`.
    #[serde(default)]
    pub database_path: Option<String>,
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    /// Upper bound on waiting for a job's result. `None` waits indefinitely.
    #[serde(default)]
    pub job_timeout_secs: Option<u64>,
    #[serde(default)]
    pub anonymizers: AnonymizersConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    pub fn scratch_root(&self) -> PathBuf {
        self.scratch_directory
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join("clipguard"))
    }
}

fn default_worker_count() -> usize {
    num_cpus::get()
}

/// External command line with `{input}`, `{output}` and `{workspace}`
/// placeholders in its arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnonymizerCommand {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl AnonymizerCommand {
    fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnonymizersConfig {
    #[serde(default = "default_lightweight")]
    pub lightweight: AnonymizerCommand,
    #[serde(default = "default_full")]
    pub full: AnonymizerCommand,
    #[serde(default = "default_extended")]
    pub extended: AnonymizerCommand,
}

fn default_lightweight() -> AnonymizerCommand {
    AnonymizerCommand::new(
        "ffmpeg",
        &["-y", "-i", "{input}", "-map_metadata", "-1", "-c", "copy", "{output}"],
    )
}

fn default_full() -> AnonymizerCommand {
    AnonymizerCommand::new(
        "ffmpeg",
        &[
            "-y",
            "-i",
            "{input}",
            "-vf",
            "boxblur=10:1",
            "-map_metadata",
            "-1",
            "{output}",
        ],
    )
}

fn default_extended() -> AnonymizerCommand {
    AnonymizerCommand::new("python3", &["anonymize.py", "{input}", "{output}"])
}

impl Default for AnonymizersConfig {
    fn default() -> Self {
        Self {
            lightweight: default_lightweight(),
            full: default_full(),
            extended: default_extended(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    /// Emit JSON lines instead of human-readable text.
    #[serde(default)]
    pub json: bool,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
        }
    }
}
