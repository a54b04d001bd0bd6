use std::path::Path;

use crate::config::schema::{AnonymizerCommand, Config};
use crate::error::ConfigError;

const SCHEMA_JSON: &str = include_str!("../../schema/config-v1.json");

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;

    validate_schema(&json_value)?;

    let config: Config = serde_json::from_value(json_value)?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let validator = jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
        message: format!("Failed to compile JSON schema: {}", e),
    })?;

    let error_messages: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| e.to_string())
        .collect();
    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    if config.worker_count == 0 {
        return Err(ConfigError::Validation {
            message: "worker_count must be at least 1".to_string(),
        });
    }

    if Path::new(&config.video_directory) == Path::new(&config.metadata_directory) {
        return Err(ConfigError::Validation {
            message: "video_directory and metadata_directory must differ".to_string(),
        });
    }

    validate_anonymizer("lightweight", &config.anonymizers.lightweight)?;
    validate_anonymizer("full", &config.anonymizers.full)?;
    validate_anonymizer("extended", &config.anonymizers.extended)?;

    Ok(())
}

fn validate_anonymizer(name: &str, command: &AnonymizerCommand) -> Result<(), ConfigError> {
    if command.program.trim().is_empty() {
        return Err(ConfigError::InvalidAnonymizer {
            name: name.to_string(),
            reason: "program must not be empty".to_string(),
        });
    }

    for placeholder in ["{input}", "{output}"] {
        if !command.args.iter().any(|arg| arg.contains(placeholder)) {
            return Err(ConfigError::InvalidAnonymizer {
                name: name.to_string(),
                reason: format!("arguments must reference {}", placeholder),
            });
        }
    }

    Ok(())
}
