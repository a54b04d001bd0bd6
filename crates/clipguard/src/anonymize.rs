//! External anonymization tools.
//!
//! Detecting and blurring faces or plates is done by an external program.
//! An [`Anonymizer`] only knows how to hand a plaintext video to that
//! program and collect the result.

use std::collections::HashMap;
use std::path::Path;
use std::process::Command;

use crate::config::schema::AnonymizerCommand;
use crate::error::AnonymizeError;

/// Turns a plaintext video into one with identifying content suppressed.
pub trait Anonymizer: Send + Sync {
    /// Short label for logs, e.g. `"full"`.
    fn label(&self) -> &str;

    /// Reads `input` and writes the anonymized video to `output`.
    /// `workspace` is scratch space the tool may use.
    fn anonymize(&self, input: &Path, output: &Path, workspace: &Path)
        -> Result<(), AnonymizeError>;
}

/// Runs a configured command line, substituting `{input}`, `{output}` and
/// `{workspace}` in every argument.
#[derive(Debug, Clone)]
pub struct CommandAnonymizer {
    label: String,
    command: AnonymizerCommand,
}

impl CommandAnonymizer {
    pub fn new(label: impl Into<String>, command: AnonymizerCommand) -> Self {
        Self {
            label: label.into(),
            command,
        }
    }

    fn render_args(&self, input: &Path, output: &Path, workspace: &Path) -> Vec<String> {
        let vars: HashMap<&str, String> = HashMap::from([
            ("input", input.display().to_string()),
            ("output", output.display().to_string()),
            ("workspace", workspace.display().to_string()),
        ]);

        self.command
            .args
            .iter()
            .map(|arg| substitute(arg, &vars))
            .collect()
    }
}

impl Anonymizer for CommandAnonymizer {
    fn label(&self) -> &str {
        &self.label
    }

    fn anonymize(
        &self,
        input: &Path,
        output: &Path,
        workspace: &Path,
    ) -> Result<(), AnonymizeError> {
        let program = &self.command.program;
        let args = self.render_args(input, output, workspace);
        tracing::debug!(anonymizer = %self.label, program = %program, ?args, "Running anonymizer");

        let result = Command::new(program)
            .args(&args)
            .current_dir(workspace)
            .output()
            .map_err(|e| AnonymizeError::Spawn {
                program: program.clone(),
                source: e,
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(AnonymizeError::NonZeroExit {
                program: program.clone(),
                status: result.status.to_string(),
                stderr: tail(&stderr, 512),
            });
        }

        let produced = std::fs::metadata(output)
            .map(|m| m.is_file() && m.len() > 0)
            .unwrap_or(false);
        if !produced {
            return Err(AnonymizeError::MissingOutput {
                program: program.clone(),
                path: output.to_path_buf(),
            });
        }

        Ok(())
    }
}

/// Replaces each `{name}` with its value in a single left-to-right pass, so
/// substituted values are never scanned again. Unknown placeholders are left
/// intact.
fn substitute(template: &str, vars: &HashMap<&str, String>) -> String {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        result.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => match vars.get(&after[..close]) {
                Some(value) => {
                    result.push_str(value);
                    rest = &after[close + 1..];
                }
                None => {
                    result.push('{');
                    rest = after;
                }
            },
            None => {
                result.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    result.push_str(rest);
    result
}

/// Last `max` bytes of `text`, trimmed, on a char boundary.
fn tail(text: &str, max: usize) -> String {
    let text = text.trim();
    if text.len() <= max {
        return text.to_string();
    }
    let mut start = text.len() - max;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    text[start..].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn command(program: &str, args: &[&str]) -> AnonymizerCommand {
        AnonymizerCommand {
            program: program.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_render_args_substitutes_placeholders() {
        let anonymizer = CommandAnonymizer::new(
            "full",
            command("ffmpeg", &["-i", "{input}", "-vf", "boxblur=10:1", "{output}", "{other}"]),
        );
        let args = anonymizer.render_args(
            Path::new("/ws/in.mp4"),
            Path::new("/ws/out.mp4"),
            Path::new("/ws"),
        );
        assert_eq!(
            args,
            vec!["-i", "/ws/in.mp4", "-vf", "boxblur=10:1", "/ws/out.mp4", "{other}"]
        );
    }

    #[test]
    fn test_substituted_values_are_not_rescanned() {
        let anonymizer = CommandAnonymizer::new(
            "full",
            command("tool", &["--in={input}", "{workspace}/{output}", "{{input}}", "{open"]),
        );
        let args = anonymizer.render_args(
            Path::new("/scratch/{output}/in.mp4"),
            Path::new("/scratch/out.mp4"),
            Path::new("/scratch/{input}"),
        );
        assert_eq!(
            args,
            vec![
                "--in=/scratch/{output}/in.mp4",
                "/scratch/{input}//scratch/out.mp4",
                "{/scratch/{output}/in.mp4}",
                "{open",
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_successful_command_produces_output() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("in.mp4");
        let output = tmp.path().join("out.mp4");
        std::fs::write(&input, b"frames").unwrap();

        let anonymizer = CommandAnonymizer::new("copy", command("cp", &["{input}", "{output}"]));
        anonymizer.anonymize(&input, &output, tmp.path()).unwrap();

        assert_eq!(std::fs::read(&output).unwrap(), b"frames");
    }

    #[cfg(unix)]
    #[test]
    fn test_non_zero_exit_is_reported() {
        let tmp = TempDir::new().unwrap();
        let anonymizer = CommandAnonymizer::new("broken", command("false", &[]));

        let result = anonymizer.anonymize(
            &tmp.path().join("in.mp4"),
            &tmp.path().join("out.mp4"),
            tmp.path(),
        );
        assert!(matches!(result, Err(AnonymizeError::NonZeroExit { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_missing_output_is_reported() {
        let tmp = TempDir::new().unwrap();
        let anonymizer = CommandAnonymizer::new("noop", command("true", &[]));

        let result = anonymizer.anonymize(
            &tmp.path().join("in.mp4"),
            &tmp.path().join("out.mp4"),
            tmp.path(),
        );
        assert!(matches!(result, Err(AnonymizeError::MissingOutput { .. })));
    }

    #[test]
    fn test_missing_program_is_reported() {
        let tmp = TempDir::new().unwrap();
        let anonymizer = CommandAnonymizer::new(
            "absent",
            command("clipguard-definitely-not-installed", &[]),
        );

        let result = anonymizer.anonymize(
            &tmp.path().join("in.mp4"),
            &tmp.path().join("out.mp4"),
            tmp.path(),
        );
        assert!(matches!(result, Err(AnonymizeError::Spawn { .. })));
    }

    #[test]
    fn test_tail_keeps_end_of_output() {
        assert_eq!(tail("  short  ", 10), "short");
        assert_eq!(tail("abcdefghij", 4), "ghij");
    }
}
