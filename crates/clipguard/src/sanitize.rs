//! Helpers for keeping file-system layout out of logs.
//!
//! Storage roots and scratch paths reveal host layout; log fields carry
//! only file names.

use std::path::Path;

/// Returns only the filename component of a path (no directory).
pub fn redact_path(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("<unknown>")
        .to_string()
}
