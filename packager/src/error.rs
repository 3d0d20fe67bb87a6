//! Error types for the packager pipeline.
//!
//! This module defines semantic error variants that tell the user which
//! precondition or step failed. Cancellation is deliberately absent: a
//! cancelled run is a normal [`crate::pipeline::BuildOutcome`], not an error.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that can occur while building project archives.
#[derive(Debug, Error)]
pub enum PackagerError {
    /// The project source directory does not exist or is not a directory.
    #[error("source directory {path} not found")]
    SourceNotFound {
        /// Path that was expected to be a directory.
        path: Utf8PathBuf,
    },

    /// No `.uproject` manifest sits at the root of the source directory.
    #[error("no .uproject manifest found in {dir}")]
    ManifestNotFound {
        /// Directory that was searched.
        dir: Utf8PathBuf,
    },

    /// More than one `.uproject` manifest sits at the root of the source
    /// directory.
    #[error("multiple .uproject manifests found in {dir}: {}", candidates.join(", "))]
    AmbiguousManifest {
        /// Directory that was searched.
        dir: Utf8PathBuf,
        /// File names of every candidate manifest.
        candidates: Vec<String>,
    },

    /// The output directory could not be created or written to.
    #[error("output directory {path} is not writable: {reason}")]
    OutputNotWritable {
        /// Output directory path.
        path: Utf8PathBuf,
        /// Description of the underlying I/O error.
        reason: String,
    },

    /// The external compressor exited unsuccessfully.
    #[error("7-Zip {operation} failed: {message}")]
    ToolFailed {
        /// The compressor operation that failed (create, update).
        operation: &'static str,
        /// Captured stderr or exit status description.
        message: String,
    },

    /// The project manifest is not a JSON object.
    #[error("invalid project manifest: {reason}")]
    InvalidManifest {
        /// Parser diagnostic or shape violation.
        reason: String,
    },

    /// Reading or writing a zip archive failed.
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// The engine version catalog is malformed.
    #[error("invalid version catalog: {reason}")]
    Catalog {
        /// Description of the problem.
        reason: String,
    },

    /// A saved build profile is malformed or references unknown versions.
    #[error("invalid build profile: {reason}")]
    Profile {
        /// Description of the problem.
        reason: String,
    },

    /// Loading `uepack.toml` failed.
    #[error(transparent)]
    Config(#[from] uepack::ConfigError),

    /// A required build input was given neither on the command line nor in
    /// the profile.
    #[error("{what} is required; pass it on the command line or set it in the profile")]
    MissingInput {
        /// Name of the missing input.
        what: &'static str,
    },

    /// A background build reported a failure.
    #[error("build failed: {message}")]
    BuildFailed {
        /// Error message reported by the worker.
        message: String,
    },

    /// The background build thread panicked.
    #[error("build worker panicked: {message}")]
    WorkerPanicked {
        /// Panic payload, when it was a string.
        message: String,
    },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Test stub received an unexpected or mismatched command invocation.
    #[cfg(any(test, feature = "test-support"))]
    #[error("stub mismatch: {message}")]
    StubMismatch {
        /// Description of what was expected versus what was received.
        message: String,
    },
}

impl From<serde_json::Error> for PackagerError {
    fn from(source: serde_json::Error) -> Self {
        Self::InvalidManifest {
            reason: source.to_string(),
        }
    }
}

/// Result type alias using [`PackagerError`].
pub type Result<T> = std::result::Result<T, PackagerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ambiguous_manifest_lists_candidates() {
        let err = PackagerError::AmbiguousManifest {
            dir: Utf8PathBuf::from("/projects/MyGame"),
            candidates: vec!["A.uproject".to_owned(), "B.uproject".to_owned()],
        };
        let msg = err.to_string();
        assert!(msg.contains("A.uproject, B.uproject"));
        assert!(msg.contains("/projects/MyGame"));
    }

    #[test]
    fn tool_failure_includes_operation_and_message() {
        let err = PackagerError::ToolFailed {
            operation: "create",
            message: "exit status 2".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("create"));
        assert!(msg.contains("exit status 2"));
    }

    #[test]
    fn json_errors_become_invalid_manifest() {
        let source = serde_json::from_str::<serde_json::Value>("{").expect_err("truncated JSON");
        let err = PackagerError::from(source);
        assert!(matches!(err, PackagerError::InvalidManifest { .. }));
    }

    #[test]
    fn output_not_writable_includes_reason() {
        let err = PackagerError::OutputNotWritable {
            path: Utf8PathBuf::from("/readonly"),
            reason: "permission denied".to_owned(),
        };
        assert!(err.to_string().contains("permission denied"));
    }
}
