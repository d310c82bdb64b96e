use std::path::PathBuf;
use thiserror::Error;

use crate::config::escapes::EscapeError;
use crate::core::ListenerError;

/// Errors that can occur while loading or saving settings and history.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File contents are not valid JSON for the expected schema.
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// Serialising settings failed.
    #[error("Failed to serialise: {0}")]
    Serialize(#[from] serde_json::Error),
    /// A prefix or suffix contains a malformed escape sequence.
    #[error("Invalid {field}: {source}")]
    InvalidEscape {
        field: &'static str,
        #[source]
        source: EscapeError,
    },
    /// The configured inactivity timeout is unusable.
    #[error(transparent)]
    InvalidTimeout(#[from] ListenerError),
    /// Atomic write operation failed.
    #[error("Atomic write failed: {0}")]
    WriteFailed(String),
    /// Generic I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
