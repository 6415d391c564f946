// error.rs — Error types for the audit subsystem.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during audit operations.
#[derive(Debug, Error)]
pub enum AuditError {
    /// Failed to open or create the audit log file.
    #[error("failed to open audit log at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to write an entry to the log.
    #[error("failed to append entry: {0}")]
    WriteFailed(#[from] std::io::Error),

    /// Failed to serialize or deserialize an entry (malformed JSON).
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// The hash chain is broken: an entry does not link to its predecessor,
    /// or its own hash does not match its contents.
    #[error("integrity check failed at entry {seq}: expected hash {expected}, got {actual}")]
    IntegrityViolation {
        seq: u64,
        expected: String,
        actual: String,
    },

    /// An earlier write failed part-way; the file tail can no longer be
    /// trusted to match the chain tip, so the log refuses further appends.
    #[error("audit log at {path} is unusable after a failed write")]
    Unavailable { path: PathBuf },

    /// Another writer panicked while holding the log lock.
    #[error("audit log lock poisoned")]
    Poisoned,
}
