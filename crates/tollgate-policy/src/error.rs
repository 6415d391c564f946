// error.rs — Error types for the policy subsystem.
//
// None of these ever reach an evaluation caller as an ALLOW: validation
// problems become DENY STATE_INVALID and engine faults become DENY
// INTERNAL_ERROR. PolicyError covers the fallible edges around the engine
// (loading config, parsing documents).

use std::path::PathBuf;
use thiserror::Error;
use tollgate_audit::AuditError;

/// Errors from configuration loading and document handling.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// The engine config file could not be read.
    #[error("failed to read engine config at {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The engine config is not valid TOML for `EngineConfig`.
    #[error("failed to parse engine config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// The engine config parsed but is unusable.
    #[error("invalid engine config: {reason}")]
    InvalidConfig { reason: String },

    /// No engine secret in the config file or the environment.
    #[error("engine secret not configured (set engine_secret or {env_var})")]
    MissingSecret { env_var: &'static str },

    /// A state document does not have the `State` shape.
    #[error("malformed state document: {0}")]
    StateParse(serde_json::Error),

    #[error("serialization error: {0}")]
    Serialization(serde_json::Error),
}

/// Internal failure inside the evaluation pipeline.
///
/// Always converted to DENY `INTERNAL_ERROR` by the engine.
#[derive(Debug, Error)]
pub enum EngineFault {
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("audit append failed: {0}")]
    Audit(#[from] AuditError),
}
