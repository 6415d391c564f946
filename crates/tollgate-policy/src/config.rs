// config.rs — Engine configuration.
//
// Loaded once at construction, usually from a TOML file:
//
//   policy_version = "v0.2"
//   authorization_ttl_seconds = 60
//   deny_mode = "collect-all"       # optional, default "fail-fast"
//   tool_amplification = true       # optional, default false
//   # engine_secret = "..."         # or TOLLGATE_ENGINE_SECRET
//
// The secret is never serialized or printed.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Deserializer};

use crate::error::PolicyError;

/// Environment variable consulted when the config file has no secret.
pub const SECRET_ENV_VAR: &str = "TOLLGATE_ENGINE_SECRET";

/// How the engine treats the first DENY.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum DenyMode {
    /// Stop at the first DENY in pipeline order.
    #[default]
    FailFast,
    /// Run every constraint and report the union of reasons.
    CollectAll,
}

/// HMAC key material. Redacted in `Debug`; not serializable.
#[derive(Clone)]
pub struct EngineSecret(String);

impl EngineSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub(crate) fn expose(&self) -> &str {
        &self.0
    }

    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for EngineSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EngineSecret(<redacted>)")
    }
}

impl<'de> Deserialize<'de> for EngineSecret {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(EngineSecret)
    }
}

/// Engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Must equal `State.policy_version` for any evaluation to proceed.
    pub policy_version: String,

    /// Optional in the file; see [`SECRET_ENV_VAR`].
    #[serde(default)]
    pub engine_secret: Option<EngineSecret>,

    /// Lifetime of issued authorizations, added to the intent timestamp.
    pub authorization_ttl_seconds: u64,

    #[serde(default)]
    pub deny_mode: DenyMode,

    /// Append ToolAmplification to the EXECUTE pipeline.
    #[serde(default)]
    pub tool_amplification: bool,
}

impl EngineConfig {
    pub fn new(
        policy_version: impl Into<String>,
        engine_secret: impl Into<String>,
        authorization_ttl_seconds: u64,
    ) -> Self {
        Self {
            policy_version: policy_version.into(),
            engine_secret: Some(EngineSecret::new(engine_secret)),
            authorization_ttl_seconds,
            deny_mode: DenyMode::FailFast,
            tool_amplification: false,
        }
    }

    pub fn with_deny_mode(mut self, mode: DenyMode) -> Self {
        self.deny_mode = mode;
        self
    }

    pub fn with_tool_amplification(mut self, enabled: bool) -> Self {
        self.tool_amplification = enabled;
        self
    }

    /// Read and validate a TOML config file, falling back to the
    /// environment for the secret.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PolicyError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| PolicyError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?.with_env_secret(std::env::var(SECRET_ENV_VAR).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse without consulting the environment or validating.
    pub fn from_toml_str(text: &str) -> Result<Self, PolicyError> {
        Ok(toml::from_str(text)?)
    }

    /// Fill in the secret from `env_value` if the file did not set one.
    pub fn with_env_secret(mut self, env_value: Option<String>) -> Self {
        if self.engine_secret.is_none() {
            self.engine_secret = env_value.map(EngineSecret::new);
        }
        self
    }

    /// Reject configs the engine cannot run with.
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.policy_version.trim().is_empty() {
            return Err(PolicyError::InvalidConfig {
                reason: "policy_version must not be empty".into(),
            });
        }
        match &self.engine_secret {
            Some(secret) if !secret.is_empty() => Ok(()),
            _ => Err(PolicyError::MissingSecret {
                env_var: SECRET_ENV_VAR,
            }),
        }
    }
}
