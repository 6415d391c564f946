// reason.rs — Decision vocabulary shared by constraints, engine and verifier.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Final outcome of an evaluation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn as_str(self) -> &'static str {
        match self {
            Decision::Allow => "ALLOW",
            Decision::Deny => "DENY",
        }
    }
}

/// Closed set of reasons for a DENY or a failed verification.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    StateInvalid,
    PolicyVersionMismatch,
    KillSwitch,
    AllowlistViolation,
    PerActionCapExceeded,
    BudgetExceeded,
    VelocityExceeded,
    ReplayNonce,
    RecursionDepthExceeded,
    ConcurrencyLimitExceeded,
    ConcurrencyReleaseInvalid,
    ToolCallLimitExceeded,
    InternalError,
    // Authorization verification only.
    AuthIntentMismatch,
    AuthExpired,
    AuthSignatureInvalid,
}

impl ReasonCode {
    /// Wire name, e.g. `"BUDGET_EXCEEDED"`.
    pub fn as_str(self) -> &'static str {
        match self {
            ReasonCode::StateInvalid => "STATE_INVALID",
            ReasonCode::PolicyVersionMismatch => "POLICY_VERSION_MISMATCH",
            ReasonCode::KillSwitch => "KILL_SWITCH",
            ReasonCode::AllowlistViolation => "ALLOWLIST_VIOLATION",
            ReasonCode::PerActionCapExceeded => "PER_ACTION_CAP_EXCEEDED",
            ReasonCode::BudgetExceeded => "BUDGET_EXCEEDED",
            ReasonCode::VelocityExceeded => "VELOCITY_EXCEEDED",
            ReasonCode::ReplayNonce => "REPLAY_NONCE",
            ReasonCode::RecursionDepthExceeded => "RECURSION_DEPTH_EXCEEDED",
            ReasonCode::ConcurrencyLimitExceeded => "CONCURRENCY_LIMIT_EXCEEDED",
            ReasonCode::ConcurrencyReleaseInvalid => "CONCURRENCY_RELEASE_INVALID",
            ReasonCode::ToolCallLimitExceeded => "TOOL_CALL_LIMIT_EXCEEDED",
            ReasonCode::InternalError => "INTERNAL_ERROR",
            ReasonCode::AuthIntentMismatch => "AUTH_INTENT_MISMATCH",
            ReasonCode::AuthExpired => "AUTH_EXPIRED",
            ReasonCode::AuthSignatureInvalid => "AUTH_SIGNATURE_INVALID",
        }
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single constraint's verdict over `(Intent, State)`.
#[derive(Debug, Clone, PartialEq)]
pub enum PolicyResult {
    /// Proceed, optionally proposing a partial state delta. The delta only
    /// touches the subtree the constraint owns, for the evaluated agent.
    Allow { delta: Option<Value> },
    /// Stop, with at least one reason.
    Deny { reasons: Vec<ReasonCode> },
}

impl PolicyResult {
    pub fn allow() -> Self {
        PolicyResult::Allow { delta: None }
    }

    pub fn allow_with(delta: Value) -> Self {
        PolicyResult::Allow { delta: Some(delta) }
    }

    pub fn deny(reason: ReasonCode) -> Self {
        PolicyResult::Deny {
            reasons: vec![reason],
        }
    }

    pub fn is_allow(&self) -> bool {
        matches!(self, PolicyResult::Allow { .. })
    }

    /// Reasons carried by a DENY; empty for ALLOW.
    pub fn reasons(&self) -> &[ReasonCode] {
        match self {
            PolicyResult::Allow { .. } => &[],
            PolicyResult::Deny { reasons } => reasons,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_match_serde() {
        for code in [
            ReasonCode::StateInvalid,
            ReasonCode::KillSwitch,
            ReasonCode::ConcurrencyReleaseInvalid,
            ReasonCode::AuthSignatureInvalid,
        ] {
            let json = serde_json::to_value(code).unwrap();
            assert_eq!(json, code.as_str());
        }
        assert_eq!(serde_json::to_value(Decision::Allow).unwrap(), "ALLOW");
    }

    #[test]
    fn deny_carries_reasons() {
        let verdict = PolicyResult::deny(ReasonCode::ReplayNonce);
        assert!(!verdict.is_allow());
        assert_eq!(verdict.reasons(), &[ReasonCode::ReplayNonce]);
        assert!(PolicyResult::allow().reasons().is_empty());
    }
}
