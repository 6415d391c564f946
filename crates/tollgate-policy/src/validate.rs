// validate.rs — Fail-closed validation of intents and state.
//
// Runs before any constraint. Every failure here is reported to the caller
// as DENY STATE_INVALID; the variant only feeds the log line.
//
// Structure is checked section by section so the log names the first
// defect, then the document is deserialized into a typed State. Per-agent
// configuration is only required for the agent being evaluated.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::intent::Intent;
use crate::state::State;

/// Why a state or intent is not trustworthy.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("RELEASE intent carries no authorization_id")]
    ReleaseWithoutAuthorization,

    #[error("state document is not an object")]
    NotAnObject,

    #[error("missing state field '{0}'")]
    MissingField(String),

    #[error("state field '{path}' has the wrong shape: expected {expected}")]
    WrongShape {
        path: String,
        expected: &'static str,
    },

    #[error("no {section} configured for agent '{agent_id}'")]
    MissingAgentConfig {
        section: &'static str,
        agent_id: String,
    },

    #[error("state document does not deserialize: {0}")]
    Malformed(String),
}

/// Intent-level checks.
pub fn validate_intent(intent: &Intent) -> Result<(), ValidationError> {
    if intent.is_release()
        && intent
            .authorization_id
            .as_deref()
            .map_or(true, str::is_empty)
    {
        return Err(ValidationError::ReleaseWithoutAuthorization);
    }
    Ok(())
}

/// Walk the required sections of an untyped state document and, if they are
/// all present with the right shape, deserialize it.
pub fn validate_document(doc: &Value) -> Result<State, ValidationError> {
    let root = doc.as_object().ok_or(ValidationError::NotAnObject)?;

    expect_string(root, "", "policy_version")?;
    expect_string(root, "", "period_id")?;

    let kill_switch = expect_object(root, "", "kill_switch")?;
    expect_bool(kill_switch, "kill_switch", "global")?;
    expect_object(kill_switch, "kill_switch", "agents")?;

    expect_object(root, "", "allowlists")?;

    let budget = expect_object(root, "", "budget")?;
    expect_object(budget, "budget", "budget_limit")?;
    expect_object(budget, "budget", "spent_in_period")?;

    expect_object(root, "", "max_amount_per_action")?;

    let velocity = expect_object(root, "", "velocity")?;
    let config = expect_object(velocity, "velocity", "config")?;
    expect_number(config, "velocity.config", "window_seconds")?;
    expect_number(config, "velocity.config", "max_actions")?;
    expect_object(velocity, "velocity", "counters")?;

    let replay = expect_object(root, "", "replay")?;
    expect_number(replay, "replay", "window_seconds")?;
    expect_number(replay, "replay", "max_nonces_per_agent")?;
    expect_object(replay, "replay", "nonces")?;

    let concurrency = expect_object(root, "", "concurrency")?;
    expect_object(concurrency, "concurrency", "max_concurrent")?;
    expect_object(concurrency, "concurrency", "active")?;
    expect_object(concurrency, "concurrency", "active_auths")?;

    let recursion = expect_object(root, "", "recursion")?;
    expect_object(recursion, "recursion", "max_depth")?;

    serde_json::from_value(doc.clone()).map_err(|e| ValidationError::Malformed(e.to_string()))
}

/// Per-agent configuration the pipeline cannot run without.
pub fn validate_agent_config(state: &State, agent_id: &str) -> Result<(), ValidationError> {
    let missing = |section: &'static str| ValidationError::MissingAgentConfig {
        section,
        agent_id: agent_id.to_string(),
    };

    if !state.budget.budget_limit.contains_key(agent_id) {
        return Err(missing("budget.budget_limit"));
    }
    if !state.max_amount_per_action.contains_key(agent_id) {
        return Err(missing("max_amount_per_action"));
    }
    if !state.concurrency.max_concurrent.contains_key(agent_id) {
        return Err(missing("concurrency.max_concurrent"));
    }
    if !state.recursion.max_depth.contains_key(agent_id) {
        return Err(missing("recursion.max_depth"));
    }
    Ok(())
}

fn join(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

fn field<'a>(map: &'a Map<String, Value>, parent: &str, key: &str) -> Result<&'a Value, ValidationError> {
    map.get(key)
        .ok_or_else(|| ValidationError::MissingField(join(parent, key)))
}

fn expect_object<'a>(
    map: &'a Map<String, Value>,
    parent: &str,
    key: &str,
) -> Result<&'a Map<String, Value>, ValidationError> {
    field(map, parent, key)?
        .as_object()
        .ok_or_else(|| ValidationError::WrongShape {
            path: join(parent, key),
            expected: "object",
        })
}

fn expect_string(map: &Map<String, Value>, parent: &str, key: &str) -> Result<(), ValidationError> {
    shape(field(map, parent, key)?.is_string(), parent, key, "string")
}

fn expect_bool(map: &Map<String, Value>, parent: &str, key: &str) -> Result<(), ValidationError> {
    shape(field(map, parent, key)?.is_boolean(), parent, key, "boolean")
}

fn expect_number(map: &Map<String, Value>, parent: &str, key: &str) -> Result<(), ValidationError> {
    shape(field(map, parent, key)?.is_u64(), parent, key, "unsigned integer")
}

fn shape(ok: bool, parent: &str, key: &str, expected: &'static str) -> Result<(), ValidationError> {
    if ok {
        Ok(())
    } else {
        Err(ValidationError::WrongShape {
            path: join(parent, key),
            expected,
        })
    }
}
