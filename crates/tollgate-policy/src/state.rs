// state.rs — The per-policy-period ledger.
//
// Every per-agent map is keyed by agent_id. Maps are BTreeMaps so the
// serialized form is stable. The engine never mutates a caller's State: it
// returns a new value that the caller persists for the next evaluation.
//
// The ledger belongs to the caller, so top-level keys the engine does not
// know about are carried through in `extra`: they come back in the next
// state and are covered by the snapshot hash. Inside the engine's own
// sections an unknown key is a malformed document, since silently dropping
// it would rewrite the caller's ledger.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PolicyError;
use crate::intent::ActionType;
use crate::units::Amount;

/// Full ledger for one policy period.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct State {
    pub policy_version: String,
    pub period_id: String,
    pub kill_switch: KillSwitchState,
    pub allowlists: Allowlists,
    pub budget: BudgetState,
    /// Hard per-action cap, per agent.
    pub max_amount_per_action: BTreeMap<String, Amount>,
    pub velocity: VelocityState,
    pub replay: ReplayState,
    pub concurrency: ConcurrencyState,
    pub recursion: RecursionState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_limits: Option<ToolLimitsState>,
    /// Caller keys outside the engine's schema, kept verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct KillSwitchState {
    pub global: bool,
    pub agents: BTreeMap<String, bool>,
}

/// Optional allow-sets. An absent or empty list leaves that dimension open.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Allowlists {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_types: Option<Vec<ActionType>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assets: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub targets: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct BudgetState {
    pub budget_limit: BTreeMap<String, Amount>,
    pub spent_in_period: BTreeMap<String, Amount>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct VelocityConfig {
    pub window_seconds: u64,
    pub max_actions: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct VelocityCounter {
    pub window_start: u64,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct VelocityState {
    pub config: VelocityConfig,
    pub counters: BTreeMap<String, VelocityCounter>,
}

/// A nonce seen for an agent, stored in its canonical decimal form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct NonceRecord {
    pub nonce: String,
    pub ts: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ReplayState {
    pub window_seconds: u64,
    pub max_nonces_per_agent: usize,
    pub nonces: BTreeMap<String, Vec<NonceRecord>>,
}

/// An outstanding EXECUTE's reservation of a concurrency slot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Lease {
    pub expires_at: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConcurrencyState {
    pub max_concurrent: BTreeMap<String, u32>,
    pub active: BTreeMap<String, u32>,
    /// agent_id → authorization_id → lease.
    pub active_auths: BTreeMap<String, BTreeMap<String, Lease>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RecursionState {
    pub max_depth: BTreeMap<String, u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ToolCallEvent {
    pub ts: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ToolLimitsState {
    pub window_seconds: u64,
    pub max_calls: BTreeMap<String, u64>,
    /// agent_id → tool → cap.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_calls_by_tool: Option<BTreeMap<String, BTreeMap<String, u64>>>,
    pub calls: BTreeMap<String, Vec<ToolCallEvent>>,
}

impl State {
    /// Parse a state document. Any structural problem is an error; callers
    /// that want a DENY instead should go through
    /// [`PolicyEngine::evaluate_document`](crate::PolicyEngine::evaluate_document).
    pub fn from_json_str(json: &str) -> Result<Self, PolicyError> {
        serde_json::from_str(json).map_err(PolicyError::StateParse)
    }

    pub fn to_json_pretty(&self) -> Result<String, PolicyError> {
        serde_json::to_string_pretty(self).map_err(PolicyError::Serialization)
    }

    /// Leases currently held by `agent_id`.
    pub fn leases(&self, agent_id: &str) -> Option<&BTreeMap<String, Lease>> {
        self.concurrency.active_auths.get(agent_id)
    }

    /// Slots currently in use by `agent_id`.
    pub fn active(&self, agent_id: &str) -> u32 {
        self.concurrency.active.get(agent_id).copied().unwrap_or(0)
    }

    /// Period-to-date spend for `agent_id`.
    pub fn spent(&self, agent_id: &str) -> Amount {
        self.budget
            .spent_in_period
            .get(agent_id)
            .copied()
            .unwrap_or(Amount::ZERO)
    }
}
