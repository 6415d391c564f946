// Shared fixtures for the integration tests.

#![allow(dead_code)]

use serde_json::{json, Value};
use tollgate_policy::{ActionType, EngineConfig, Intent, PolicyEngine, State};

pub const AGENT: &str = "agent-A";
pub const VERSION: &str = "0.1.0";
pub const NOW: u64 = 1_771_800_000;
pub const TTL: u64 = 60;

pub fn config() -> EngineConfig {
    EngineConfig::new(VERSION, "integration-secret", TTL)
}

pub fn engine() -> PolicyEngine {
    PolicyEngine::new(config()).unwrap()
}

/// A period ledger as a caller would store it.
pub fn state_document() -> Value {
    json!({
        "policy_version": VERSION,
        "period_id": "2026-02-23",
        "kill_switch": { "global": false, "agents": {} },
        "allowlists": {
            "action_types": ["PAYMENT"],
            "assets": ["USDC"],
            "targets": ["merchant:coffee"]
        },
        "budget": {
            "budget_limit": { AGENT: "10000000" },
            "spent_in_period": { AGENT: "0" }
        },
        "max_amount_per_action": { AGENT: "6000000" },
        "velocity": {
            "config": { "window_seconds": 60, "max_actions": 3 },
            "counters": {}
        },
        "replay": { "window_seconds": 3600, "max_nonces_per_agent": 256, "nonces": {} },
        "concurrency": { "max_concurrent": { AGENT: 2 }, "active": {}, "active_auths": {} },
        "recursion": { "max_depth": { AGENT: 5 } }
    })
}

pub fn state() -> State {
    State::from_json_str(&state_document().to_string()).unwrap()
}

pub fn payment(nonce: u64, amount: u64) -> Intent {
    payment_at(nonce, amount, NOW)
}

pub fn payment_at(nonce: u64, amount: u64, timestamp: u64) -> Intent {
    Intent::new(
        format!("intent-{}", nonce),
        AGENT,
        ActionType::Payment,
        amount,
        "merchant:coffee",
        timestamp,
        nonce,
    )
    .with_asset("USDC")
    .with_metadata_hash(format!("0x{}", "0".repeat(64)))
    .with_signature("agent-signature-placeholder")
}
