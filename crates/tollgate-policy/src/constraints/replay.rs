use serde_json::json;

use crate::constraints::Constraint;
use crate::intent::Intent;
use crate::reason::{PolicyResult, ReasonCode};
use crate::state::{NonceRecord, State};

/// Per-agent nonce log with time and capacity eviction.
///
/// Entries older than `window_seconds` are pruned before the lookup. After
/// appending, only the newest `max_nonces_per_agent` entries are kept, so
/// under heavy traffic a nonce can be evicted before its window expires and
/// become replayable. That trade-off is part of the contract.
pub struct Replay;

impl Constraint for Replay {
    fn name(&self) -> &'static str {
        "replay"
    }

    fn check(&self, intent: &Intent, state: &State) -> PolicyResult {
        let config = &state.replay;
        let agent = intent.agent_id.as_str();
        let now = intent.timestamp;
        let cutoff = now.saturating_sub(config.window_seconds);
        let nonce = intent.nonce.to_string();

        let mut log: Vec<NonceRecord> = config
            .nonces
            .get(agent)
            .map(|entries| entries.iter().filter(|e| e.ts >= cutoff).cloned().collect())
            .unwrap_or_default();

        if log.iter().any(|e| e.nonce == nonce) {
            return PolicyResult::deny(ReasonCode::ReplayNonce);
        }

        log.push(NonceRecord { nonce, ts: now });
        if log.len() > config.max_nonces_per_agent {
            let excess = log.len() - config.max_nonces_per_agent;
            log.drain(..excess);
        }

        PolicyResult::allow_with(json!({
            "replay": { "nonces": { agent: log } }
        }))
    }
}
