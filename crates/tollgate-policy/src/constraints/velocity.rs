use serde_json::json;

use crate::constraints::Constraint;
use crate::intent::Intent;
use crate::reason::{PolicyResult, ReasonCode};
use crate::state::{State, VelocityCounter};

/// Fixed-window action counter, one window per agent.
///
/// A request at exactly `window_start + window_seconds` opens a new window.
/// On deny the counter is left where it was.
pub struct Velocity;

impl Constraint for Velocity {
    fn name(&self) -> &'static str {
        "velocity"
    }

    fn check(&self, intent: &Intent, state: &State) -> PolicyResult {
        let config = state.velocity.config;
        let agent = intent.agent_id.as_str();
        let now = intent.timestamp;

        let next = match state.velocity.counters.get(agent) {
            Some(c) if now < c.window_start.saturating_add(config.window_seconds) => VelocityCounter {
                window_start: c.window_start,
                count: c.count.saturating_add(1),
            },
            _ => VelocityCounter {
                window_start: now,
                count: 1,
            },
        };

        if next.count > config.max_actions {
            return PolicyResult::deny(ReasonCode::VelocityExceeded);
        }

        PolicyResult::allow_with(json!({
            "velocity": { "counters": { agent: next } }
        }))
    }
}
