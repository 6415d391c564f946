use crate::constraints::Constraint;
use crate::intent::Intent;
use crate::reason::{PolicyResult, ReasonCode};
use crate::state::State;

/// Global and per-agent emergency stop.
pub struct KillSwitch;

impl Constraint for KillSwitch {
    fn name(&self) -> &'static str {
        "kill_switch"
    }

    fn check(&self, intent: &Intent, state: &State) -> PolicyResult {
        let switch = &state.kill_switch;
        if switch.global || switch.agents.get(&intent.agent_id).copied().unwrap_or(false) {
            return PolicyResult::deny(ReasonCode::KillSwitch);
        }
        PolicyResult::allow()
    }
}
