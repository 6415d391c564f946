use crate::constraints::Constraint;
use crate::intent::Intent;
use crate::reason::{PolicyResult, ReasonCode};
use crate::state::State;

/// Caps how deep an agent's calling chain may go. Depth equal to the max is allowed.
pub struct RecursionDepth;

impl Constraint for RecursionDepth {
    fn name(&self) -> &'static str {
        "recursion_depth"
    }

    fn check(&self, intent: &Intent, state: &State) -> PolicyResult {
        match state.recursion.max_depth.get(&intent.agent_id) {
            None => PolicyResult::deny(ReasonCode::StateInvalid),
            Some(&max) if intent.depth > max => {
                PolicyResult::deny(ReasonCode::RecursionDepthExceeded)
            }
            Some(_) => PolicyResult::allow(),
        }
    }
}
