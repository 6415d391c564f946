use serde_json::json;

use crate::constraints::Constraint;
use crate::intent::Intent;
use crate::reason::{PolicyResult, ReasonCode};
use crate::state::State;

/// Per-action hard cap, then period-to-date budget.
pub struct Budget;

impl Constraint for Budget {
    fn name(&self) -> &'static str {
        "budget"
    }

    fn check(&self, intent: &Intent, state: &State) -> PolicyResult {
        let agent = intent.agent_id.as_str();

        let Some(&limit) = state.budget.budget_limit.get(agent) else {
            return PolicyResult::deny(ReasonCode::StateInvalid);
        };
        let Some(&cap) = state.max_amount_per_action.get(agent) else {
            return PolicyResult::deny(ReasonCode::StateInvalid);
        };

        if intent.amount > cap {
            return PolicyResult::deny(ReasonCode::PerActionCapExceeded);
        }

        // Overflow exceeds every representable limit.
        let next = match state.spent(agent).checked_add(intent.amount) {
            Some(next) if next <= limit => next,
            _ => return PolicyResult::deny(ReasonCode::BudgetExceeded),
        };

        PolicyResult::allow_with(json!({
            "budget": { "spent_in_period": { agent: next } }
        }))
    }
}
