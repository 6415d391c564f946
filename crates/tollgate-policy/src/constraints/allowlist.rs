use crate::constraints::Constraint;
use crate::intent::Intent;
use crate::reason::{PolicyResult, ReasonCode};
use crate::state::State;

/// Membership checks for action type, asset and target.
///
/// Only lists that are present and non-empty are enforced. An intent with no
/// asset is exempt from the asset list. All dimensions are checked; any
/// violation yields a single `ALLOWLIST_VIOLATION`.
pub struct Allowlist;

impl Constraint for Allowlist {
    fn name(&self) -> &'static str {
        "allowlist"
    }

    fn check(&self, intent: &Intent, state: &State) -> PolicyResult {
        let lists = &state.allowlists;
        let mut violated: Vec<&'static str> = Vec::new();

        if let Some(allowed) = enforced(&lists.action_types) {
            if !allowed.contains(&intent.action_type) {
                violated.push("action_type");
            }
        }
        if let (Some(allowed), Some(asset)) = (enforced(&lists.assets), &intent.asset) {
            if !allowed.contains(asset) {
                violated.push("asset");
            }
        }
        if let Some(allowed) = enforced(&lists.targets) {
            if !allowed.contains(&intent.target) {
                violated.push("target");
            }
        }

        if violated.is_empty() {
            PolicyResult::allow()
        } else {
            tracing::debug!(agent_id = %intent.agent_id, dimensions = ?violated, "allowlist violated");
            PolicyResult::deny(ReasonCode::AllowlistViolation)
        }
    }
}

fn enforced<T>(list: &Option<Vec<T>>) -> Option<&[T]> {
    list.as_deref().filter(|l| !l.is_empty())
}
