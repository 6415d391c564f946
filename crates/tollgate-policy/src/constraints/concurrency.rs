use serde_json::json;

use crate::constraints::Constraint;
use crate::intent::{Intent, IntentKind};
use crate::reason::{PolicyResult, ReasonCode};
use crate::state::State;

/// Lease accounting for in-flight actions.
///
/// EXECUTE takes a slot (the engine later binds it to the issued
/// authorization id). RELEASE must name a lease the agent holds; it removes
/// the lease and frees the slot. `active[agent]` only changes here, so it
/// tracks the number of live leases.
pub struct ConcurrencyLease;

impl Constraint for ConcurrencyLease {
    fn name(&self) -> &'static str {
        "concurrency_lease"
    }

    fn check(&self, intent: &Intent, state: &State) -> PolicyResult {
        let agent = intent.agent_id.as_str();
        let Some(&max) = state.concurrency.max_concurrent.get(agent) else {
            return PolicyResult::deny(ReasonCode::StateInvalid);
        };
        let active = state.active(agent);

        match intent.kind {
            IntentKind::Release => {
                let Some(auth_id) = intent.authorization_id.as_deref() else {
                    return PolicyResult::deny(ReasonCode::ConcurrencyReleaseInvalid);
                };
                let held = state
                    .leases(agent)
                    .is_some_and(|leases| leases.contains_key(auth_id));
                if !held {
                    return PolicyResult::deny(ReasonCode::ConcurrencyReleaseInvalid);
                }

                PolicyResult::allow_with(json!({
                    "concurrency": {
                        "active": { agent: active.saturating_sub(1) },
                        "active_auths": { agent: { auth_id: null } }
                    }
                }))
            }
            IntentKind::Execute => {
                if active >= max {
                    return PolicyResult::deny(ReasonCode::ConcurrencyLimitExceeded);
                }
                PolicyResult::allow_with(json!({
                    "concurrency": { "active": { agent: active + 1 } }
                }))
            }
        }
    }
}
