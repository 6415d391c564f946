// constraints/mod.rs — The constraint modules and their fixed orderings.
//
// Each constraint is a pure function of (Intent, State). It may propose a
// delta over the subtree it owns, for the evaluated agent only; it never
// mutates its inputs. The engine runs them in one of two fixed orders.

mod allowlist;
mod budget;
mod concurrency;
mod kill_switch;
mod recursion;
mod replay;
mod tool_amplification;
mod velocity;

pub use allowlist::Allowlist;
pub use budget::Budget;
pub use concurrency::ConcurrencyLease;
pub use kill_switch::KillSwitch;
pub use recursion::RecursionDepth;
pub use replay::Replay;
pub use tool_amplification::ToolAmplification;
pub use velocity::Velocity;

use crate::intent::{Intent, IntentKind};
use crate::reason::PolicyResult;
use crate::state::State;

/// One safety constraint over `(Intent, State)`.
pub trait Constraint: Sync {
    /// Stable name used in logs.
    fn name(&self) -> &'static str;

    fn check(&self, intent: &Intent, state: &State) -> PolicyResult;
}

/// Order for EXECUTE intents.
///
/// KillSwitch and Allowlist come first so a halted or out-of-scope agent is
/// denied before anything is counted. Replay precedes every constraint that
/// writes a delta, so a replayed intent cannot consume budget, velocity or a
/// concurrency slot.
pub const EXECUTE_ORDER: &[&dyn Constraint] = &[
    &KillSwitch,
    &Allowlist,
    &Replay,
    &RecursionDepth,
    &ConcurrencyLease,
    &Budget,
    &Velocity,
];

/// Order for RELEASE intents. Replay runs before ConcurrencyLease so a
/// replayed RELEASE cannot free a slot twice.
pub const RELEASE_ORDER: &[&dyn Constraint] = &[&KillSwitch, &Replay, &ConcurrencyLease];

/// The constraint sequence for `kind`. With `tool_amplification` set,
/// ToolAmplification runs after the EXECUTE order; RELEASE is unaffected.
pub fn pipeline(kind: IntentKind, tool_amplification: bool) -> Vec<&'static dyn Constraint> {
    match kind {
        IntentKind::Release => RELEASE_ORDER.to_vec(),
        IntentKind::Execute => {
            let mut order = EXECUTE_ORDER.to_vec();
            if tool_amplification {
                order.push(&ToolAmplification);
            }
            order
        }
    }
}

/// Shared fixtures for constraint and engine unit tests.
#[cfg(test)]
pub(crate) mod fixtures {
    use std::collections::BTreeMap;

    use crate::intent::{ActionType, Intent};
    use crate::state::*;
    use crate::units::Amount;

    pub const AGENT: &str = "agent-1";
    pub const NOW: u64 = 1_700_000_000;

    pub fn state() -> State {
        let one = |v: u32| BTreeMap::from([(AGENT.to_string(), v)]);
        State {
            policy_version: "v0.2".into(),
            period_id: "2026-02".into(),
            kill_switch: KillSwitchState::default(),
            allowlists: Allowlists::default(),
            budget: BudgetState {
                budget_limit: BTreeMap::from([(AGENT.to_string(), Amount(10_000))]),
                spent_in_period: BTreeMap::from([(AGENT.to_string(), Amount(0))]),
            },
            max_amount_per_action: BTreeMap::from([(AGENT.to_string(), Amount(9_999))]),
            velocity: VelocityState {
                config: VelocityConfig {
                    window_seconds: 60,
                    max_actions: 100,
                },
                counters: BTreeMap::new(),
            },
            replay: ReplayState {
                window_seconds: 3600,
                max_nonces_per_agent: 256,
                nonces: BTreeMap::new(),
            },
            concurrency: ConcurrencyState {
                max_concurrent: one(2),
                active: BTreeMap::new(),
                active_auths: BTreeMap::new(),
            },
            recursion: RecursionState { max_depth: one(2) },
            tool_limits: Some(ToolLimitsState {
                window_seconds: 60,
                max_calls: BTreeMap::from([(AGENT.to_string(), 2)]),
                max_calls_by_tool: None,
                calls: BTreeMap::new(),
            }),
            extra: BTreeMap::new(),
        }
    }

    pub fn intent(nonce: u64) -> Intent {
        Intent::new(
            format!("intent-{}", nonce),
            AGENT,
            ActionType::Payment,
            1u64,
            "merchant:coffee",
            NOW,
            nonce,
        )
        .with_asset("USDC")
        .with_metadata_hash(format!("0x{}", "0".repeat(64)))
        .with_signature("sig")
    }

    /// Apply an ALLOW delta the way the engine does.
    pub fn apply(state: &State, delta: &serde_json::Value) -> State {
        let base = serde_json::to_value(state).unwrap();
        serde_json::from_value(crate::merge::merge(&base, delta)).unwrap()
    }
}
