//! # tollgate-policy
//!
//! Deterministic spend-authorization engine for autonomous agents.
//!
//! Before an agent spends money or provisions resources it submits an
//! [`Intent`]. The [`PolicyEngine`] evaluates it against the caller-owned
//! [`State`] ledger through a fixed pipeline of [`constraints`] and returns
//! either DENY with [`ReasonCode`]s or ALLOW with a signed [`Authorization`]
//! and the next state to persist. The authorization can later be checked
//! with [`PolicyEngine::verify_authorization`] without any engine state.
//!
//! ## Key invariants
//!
//! - **Fail closed**: malformed input, a missing agent config or an internal
//!   fault is always a DENY.
//! - **Pure**: the same `(Intent, State)` always yields the same result, and
//!   the caller's state is never touched by [`PolicyEngine::evaluate_pure`].
//! - **Bound authorizations**: the signature commits to the intent hash, the
//!   policy version, the post-pipeline state hash and the expiry.
//!
//! ## Quick Example
//!
//! ```rust,no_run
//! use tollgate_policy::{EngineConfig, EvalOptions, Evaluation, Intent, PolicyEngine, State};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = PolicyEngine::new(EngineConfig::load("tollgate.toml")?)?;
//! let state = State::from_json_str(&std::fs::read_to_string("state.json")?)?;
//! let intent: Intent = serde_json::from_str(&std::fs::read_to_string("intent.json")?)?;
//!
//! match engine.evaluate_pure(&intent, &state, EvalOptions::default()) {
//!     Evaluation::Allow { authorization, next_state } => {
//!         println!("allowed: {}", authorization.authorization_id);
//!         std::fs::write("state.json", next_state.to_json_pretty()?)?;
//!     }
//!     Evaluation::Deny { reasons } => println!("denied: {:?}", reasons),
//! }
//! # Ok(())
//! # }
//! ```

pub mod authorization;
pub mod config;
pub mod constraints;
pub mod engine;
pub mod error;
pub mod intent;
pub mod merge;
pub mod reason;
pub mod state;
pub mod units;
pub mod validate;

pub use authorization::{Authorization, AuthorizationPayload, VerificationResult};
pub use config::{DenyMode, EngineConfig, EngineSecret};
pub use engine::{EvalOptions, Evaluation, Outcome, PolicyEngine};
pub use error::{EngineFault, PolicyError};
pub use intent::{ActionType, Intent, IntentKind};
pub use reason::{Decision, PolicyResult, ReasonCode};
pub use state::State;
pub use units::{Amount, Nonce};
pub use validate::ValidationError;
