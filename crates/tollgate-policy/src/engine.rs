// engine.rs — Policy evaluation engine.
//
// The PolicyEngine is a default-deny decision function over (Intent, State):
//
// 1. Is the intent well-formed and the agent configured? → No → Deny STATE_INVALID
// 2. Does the state's policy_version match ours? → No → Deny POLICY_VERSION_MISMATCH
// 3. Run the constraint pipeline for the intent kind, folding each ALLOW
//    delta into a working copy → any Deny → Deny with the collected reasons
// 4. Hash the merged state, sign the authorization payload
// 5. EXECUTE only: bind the lease to the new authorization id (after the hash)
// 6. Allow with the authorization and the next state
//
// Any fault past step 2 (serialization, audit write) becomes Deny
// INTERNAL_ERROR. Nothing in here can produce an ALLOW by failing.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};

use tollgate_audit::{hasher, AuditRecord, AuditSink, HashChainedLog};

use crate::authorization::{self, Authorization, AuthorizationPayload, Signer, VerificationResult};
use crate::config::{DenyMode, EngineConfig};
use crate::constraints;
use crate::error::{EngineFault, PolicyError};
use crate::intent::{Intent, IntentKind};
use crate::merge::merge;
use crate::reason::{Decision, PolicyResult, ReasonCode};
use crate::state::State;
use crate::validate::{self, ValidationError};

/// Per-call overrides.
#[derive(Debug, Clone, Copy, Default)]
pub struct EvalOptions {
    /// Overrides the configured deny mode for this call.
    pub mode: Option<DenyMode>,
}

impl EvalOptions {
    pub fn mode(mode: DenyMode) -> Self {
        Self { mode: Some(mode) }
    }
}

/// Result of [`PolicyEngine::evaluate_pure`].
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "decision", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Evaluation {
    Allow {
        authorization: Authorization,
        next_state: State,
    },
    Deny { reasons: Vec<ReasonCode> },
}

impl Evaluation {
    fn deny(reason: ReasonCode) -> Self {
        Evaluation::Deny {
            reasons: vec![reason],
        }
    }

    pub fn decision(&self) -> Decision {
        match self {
            Evaluation::Allow { .. } => Decision::Allow,
            Evaluation::Deny { .. } => Decision::Deny,
        }
    }

    pub fn is_allow(&self) -> bool {
        matches!(self, Evaluation::Allow { .. })
    }

    /// Reasons carried by a DENY; empty for ALLOW.
    pub fn reasons(&self) -> &[ReasonCode] {
        match self {
            Evaluation::Allow { .. } => &[],
            Evaluation::Deny { reasons } => reasons,
        }
    }

    pub fn authorization(&self) -> Option<&Authorization> {
        match self {
            Evaluation::Allow { authorization, .. } => Some(authorization),
            Evaluation::Deny { .. } => None,
        }
    }
}

/// Result of [`PolicyEngine::evaluate`]; the next state has already been
/// written to the caller's handle.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "decision", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    Allow { authorization: Authorization },
    Deny { reasons: Vec<ReasonCode> },
}

impl Outcome {
    pub fn is_allow(&self) -> bool {
        matches!(self, Outcome::Allow { .. })
    }

    pub fn reasons(&self) -> &[ReasonCode] {
        match self {
            Outcome::Allow { .. } => &[],
            Outcome::Deny { reasons } => reasons,
        }
    }
}

/// Deterministic spend-authorization engine.
///
/// Holds only its configuration, the signing key and the audit sink. All
/// ledger data lives in the `State` the caller passes in.
pub struct PolicyEngine {
    config: EngineConfig,
    signer: Signer,
    audit: Arc<dyn AuditSink>,
}

impl PolicyEngine {
    /// Engine with an in-memory hash-chained audit log.
    pub fn new(config: EngineConfig) -> Result<Self, PolicyError> {
        Self::with_audit(config, Arc::new(HashChainedLog::new()))
    }

    /// Engine writing its audit trail to `audit`.
    pub fn with_audit(config: EngineConfig, audit: Arc<dyn AuditSink>) -> Result<Self, PolicyError> {
        config.validate()?;
        let signer = match &config.engine_secret {
            Some(secret) => Signer::new(secret),
            None => {
                return Err(PolicyError::MissingSecret {
                    env_var: crate::config::SECRET_ENV_VAR,
                })
            }
        };
        Ok(Self {
            config,
            signer,
            audit,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Evaluate without touching `state`; on ALLOW the caller gets the next
    /// state to persist.
    pub fn evaluate_pure(&self, intent: &Intent, state: &State, options: EvalOptions) -> Evaluation {
        let mode = options.mode.unwrap_or(self.config.deny_mode);

        if let Err(e) = validate::validate_intent(intent)
            .and_then(|()| validate::validate_agent_config(state, &intent.agent_id))
        {
            return self.invalid(intent, e);
        }

        if state.policy_version != self.config.policy_version {
            tracing::warn!(
                intent_id = %intent.intent_id,
                state_version = %state.policy_version,
                engine_version = %self.config.policy_version,
                "policy version mismatch"
            );
            return Evaluation::deny(ReasonCode::PolicyVersionMismatch);
        }

        match self.run(intent, state, mode) {
            Ok(evaluation) => evaluation,
            Err(fault) => {
                tracing::error!(
                    intent_id = %intent.intent_id,
                    error = %fault,
                    "evaluation fault, denying"
                );
                Evaluation::deny(ReasonCode::InternalError)
            }
        }
    }

    /// Evaluate and, on ALLOW, replace `*state` with the next state.
    pub fn evaluate(&self, intent: &Intent, state: &mut State) -> Outcome {
        match self.evaluate_pure(intent, state, EvalOptions::default()) {
            Evaluation::Allow {
                authorization,
                next_state,
            } => {
                *state = next_state;
                Outcome::Allow { authorization }
            }
            Evaluation::Deny { reasons } => Outcome::Deny { reasons },
        }
    }

    /// Evaluate against an untyped state document.
    ///
    /// The document is validated section by section first, so a missing or
    /// mistyped section is DENY STATE_INVALID rather than a parse error.
    pub fn evaluate_document(&self, intent: &Intent, document: &Value, options: EvalOptions) -> Evaluation {
        match validate::validate_document(document) {
            Ok(state) => self.evaluate_pure(intent, &state, options),
            Err(e) => self.invalid(intent, e),
        }
    }

    /// Check a previously issued authorization. Needs no engine state besides
    /// the signing key.
    pub fn verify_authorization(
        &self,
        intent: &Intent,
        authorization: &Authorization,
        state: &State,
        now: u64,
    ) -> VerificationResult {
        let result = authorization::verify(&self.signer, intent, authorization, state, now);
        tracing::debug!(
            authorization_id = %authorization.authorization_id,
            valid = result.valid,
            reason = ?result.reason,
            "verified authorization"
        );
        result
    }

    fn invalid(&self, intent: &Intent, error: ValidationError) -> Evaluation {
        tracing::warn!(
            intent_id = %intent.intent_id,
            agent_id = %intent.agent_id,
            error = %error,
            "rejecting untrustworthy input"
        );
        Evaluation::deny(ReasonCode::StateInvalid)
    }

    fn run(&self, intent: &Intent, state: &State, mode: DenyMode) -> Result<Evaluation, EngineFault> {
        let intent_hash = authorization::intent_hash(intent)?;
        let agent = intent.agent_id.as_str();
        let now = intent.timestamp;

        self.audit.append(AuditRecord::IntentReceived {
            intent_hash: intent_hash.clone(),
            agent_id: agent.to_string(),
            timestamp: now,
        })?;

        // Deltas are merged into the JSON form; the typed copy is rebuilt
        // after each one so later constraints see earlier effects.
        let mut working = serde_json::to_value(state)?;
        let mut typed = state.clone();
        let mut reasons = Vec::new();

        for constraint in constraints::pipeline(intent.kind, self.config.tool_amplification) {
            match constraint.check(intent, &typed) {
                PolicyResult::Allow { delta } => {
                    tracing::debug!(
                        constraint = constraint.name(),
                        has_delta = delta.is_some(),
                        "constraint allowed"
                    );
                    if let Some(delta) = delta {
                        working = merge(&working, &delta);
                        typed = serde_json::from_value(working.clone())?;
                    }
                }
                PolicyResult::Deny { reasons: denied } => {
                    tracing::debug!(
                        constraint = constraint.name(),
                        reasons = ?denied,
                        "constraint denied"
                    );
                    reasons.extend(denied);
                    if mode == DenyMode::FailFast {
                        break;
                    }
                }
            }
        }

        if !reasons.is_empty() {
            tracing::info!(
                intent_id = %intent.intent_id,
                intent_hash = %intent_hash,
                agent_id = %agent,
                reasons = ?reasons,
                "DENY"
            );
            self.audit.append(AuditRecord::Decision {
                intent_hash,
                decision: Decision::Deny.as_str().to_string(),
                reasons: reasons.iter().map(|r| r.as_str().to_string()).collect(),
                policy_version: state.policy_version.clone(),
                timestamp: now,
            })?;
            return Ok(Evaluation::Deny { reasons });
        }

        let state_snapshot_hash = hasher::hash_canonical(&typed)?;
        let expires_at = now.saturating_add(self.config.authorization_ttl_seconds);
        let authorization = self.signer.issue(AuthorizationPayload {
            intent_hash: intent_hash.clone(),
            policy_version: state.policy_version.clone(),
            state_snapshot_hash,
            decision: Decision::Allow,
            expires_at,
        })?;

        // The lease is keyed by the authorization id, and that id is a hash
        // over the signed payload, snapshot hash included. The binding can
        // therefore only be merged after signing, and the snapshot it is
        // checked against never contains the lease itself.
        if intent.kind == IntentKind::Execute {
            let auth_id = authorization.authorization_id.as_str();
            let binding = json!({
                "concurrency": {
                    "active_auths": { agent: { auth_id: { "expires_at": expires_at } } }
                }
            });
            working = merge(&working, &binding);
            typed = serde_json::from_value(working)?;
        }

        self.audit.append(AuditRecord::Decision {
            intent_hash: intent_hash.clone(),
            decision: Decision::Allow.as_str().to_string(),
            reasons: Vec::new(),
            policy_version: state.policy_version.clone(),
            timestamp: now,
        })?;
        self.audit.append(AuditRecord::AuthEmitted {
            authorization_id: authorization.authorization_id.clone(),
            intent_hash,
            expires_at,
            timestamp: now,
        })?;

        tracing::info!(
            intent_id = %intent.intent_id,
            intent_hash = %authorization.intent_hash,
            agent_id = %agent,
            authorization_id = %authorization.authorization_id,
            expires_at,
            "ALLOW"
        );

        Ok(Evaluation::Allow {
            authorization,
            next_state: typed,
        })
    }
}
