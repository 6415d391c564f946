// authorization.rs — Signed authorization artifacts.
//
// On ALLOW the engine signs a payload binding the intent hash, the policy
// version, the post-pipeline state snapshot hash and an expiry. The
// signature is HMAC-SHA256 under the engine secret; the authorization id is
// the content hash of payload + signature.
//
// Verification needs only the intent, the authorization, the caller's state
// and a caller-supplied "now". It never consults engine working state.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use ring::hmac;
use serde::{Deserialize, Serialize};

use tollgate_audit::hasher;

use crate::config::EngineSecret;
use crate::intent::Intent;
use crate::reason::{Decision, ReasonCode};
use crate::state::State;

/// The signed artifact returned with an ALLOW.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Authorization {
    pub authorization_id: String,
    pub intent_hash: String,
    pub policy_version: String,
    /// Hash of the post-pipeline state, taken before the lease binding.
    pub state_snapshot_hash: String,
    pub decision: Decision,
    pub expires_at: u64,
    /// Base64 HMAC-SHA256 tag over the canonical payload.
    pub engine_signature: String,
}

/// The fields covered by the engine signature.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AuthorizationPayload {
    pub intent_hash: String,
    pub policy_version: String,
    pub state_snapshot_hash: String,
    pub decision: Decision,
    pub expires_at: u64,
}

#[derive(Serialize)]
struct SignedPayload<'a> {
    #[serde(flatten)]
    payload: &'a AuthorizationPayload,
    engine_signature: &'a str,
}

impl AuthorizationPayload {
    /// The payload as stored inside an existing authorization.
    pub fn of(authorization: &Authorization) -> Self {
        Self {
            intent_hash: authorization.intent_hash.clone(),
            policy_version: authorization.policy_version.clone(),
            state_snapshot_hash: authorization.state_snapshot_hash.clone(),
            decision: authorization.decision,
            expires_at: authorization.expires_at,
        }
    }
}

/// Outcome of [`verify`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerificationResult {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<ReasonCode>,
}

impl VerificationResult {
    pub fn valid() -> Self {
        Self {
            valid: true,
            reason: None,
        }
    }

    pub fn invalid(reason: ReasonCode) -> Self {
        Self {
            valid: false,
            reason: Some(reason),
        }
    }
}

/// HMAC key derived from the engine secret.
pub(crate) struct Signer {
    key: hmac::Key,
}

impl Signer {
    pub(crate) fn new(secret: &EngineSecret) -> Self {
        Self {
            key: hmac::Key::new(hmac::HMAC_SHA256, secret.expose().as_bytes()),
        }
    }

    /// Sign `payload` and assemble the authorization.
    pub(crate) fn issue(&self, payload: AuthorizationPayload) -> Result<Authorization, serde_json::Error> {
        let message = hasher::to_canonical_string(&payload)?;
        let engine_signature = STANDARD.encode(hmac::sign(&self.key, message.as_bytes()).as_ref());
        let authorization_id = hasher::hash_canonical(&SignedPayload {
            payload: &payload,
            engine_signature: &engine_signature,
        })?;

        Ok(Authorization {
            authorization_id,
            intent_hash: payload.intent_hash,
            policy_version: payload.policy_version,
            state_snapshot_hash: payload.state_snapshot_hash,
            decision: payload.decision,
            expires_at: payload.expires_at,
            engine_signature,
        })
    }

    /// Constant-time check of `signature` over `payload`.
    fn verify(&self, payload: &AuthorizationPayload, signature: &str) -> Result<bool, serde_json::Error> {
        let Ok(tag) = STANDARD.decode(signature) else {
            return Ok(false);
        };
        let message = hasher::to_canonical_string(payload)?;
        Ok(hmac::verify(&self.key, message.as_bytes(), &tag).is_ok())
    }
}

/// Content hash of an intent over its canonical encoding.
pub fn intent_hash(intent: &Intent) -> Result<String, serde_json::Error> {
    hasher::hash_canonical(intent)
}

/// Check an authorization against `intent`, `state` and `now`.
///
/// Checks run in order: intent binding, expiry, policy version, signature.
/// An internal failure reports `INTERNAL_ERROR`, never a valid result.
pub(crate) fn verify(
    signer: &Signer,
    intent: &Intent,
    authorization: &Authorization,
    state: &State,
    now: u64,
) -> VerificationResult {
    match check(signer, intent, authorization, state, now) {
        Ok(()) => VerificationResult::valid(),
        Err(reason) => VerificationResult::invalid(reason),
    }
}

fn check(
    signer: &Signer,
    intent: &Intent,
    authorization: &Authorization,
    state: &State,
    now: u64,
) -> Result<(), ReasonCode> {
    let internal = |e: serde_json::Error| {
        tracing::error!(error = %e, "authorization verification failed internally");
        ReasonCode::InternalError
    };

    if intent_hash(intent).map_err(internal)? != authorization.intent_hash {
        return Err(ReasonCode::AuthIntentMismatch);
    }
    if now > authorization.expires_at {
        return Err(ReasonCode::AuthExpired);
    }
    if state.policy_version != authorization.policy_version {
        return Err(ReasonCode::PolicyVersionMismatch);
    }
    let payload = AuthorizationPayload::of(authorization);
    if !signer
        .verify(&payload, &authorization.engine_signature)
        .map_err(internal)?
    {
        return Err(ReasonCode::AuthSignatureInvalid);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::fixtures::{intent, state};

    fn signer(secret: &str) -> Signer {
        Signer::new(&EngineSecret::new(secret))
    }

    fn issued(signer: &Signer) -> Authorization {
        signer
            .issue(AuthorizationPayload {
                intent_hash: intent_hash(&intent(1)).unwrap(),
                policy_version: "v0.2".into(),
                state_snapshot_hash: "snap".into(),
                decision: Decision::Allow,
                expires_at: 1_700_000_060,
            })
            .unwrap()
    }

    #[test]
    fn issuing_is_deterministic() {
        let s = signer("k");
        assert_eq!(issued(&s), issued(&s));
        assert_eq!(issued(&s).authorization_id.len(), 64);
    }

    #[test]
    fn fresh_authorization_verifies() {
        let s = signer("k");
        let auth = issued(&s);
        assert_eq!(
            verify(&s, &intent(1), &auth, &state(), 1_700_000_060),
            VerificationResult::valid()
        );
    }

    #[test]
    fn checks_report_specific_reasons() {
        let s = signer("k");
        let auth = issued(&s);

        assert_eq!(
            verify(&s, &intent(2), &auth, &state(), 0).reason,
            Some(ReasonCode::AuthIntentMismatch)
        );
        assert_eq!(
            verify(&s, &intent(1), &auth, &state(), 1_700_000_061).reason,
            Some(ReasonCode::AuthExpired)
        );

        let mut other_version = state();
        other_version.policy_version = "v9".into();
        assert_eq!(
            verify(&s, &intent(1), &auth, &other_version, 0).reason,
            Some(ReasonCode::PolicyVersionMismatch)
        );
    }

    #[test]
    fn wrong_secret_fails_signature() {
        let auth = issued(&signer("k"));
        assert_eq!(
            verify(&signer("other"), &intent(1), &auth, &state(), 0).reason,
            Some(ReasonCode::AuthSignatureInvalid)
        );
    }

    #[test]
    fn tampered_payload_fails_signature() {
        let s = signer("k");

        let mut auth = issued(&s);
        auth.state_snapshot_hash = "other".into();
        assert!(!verify(&s, &intent(1), &auth, &state(), 0).valid);

        let mut auth = issued(&s);
        auth.decision = Decision::Deny;
        assert!(!verify(&s, &intent(1), &auth, &state(), 0).valid);

        let mut auth = issued(&s);
        auth.expires_at += 3600;
        assert_eq!(
            verify(&s, &intent(1), &auth, &state(), 0).reason,
            Some(ReasonCode::AuthSignatureInvalid)
        );
    }

    #[test]
    fn garbled_signature_is_invalid_not_an_error() {
        let s = signer("k");
        let mut auth = issued(&s);
        auth.engine_signature = "%%% not base64 %%%".into();
        assert_eq!(
            verify(&s, &intent(1), &auth, &state(), 0).reason,
            Some(ReasonCode::AuthSignatureInvalid)
        );
    }
}
