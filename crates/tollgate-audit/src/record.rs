// record.rs — Audit record vocabulary and sealed chain entries.
//
// The engine emits three record types per evaluation. Each record is sealed
// into an AuditEntry carrying its sequence number, the hash of the previous
// entry, and its own hash over (seq, previous_hash, record).

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::hasher;

/// One event reported by the policy engine.
///
/// Decision and reason codes are carried as their wire strings so this crate
/// stays independent of the policy vocabulary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditRecord {
    /// An intent entered evaluation (after validation passed).
    IntentReceived {
        intent_hash: String,
        agent_id: String,
        timestamp: u64,
    },
    /// The engine reached a decision.
    Decision {
        intent_hash: String,
        decision: String,
        reasons: Vec<String>,
        policy_version: String,
        timestamp: u64,
    },
    /// A signed authorization was issued.
    AuthEmitted {
        authorization_id: String,
        intent_hash: String,
        expires_at: u64,
        timestamp: u64,
    },
}

impl AuditRecord {
    /// Wire name of the record type, e.g. `"DECISION"`.
    pub fn kind(&self) -> &'static str {
        match self {
            AuditRecord::IntentReceived { .. } => "INTENT_RECEIVED",
            AuditRecord::Decision { .. } => "DECISION",
            AuditRecord::AuthEmitted { .. } => "AUTH_EMITTED",
        }
    }
}

/// A record sealed into the hash chain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuditEntry {
    /// Position in the chain, starting at 0.
    pub seq: u64,
    /// Hash of the previous entry. `None` for the first entry.
    pub previous_hash: Option<String>,
    /// SHA-256 over the canonical encoding of `(seq, previous_hash, record)`.
    pub entry_hash: String,
    pub record: AuditRecord,
}

impl AuditEntry {
    /// Seal `record` as entry `seq`, linked to `previous_hash`.
    pub fn seal(
        seq: u64,
        previous_hash: Option<String>,
        record: AuditRecord,
    ) -> Result<Self, serde_json::Error> {
        let entry_hash = Self::compute_hash(seq, previous_hash.as_deref(), &record)?;
        Ok(Self {
            seq,
            previous_hash,
            entry_hash,
            record,
        })
    }

    /// Recompute the hash this entry should carry.
    pub fn expected_hash(&self) -> Result<String, serde_json::Error> {
        Self::compute_hash(self.seq, self.previous_hash.as_deref(), &self.record)
    }

    fn compute_hash(
        seq: u64,
        previous_hash: Option<&str>,
        record: &AuditRecord,
    ) -> Result<String, serde_json::Error> {
        hasher::hash_canonical(&json!({
            "seq": seq,
            "previous_hash": previous_hash,
            "record": record,
        }))
    }
}
