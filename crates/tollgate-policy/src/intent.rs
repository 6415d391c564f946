// intent.rs — The action an agent asks permission for.

use serde::{Deserialize, Serialize};

use crate::units::{Amount, Nonce};

/// Category of the requested action.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    Payment,
    Purchase,
    Provision,
    OnchainTx,
}

/// Whether the intent starts an action or releases a previously granted lease.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntentKind {
    #[default]
    Execute,
    Release,
}

/// One proposed agent action.
///
/// `timestamp` is the authoritative "now" for the whole evaluation; the
/// engine never reads a clock. `signature` is carried through hashing but
/// not verified here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Intent {
    pub intent_id: String,
    pub agent_id: String,
    pub action_type: ActionType,
    pub amount: Amount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset: Option<String>,
    pub target: String,
    /// Unix seconds.
    pub timestamp: u64,
    pub metadata_hash: String,
    pub nonce: Nonce,
    pub signature: String,
    /// Recursion depth of the calling chain.
    #[serde(default)]
    pub depth: u32,
    #[serde(rename = "type", default)]
    pub kind: IntentKind,
    /// Lease key being released. Required when `kind` is `Release`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization_id: Option<String>,
    /// Marks the intent as a tool invocation subject to amplification limits.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub tool_call: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
}

impl Intent {
    /// Build an EXECUTE intent with the mandatory fields; everything else
    /// takes its default and can be adjusted with the `with_*` builders.
    pub fn new(
        intent_id: impl Into<String>,
        agent_id: impl Into<String>,
        action_type: ActionType,
        amount: impl Into<Amount>,
        target: impl Into<String>,
        timestamp: u64,
        nonce: impl Into<Nonce>,
    ) -> Self {
        Self {
            intent_id: intent_id.into(),
            agent_id: agent_id.into(),
            action_type,
            amount: amount.into(),
            asset: None,
            target: target.into(),
            timestamp,
            metadata_hash: String::new(),
            nonce: nonce.into(),
            signature: String::new(),
            depth: 0,
            kind: IntentKind::Execute,
            authorization_id: None,
            tool_call: false,
            tool: None,
        }
    }

    pub fn with_asset(mut self, asset: impl Into<String>) -> Self {
        self.asset = Some(asset.into());
        self
    }

    pub fn with_metadata_hash(mut self, hash: impl Into<String>) -> Self {
        self.metadata_hash = hash.into();
        self
    }

    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = signature.into();
        self
    }

    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    /// Turn this into a RELEASE of the lease keyed by `authorization_id`.
    pub fn release(mut self, authorization_id: impl Into<String>) -> Self {
        self.kind = IntentKind::Release;
        self.authorization_id = Some(authorization_id.into());
        self
    }

    /// Flag this intent as a call of `tool`.
    pub fn tool_call(mut self, tool: impl Into<String>) -> Self {
        self.tool_call = true;
        self.tool = Some(tool.into());
        self
    }

    pub fn is_release(&self) -> bool {
        self.kind == IntentKind::Release
    }
}
