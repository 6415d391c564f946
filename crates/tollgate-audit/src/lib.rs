//! # tollgate-audit
//!
//! Append-only, hash-chained audit trail for Tollgate policy decisions.
//!
//! The policy engine reports three kinds of [`AuditRecord`]: the intent it
//! received, the decision it reached, and any authorization it emitted.
//! Records are written through the [`AuditSink`] trait and sealed into
//! [`AuditEntry`] values that link to their predecessor by SHA-256 hash,
//! so inserting, deleting or editing an entry breaks the chain.
//!
//! ## Quick Example
//!
//! ```rust
//! use tollgate_audit::{AuditRecord, AuditSink, HashChainedLog};
//!
//! let log = HashChainedLog::new();
//! log.append(AuditRecord::IntentReceived {
//!     intent_hash: "ab12".into(),
//!     agent_id: "agent-1".into(),
//!     timestamp: 1_700_000_000,
//! })
//! .unwrap();
//! assert!(log.verify().is_ok());
//! ```

pub mod chain;
pub mod error;
pub mod hasher;
pub mod log;
pub mod record;

pub use chain::{AuditSink, HashChainedLog};
pub use error::AuditError;
pub use log::AuditLog;
pub use record::{AuditEntry, AuditRecord};
