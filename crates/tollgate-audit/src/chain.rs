// chain.rs — The audit sink seam and the in-memory hash-chained log.
//
// The policy engine only needs an append-only write interface. Concurrent
// writers are serialized by the sink itself (a Mutex here, and in the file
// log), so the engine can share one sink across threads behind an Arc.

use std::sync::{Mutex, MutexGuard};

use crate::error::AuditError;
use crate::record::{AuditEntry, AuditRecord};

/// Append-only audit destination used by the policy engine.
pub trait AuditSink: Send + Sync {
    /// Seal `record` onto the end of the chain and return the sealed entry.
    fn append(&self, record: AuditRecord) -> Result<AuditEntry, AuditError>;
}

/// In-memory hash-chained audit log.
#[derive(Debug, Default)]
pub struct HashChainedLog {
    entries: Mutex<Vec<AuditEntry>>,
}

impl HashChainedLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all entries, oldest first.
    pub fn entries(&self) -> Result<Vec<AuditEntry>, AuditError> {
        Ok(self.lock()?.clone())
    }

    /// Number of entries written so far.
    pub fn len(&self) -> Result<usize, AuditError> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, AuditError> {
        Ok(self.lock()?.is_empty())
    }

    /// Hash of the newest entry, if any.
    pub fn head(&self) -> Result<Option<String>, AuditError> {
        Ok(self.lock()?.last().map(|e| e.entry_hash.clone()))
    }

    /// Recompute every link and entry hash.
    pub fn verify(&self) -> Result<(), AuditError> {
        verify_entries(&self.lock()?)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<AuditEntry>>, AuditError> {
        self.entries.lock().map_err(|_| AuditError::Poisoned)
    }
}

impl AuditSink for HashChainedLog {
    fn append(&self, record: AuditRecord) -> Result<AuditEntry, AuditError> {
        let mut entries = self.lock()?;
        let previous_hash = entries.last().map(|e| e.entry_hash.clone());
        let entry = AuditEntry::seal(entries.len() as u64, previous_hash, record)?;
        tracing::trace!(seq = entry.seq, kind = entry.record.kind(), "audit entry sealed");
        entries.push(entry.clone());
        Ok(entry)
    }
}

/// Check that `entries` form an unbroken chain starting at seq 0.
pub fn verify_entries(entries: &[AuditEntry]) -> Result<(), AuditError> {
    let mut previous_hash: Option<String> = None;

    for (index, entry) in entries.iter().enumerate() {
        if entry.seq != index as u64 {
            return Err(AuditError::IntegrityViolation {
                seq: entry.seq,
                expected: format!("seq {}", index),
                actual: format!("seq {}", entry.seq),
            });
        }
        if entry.previous_hash != previous_hash {
            return Err(AuditError::IntegrityViolation {
                seq: entry.seq,
                expected: previous_hash.unwrap_or_else(|| "None".to_string()),
                actual: entry
                    .previous_hash
                    .clone()
                    .unwrap_or_else(|| "None".to_string()),
            });
        }
        let expected = entry.expected_hash()?;
        if expected != entry.entry_hash {
            return Err(AuditError::IntegrityViolation {
                seq: entry.seq,
                expected,
                actual: entry.entry_hash.clone(),
            });
        }
        previous_hash = Some(entry.entry_hash.clone());
    }

    Ok(())
}
