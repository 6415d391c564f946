// log.rs — Append-only JSONL audit log.
//
// One sealed AuditEntry per line. Each entry carries the hash of the entry
// before it, so tampering with the file (inserting, deleting, or editing
// lines) is detected by `verify_chain`.
//
// Writes go through a BufWriter that is flushed on every append, so a line
// is either on disk when `append` returns Ok or the append reports an error.
// A failed write or flush may leave part of a line in the buffer or the
// file. The buffer is discarded rather than flushed later (which would
// write a line with a reused seq), and the log stops accepting entries.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::chain::{verify_entries, AuditSink};
use crate::error::AuditError;
use crate::record::{AuditEntry, AuditRecord};

/// An append-only audit log backed by a JSONL file.
pub struct AuditLog {
    inner: Mutex<Tip>,
    path: PathBuf,
}

struct Tip {
    /// `None` once a write has failed.
    writer: Option<BufWriter<File>>,
    /// Hash of the last entry written.
    last_hash: Option<String>,
    next_seq: u64,
}

impl AuditLog {
    /// Open (or create) an audit log at the given path.
    ///
    /// An existing file is scanned for its last entry so new entries keep
    /// extending the same chain.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AuditError> {
        let path = path.as_ref().to_path_buf();

        let (last_hash, next_seq) = if path.exists() {
            match Self::read_last_entry(&path)? {
                Some(entry) => (Some(entry.entry_hash), entry.seq + 1),
                None => (None, 0),
            }
        } else {
            (None, 0)
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| AuditError::OpenFailed {
                path: path.clone(),
                source,
            })?;

        Ok(Self {
            inner: Mutex::new(Tip {
                writer: Some(BufWriter::new(file)),
                last_hash,
                next_seq,
            }),
            path,
        })
    }

    /// Read all entries from a log file, oldest first. Blank lines are skipped.
    pub fn read_all(path: impl AsRef<Path>) -> Result<Vec<AuditEntry>, AuditError> {
        let reader = Self::reader(path.as_ref())?;
        let mut entries = Vec::new();

        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            entries.push(serde_json::from_str(&line)?);
        }

        Ok(entries)
    }

    /// Verify the hash chain of a log file.
    ///
    /// Returns the number of verified entries, or an `IntegrityViolation`
    /// naming the first broken entry.
    pub fn verify_chain(path: impl AsRef<Path>) -> Result<usize, AuditError> {
        let entries = Self::read_all(path)?;
        verify_entries(&entries)?;
        Ok(entries.len())
    }

    /// Return the path to the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn reader(path: &Path) -> Result<BufReader<File>, AuditError> {
        let file = File::open(path).map_err(|source| AuditError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(BufReader::new(file))
    }

    fn read_last_entry(path: &Path) -> Result<Option<AuditEntry>, AuditError> {
        let mut last_line: Option<String> = None;
        for line in Self::reader(path)?.lines() {
            let line = line?;
            if !line.trim().is_empty() {
                last_line = Some(line);
            }
        }

        match last_line {
            Some(line) => Ok(Some(serde_json::from_str(&line)?)),
            None => Ok(None),
        }
    }
}

impl AuditSink for AuditLog {
    fn append(&self, record: AuditRecord) -> Result<AuditEntry, AuditError> {
        let mut tip = self.inner.lock().map_err(|_| AuditError::Poisoned)?;

        let entry = AuditEntry::seal(tip.next_seq, tip.last_hash.clone(), record)?;
        let json = serde_json::to_string(&entry)?;

        let Some(writer) = tip.writer.as_mut() else {
            return Err(AuditError::Unavailable {
                path: self.path.clone(),
            });
        };
        if let Err(e) = writeln!(writer, "{}", json).and_then(|()| writer.flush()) {
            if let Some(writer) = tip.writer.take() {
                // into_parts hands back the unflushed bytes instead of
                // writing them on drop.
                let (_file, _unflushed) = writer.into_parts();
            }
            tracing::error!(
                path = %self.path.display(),
                seq = entry.seq,
                error = %e,
                "audit write failed, closing log"
            );
            return Err(AuditError::WriteFailed(e));
        }

        // Advance the tip only once the line is durable.
        tip.last_hash = Some(entry.entry_hash.clone());
        tip.next_seq += 1;

        Ok(entry)
    }
}
