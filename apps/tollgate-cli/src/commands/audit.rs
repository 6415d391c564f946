// audit.rs — Audit subcommands: verify, tail.

use std::path::PathBuf;

use clap::Subcommand;
use tollgate_audit::{AuditError, AuditLog, AuditRecord};

#[derive(Subcommand)]
pub enum AuditCommands {
    /// Verify the audit log hash chain integrity.
    Verify {
        /// Path to the JSONL audit log.
        #[arg(long)]
        log: PathBuf,
    },
    /// Show recent audit entries.
    Tail {
        /// Path to the JSONL audit log.
        #[arg(long)]
        log: PathBuf,
        /// Number of entries to show.
        #[arg(short, default_value = "10")]
        n: usize,
    },
}

pub fn execute(cmd: &AuditCommands) -> anyhow::Result<()> {
    match cmd {
        AuditCommands::Verify { log } => {
            if !log.exists() {
                println!("No audit log found at {}", log.display());
                return Ok(());
            }

            match AuditLog::verify_chain(log) {
                Ok(count) => {
                    println!("Audit log verified: {} entry(ies), hash chain intact.", count);
                }
                Err(AuditError::IntegrityViolation {
                    seq,
                    expected,
                    actual,
                }) => {
                    println!("INTEGRITY VIOLATION at seq {}:", seq);
                    println!("  Expected: {}", expected);
                    println!("  Actual:   {}", actual);
                    println!();
                    println!("The audit log may have been tampered with.");
                    anyhow::bail!("Audit log integrity check failed");
                }
                Err(e) => return Err(e.into()),
            }
        }

        AuditCommands::Tail { log, n } => {
            if !log.exists() {
                println!("No audit log found at {}", log.display());
                return Ok(());
            }

            let entries = AuditLog::read_all(log)?;
            let start = entries.len().saturating_sub(*n);
            let recent = &entries[start..];

            if recent.is_empty() {
                println!("No audit entries.");
                return Ok(());
            }

            println!("{:<6} {:<20} {:<16} {:<12} DETAIL", "SEQ", "TIMESTAMP", "TYPE", "INTENT");
            println!("{}", "-".repeat(80));

            for entry in recent {
                let (timestamp, intent_hash, detail) = describe(&entry.record);
                println!(
                    "{:<6} {:<20} {:<16} {:<12} {}",
                    entry.seq,
                    format_timestamp(timestamp),
                    entry.record.kind(),
                    short(intent_hash),
                    detail,
                );
            }
        }
    }

    Ok(())
}

fn describe(record: &AuditRecord) -> (u64, &str, String) {
    match record {
        AuditRecord::IntentReceived {
            intent_hash,
            agent_id,
            timestamp,
        } => (*timestamp, intent_hash.as_str(), format!("agent={}", agent_id)),
        AuditRecord::Decision {
            intent_hash,
            decision,
            reasons,
            timestamp,
            ..
        } => {
            let detail = if reasons.is_empty() {
                decision.clone()
            } else {
                format!("{} {}", decision, reasons.join(","))
            };
            (*timestamp, intent_hash.as_str(), detail)
        }
        AuditRecord::AuthEmitted {
            authorization_id,
            intent_hash,
            expires_at,
            timestamp,
        } => (
            *timestamp,
            intent_hash.as_str(),
            format!("auth={} expires_at={}", short(authorization_id), expires_at),
        ),
    }
}

fn format_timestamp(secs: u64) -> String {
    i64::try_from(secs)
        .ok()
        .and_then(|s| chrono::DateTime::from_timestamp(s, 0))
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| secs.to_string())
}

fn short(hash: &str) -> &str {
    hash.get(..12).unwrap_or(hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_are_shortened_for_display() {
        assert_eq!(short("0123456789abcdef"), "0123456789ab");
        assert_eq!(short("abc"), "abc");
    }

    #[test]
    fn timestamps_render_as_utc() {
        assert_eq!(format_timestamp(0), "1970-01-01 00:00:00");
        assert_eq!(format_timestamp(u64::MAX), u64::MAX.to_string());
    }

    #[test]
    fn decision_detail_lists_reasons() {
        let (_, _, detail) = describe(&AuditRecord::Decision {
            intent_hash: "h".into(),
            decision: "DENY".into(),
            reasons: vec!["KILL_SWITCH".into(), "BUDGET_EXCEEDED".into()],
            policy_version: "v1".into(),
            timestamp: 1,
        });
        assert_eq!(detail, "DENY KILL_SWITCH,BUDGET_EXCEEDED");
    }
}
