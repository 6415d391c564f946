// evaluate.rs — `tollgate evaluate`: one evaluation against a state file.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, ValueEnum};
use serde_json::Value;
use tollgate_audit::{AuditLog, AuditSink, HashChainedLog};
use tollgate_policy::{DenyMode, EngineConfig, EvalOptions, Evaluation, Intent, PolicyEngine};

use super::read_json;

#[derive(Clone, Copy, ValueEnum)]
pub enum ModeArg {
    FailFast,
    CollectAll,
}

impl From<ModeArg> for DenyMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::FailFast => DenyMode::FailFast,
            ModeArg::CollectAll => DenyMode::CollectAll,
        }
    }
}

#[derive(Args)]
pub struct EvaluateArgs {
    /// Engine config (TOML).
    #[arg(long)]
    config: PathBuf,
    /// State document (JSON).
    #[arg(long)]
    state: PathBuf,
    /// Intent (JSON).
    #[arg(long)]
    intent: PathBuf,
    /// Override the configured deny mode.
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,
    /// On ALLOW, write the next state back over the state file.
    #[arg(long)]
    write_state: bool,
    /// Append audit records to this JSONL file instead of memory.
    #[arg(long)]
    audit_log: Option<PathBuf>,
}

pub fn execute(args: &EvaluateArgs) -> anyhow::Result<()> {
    let config = EngineConfig::load(&args.config)?;
    let audit: Arc<dyn AuditSink> = match &args.audit_log {
        Some(path) => Arc::new(AuditLog::open(path)?),
        None => Arc::new(HashChainedLog::new()),
    };
    let engine = PolicyEngine::with_audit(config, audit)?;

    let intent: Intent = read_json(&args.intent, "intent")?;
    let document: Value = read_json(&args.state, "state")?;
    let options = EvalOptions {
        mode: args.mode.map(DenyMode::from),
    };

    let evaluation = engine.evaluate_document(&intent, &document, options);
    println!("{}", serde_json::to_string_pretty(&evaluation)?);

    if let (true, Evaluation::Allow { next_state, .. }) = (args.write_state, &evaluation) {
        std::fs::write(&args.state, next_state.to_json_pretty()?)
            .with_context(|| format!("failed to write state to {}", args.state.display()))?;
        tracing::info!(path = %args.state.display(), "state updated");
    }

    Ok(())
}
