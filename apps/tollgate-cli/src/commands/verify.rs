// verify.rs — `tollgate verify`: offline authorization check.

use std::path::PathBuf;

use clap::Args;
use tollgate_policy::{Authorization, EngineConfig, Intent, PolicyEngine, State};

use super::read_json;

#[derive(Args)]
pub struct VerifyArgs {
    /// Engine config (TOML); supplies the signing secret.
    #[arg(long)]
    config: PathBuf,
    /// Current state document (JSON).
    #[arg(long)]
    state: PathBuf,
    /// The intent the authorization was issued for (JSON).
    #[arg(long)]
    intent: PathBuf,
    /// The authorization to check (JSON).
    #[arg(long)]
    authorization: PathBuf,
    /// Unix seconds to check expiry against (defaults to the system clock).
    #[arg(long)]
    now: Option<u64>,
}

pub fn execute(args: &VerifyArgs) -> anyhow::Result<()> {
    let engine = PolicyEngine::new(EngineConfig::load(&args.config)?)?;

    let intent: Intent = read_json(&args.intent, "intent")?;
    let state: State = read_json(&args.state, "state")?;
    let authorization: Authorization = read_json(&args.authorization, "authorization")?;
    let now = args
        .now
        .unwrap_or_else(|| u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0));

    let result = engine.verify_authorization(&intent, &authorization, &state, now);
    println!("{}", serde_json::to_string_pretty(&result)?);

    if !result.valid {
        let reason = result.reason.map(|r| r.as_str()).unwrap_or("UNKNOWN");
        anyhow::bail!("authorization rejected: {}", reason);
    }
    Ok(())
}
