use serde_json::json;

use crate::constraints::Constraint;
use crate::intent::Intent;
use crate::reason::{PolicyResult, ReasonCode};
use crate::state::{State, ToolCallEvent};

/// Sliding-window cap on tool calls, with optional per-tool sub-caps.
///
/// Only intents flagged `tool_call` are counted. RELEASE is never blocked so
/// leases can always be returned.
pub struct ToolAmplification;

impl Constraint for ToolAmplification {
    fn name(&self) -> &'static str {
        "tool_amplification"
    }

    fn check(&self, intent: &Intent, state: &State) -> PolicyResult {
        if intent.is_release() || !intent.tool_call {
            return PolicyResult::allow();
        }

        let Some(limits) = &state.tool_limits else {
            return PolicyResult::deny(ReasonCode::StateInvalid);
        };
        let agent = intent.agent_id.as_str();
        let Some(&max) = limits.max_calls.get(agent) else {
            return PolicyResult::deny(ReasonCode::StateInvalid);
        };

        let now = intent.timestamp;
        let cutoff = now.saturating_sub(limits.window_seconds);
        let mut events: Vec<ToolCallEvent> = limits
            .calls
            .get(agent)
            .map(|calls| calls.iter().filter(|e| e.ts >= cutoff).cloned().collect())
            .unwrap_or_default();

        if events.len() as u64 + 1 > max {
            return PolicyResult::deny(ReasonCode::ToolCallLimitExceeded);
        }

        let tool_cap = intent.tool.as_deref().and_then(|tool| {
            limits
                .max_calls_by_tool
                .as_ref()
                .and_then(|by_agent| by_agent.get(agent))
                .and_then(|caps| caps.get(tool))
                .map(|&cap| (tool, cap))
        });
        if let Some((tool, cap)) = tool_cap {
            let used = events
                .iter()
                .filter(|e| e.tool.as_deref() == Some(tool))
                .count() as u64;
            if used + 1 > cap {
                return PolicyResult::deny(ReasonCode::ToolCallLimitExceeded);
            }
        }

        events.push(ToolCallEvent {
            ts: now,
            tool: intent.tool.clone(),
        });

        PolicyResult::allow_with(json!({
            "tool_limits": { "calls": { agent: events } }
        }))
    }
}
