//! Planner: one reasoning call per step, turned into a `PlanStep`.
//!
//! `plan` never fails. Rate-limited calls back off and return a fallback
//! command; any other reasoning failure ends the run with `Done`.
pub mod prompt;
pub mod rate_limit;
pub mod reply;

use std::sync::Arc;

use serde::Serialize;

use crate::grammar::{parse_command, Command};
use crate::llm::Reasoner;

pub use rate_limit::{rate_limit_fallback, rate_limit_signal, RateLimit};

/// Used when the reply names no action at all.
pub const NO_ACTION_LINE: &str = "wait(1000)";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanStep {
    pub observation: String,
    pub rationale: String,
    pub action_line: String,
    pub command: Command,
}

impl PlanStep {
    fn fallback(action_line: &str, command: Command) -> Self {
        Self {
            observation: String::new(),
            rationale: String::new(),
            action_line: action_line.to_string(),
            command,
        }
    }
}

pub struct Planner {
    reasoner: Arc<dyn Reasoner>,
}

impl Planner {
    pub fn new(reasoner: Arc<dyn Reasoner>) -> Self {
        Self { reasoner }
    }

    pub async fn plan(&self, task: &str, image_jpeg: &[u8]) -> PlanStep {
        let prompt = prompt::build_prompt(task);
        let text = match self.reasoner.infer(&prompt, image_jpeg).await {
            Ok(text) => text,
            Err(e) => return self.recover(task, &e.to_string()).await,
        };

        let parsed = reply::parse_reply(&text);
        if !parsed.observation.is_empty() {
            tracing::info!(observation = %parsed.observation, "see");
        }
        if !parsed.rationale.is_empty() {
            tracing::info!(rationale = %parsed.rationale, "think");
        }
        let action_line = parsed.action.unwrap_or_else(|| {
            tracing::warn!("reply contained no action; waiting");
            NO_ACTION_LINE.to_string()
        });
        let command = parse_command(&action_line);
        tracing::info!(action = %action_line, command = command.name(), "planned");

        PlanStep {
            observation: parsed.observation,
            rationale: parsed.rationale,
            action_line,
            command,
        }
    }

    async fn recover(&self, task: &str, error: &str) -> PlanStep {
        let Some(limit) = rate_limit_signal(error) else {
            tracing::error!(provider = self.reasoner.name(), error, "reasoning failed; finishing");
            return PlanStep::fallback("done()", Command::Done);
        };

        let backoff = limit.backoff();
        tracing::warn!(
            provider = self.reasoner.name(),
            backoff_ms = backoff.as_millis() as u64,
            "rate limited; backing off"
        );
        tokio::time::sleep(backoff).await;

        let command = rate_limit_fallback(task);
        let line = match &command {
            Command::Hotkey(combo) => format!("hotkey(\"{combo}\")"),
            _ => "done()".to_string(),
        };
        tracing::info!(action = %line, "rate-limit fallback");
        PlanStep::fallback(&line, command)
    }
}
