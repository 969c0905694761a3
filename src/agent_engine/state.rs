use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle of one control-loop run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum LoopStatus {
    /// Currently executing the given 0-based step.
    Running(u32),
    Done,
    Aborted(AbortReason),
}

impl LoopStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, LoopStatus::Running(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AbortReason {
    CaptureFailed,
    StepLimit,
    Cancelled,
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AbortReason::CaptureFailed => "capture-failed",
            AbortReason::StepLimit => "step-limit",
            AbortReason::Cancelled => "cancelled",
        })
    }
}

/// Per-run loop bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopState {
    pub task: String,
    pub step_index: u32,
    pub done: bool,
}

impl LoopState {
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            step_index: 0,
            done: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abort_reasons_display_kebab_case() {
        assert_eq!(AbortReason::CaptureFailed.to_string(), "capture-failed");
        assert_eq!(AbortReason::StepLimit.to_string(), "step-limit");
        assert_eq!(AbortReason::Cancelled.to_string(), "cancelled");
    }

    #[test]
    fn status_serializes_with_reason() {
        let json = serde_json::to_string(&LoopStatus::Aborted(AbortReason::StepLimit)).unwrap();
        assert_eq!(json, r#"{"state":"aborted","detail":"step-limit"}"#);
        assert!(!LoopStatus::Running(3).is_terminal());
        assert!(LoopStatus::Done.is_terminal());
    }
}
