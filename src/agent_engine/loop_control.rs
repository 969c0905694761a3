use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::agent_engine::state::{AbortReason, LoopStatus};

/// Step budget plus the cooperative stop flag set by the Ctrl-C handler.
pub struct LoopController {
    max_steps: u32,
    stop: Arc<AtomicBool>,
}

impl LoopController {
    pub fn new(max_steps: u32) -> Self {
        Self {
            max_steps: max_steps.max(1),
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn max_steps(&self) -> u32 {
        self.max_steps
    }

    /// Shared handle; storing `true` stops the loop before its next step.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    pub fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Status after `step` finished. `finished` is true when the step was `done`.
    pub fn advance(&self, step: u32, finished: bool) -> LoopStatus {
        if finished {
            return LoopStatus::Done;
        }
        let next = step + 1;
        if next >= self.max_steps {
            LoopStatus::Aborted(AbortReason::StepLimit)
        } else {
            LoopStatus::Running(next)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_limit_is_reached_after_last_step() {
        let ctrl = LoopController::new(3);
        assert_eq!(ctrl.advance(0, false), LoopStatus::Running(1));
        assert_eq!(ctrl.advance(1, false), LoopStatus::Running(2));
        assert_eq!(ctrl.advance(2, false), LoopStatus::Aborted(AbortReason::StepLimit));
    }

    #[test]
    fn done_wins_over_step_limit() {
        let ctrl = LoopController::new(1);
        assert_eq!(ctrl.advance(0, true), LoopStatus::Done);
    }

    #[test]
    fn stop_flag_is_shared() {
        let ctrl = LoopController::new(5);
        assert!(!ctrl.stop_requested());
        ctrl.stop_flag().store(true, Ordering::SeqCst);
        assert!(ctrl.stop_requested());
    }
}
