use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::agent_engine::history::{StepHistory, StepRecord};
use crate::agent_engine::loop_control::LoopController;
use crate::agent_engine::state::{AbortReason, LoopState, LoopStatus};
use crate::executor::{dispatch, Dispatch, InputExecutor};
use crate::narration::{narration_for, Narrator};
use crate::perception::{CapturedFrame, ScreenCapture};
use crate::planner::{PlanStep, Planner};

pub const DEBUG_SCREENSHOT_FILE: &str = "screenpilot_debug.jpg";

#[derive(Debug)]
pub struct LoopOutcome {
    pub status: LoopStatus,
    pub steps_taken: u32,
    pub history: StepHistory,
}

/// capture → plan → narrate → execute, one step at a time, until the model
/// says `done()`, a capture fails, the step budget runs out or the run is
/// cancelled.
pub struct ControlLoop {
    capture: Arc<dyn ScreenCapture>,
    planner: Planner,
    executor: InputExecutor,
    narrator: Option<Arc<dyn Narrator>>,
    loop_ctrl: LoopController,
    debug_screenshot: Option<PathBuf>,
}

impl ControlLoop {
    pub fn new(
        capture: Arc<dyn ScreenCapture>,
        planner: Planner,
        executor: InputExecutor,
        loop_ctrl: LoopController,
    ) -> Self {
        Self {
            capture,
            planner,
            executor,
            narrator: None,
            loop_ctrl,
            debug_screenshot: None,
        }
    }

    pub fn with_narrator(mut self, narrator: Arc<dyn Narrator>) -> Self {
        self.narrator = Some(narrator);
        self
    }

    /// Writes the first capture of each run to `path`.
    pub fn with_debug_screenshot(mut self, path: impl Into<PathBuf>) -> Self {
        self.debug_screenshot = Some(path.into());
        self
    }

    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.loop_ctrl.stop_flag()
    }

    pub async fn run(&mut self, task: &str) -> LoopOutcome {
        let mut state = LoopState::new(task);
        let mut history = StepHistory::new();
        let mut status = LoopStatus::Running(0);
        tracing::info!(
            run = %history.run_id,
            task = %state.task,
            max_steps = self.loop_ctrl.max_steps(),
            backend = self.executor.backend_name(),
            "run started"
        );

        while let LoopStatus::Running(step) = status {
            if self.loop_ctrl.stop_requested() {
                tracing::warn!(step, "stop requested");
                status = LoopStatus::Aborted(AbortReason::Cancelled);
                break;
            }

            let Some(frame) = self.capture.capture().await else {
                tracing::error!(step, "no screen capture; aborting");
                status = LoopStatus::Aborted(AbortReason::CaptureFailed);
                break;
            };
            if step == 0 {
                self.inspect_first_frame(&frame).await;
            }

            tracing::info!(step = step + 1, of = self.loop_ctrl.max_steps(), "planning");
            let plan = self.planner.plan(&state.task, &frame.jpeg).await;
            self.narrate(&plan).await;

            let outcome = dispatch(&mut self.executor, &plan.command).await;
            history.push(StepRecord {
                index: step,
                action_line: plan.action_line,
                command: plan.command,
                observation: plan.observation,
                timestamp: chrono::Utc::now(),
            });

            state.step_index = step + 1;
            state.done = outcome == Dispatch::Finished;
            status = self.loop_ctrl.advance(step, state.done);
        }

        match status {
            LoopStatus::Done => tracing::info!(steps = state.step_index, "task complete"),
            LoopStatus::Aborted(reason) => {
                tracing::warn!(steps = state.step_index, %reason, "run aborted")
            }
            LoopStatus::Running(_) => {}
        }
        LoopOutcome {
            status,
            steps_taken: state.step_index,
            history,
        }
    }

    async fn inspect_first_frame(&self, frame: &CapturedFrame) {
        let geo = self.executor.mapper().geometry();
        tracing::info!(
            image = %format!("{}x{}", frame.width, frame.height),
            points = %format!("{}x{}", geo.logical_width, geo.logical_height),
            scale = geo.scale_factor,
            "first capture"
        );
        let Some(path) = &self.debug_screenshot else {
            return;
        };
        match tokio::fs::write(path, &frame.jpeg).await {
            Ok(()) => tracing::info!(path = %path.display(), bytes = frame.jpeg.len(), "debug screenshot saved"),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "debug screenshot not saved"),
        }
    }

    async fn narrate(&self, plan: &PlanStep) {
        let Some(narrator) = &self.narrator else {
            return;
        };
        let Some(text) = narration_for(&plan.command, &plan.observation) else {
            return;
        };
        if let Err(e) = narrator.speak(&text).await {
            tracing::debug!(error = %e, "narration failed");
        }
    }
}
