pub mod engine;
pub mod history;
pub mod loop_control;
pub mod state;

pub use engine::{ControlLoop, LoopOutcome, DEBUG_SCREENSHOT_FILE};
pub use state::{AbortReason, LoopStatus};
