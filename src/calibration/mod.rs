//! Pointer calibration: a persisted (dx, dy) correction added to every
//! ratio → device conversion, plus the operator procedure that derives it.

pub mod procedure;
pub mod store;

use serde::{Deserialize, Serialize};

pub use procedure::{
    require_live_input, CalibrationOutcome, CalibrationProcedure, ConsoleOperator, Operator,
};
pub use store::CalibrationStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CalibrationOffset {
    pub dx: i32,
    pub dy: i32,
}

impl CalibrationOffset {
    pub const ZERO: CalibrationOffset = CalibrationOffset { dx: 0, dy: 0 };

    pub fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }
}
