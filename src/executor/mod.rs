pub mod backend;
pub mod coordinator;
pub mod dispatcher;
pub mod input;
pub mod keys;
pub mod motion;
pub mod safety;
pub mod text_input;

pub use dispatcher::{dispatch, Dispatch};
pub use input::InputExecutor;
