pub mod grid;
pub mod screenshot;
pub mod traits;
pub mod types;

pub use screenshot::XcapCapture;
pub use traits::ScreenCapture;
pub use types::CapturedFrame;
