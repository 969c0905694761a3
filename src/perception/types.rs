use serde::{Deserialize, Serialize};

/// One screen capture, grid overlay applied, JPEG-encoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapturedFrame {
    #[serde(skip)]
    pub jpeg: Vec<u8>,
    /// Pixel dimensions of the encoded image.
    pub width: u32,
    pub height: u32,
}
