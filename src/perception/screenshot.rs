// Primary-monitor capture via xcap, grid overlay, JPEG encode.
use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbaImage};

use crate::errors::{PilotError, PilotResult};
use crate::perception::grid::{draw_ratio_grid, GRID_DIVISIONS};
use crate::perception::traits::ScreenCapture;
use crate::perception::types::CapturedFrame;

pub const JPEG_QUALITY: u8 = 85;

/// Applies the optional grid and encodes the capture as JPEG.
pub fn encode_frame(mut canvas: RgbaImage, grid: bool) -> PilotResult<CapturedFrame> {
    if grid {
        draw_ratio_grid(&mut canvas, GRID_DIVISIONS);
    }
    let (width, height) = canvas.dimensions();
    let rgb = DynamicImage::ImageRgba8(canvas).to_rgb8();

    let mut jpeg = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY);
    rgb.write_with_encoder(encoder)
        .map_err(|e| PilotError::Perception(format!("JPEG encode: {e}")))?;
    Ok(CapturedFrame {
        jpeg,
        width,
        height,
    })
}

fn capture_primary_rgba() -> PilotResult<RgbaImage> {
    let monitors = xcap::Monitor::all()
        .map_err(|e| PilotError::Perception(format!("enumerate monitors: {e}")))?;
    let monitor = monitors
        .iter()
        .find(|m| m.is_primary())
        .or_else(|| monitors.first())
        .ok_or_else(|| PilotError::Perception("no monitor found".into()))?;
    monitor
        .capture_image()
        .map_err(|e| PilotError::Perception(format!("capture: {e}")))
}

/// Captures the primary monitor on a blocking thread.
pub struct XcapCapture {
    grid: bool,
}

impl XcapCapture {
    pub fn new(grid: bool) -> Self {
        Self { grid }
    }
}

impl Default for XcapCapture {
    fn default() -> Self {
        Self::new(true)
    }
}

#[async_trait]
impl ScreenCapture for XcapCapture {
    async fn capture(&self) -> Option<CapturedFrame> {
        let grid = self.grid;
        let joined = tokio::task::spawn_blocking(move || {
            capture_primary_rgba().and_then(|img| encode_frame(img, grid))
        })
        .await;
        match joined {
            Ok(Ok(frame)) => {
                tracing::debug!(width = frame.width, height = frame.height, bytes = frame.jpeg.len(), "screen captured");
                Some(frame)
            }
            Ok(Err(e)) => {
                tracing::error!(error = %e, "screen capture failed");
                None
            }
            Err(e) => {
                tracing::error!(error = %e, "capture task panicked");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn encodes_decodable_jpeg_with_same_size() {
        let img = RgbaImage::from_pixel(64, 48, Rgba([10, 20, 30, 255]));
        let frame = encode_frame(img, true).unwrap();
        assert_eq!((frame.width, frame.height), (64, 48));
        assert_eq!(&frame.jpeg[..2], &[0xff, 0xd8]);
        let decoded = image::load_from_memory(&frame.jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (64, 48));
    }
}
