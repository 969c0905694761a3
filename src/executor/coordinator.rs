// Ratio → device coordinate mapping.
//
// Event coordinates on the reference platform are logical points, so the
// display scale factor is reported for diagnostics but never multiplied in.
use serde::{Deserialize, Serialize};

use crate::calibration::CalibrationOffset;

/// Display size in logical points plus the points→pixels scale factor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenGeometry {
    pub logical_width: u32,
    pub logical_height: u32,
    pub scale_factor: f64,
}

impl ScreenGeometry {
    /// Used whenever the OS cannot report a display.
    pub const FALLBACK: ScreenGeometry = ScreenGeometry {
        logical_width: 1920,
        logical_height: 1080,
        scale_factor: 1.0,
    };
}

/// Normalized position, origin top-left. Components are always within [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatioPoint {
    x: f64,
    y: f64,
}

impl RatioPoint {
    /// Clamps both components into [0, 1]; NaN becomes 0.
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x: clamp_unit(x),
            y: clamp_unit(y),
        }
    }

    pub const CENTER: RatioPoint = RatioPoint { x: 0.5, y: 0.5 };

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }
}

fn clamp_unit(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

/// A point in the OS input-event coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DevicePoint {
    pub x: i32,
    pub y: i32,
}

impl DevicePoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset_by(self, offset: CalibrationOffset) -> Self {
        Self {
            x: self.x + offset.dx,
            y: self.y + offset.dy,
        }
    }

    pub fn distance_to(self, other: DevicePoint) -> f64 {
        let dx = (other.x - self.x) as f64;
        let dy = (other.y - self.y) as f64;
        (dx * dx + dy * dy).sqrt()
    }

    /// Largest per-axis difference.
    pub fn axis_drift(self, other: DevicePoint) -> i32 {
        (other.x - self.x).abs().max((other.y - self.y).abs())
    }
}

/// Where the mapper learns the current display geometry.
pub trait GeometrySource {
    /// `None` when the OS cannot report a display right now.
    fn query(&self) -> Option<ScreenGeometry>;
}

/// Reads the primary monitor on every call.
pub struct OsGeometry;

impl GeometrySource for OsGeometry {
    fn query(&self) -> Option<ScreenGeometry> {
        let monitors = match xcap::Monitor::all() {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(error = %e, "cannot enumerate monitors");
                return None;
            }
        };
        let primary = monitors
            .iter()
            .find(|m| m.is_primary())
            .or_else(|| monitors.first())?;
        let (w, h) = (primary.width(), primary.height());
        if w == 0 || h == 0 {
            return None;
        }
        Some(ScreenGeometry {
            logical_width: w,
            logical_height: h,
            scale_factor: primary.scale_factor() as f64,
        })
    }
}

/// Always reports the same geometry. Used for dry runs and tests.
pub struct FixedGeometry(pub Option<ScreenGeometry>);

impl GeometrySource for FixedGeometry {
    fn query(&self) -> Option<ScreenGeometry> {
        self.0
    }
}

pub struct CoordinateMapper {
    geometry: Box<dyn GeometrySource>,
    offset: CalibrationOffset,
}

impl CoordinateMapper {
    pub fn new(geometry: Box<dyn GeometrySource>, offset: CalibrationOffset) -> Self {
        Self { geometry, offset }
    }

    pub fn offset(&self) -> CalibrationOffset {
        self.offset
    }

    pub fn set_offset(&mut self, offset: CalibrationOffset) {
        self.offset = offset;
    }

    /// Current geometry, or the fixed fallback. Never cached.
    pub fn geometry(&self) -> ScreenGeometry {
        self.geometry.query().unwrap_or_else(|| {
            tracing::warn!("screen geometry unavailable; using 1920x1080 fallback");
            ScreenGeometry::FALLBACK
        })
    }

    /// Ratio → device point without the calibration offset.
    pub fn to_device_uncalibrated(&self, ratio: RatioPoint) -> DevicePoint {
        let geo = self.geometry();
        let max_x = geo.logical_width.saturating_sub(1) as f64;
        let max_y = geo.logical_height.saturating_sub(1) as f64;
        let point = DevicePoint {
            x: (ratio.x() * max_x).round() as i32,
            y: (ratio.y() * max_y).round() as i32,
        };
        tracing::debug!(
            rx = ratio.x(),
            ry = ratio.y(),
            x = point.x,
            y = point.y,
            points = %format!("{}x{}", geo.logical_width, geo.logical_height),
            scale = geo.scale_factor,
            "ratio → device"
        );
        point
    }

    /// Ratio → device point with the calibration offset applied once.
    pub fn to_device(&self, ratio: RatioPoint) -> DevicePoint {
        let offset = self.offset;
        self.to_device_uncalibrated(ratio).offset_by(offset)
    }
}
