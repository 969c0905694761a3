// Smoothed pointer motion along a quadratic Bezier, plus landing verification.
use std::collections::VecDeque;
use std::time::Duration;

use serde::Serialize;

use crate::errors::PilotResult;
use crate::executor::backend::InputBackend;
use crate::executor::coordinator::DevicePoint;

/// Moves shorter than this (in points) are not animated.
pub const MIN_GLIDE_DISTANCE: f64 = 5.0;
const MIN_STEPS: usize = 10;
const POINTS_PER_STEP: f64 = 15.0;
const CURVE_BEND: f64 = 0.1;

pub const TRAIL_CAPACITY: usize = 15;
const TRAIL_FADE: f64 = 0.8;
const TRAIL_SHRINK: f64 = 0.95;
const TRAIL_MIN_OPACITY: f64 = 0.1;
const TRAIL_START_SIZE: f64 = 8.0;

/// Points after `from` up to and including `to`. Empty for short moves.
pub fn path(from: DevicePoint, to: DevicePoint) -> Vec<DevicePoint> {
    let distance = from.distance_to(to);
    if distance < MIN_GLIDE_DISTANCE {
        return Vec::new();
    }
    let steps = MIN_STEPS.max((distance / POINTS_PER_STEP).floor() as usize);

    let (x0, y0) = (from.x as f64, from.y as f64);
    let (x2, y2) = (to.x as f64, to.y as f64);
    let (dx, dy) = (x2 - x0, y2 - y0);
    // Control point sits off the midpoint, perpendicular to the travel line.
    let x1 = (x0 + x2) / 2.0 + dy * CURVE_BEND;
    let y1 = (y0 + y2) / 2.0 - dx * CURVE_BEND;

    let mut points: Vec<DevicePoint> = (1..=steps)
        .map(|i| {
            let t = i as f64 / steps as f64;
            let e = t * t * (3.0 - 2.0 * t);
            let u = 1.0 - e;
            let x = u * u * x0 + 2.0 * u * e * x1 + e * e * x2;
            let y = u * u * y0 + 2.0 * u * e * y1 + e * e * y2;
            DevicePoint::new(x.round() as i32, y.round() as i32)
        })
        .collect();
    if let Some(last) = points.last_mut() {
        *last = to;
    }
    points
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrailPoint {
    pub x: i32,
    pub y: i32,
    pub opacity: f64,
    pub size: f64,
}

/// Fading record of recent pointer positions. Telemetry only; nothing reads
/// it to make decisions.
#[derive(Debug, Default)]
pub struct TrailBuffer {
    points: VecDeque<TrailPoint>,
}

impl TrailBuffer {
    pub fn push(&mut self, p: DevicePoint) {
        for old in self.points.iter_mut() {
            old.opacity *= TRAIL_FADE;
            old.size *= TRAIL_SHRINK;
        }
        self.points.push_back(TrailPoint {
            x: p.x,
            y: p.y,
            opacity: 1.0,
            size: TRAIL_START_SIZE,
        });
        self.points.retain(|t| t.opacity > TRAIL_MIN_OPACITY);
        while self.points.len() > TRAIL_CAPACITY {
            self.points.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = &TrailPoint> {
        self.points.iter()
    }

    pub fn newest(&self) -> Option<&TrailPoint> {
        self.points.back()
    }
}

/// Settle and tolerance parameters for post-move verification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LandingCheck {
    pub settle: Duration,
    /// Allowed per-axis error in points.
    pub tolerance: i32,
    pub settle_after_correction: Duration,
}

impl LandingCheck {
    pub const SINGLE_CLICK: LandingCheck = LandingCheck {
        settle: Duration::from_millis(150),
        tolerance: 5,
        settle_after_correction: Duration::from_millis(50),
    };

    // Tighter than SINGLE_CLICK. Both values are kept as observed in use.
    pub const DOUBLE_CLICK: LandingCheck = LandingCheck {
        settle: Duration::from_millis(200),
        tolerance: 2,
        settle_after_correction: Duration::from_millis(100),
    };
}

pub struct MotionController {
    trail: TrailBuffer,
    trail_enabled: bool,
    step_interval: Duration,
}

impl MotionController {
    pub fn new(trail_enabled: bool, step_interval: Duration) -> Self {
        Self {
            trail: TrailBuffer::default(),
            trail_enabled,
            step_interval,
        }
    }

    pub fn trail(&self) -> &TrailBuffer {
        &self.trail
    }

    /// Emits the `path` between two points with one move per step. Returns
    /// the number of moves issued.
    pub async fn glide(
        &mut self,
        backend: &mut dyn InputBackend,
        from: DevicePoint,
        to: DevicePoint,
    ) -> PilotResult<usize> {
        let points = path(from, to);
        for &p in &points {
            backend.move_to(p)?;
            if self.trail_enabled {
                self.trail.push(p);
            }
            tokio::time::sleep(self.step_interval).await;
        }
        tracing::trace!(from = ?from, to = ?to, steps = points.len(), "glide");
        Ok(points.len())
    }

    /// Waits for the pointer to settle and issues at most one corrective
    /// move if it landed outside the tolerance. Returns true if a correction
    /// was made.
    pub async fn verify_landing(
        &mut self,
        backend: &mut dyn InputBackend,
        target: DevicePoint,
        check: LandingCheck,
    ) -> PilotResult<bool> {
        tokio::time::sleep(check.settle).await;
        let actual = backend.position()?;
        let drift = actual.axis_drift(target);
        if drift <= check.tolerance {
            return Ok(false);
        }
        tracing::debug!(
            target_x = target.x,
            target_y = target.y,
            actual_x = actual.x,
            actual_y = actual.y,
            drift,
            "pointer drifted; correcting"
        );
        if actual.distance_to(target) < MIN_GLIDE_DISTANCE {
            backend.move_to(target)?;
        } else {
            self.glide(backend, actual, target).await?;
        }
        tokio::time::sleep(check.settle_after_correction).await;
        Ok(true)
    }
}
