// Input primitives. Each one is best-effort: a backend failure is logged and
// the primitive returns normally so the step still counts.
use std::sync::Arc;
use std::time::Duration;

use crate::calibration::CalibrationOffset;
use crate::config::{BackendKind, InputConfig};
use crate::errors::PilotResult;
use crate::executor::backend::{Direction, DryRunBackend, EnigoBackend, InputBackend};
use crate::executor::coordinator::{CoordinateMapper, DevicePoint, OsGeometry, RatioPoint};
use crate::executor::keys::{Key, KeyCombo};
use crate::executor::motion::{LandingCheck, MotionController};
use crate::executor::safety::{NoOverlay, OverlayDetector, SpotlightDetector};
use crate::executor::text_input;
use crate::grammar::ScrollDirection;

pub const DEFAULT_SCROLL_AMOUNT: i32 = 5;
const HOVER_DWELL: Duration = Duration::from_millis(500);
const BUTTON_HOLD: Duration = Duration::from_millis(50);
const DOUBLE_CLICK_GAP: Duration = Duration::from_millis(100);
const CHORD_HOLD: Duration = Duration::from_millis(20);

pub struct InputExecutor {
    backend: Box<dyn InputBackend>,
    mapper: CoordinateMapper,
    motion: MotionController,
    overlay: Arc<dyn OverlayDetector>,
}

impl InputExecutor {
    pub fn new(
        backend: Box<dyn InputBackend>,
        mapper: CoordinateMapper,
        motion: MotionController,
        overlay: Arc<dyn OverlayDetector>,
    ) -> Self {
        Self {
            backend,
            mapper,
            motion,
            overlay,
        }
    }

    /// Builds the executor selected by `[input]`. Falls back to the dry-run
    /// backend if the OS backend cannot start.
    pub fn from_config(config: &InputConfig, offset: CalibrationOffset) -> Self {
        let motion = MotionController::new(
            config.trail,
            Duration::from_millis(config.step_interval_ms),
        );
        let os_backend = match config.backend {
            BackendKind::Os => match EnigoBackend::new() {
                Ok(b) => Some(b),
                Err(e) => {
                    tracing::warn!(error = %e, "OS input backend unavailable; using dry run");
                    None
                }
            },
            BackendKind::DryRun => None,
        };

        let mapper = CoordinateMapper::new(Box::new(OsGeometry), offset);
        let executor = match os_backend {
            Some(backend) => Self::new(Box::new(backend), mapper, motion, Arc::new(SpotlightDetector)),
            None => Self::new(Box::new(DryRunBackend::new()), mapper, motion, Arc::new(NoOverlay)),
        };
        tracing::info!(
            backend = executor.backend.name(),
            dx = offset.dx,
            dy = offset.dy,
            "input executor ready"
        );
        executor
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn mapper(&self) -> &CoordinateMapper {
        &self.mapper
    }

    pub fn mapper_mut(&mut self) -> &mut CoordinateMapper {
        &mut self.mapper
    }

    /// Current pointer position as reported by the backend.
    pub fn pointer_position(&self) -> PilotResult<DevicePoint> {
        self.backend.position()
    }

    /// Glides from wherever the pointer is to an absolute device point.
    pub async fn glide_to(&mut self, target: DevicePoint) -> PilotResult<()> {
        let from = match self.backend.position() {
            Ok(p) => p,
            Err(e) => {
                tracing::debug!(error = %e, "pointer position unknown; jumping");
                return self.backend.move_to(target);
            }
        };
        self.motion.glide(self.backend.as_mut(), from, target).await?;
        Ok(())
    }

    // ── Pointer primitives ───────────────────────────────────────────────

    pub async fn move_to(&mut self, ratio: RatioPoint) {
        let target = self.mapper.to_device(ratio);
        tracing::info!(x = target.x, y = target.y, "move");
        if let Err(e) = self.glide_to(target).await {
            tracing::warn!(error = %e, "move failed");
        }
    }

    pub async fn hover(&mut self, ratio: RatioPoint) {
        let target = self.mapper.to_device(ratio);
        tracing::info!(x = target.x, y = target.y, "hover");
        if let Err(e) = self.glide_to(target).await {
            tracing::warn!(error = %e, "hover move failed");
        }
        tokio::time::sleep(HOVER_DWELL).await;
    }

    pub async fn click(&mut self, ratio: RatioPoint) {
        if self.confirm_overlay_instead().await {
            return;
        }
        let target = self.mapper.to_device(ratio);
        tracing::info!(x = target.x, y = target.y, "click");
        if let Err(e) = self.click_at(target).await {
            tracing::warn!(error = %e, "click failed");
        }
    }

    pub async fn double_click(&mut self, ratio: RatioPoint) {
        if self.confirm_overlay_instead().await {
            return;
        }
        let target = self.mapper.to_device(ratio);
        tracing::info!(x = target.x, y = target.y, "double click");
        if let Err(e) = self.double_click_at(target).await {
            tracing::warn!(error = %e, "double click failed");
        }
    }

    async fn click_at(&mut self, target: DevicePoint) -> PilotResult<()> {
        self.glide_to(target).await?;
        self.motion
            .verify_landing(self.backend.as_mut(), target, LandingCheck::SINGLE_CLICK)
            .await?;
        self.press_left().await
    }

    async fn double_click_at(&mut self, target: DevicePoint) -> PilotResult<()> {
        self.glide_to(target).await?;
        self.motion
            .verify_landing(self.backend.as_mut(), target, LandingCheck::DOUBLE_CLICK)
            .await?;
        for _ in 0..2 {
            self.press_left().await?;
            tokio::time::sleep(DOUBLE_CLICK_GAP).await;
        }
        Ok(())
    }

    async fn press_left(&mut self) -> PilotResult<()> {
        self.backend.left_button(Direction::Press)?;
        tokio::time::sleep(BUTTON_HOLD).await;
        self.backend.left_button(Direction::Release)
    }

    /// With the quick-search overlay focused, Return accepts the highlighted
    /// result; a click would only dismiss it.
    async fn confirm_overlay_instead(&mut self) -> bool {
        if !self.overlay.quick_search_frontmost().await {
            return false;
        }
        tracing::info!("quick-search overlay is frontmost; pressing Return instead of clicking");
        self.press_key(Key::Return).await;
        true
    }

    // ── Keyboard primitives ──────────────────────────────────────────────

    pub async fn type_text(&mut self, text: &str) {
        tracing::info!(chars = text.chars().count(), "type text");
        match text_input::type_text(self.backend.as_mut(), text).await {
            Ok(typed) => tracing::debug!(typed, "text typed"),
            Err(e) => tracing::warn!(error = %e, "typing failed"),
        }
    }

    pub async fn press_key(&mut self, key: Key) {
        let result: PilotResult<()> = async {
            self.backend.key(key, Direction::Press)?;
            tokio::time::sleep(CHORD_HOLD).await;
            self.backend.key(key, Direction::Release)
        }
        .await;
        if let Err(e) = result {
            tracing::warn!(error = %e, ?key, "key press failed");
        }
    }

    pub async fn hotkey(&mut self, combo: &str) {
        let chord = KeyCombo::parse(combo);
        if !chord.unknown.is_empty() {
            tracing::warn!(combo, unknown = ?chord.unknown, "unrecognised hotkey tokens");
        }
        let Some(key) = chord.key else {
            tracing::warn!(combo, "hotkey has no usable main key; nothing pressed");
            return;
        };
        tracing::info!(combo, "hotkey");
        if let Err(e) = self.press_chord(&chord.modifiers, key).await {
            tracing::warn!(error = %e, combo, "hotkey failed");
        }
    }

    async fn press_chord(&mut self, modifiers: &[Key], key: Key) -> PilotResult<()> {
        let mut held = Vec::with_capacity(modifiers.len());
        let mut result = Ok(());
        for &m in modifiers {
            if let Err(e) = self.backend.key(m, Direction::Press) {
                result = Err(e);
                break;
            }
            held.push(m);
        }
        if result.is_ok() {
            result = async {
                self.backend.key(key, Direction::Press)?;
                tokio::time::sleep(CHORD_HOLD).await;
                self.backend.key(key, Direction::Release)
            }
            .await;
        }
        // Modifiers are always released, even after a failure.
        for &m in held.iter().rev() {
            if let Err(e) = self.backend.key(m, Direction::Release) {
                tracing::warn!(error = %e, modifier = ?m, "modifier release failed");
            }
        }
        result
    }

    pub async fn scroll(&mut self, direction: ScrollDirection, amount: i32) {
        let (dx, dy) = match direction {
            ScrollDirection::Down => (0, amount),
            ScrollDirection::Up => (0, -amount),
            ScrollDirection::Right => (amount, 0),
            ScrollDirection::Left => (-amount, 0),
        };
        tracing::info!(?direction, amount, "scroll");
        if let Err(e) = self.backend.scroll(dx, dy) {
            tracing::warn!(error = %e, "scroll failed");
        }
    }
}
