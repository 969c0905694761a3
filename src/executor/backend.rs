// Event-injection backends. The control loop and grammar never see which one
// is active; it is picked once at start-up.
use std::sync::{Arc, Mutex, MutexGuard};

use enigo::{Axis, Coordinate, Enigo, Keyboard, Mouse, Settings};

use crate::errors::{PilotError, PilotResult};
use crate::executor::coordinator::DevicePoint;
use crate::executor::keys::Key;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Press,
    Release,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    MoveTo(DevicePoint),
    LeftButton(Direction),
    Key(Key, Direction),
    Scroll { dx: i32, dy: i32 },
}

/// Primitive input capability: pointer moves, left button, keys, wheel.
pub trait InputBackend {
    fn name(&self) -> &'static str;
    fn move_to(&mut self, point: DevicePoint) -> PilotResult<()>;
    fn position(&self) -> PilotResult<DevicePoint>;
    fn left_button(&mut self, direction: Direction) -> PilotResult<()>;
    fn key(&mut self, key: Key, direction: Direction) -> PilotResult<()>;
    /// Positive `dy` scrolls down, positive `dx` scrolls right.
    fn scroll(&mut self, dx: i32, dy: i32) -> PilotResult<()>;
}

// ── OS backend ───────────────────────────────────────────────────────────────

pub struct EnigoBackend {
    enigo: Enigo,
}

impl EnigoBackend {
    pub fn new() -> PilotResult<Self> {
        let enigo = Enigo::new(&Settings::default())
            .map_err(|e| PilotError::Input(format!("enigo init: {e}")))?;
        Ok(Self { enigo })
    }
}

fn to_enigo_key(key: Key) -> enigo::Key {
    use enigo::Key as K;
    match key {
        Key::Char(c) => K::Unicode(c),
        Key::Space => K::Space,
        Key::Return => K::Return,
        Key::Tab => K::Tab,
        Key::Escape => K::Escape,
        Key::Backspace => K::Backspace,
        Key::Delete => K::Delete,
        Key::Up => K::UpArrow,
        Key::Down => K::DownArrow,
        Key::Left => K::LeftArrow,
        Key::Right => K::RightArrow,
        Key::Home => K::Home,
        Key::End => K::End,
        Key::PageUp => K::PageUp,
        Key::PageDown => K::PageDown,
        Key::Function(n) => match n {
            1 => K::F1,
            2 => K::F2,
            3 => K::F3,
            4 => K::F4,
            5 => K::F5,
            6 => K::F6,
            7 => K::F7,
            8 => K::F8,
            9 => K::F9,
            10 => K::F10,
            11 => K::F11,
            _ => K::F12,
        },
        Key::Meta => K::Meta,
        Key::Shift => K::Shift,
        Key::Alt => K::Alt,
        Key::Control => K::Control,
    }
}

fn to_enigo_direction(direction: Direction) -> enigo::Direction {
    match direction {
        Direction::Press => enigo::Direction::Press,
        Direction::Release => enigo::Direction::Release,
    }
}

impl InputBackend for EnigoBackend {
    fn name(&self) -> &'static str {
        "os"
    }

    fn move_to(&mut self, point: DevicePoint) -> PilotResult<()> {
        self.enigo
            .move_mouse(point.x, point.y, Coordinate::Abs)
            .map_err(|e| PilotError::Input(format!("move to ({}, {}): {e}", point.x, point.y)))
    }

    fn position(&self) -> PilotResult<DevicePoint> {
        let (x, y) = self
            .enigo
            .location()
            .map_err(|e| PilotError::Input(format!("pointer location: {e}")))?;
        Ok(DevicePoint { x, y })
    }

    fn left_button(&mut self, direction: Direction) -> PilotResult<()> {
        self.enigo
            .button(enigo::Button::Left, to_enigo_direction(direction))
            .map_err(|e| PilotError::Input(format!("left button {direction:?}: {e}")))
    }

    fn key(&mut self, key: Key, direction: Direction) -> PilotResult<()> {
        self.enigo
            .key(to_enigo_key(key), to_enigo_direction(direction))
            .map_err(|e| PilotError::Input(format!("key {key:?} {direction:?}: {e}")))
    }

    fn scroll(&mut self, dx: i32, dy: i32) -> PilotResult<()> {
        if dy != 0 {
            self.enigo
                .scroll(dy, Axis::Vertical)
                .map_err(|e| PilotError::Input(format!("vertical scroll: {e}")))?;
        }
        if dx != 0 {
            self.enigo
                .scroll(dx, Axis::Horizontal)
                .map_err(|e| PilotError::Input(format!("horizontal scroll: {e}")))?;
        }
        Ok(())
    }
}

// ── Dry-run backend ──────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct JournalState {
    position: DevicePoint,
    events: Vec<InputEvent>,
    /// Added to every move so landing drift can be reproduced.
    move_bias: (i32, i32),
}

/// Shared record of everything a `DryRunBackend` was asked to do.
#[derive(Debug, Clone, Default)]
pub struct EventJournal {
    inner: Arc<Mutex<JournalState>>,
}

impl EventJournal {
    fn state(&self) -> MutexGuard<'_, JournalState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn events(&self) -> Vec<InputEvent> {
        self.state().events.clone()
    }

    pub fn moves(&self) -> Vec<DevicePoint> {
        self.state()
            .events
            .iter()
            .filter_map(|e| match e {
                InputEvent::MoveTo(p) => Some(*p),
                _ => None,
            })
            .collect()
    }

    pub fn position(&self) -> DevicePoint {
        self.state().position
    }

    /// Moves the simulated pointer without recording an event, as an
    /// operator dragging the physical mouse would.
    pub fn warp(&self, point: DevicePoint) {
        self.state().position = point;
    }

    pub fn set_move_bias(&self, dx: i32, dy: i32) {
        self.state().move_bias = (dx, dy);
    }
}

pub const DRY_RUN_NAME: &str = "dry_run";

/// Logs and records events instead of injecting them.
pub struct DryRunBackend {
    journal: EventJournal,
}

impl DryRunBackend {
    pub fn new() -> Self {
        Self {
            journal: EventJournal::default(),
        }
    }

    pub fn starting_at(point: DevicePoint) -> Self {
        let backend = Self::new();
        backend.journal.warp(point);
        backend
    }

    pub fn journal(&self) -> EventJournal {
        self.journal.clone()
    }

    fn record(&self, event: InputEvent) {
        tracing::trace!(?event, "dry-run input");
        self.journal.state().events.push(event);
    }
}

impl Default for DryRunBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InputBackend for DryRunBackend {
    fn name(&self) -> &'static str {
        DRY_RUN_NAME
    }

    fn move_to(&mut self, point: DevicePoint) -> PilotResult<()> {
        self.record(InputEvent::MoveTo(point));
        let mut state = self.journal.state();
        let (bx, by) = state.move_bias;
        state.position = DevicePoint::new(point.x + bx, point.y + by);
        Ok(())
    }

    fn position(&self) -> PilotResult<DevicePoint> {
        Ok(self.journal.position())
    }

    fn left_button(&mut self, direction: Direction) -> PilotResult<()> {
        self.record(InputEvent::LeftButton(direction));
        Ok(())
    }

    fn key(&mut self, key: Key, direction: Direction) -> PilotResult<()> {
        self.record(InputEvent::Key(key, direction));
        Ok(())
    }

    fn scroll(&mut self, dx: i32, dy: i32) -> PilotResult<()> {
        self.record(InputEvent::Scroll { dx, dy });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dry_run_tracks_position_and_events() {
        let mut backend = DryRunBackend::starting_at(DevicePoint::new(10, 10));
        let journal = backend.journal();
        backend.move_to(DevicePoint::new(50, 60)).unwrap();
        backend.left_button(Direction::Press).unwrap();
        backend.left_button(Direction::Release).unwrap();

        assert_eq!(backend.position().unwrap(), DevicePoint::new(50, 60));
        assert_eq!(
            journal.events(),
            vec![
                InputEvent::MoveTo(DevicePoint::new(50, 60)),
                InputEvent::LeftButton(Direction::Press),
                InputEvent::LeftButton(Direction::Release),
            ]
        );
    }

    #[test]
    fn move_bias_shifts_landing_point_only() {
        let mut backend = DryRunBackend::new();
        let journal = backend.journal();
        journal.set_move_bias(4, -1);
        backend.move_to(DevicePoint::new(100, 100)).unwrap();
        assert_eq!(journal.moves(), vec![DevicePoint::new(100, 100)]);
        assert_eq!(journal.position(), DevicePoint::new(104, 99));
    }

    #[test]
    fn warp_is_not_recorded() {
        let backend = DryRunBackend::new();
        let journal = backend.journal();
        journal.warp(DevicePoint::new(3, 4));
        assert!(journal.events().is_empty());
        assert_eq!(backend.position().unwrap(), DevicePoint::new(3, 4));
    }
}
