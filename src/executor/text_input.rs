// Per-character typing through a fixed US-layout key table.
// Characters outside the table are skipped with a warning.
use std::time::Duration;

use crate::errors::PilotResult;
use crate::executor::backend::{Direction, InputBackend};
use crate::executor::keys::Key;

const UNSHIFTED: &str = "abcdefghijklmnopqrstuvwxyz0123456789./-=,;'[]\\`";

/// Hold time for each key and the gap after a full keystroke.
pub const KEY_HOLD: Duration = Duration::from_millis(20);
pub const KEY_GAP: Duration = Duration::from_millis(30);
pub const CHAR_GAP: Duration = Duration::from_millis(20);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Keystroke {
    pub key: Key,
    pub shift: bool,
}

/// Key (and shift state) that produces `c`, if the table covers it.
pub fn key_for_char(c: char) -> Option<Keystroke> {
    if c == ' ' {
        return Some(Keystroke { key: Key::Space, shift: false });
    }
    if c.is_ascii_uppercase() {
        return Some(Keystroke {
            key: Key::Char(c.to_ascii_lowercase()),
            shift: true,
        });
    }
    UNSHIFTED
        .contains(c)
        .then_some(Keystroke { key: Key::Char(c), shift: false })
}

/// Press and release one key, holding `shift` around it when requested.
pub async fn press_keystroke(backend: &mut dyn InputBackend, stroke: Keystroke) -> PilotResult<()> {
    if stroke.shift {
        backend.key(Key::Shift, Direction::Press)?;
    }
    backend.key(stroke.key, Direction::Press)?;
    tokio::time::sleep(KEY_HOLD).await;
    if stroke.shift {
        backend.key(Key::Shift, Direction::Release)?;
    }
    backend.key(stroke.key, Direction::Release)?;
    tokio::time::sleep(KEY_GAP).await;
    Ok(())
}

/// Types `text` one character at a time. Returns how many characters were
/// typed; unsupported ones are skipped.
pub async fn type_text(backend: &mut dyn InputBackend, text: &str) -> PilotResult<usize> {
    let mut typed = 0;
    for c in text.chars() {
        match key_for_char(c) {
            Some(stroke) => {
                press_keystroke(backend, stroke).await?;
                typed += 1;
                tokio::time::sleep(CHAR_GAP).await;
            }
            None => tracing::warn!(char = ?c, "no key mapping; character skipped"),
        }
    }
    Ok(typed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::backend::{DryRunBackend, InputEvent};

    #[test]
    fn table_covers_letters_digits_and_punctuation() {
        assert_eq!(key_for_char('a'), Some(Keystroke { key: Key::Char('a'), shift: false }));
        assert_eq!(key_for_char('Q'), Some(Keystroke { key: Key::Char('q'), shift: true }));
        assert_eq!(key_for_char('7').map(|k| k.shift), Some(false));
        assert_eq!(key_for_char('\\').map(|k| k.key), Some(Key::Char('\\')));
        assert_eq!(key_for_char(' ').map(|k| k.key), Some(Key::Space));
        assert_eq!(key_for_char('é'), None);
        assert_eq!(key_for_char('!'), None);
    }

    #[tokio::test(start_paused = true)]
    async fn uppercase_wraps_key_in_shift() {
        let mut backend = DryRunBackend::new();
        let journal = backend.journal();
        let typed = type_text(&mut backend, "Hi").await.unwrap();
        assert_eq!(typed, 2);
        assert_eq!(
            journal.events(),
            vec![
                InputEvent::Key(Key::Shift, Direction::Press),
                InputEvent::Key(Key::Char('h'), Direction::Press),
                InputEvent::Key(Key::Shift, Direction::Release),
                InputEvent::Key(Key::Char('h'), Direction::Release),
                InputEvent::Key(Key::Char('i'), Direction::Press),
                InputEvent::Key(Key::Char('i'), Direction::Release),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn unsupported_characters_are_skipped() {
        let mut backend = DryRunBackend::new();
        let journal = backend.journal();
        let typed = type_text(&mut backend, "a€b").await.unwrap();
        assert_eq!(typed, 2);
        assert_eq!(journal.events().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn each_character_takes_hold_gap_and_spacing() {
        let mut backend = DryRunBackend::new();
        let start = tokio::time::Instant::now();
        type_text(&mut backend, "abc").await.unwrap();
        assert_eq!(start.elapsed(), (KEY_HOLD + KEY_GAP + CHAR_GAP) * 3);
    }
}
