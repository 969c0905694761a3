// Command dispatcher: turns one parsed `Command` into input primitives,
// including the multi-step app-launch and web-search workflows.
use std::time::Duration;

use crate::executor::input::{InputExecutor, DEFAULT_SCROLL_AMOUNT};
use crate::executor::keys::Key;
use crate::grammar::Command;

/// Spotlight and new-tab animations.
const OVERLAY_SETTLE: Duration = Duration::from_millis(1500);
const TYPE_SETTLE: Duration = Duration::from_millis(500);
const APP_LAUNCH_SETTLE: Duration = Duration::from_millis(2000);
const RESULTS_SETTLE: Duration = Duration::from_millis(2500);
const ADDRESS_BAR_SETTLE: Duration = Duration::from_millis(300);
const LINE_GAP: Duration = Duration::from_millis(100);

const SEARCH_BROWSER: &str = "Safari";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Continue,
    Finished,
}

pub async fn dispatch(exec: &mut InputExecutor, command: &Command) -> Dispatch {
    match command {
        Command::OpenApp(name) => open_app(exec, name).await,
        Command::WebSearch(term) => web_search(exec, term).await,
        Command::MoveMouse(p) => exec.move_to(*p).await,
        Command::Click(p) => exec.click(*p).await,
        Command::DoubleClick(p) => exec.double_click(*p).await,
        Command::Hover(p) => exec.hover(*p).await,
        Command::TypeText(text) => exec.type_text(text).await,
        Command::BulkType(text) => bulk_type(exec, text).await,
        Command::Scroll(direction) => exec.scroll(*direction, DEFAULT_SCROLL_AMOUNT).await,
        Command::Hotkey(combo) => {
            exec.hotkey(combo).await;
            if opens_overlay(combo) {
                tokio::time::sleep(OVERLAY_SETTLE).await;
            }
        }
        Command::Wait(ms) => {
            tracing::info!(ms, "wait");
            tokio::time::sleep(Duration::from_millis(*ms)).await;
        }
        Command::FocusAddressBar => {
            exec.hotkey("cmd+l").await;
            tokio::time::sleep(ADDRESS_BAR_SETTLE).await;
        }
        Command::Done => return Dispatch::Finished,
        Command::Unknown(line) => tracing::warn!(line = %line, "unrecognised action; skipping"),
    }
    Dispatch::Continue
}

/// Chords whose UI needs time to animate in before typing.
fn opens_overlay(combo: &str) -> bool {
    let normalized: String = combo
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    matches!(
        normalized.as_str(),
        "cmd+space" | "command+space" | "cmd+t" | "command+t"
    )
}

async fn open_app(exec: &mut InputExecutor, name: &str) {
    tracing::info!(app = %name, "open app via Spotlight");
    exec.hotkey("cmd+space").await;
    tokio::time::sleep(OVERLAY_SETTLE).await;
    exec.type_text(name).await;
    tokio::time::sleep(TYPE_SETTLE).await;
    exec.press_key(Key::Return).await;
    tokio::time::sleep(APP_LAUNCH_SETTLE).await;
}

async fn web_search(exec: &mut InputExecutor, term: &str) {
    tracing::info!(term = %term, "web search");
    open_app(exec, SEARCH_BROWSER).await;
    exec.hotkey("cmd+t").await;
    tokio::time::sleep(OVERLAY_SETTLE).await;
    // Trailing space dismisses address-bar autocompletion.
    exec.type_text(&format!("{term} ")).await;
    tokio::time::sleep(TYPE_SETTLE).await;
    exec.press_key(Key::Return).await;
    tokio::time::sleep(RESULTS_SETTLE).await;
}

async fn bulk_type(exec: &mut InputExecutor, text: &str) {
    let mut lines = text.split('\n').peekable();
    while let Some(line) = lines.next() {
        exec.type_text(line).await;
        if lines.peek().is_some() {
            exec.press_key(Key::Return).await;
            tokio::time::sleep(LINE_GAP).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::calibration::CalibrationOffset;
    use crate::executor::backend::{Direction, InputEvent};
    use crate::executor::coordinator::RatioPoint;
    use crate::executor::input::tests::dry_executor;
    use crate::executor::safety::NoOverlay;

    fn key_downs(events: &[InputEvent]) -> Vec<Key> {
        events
            .iter()
            .filter_map(|e| match e {
                InputEvent::Key(k, Direction::Press) => Some(*k),
                _ => None,
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn done_finishes_without_input() {
        let (mut exec, journal) = dry_executor(CalibrationOffset::ZERO, Arc::new(NoOverlay));
        assert_eq!(dispatch(&mut exec, &Command::Done).await, Dispatch::Finished);
        assert!(journal.events().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_is_a_no_op() {
        let (mut exec, journal) = dry_executor(CalibrationOffset::ZERO, Arc::new(NoOverlay));
        let outcome = dispatch(&mut exec, &Command::Unknown("fly()".into())).await;
        assert_eq!(outcome, Dispatch::Continue);
        assert!(journal.events().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn open_app_uses_spotlight_workflow() {
        let (mut exec, journal) = dry_executor(CalibrationOffset::ZERO, Arc::new(NoOverlay));
        let start = tokio::time::Instant::now();
        dispatch(&mut exec, &Command::OpenApp("Notes".into())).await;

        let downs = key_downs(&journal.events());
        assert_eq!(
            downs,
            vec![
                Key::Meta,
                Key::Space,
                Key::Shift,
                Key::Char('n'),
                Key::Char('o'),
                Key::Char('t'),
                Key::Char('e'),
                Key::Char('s'),
                Key::Return,
            ]
        );
        assert!(start.elapsed() >= OVERLAY_SETTLE + TYPE_SETTLE + APP_LAUNCH_SETTLE);
    }

    #[tokio::test(start_paused = true)]
    async fn web_search_opens_tab_and_submits() {
        let (mut exec, journal) = dry_executor(CalibrationOffset::ZERO, Arc::new(NoOverlay));
        dispatch(&mut exec, &Command::WebSearch("rust".into())).await;

        let downs = key_downs(&journal.events());
        let tab = downs
            .windows(2)
            .position(|w| w == [Key::Meta, Key::Char('t')])
            .expect("cmd+t pressed");
        assert_eq!(
            &downs[tab + 2..],
            &[
                Key::Char('r'),
                Key::Char('u'),
                Key::Char('s'),
                Key::Char('t'),
                Key::Space,
                Key::Return
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn bulk_type_presses_return_between_lines_only() {
        let (mut exec, journal) = dry_executor(CalibrationOffset::ZERO, Arc::new(NoOverlay));
        dispatch(&mut exec, &Command::BulkType("a\nb".into())).await;
        assert_eq!(
            key_downs(&journal.events()),
            vec![Key::Char('a'), Key::Return, Key::Char('b')]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn wait_sleeps_for_requested_time() {
        let (mut exec, _journal) = dry_executor(CalibrationOffset::ZERO, Arc::new(NoOverlay));
        let start = tokio::time::Instant::now();
        dispatch(&mut exec, &Command::Wait(1200)).await;
        assert_eq!(start.elapsed(), Duration::from_millis(1200));
    }

    #[tokio::test(start_paused = true)]
    async fn click_command_reaches_mapped_point() {
        let (mut exec, journal) = dry_executor(CalibrationOffset::ZERO, Arc::new(NoOverlay));
        dispatch(&mut exec, &Command::Click(RatioPoint::new(0.5, 0.5))).await;
        assert_eq!(journal.position().x, 960);
        assert_eq!(journal.position().y, 540);
    }

    #[test]
    fn overlay_chords_are_recognised() {
        assert!(opens_overlay("cmd+space"));
        assert!(opens_overlay("Cmd + T"));
        assert!(!opens_overlay("cmd+l"));
    }
}
