// Spoken one-line rationale before each command.
use async_trait::async_trait;

use crate::errors::{PilotError, PilotResult};
use crate::grammar::Command;

const MAX_SPOKEN_TEXT: usize = 20;

#[async_trait]
pub trait Narrator: Send + Sync {
    async fn speak(&self, text: &str) -> PilotResult<()>;
}

/// Speaks through an external program that takes the text as its argument
/// (`say` on macOS).
pub struct CommandNarrator {
    program: String,
}

impl CommandNarrator {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl Narrator for CommandNarrator {
    async fn speak(&self, text: &str) -> PilotResult<()> {
        let status = tokio::process::Command::new(&self.program)
            .arg(text)
            .status()
            .await
            .map_err(|e| PilotError::Narration(format!("{}: {e}", self.program)))?;
        if !status.success() {
            return Err(PilotError::Narration(format!("{} exited with {status}", self.program)));
        }
        Ok(())
    }
}

fn shorten(text: &str) -> String {
    if text.chars().count() > MAX_SPOKEN_TEXT {
        let head: String = text.chars().take(MAX_SPOKEN_TEXT - 3).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

fn click_target(observation: &str) -> &'static str {
    let seen = observation.to_lowercase();
    [
        ("compose", "Clicking compose button."),
        ("subject", "Clicking subject field."),
        ("message", "Clicking message body."),
        ("body", "Clicking message body."),
        ("button", "Clicking button."),
        ("icon", "Clicking icon."),
    ]
    .iter()
    .find(|(word, _)| seen.contains(word))
    .map(|(_, phrase)| *phrase)
    .unwrap_or("Clicking target.")
}

/// Short phrase describing what `command` is about to do. `None` for
/// commands that are not narrated.
pub fn narration_for(command: &Command, observation: &str) -> Option<String> {
    let phrase = match command {
        Command::OpenApp(name) => format!("Opening {name}."),
        Command::WebSearch(term) => format!("Searching the web for {}.", shorten(term)),
        Command::Hotkey(combo) => match combo.trim().to_lowercase().as_str() {
            "cmd+space" => "Opening Spotlight.".into(),
            "cmd+t" => "Opening new tab.".into(),
            "cmd+l" => "Focusing address bar.".into(),
            "enter" | "return" => "Pressing Enter.".into(),
            _ => format!("Pressing {combo}."),
        },
        Command::BulkType(text) => format!("Typing {} lines of content.", text.split('\n').count()),
        Command::TypeText(text) => format!("Typing {}.", shorten(text)),
        Command::Click(_) => click_target(observation).into(),
        Command::DoubleClick(_) => "Double-clicking to open.".into(),
        Command::Hover(_) => "Hovering over element.".into(),
        Command::Scroll(direction) => format!("Scrolling {}.", format!("{direction:?}").to_lowercase()),
        Command::Wait(ms) => format!("Waiting {:.1} seconds.", *ms as f64 / 1000.0),
        Command::FocusAddressBar => "Focusing address bar.".into(),
        Command::Done => "Task complete.".into(),
        Command::MoveMouse(_) | Command::Unknown(_) => return None,
    };
    Some(phrase)
}
