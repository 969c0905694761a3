//! Action grammar: one line of model output → one `Command`.
//!
//! ```text
//! open_app("str") | web_search("str") | move_mouse(f,f) | left_click(f,f)
//! | double_click(f,f) | hover(f,f) | type_text("str") | bulk_type("str")
//! | scroll("dir") | hotkey("combo") | wait(int) | focus_address_bar() | done()
//! ```
//!
//! Parsing is pure and total: anything malformed becomes `Command::Unknown`.
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::executor::coordinator::RatioPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollDirection {
    Up,
    Down,
    Left,
    Right,
}

impl ScrollDirection {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "arg", rename_all = "snake_case")]
pub enum Command {
    OpenApp(String),
    WebSearch(String),
    MoveMouse(RatioPoint),
    Click(RatioPoint),
    DoubleClick(RatioPoint),
    Hover(RatioPoint),
    TypeText(String),
    BulkType(String),
    Scroll(ScrollDirection),
    Hotkey(String),
    Wait(u64),
    FocusAddressBar,
    Done,
    /// The raw line that did not parse.
    Unknown(String),
}

impl Command {
    /// Grammar name of the command, `"unknown"` for unparsed lines.
    pub fn name(&self) -> &'static str {
        match self {
            Command::OpenApp(_) => "open_app",
            Command::WebSearch(_) => "web_search",
            Command::MoveMouse(_) => "move_mouse",
            Command::Click(_) => "left_click",
            Command::DoubleClick(_) => "double_click",
            Command::Hover(_) => "hover",
            Command::TypeText(_) => "type_text",
            Command::BulkType(_) => "bulk_type",
            Command::Scroll(_) => "scroll",
            Command::Hotkey(_) => "hotkey",
            Command::Wait(_) => "wait",
            Command::FocusAddressBar => "focus_address_bar",
            Command::Done => "done",
            Command::Unknown(_) => "unknown",
        }
    }
}

/// Every command name the grammar accepts.
pub const COMMAND_NAMES: &[&str] = &[
    "open_app",
    "web_search",
    "move_mouse",
    "left_click",
    "double_click",
    "hover",
    "type_text",
    "bulk_type",
    "scroll",
    "hotkey",
    "wait",
    "focus_address_bar",
    "done",
];

fn pair_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\(\s*([-+]?\d*\.?\d+)\s*,\s*([-+]?\d*\.?\d+)\s*\)").expect("valid regex")
    })
}

fn quoted_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#""([^"]*)""#).expect("valid regex"))
}

fn int_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\(\s*(\d+)\s*\)").expect("valid regex"))
}

fn ratio_pair(args: &str) -> Option<RatioPoint> {
    let caps = pair_re().captures(args)?;
    let x: f64 = caps.get(1)?.as_str().parse().ok()?;
    let y: f64 = caps.get(2)?.as_str().parse().ok()?;
    Some(RatioPoint::new(x, y))
}

fn quoted(args: &str) -> Option<String> {
    quoted_re()
        .captures(args)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

fn integer(args: &str) -> Option<u64> {
    int_re().captures(args)?.get(1)?.as_str().parse().ok()
}

/// Known command name at the start of `line`, matched case-insensitively.
/// Longer names win so `double_click` is never read as a shorter prefix.
pub fn leading_command_name(line: &str) -> Option<&'static str> {
    let line = line.trim_start();
    COMMAND_NAMES
        .iter()
        .filter(|name| {
            line.get(..name.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(name))
        })
        .max_by_key(|name| name.len())
        .copied()
}

pub fn parse_command(line: &str) -> Command {
    let trimmed = line.trim();
    let unknown = || Command::Unknown(trimmed.to_string());
    let Some(name) = leading_command_name(trimmed) else {
        return unknown();
    };
    let args = trimmed.get(name.len()..).unwrap_or_default();

    let parsed = match name {
        "open_app" => quoted(args).map(Command::OpenApp),
        "web_search" => quoted(args).map(Command::WebSearch),
        "move_mouse" => ratio_pair(args).map(Command::MoveMouse),
        "left_click" => ratio_pair(args).map(Command::Click),
        "double_click" => ratio_pair(args).map(Command::DoubleClick),
        "hover" => ratio_pair(args).map(Command::Hover),
        "type_text" => quoted(args).map(Command::TypeText),
        "bulk_type" => quoted(args).map(|s| Command::BulkType(s.replace("\\n", "\n"))),
        "scroll" => quoted(args)
            .and_then(|d| ScrollDirection::from_name(&d))
            .map(Command::Scroll),
        "hotkey" => quoted(args).map(Command::Hotkey),
        "wait" => integer(args).map(Command::Wait),
        "focus_address_bar" => Some(Command::FocusAddressBar),
        "done" => Some(Command::Done),
        _ => None,
    };
    parsed.unwrap_or_else(unknown)
}
