/// Platform-neutral key identifiers understood by every `InputBackend`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// A printable key, always stored lowercase.
    Char(char),
    Space,
    Return,
    Tab,
    Escape,
    Backspace,
    Delete,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    /// F1–F12.
    Function(u8),
    Meta,
    Shift,
    Alt,
    Control,
}

impl Key {
    /// Parses a single key token (case-insensitive): a modifier name, a named
    /// key, or one printable character.
    pub fn from_name(name: &str) -> Option<Key> {
        let lower = name.trim().to_lowercase();
        if let Some(m) = modifier_from_name(&lower) {
            return Some(m);
        }
        let key = match lower.as_str() {
            "space" => Key::Space,
            "return" | "enter" => Key::Return,
            "tab" => Key::Tab,
            "escape" | "esc" => Key::Escape,
            "backspace" => Key::Backspace,
            "delete" | "del" => Key::Delete,
            "up" | "uparrow" => Key::Up,
            "down" | "downarrow" => Key::Down,
            "left" | "leftarrow" => Key::Left,
            "right" | "rightarrow" => Key::Right,
            "home" => Key::Home,
            "end" => Key::End,
            "pageup" | "pgup" => Key::PageUp,
            "pagedown" | "pgdn" => Key::PageDown,
            f if f.len() >= 2 && f.starts_with('f') => {
                let n: u8 = f[1..].parse().ok()?;
                if (1..=12).contains(&n) {
                    Key::Function(n)
                } else {
                    return None;
                }
            }
            _ => {
                let mut chars = lower.chars();
                let c = chars.next()?;
                if chars.next().is_some() || c.is_whitespace() || c.is_control() {
                    return None;
                }
                Key::Char(c)
            }
        };
        Some(key)
    }
}

fn modifier_from_name(name: &str) -> Option<Key> {
    match name {
        "cmd" | "command" | "meta" | "super" | "win" => Some(Key::Meta),
        "shift" => Some(Key::Shift),
        "alt" | "option" | "opt" => Some(Key::Alt),
        "ctrl" | "control" => Some(Key::Control),
        _ => None,
    }
}

/// A parsed `modifier+...+key` chord.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCombo {
    pub modifiers: Vec<Key>,
    /// `None` when the final token is not a known key.
    pub key: Option<Key>,
    /// Tokens that could not be mapped; reported, never fatal.
    pub unknown: Vec<String>,
}

impl KeyCombo {
    pub fn parse(combo: &str) -> KeyCombo {
        let tokens: Vec<&str> = combo.split('+').map(str::trim).collect();
        let (last, leading) = match tokens.split_last() {
            Some(split) => split,
            None => (&"", &[][..]),
        };

        let mut modifiers = Vec::new();
        let mut unknown = Vec::new();
        for token in leading {
            match modifier_from_name(&token.to_lowercase()) {
                Some(m) if !modifiers.contains(&m) => modifiers.push(m),
                Some(_) => {}
                None => unknown.push(token.to_string()),
            }
        }

        let key = Key::from_name(last);
        if key.is_none() {
            unknown.push(last.to_string());
        }

        KeyCombo {
            modifiers,
            key,
            unknown,
        }
    }
}
