// See/Think/Action reply parsing.
use crate::grammar::COMMAND_NAMES;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    See,
    Think,
    Action,
    Other,
}

/// Checked in order; the first label that matches classifies the line.
const LABELS: &[(LineKind, &str)] = &[
    (LineKind::See, "see"),
    (LineKind::Think, "think"),
    (LineKind::Action, "action"),
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply {
    pub observation: String,
    pub rationale: String,
    /// Cleaned action text, `None` when the reply names no action.
    pub action: Option<String>,
}

/// Drops list numbering such as `1.`, `2)` or `- `.
fn strip_numbering(line: &str) -> &str {
    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    if digits > 0 {
        if let Some(rest) = line[digits..].strip_prefix(['.', ')']) {
            return rest.trim_start();
        }
    }
    line.strip_prefix("- ").map(str::trim_start).unwrap_or(line)
}

/// Text after `label` in any of the forms `Label:`, `**Label:**`, `**Label**:`.
fn strip_label<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    let (bold, rest) = match line.strip_prefix("**") {
        Some(r) => (true, r),
        None => (false, line),
    };
    if !rest.get(..label.len())?.eq_ignore_ascii_case(label) {
        return None;
    }
    let rest = rest.get(label.len()..)?;
    let body = if bold {
        rest.strip_prefix(":**").or_else(|| rest.strip_prefix("**:"))?
    } else {
        rest.strip_prefix(':')?
    };
    Some(body.trim())
}

pub fn classify(line: &str) -> (LineKind, &str) {
    let line = strip_numbering(line.trim());
    LABELS
        .iter()
        .find_map(|(kind, label)| strip_label(line, label).map(|body| (*kind, body)))
        .unwrap_or((LineKind::Other, line))
}

/// Removes inline-code and emphasis markers around an action. Markers inside
/// the action, quoted arguments included, are kept.
pub fn clean_action(action: &str) -> String {
    action
        .trim_matches(|c: char| c == '`' || c == '*' || c.is_whitespace())
        .to_string()
}

/// Byte offset of the earliest `name(` token in `line`.
fn command_token(line: &str) -> Option<usize> {
    let lower = line.to_ascii_lowercase();
    COMMAND_NAMES
        .iter()
        .filter_map(|name| lower.find(&format!("{name}(")))
        .min()
}

pub fn parse_reply(text: &str) -> Reply {
    let mut reply = Reply::default();
    let mut lines = text.lines();
    while let Some(line) = lines.next() {
        match classify(line) {
            (LineKind::See, body) => reply.observation = body.to_string(),
            (LineKind::Think, body) => reply.rationale = body.to_string(),
            (LineKind::Action, body) => {
                // `Action:` on its own line puts the command on the next one.
                let body = if clean_action(body).is_empty() {
                    lines.by_ref().map(str::trim).find(|l| !l.is_empty()).unwrap_or("")
                } else {
                    body
                };
                let action = clean_action(body);
                reply.action = (!action.is_empty()).then_some(action);
                return reply;
            }
            (LineKind::Other, _) => {}
        }
    }

    // Only unlabelled prose; See/Think text and bold headings describe, not act.
    reply.action = text.lines().find_map(|line| match classify(line) {
        (LineKind::Other, body) if !body.starts_with("**") => {
            command_token(body).map(|at| clean_action(&body[at..]))
        }
        _ => None,
    });
    reply
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_labels() {
        let r = parse_reply("See: Desktop\nThink: open settings\nAction: open_app(\"System Settings\")");
        assert_eq!(r.observation, "Desktop");
        assert_eq!(r.rationale, "open settings");
        assert_eq!(r.action.as_deref(), Some("open_app(\"System Settings\")"));
    }

    #[test]
    fn bold_and_numbered_labels() {
        let r = parse_reply(
            "1. **See:** Finder window\n2. **Think**: click the sidebar\n3. **Action:** `left_click(0.1, 0.3)`",
        );
        assert_eq!(r.observation, "Finder window");
        assert_eq!(r.rationale, "click the sidebar");
        assert_eq!(r.action.as_deref(), Some("left_click(0.1, 0.3)"));
    }

    #[test]
    fn labels_are_case_insensitive() {
        assert_eq!(classify("ACTION: done()"), (LineKind::Action, "done()"));
        assert_eq!(classify("see: x").0, LineKind::See);
    }

    #[test]
    fn parsing_stops_at_first_action() {
        let r = parse_reply("Action: wait(500)\nAction: done()\nSee: late");
        assert_eq!(r.action.as_deref(), Some("wait(500)"));
        assert_eq!(r.observation, "");
    }

    #[test]
    fn action_on_following_line() {
        let r = parse_reply("Think: go\nAction:\n\n  `done()`\n");
        assert_eq!(r.action.as_deref(), Some("done()"));
    }

    #[test]
    fn falls_back_to_command_token() {
        let r = parse_reply("I will now press it: left_click(0.5, 0.5)");
        assert_eq!(r.action.as_deref(), Some("left_click(0.5, 0.5)"));
    }

    #[test]
    fn markup_inside_quoted_arguments_survives() {
        let r = parse_reply("See: calc\nThink: enter it\nAction: type_text(\"5*3=15\")");
        assert_eq!(r.action.as_deref(), Some("type_text(\"5*3=15\")"));

        let r = parse_reply("Action: **`bulk_type(\"* item one\\n* item two\")`**");
        assert_eq!(r.action.as_deref(), Some("bulk_type(\"* item one\\n* item two\")"));

        assert_eq!(clean_action("`hotkey(\"cmd+*\")`"), "hotkey(\"cmd+*\")");
    }

    #[test]
    fn fallback_ignores_labelled_and_bold_lines() {
        let r = parse_reply("See: a done() button\nThink: maybe left_click(0.1, 0.1)\n**Plan** wait(10)");
        assert_eq!(r.action, None);

        let r = parse_reply("Think: tricky\nThen hover(0.2, 0.4) to reveal it");
        assert_eq!(r.action.as_deref(), Some("hover(0.2, 0.4) to reveal it"));
    }

    #[test]
    fn reply_without_action() {
        let r = parse_reply("See: nothing happening\nThink: hmm");
        assert_eq!(r.action, None);
        assert_eq!(r.observation, "nothing happening");
    }

    #[test]
    fn unlabelled_lines_are_other() {
        assert_eq!(classify("Seems fine").0, LineKind::Other);
        assert_eq!(classify("Actions speak louder"), (LineKind::Other, "Actions speak louder"));
    }
}
