/// Instruction text sent with every screenshot.
pub fn build_prompt(task: &str) -> String {
    format!(
        "\
You operate a macOS desktop on behalf of the user. Every turn you receive a
screenshot overlaid with a red ratio grid (labels give x,y from 0.00 at the
top-left to 1.00 at the bottom-right) and choose exactly ONE next command.

TASK: {task}

## Workflow commands (prefer these when they fit)
- open_app(\"App Name\")      open an application through Spotlight
- web_search(\"terms\")       open Safari in a new tab and search

## Direct commands
- left_click(x, y)            click at ratio coordinates, e.g. left_click(0.45, 0.12)
- double_click(x, y)          double-click at ratio coordinates
- move_mouse(x, y)            move the pointer without clicking
- hover(x, y)                 move the pointer and pause for tooltips or menus
- type_text(\"text\")          type into the focused field
- bulk_type(\"line one\\nline two\")  type several lines, pressing Return between them
- hotkey(\"cmd+w\")            press a key chord (cmd, shift, alt, ctrl + key)
- scroll(\"up|down|left|right\")  scroll the active window
- focus_address_bar()         focus the browser address bar
- wait(ms)                    wait for the UI to settle
- done()                      the whole task is complete

Coordinates are fractions of the screen, never pixels.

## Reply format (three lines, nothing else)
See: <what is on screen now>
Think: <which sub-task comes next and which command does it>
Action: <one command>
"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::COMMAND_NAMES;

    #[test]
    fn prompt_embeds_task_and_full_vocabulary() {
        let prompt = build_prompt("open notes");
        assert!(prompt.contains("TASK: open notes"));
        for name in COMMAND_NAMES {
            assert!(prompt.contains(&format!("{name}(")), "missing {name}");
        }
        assert!(prompt.contains("Action: <one command>"));
    }
}
