//! Command-line arguments.

use clap::Parser;

/// screenpilot - drives the desktop from screenshots toward a natural-language task
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "screenpilot")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Run the interactive pointer calibration instead of a task
    #[arg(long)]
    pub calibrate: bool,

    /// Task to perform, or `calibrate`
    #[arg(trailing_var_arg = true)]
    pub task: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Calibrate,
    Task(String),
}

impl Cli {
    /// `None` when neither a task nor calibration was requested.
    pub fn mode(&self) -> Option<Mode> {
        let task = self.task.join(" ");
        let task = task.trim();
        if self.calibrate || task.eq_ignore_ascii_case("calibrate") {
            return Some(Mode::Calibrate);
        }
        (!task.is_empty()).then(|| Mode::Task(task.to_string()))
    }
}

pub const USAGE: &str = "usage: screenpilot \"<task>\" | screenpilot calibrate | screenpilot --calibrate";

#[cfg(test)]
mod tests {
    use super::*;

    fn mode(args: &[&str]) -> Option<Mode> {
        Cli::try_parse_from(std::iter::once("screenpilot").chain(args.iter().copied()))
            .unwrap()
            .mode()
    }

    #[test]
    fn quoted_task() {
        assert_eq!(
            mode(&["open system settings"]),
            Some(Mode::Task("open system settings".into()))
        );
    }

    #[test]
    fn unquoted_words_are_joined() {
        assert_eq!(mode(&["open", "notes"]), Some(Mode::Task("open notes".into())));
    }

    #[test]
    fn both_calibrate_spellings() {
        assert_eq!(mode(&["calibrate"]), Some(Mode::Calibrate));
        assert_eq!(mode(&["--calibrate"]), Some(Mode::Calibrate));
    }

    #[test]
    fn missing_argument() {
        assert_eq!(mode(&[]), None);
        assert_eq!(mode(&["   "]), None);
    }
}
