use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::calibration::CalibrationOffset;
use crate::errors::PilotResult;

pub const X_OFFSET_KEY: &str = "SCREENPILOT_X_OFFSET";
pub const Y_OFFSET_KEY: &str = "SCREENPILOT_Y_OFFSET";

/// Calibration offsets kept as `KEY=value` lines in a dotenv-style file.
/// Lines the store does not own are preserved verbatim.
#[derive(Debug, Clone)]
pub struct CalibrationStore {
    path: PathBuf,
}

impl CalibrationStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Never fails: a missing file or unparsable value reads as zero.
    pub fn load(&self) -> CalibrationOffset {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(path = %self.path.display(), error = %e, "calibration file unreadable");
                }
                return CalibrationOffset::ZERO;
            }
        };
        let offset = CalibrationOffset {
            dx: lookup(&content, X_OFFSET_KEY).unwrap_or(0),
            dy: lookup(&content, Y_OFFSET_KEY).unwrap_or(0),
        };
        tracing::debug!(dx = offset.dx, dy = offset.dy, path = %self.path.display(), "calibration loaded");
        offset
    }

    /// Upserts both keys and rewrites the file through a sibling temp file.
    pub fn save(&self, offset: CalibrationOffset) -> PilotResult<()> {
        let existing = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };

        // Keep the file's own line terminator.
        let newline = if existing.contains("\r\n") { "\r\n" } else { "\n" };
        let mut lines: Vec<String> = existing.lines().map(str::to_string).collect();
        upsert(&mut lines, X_OFFSET_KEY, offset.dx);
        upsert(&mut lines, Y_OFFSET_KEY, offset.dy);

        let mut body = lines.join(newline);
        body.push_str(newline);

        let tmp = self.temp_path();
        std::fs::write(&tmp, body)?;
        if let Err(e) = std::fs::rename(&tmp, &self.path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }
        tracing::info!(dx = offset.dx, dy = offset.dy, path = %self.path.display(), "calibration saved");
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name: OsString = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| OsString::from("calibration"));
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

/// Value part of `line` if it assigns `key`.
fn value_for<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let rest = line.trim_start().strip_prefix(key)?;
    rest.trim_start().strip_prefix('=').map(str::trim)
}

fn lookup(content: &str, key: &str) -> Option<i32> {
    content
        .lines()
        .find_map(|line| value_for(line, key))
        .and_then(parse_offset)
}

fn parse_offset(raw: &str) -> Option<i32> {
    let raw = raw.trim_matches(|c| c == '"' || c == '\'');
    if let Ok(v) = raw.parse::<i32>() {
        return Some(v);
    }
    // Decimal offsets from hand-edited files are truncated toward zero.
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && v.abs() < i32::MAX as f64)
        .map(|v| v.trunc() as i32)
}

fn upsert(lines: &mut Vec<String>, key: &str, value: i32) {
    let entry = format!("{key}={value}");
    match lines.iter_mut().find(|line| value_for(line, key).is_some()) {
        Some(line) => *line = entry,
        None => lines.push(entry),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> CalibrationStore {
        CalibrationStore::new(dir.path().join(".env"))
    }

    #[test]
    fn missing_file_loads_zero() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(store_in(&dir).load(), CalibrationOffset::ZERO);
    }

    #[test]
    fn save_then_load_returns_same_offset() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.save(CalibrationOffset::new(-12, 7)).unwrap();
        assert_eq!(store.load(), CalibrationOffset::new(-12, 7));

        store.save(CalibrationOffset::new(3, 0)).unwrap();
        assert_eq!(store.load(), CalibrationOffset::new(3, 0));
    }

    #[test]
    fn save_preserves_unrelated_entries() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(
            store.path(),
            "GOOGLE_API_KEY=abc123\n# comment line\nSCREENPILOT_X_OFFSET=1\nOTHER = spaced value\n",
        )
        .unwrap();

        store.save(CalibrationOffset::new(4, -2)).unwrap();

        let content = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(
            content,
            "GOOGLE_API_KEY=abc123\n# comment line\nSCREENPILOT_X_OFFSET=4\nOTHER = spaced value\nSCREENPILOT_Y_OFFSET=-2\n"
        );
    }

    #[test]
    fn save_keeps_crlf_line_endings() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), "GOOGLE_API_KEY=abc\r\nSCREENPILOT_Y_OFFSET=9\r\n").unwrap();

        store.save(CalibrationOffset::new(-1, 2)).unwrap();

        assert_eq!(
            std::fs::read_to_string(store.path()).unwrap(),
            "GOOGLE_API_KEY=abc\r\nSCREENPILOT_Y_OFFSET=2\r\nSCREENPILOT_X_OFFSET=-1\r\n"
        );
        assert_eq!(store.load(), CalibrationOffset::new(-1, 2));
    }

    #[test]
    fn save_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.save(CalibrationOffset::new(5, 5)).unwrap();
        let first = std::fs::read_to_string(store.path()).unwrap();
        store.save(CalibrationOffset::new(5, 5)).unwrap();
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), first);
        assert!(!dir.path().join(".env.tmp").exists());
    }

    #[test]
    fn garbage_values_default_per_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(
            store.path(),
            "SCREENPILOT_X_OFFSET=left-ish\nSCREENPILOT_Y_OFFSET=\"-3.8\"\n",
        )
        .unwrap();
        assert_eq!(store.load(), CalibrationOffset::new(0, -3));
    }

    #[test]
    fn key_prefix_does_not_match_longer_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), "SCREENPILOT_X_OFFSET_OLD=99\n").unwrap();
        assert_eq!(store.load().dx, 0);
        store.save(CalibrationOffset::new(1, 1)).unwrap();
        let content = std::fs::read_to_string(store.path()).unwrap();
        assert!(content.starts_with("SCREENPILOT_X_OFFSET_OLD=99\n"));
    }
}
