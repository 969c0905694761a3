// Rate-limit detection on reasoning errors and the fallback taken after the
// backoff sleep.
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;

use crate::grammar::Command;

/// Sleep used when a rate-limit error carries no retry hint.
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(10);
/// Added on top of the server's retry hint.
pub const BACKOFF_MARGIN: Duration = Duration::from_secs(1);
/// Longest retry hint honoured.
pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(120);

const BROWSER_KEYWORDS: &[&str] = &["safari", "browser", "chrome", "firefox"];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimit {
    pub retry_after: Option<Duration>,
}

impl RateLimit {
    pub fn backoff(&self) -> Duration {
        match self.retry_after {
            Some(d) => d + BACKOFF_MARGIN,
            None => DEFAULT_BACKOFF,
        }
    }
}

fn status_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b429\b").expect("valid regex"))
}

fn retry_in_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)retry in\s+(\d+(?:\.\d+)?)\s*s").expect("valid regex"))
}

fn retry_delay_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#""retryDelay"\s*:\s*"(\d+(?:\.\d+)?)s""#).expect("valid regex")
    })
}

fn retry_hint(msg: &str) -> Option<Duration> {
    let secs: f64 = retry_in_re()
        .captures(msg)
        .or_else(|| retry_delay_re().captures(msg))?
        .get(1)?
        .as_str()
        .parse()
        .ok()?;
    if !secs.is_finite() || secs < 0.0 {
        return None;
    }
    Some(Duration::from_secs_f64(secs).min(MAX_RETRY_AFTER))
}

/// Classifies a reasoning error message. `None` means "not rate limited".
pub fn rate_limit_signal(msg: &str) -> Option<RateLimit> {
    let lower = msg.to_lowercase();
    let retry_after = retry_hint(msg);
    let limited = status_re().is_match(msg)
        || msg.contains("RESOURCE_EXHAUSTED")
        || lower.contains("rate limit")
        || lower.contains("too many requests")
        || retry_after.is_some();
    limited.then_some(RateLimit { retry_after })
}

/// Command returned in place of a plan after a rate-limit backoff.
pub fn rate_limit_fallback(task: &str) -> Command {
    let task = task.to_lowercase();
    let browser = BROWSER_KEYWORDS.iter().any(|k| task.contains(k));
    if browser && task.contains("search") {
        Command::Hotkey("cmd+t".into())
    } else {
        Command::Done
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_marker_gives_duration() {
        let sig = rate_limit_signal("429 RESOURCE_EXHAUSTED. Please retry in 3.5s.").unwrap();
        assert_eq!(sig.retry_after, Some(Duration::from_millis(3500)));
        assert_eq!(sig.backoff(), Duration::from_millis(4500));
    }

    #[test]
    fn gemini_retry_delay_field_is_read() {
        let body = r#"{"error":{"code":429,"details":[{"retryDelay":"12s"}]}}"#;
        let sig = rate_limit_signal(body).unwrap();
        assert_eq!(sig.retry_after, Some(Duration::from_secs(12)));
    }

    #[test]
    fn markers_without_duration_use_default() {
        for msg in ["HTTP 429", "RESOURCE_EXHAUSTED", "Rate limit exceeded", "Too Many Requests"] {
            let sig = rate_limit_signal(msg).unwrap_or_else(|| panic!("{msg}"));
            assert_eq!(sig.backoff(), DEFAULT_BACKOFF, "{msg}");
        }
    }

    #[test]
    fn unrelated_errors_are_not_rate_limits() {
        assert_eq!(rate_limit_signal("500 Internal Server Error"), None);
        assert_eq!(rate_limit_signal("connection refused"), None);
        // 429 embedded in a longer number is not a status code.
        assert_eq!(rate_limit_signal("request id 14290"), None);
    }

    #[test]
    fn huge_retry_hint_is_capped() {
        let sig = rate_limit_signal("retry in 9000s").unwrap();
        assert_eq!(sig.retry_after, Some(MAX_RETRY_AFTER));
    }

    #[test]
    fn fallback_needs_browser_and_search() {
        assert_eq!(
            rate_limit_fallback("Open Safari and search for otters"),
            Command::Hotkey("cmd+t".into())
        );
        assert_eq!(rate_limit_fallback("search my files"), Command::Done);
        assert_eq!(rate_limit_fallback("open chrome"), Command::Done);
    }
}
