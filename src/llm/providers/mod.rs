pub mod gemini;
pub mod openai_compatible;

use crate::errors::PilotError;

/// Error for a non-success HTTP response. A `Retry-After` header is folded
/// into the message as a `retry in Ns` marker so the planner's backoff can
/// read it without knowing about HTTP.
pub(crate) async fn status_error(response: reqwest::Response) -> PilotError {
    let status = response.status();
    let retry_after = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());
    let body = response.text().await.unwrap_or_default();
    PilotError::LlmProvider(format_status_error(status.as_u16(), status.canonical_reason(), &body, retry_after))
}

fn format_status_error(code: u16, reason: Option<&str>, body: &str, retry_after: Option<u64>) -> String {
    let mut msg = match reason {
        Some(r) => format!("{code} {r}: {body}"),
        None => format!("{code}: {body}"),
    };
    if let Some(secs) = retry_after {
        msg.push_str(&format!(" (retry in {secs}s)"));
    }
    msg
}
