// Click interception: a click aimed at the desktop while the quick-search
// overlay holds focus would dismiss it, so the overlay is confirmed instead.
use async_trait::async_trait;

/// Reports whether a system quick-search overlay currently has focus.
#[async_trait]
pub trait OverlayDetector: Send + Sync {
    async fn quick_search_frontmost(&self) -> bool;
}

/// Process names that identify the macOS Spotlight overlay, matched anywhere
/// in the name.
pub fn is_quick_search_process(name: &str) -> bool {
    name.to_ascii_lowercase().contains("spotlight")
}

/// Asks System Events for the frontmost process. Any failure reads as
/// "not frontmost".
pub struct SpotlightDetector;

#[async_trait]
impl OverlayDetector for SpotlightDetector {
    async fn quick_search_frontmost(&self) -> bool {
        if !cfg!(target_os = "macos") {
            return false;
        }
        let output = tokio::process::Command::new("osascript")
            .arg("-e")
            .arg(r#"tell application "System Events" to get name of first process whose frontmost is true"#)
            .output()
            .await;
        match output {
            Ok(out) if out.status.success() => {
                let name = String::from_utf8_lossy(&out.stdout);
                let frontmost = is_quick_search_process(&name);
                tracing::debug!(process = %name.trim(), frontmost, "frontmost process");
                frontmost
            }
            Ok(out) => {
                tracing::debug!(status = %out.status, "osascript returned failure");
                false
            }
            Err(e) => {
                tracing::debug!(error = %e, "osascript unavailable");
                false
            }
        }
    }
}

/// Never reports an overlay.
pub struct NoOverlay;

#[async_trait]
impl OverlayDetector for NoOverlay {
    async fn quick_search_frontmost(&self) -> bool {
        false
    }
}
