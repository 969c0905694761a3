use async_trait::async_trait;

use crate::perception::types::CapturedFrame;

/// Screen capture collaborator. `None` means no frame could be taken; the
/// control loop treats that as fatal.
#[async_trait]
pub trait ScreenCapture: Send + Sync {
    async fn capture(&self) -> Option<CapturedFrame>;
}
