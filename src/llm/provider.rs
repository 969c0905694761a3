use async_trait::async_trait;

use crate::errors::PilotResult;

/// Unified reasoning-service interface: one screenshot plus a prompt in,
/// free text out. Every provider implements this trait.
#[async_trait]
pub trait Reasoner: Send + Sync {
    /// Provider identifier (matches `llm.provider` in config.toml).
    fn name(&self) -> &str;

    /// Sends the prompt with the JPEG screenshot attached and returns the
    /// model's text reply. Rate-limit responses surface as
    /// `PilotError::LlmProvider` carrying the status and body.
    async fn infer(&self, prompt: &str, image_jpeg: &[u8]) -> PilotResult<String>;
}
