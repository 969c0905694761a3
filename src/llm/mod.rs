pub mod provider;
pub mod providers;
pub mod types;

use std::sync::Arc;

use crate::config::{LlmConfig, ProviderKind};
use crate::llm::providers::gemini::GeminiProvider;
use crate::llm::providers::openai_compatible::OpenAiCompatibleProvider;

pub use provider::Reasoner;

/// Builds the reasoner named by `[llm] provider`.
pub fn build_reasoner(cfg: &LlmConfig, api_key: String) -> Arc<dyn Reasoner> {
    tracing::info!(provider = cfg.provider.id(), model = %cfg.model, "reasoning provider selected");
    match cfg.provider {
        ProviderKind::Gemini => Arc::new(GeminiProvider::new(
            cfg.api_base.clone(),
            api_key,
            cfg.model.clone(),
            cfg.temperature,
        )),
        ProviderKind::OpenaiCompatible => Arc::new(OpenAiCompatibleProvider::new(
            cfg.api_base.clone(),
            api_key,
            cfg.model.clone(),
            cfg.temperature,
        )),
    }
}
