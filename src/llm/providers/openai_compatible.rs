use async_trait::async_trait;
use base64::Engine as _;

use crate::errors::{PilotError, PilotResult};
use crate::llm::provider::Reasoner;
use crate::llm::providers::status_error;
use crate::llm::types::{ChatMessage, ChatRequest, ContentPart, ImageUrl, MessageContent};

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1/chat/completions";

/// Any endpoint that speaks the chat-completions protocol with image parts.
pub struct OpenAiCompatibleProvider {
    api_base: String,
    api_key: String,
    model: String,
    temperature: f64,
    client: reqwest::Client,
}

impl OpenAiCompatibleProvider {
    pub fn new(api_base: Option<String>, api_key: String, model: String, temperature: f64) -> Self {
        Self {
            api_base: api_base.unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            api_key,
            model,
            temperature,
            client: reqwest::Client::new(),
        }
    }

    fn request(&self, prompt: &str, image_jpeg: &[u8]) -> ChatRequest<'_> {
        let b64 = base64::engine::general_purpose::STANDARD.encode(image_jpeg);
        ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user".into(),
                content: MessageContent::Parts(vec![
                    ContentPart::Text {
                        text: prompt.to_string(),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: format!("data:image/jpeg;base64,{b64}"),
                        },
                    },
                ]),
            }],
            temperature: self.temperature,
            stream: false,
        }
    }
}

/// Text of the first choice in a chat-completions reply.
fn reply_text(json: &serde_json::Value) -> Option<String> {
    json["choices"][0]["message"]["content"]
        .as_str()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[async_trait]
impl Reasoner for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        "openai_compatible"
    }

    async fn infer(&self, prompt: &str, image_jpeg: &[u8]) -> PilotResult<String> {
        let body = self.request(prompt, image_jpeg);
        tracing::debug!(
            model = %self.model,
            api_base = %self.api_base,
            image_bytes = image_jpeg.len(),
            "sending chat request"
        );

        let response = self
            .client
            .post(&self.api_base)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let json: serde_json::Value = response.json().await?;
        let content = reply_text(&json)
            .ok_or_else(|| PilotError::LlmProvider("chat reply had no content".into()))?;
        tracing::info!(content_len = content.len(), "chat response received");
        Ok(content)
    }
}
