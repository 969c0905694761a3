use async_trait::async_trait;
use base64::Engine as _;

use crate::errors::{PilotError, PilotResult};
use crate::llm::provider::Reasoner;
use crate::llm::providers::status_error;
use crate::llm::types::{
    GeminiContent, GeminiPart, GeminiRequest, GeminiResponse, GenerationConfig, InlineData,
};

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Google Gemini `generateContent` over REST.
pub struct GeminiProvider {
    api_base: String,
    api_key: String,
    model: String,
    temperature: f64,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(api_base: Option<String>, api_key: String, model: String, temperature: f64) -> Self {
        Self {
            api_base: api_base
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
            api_key,
            model,
            temperature,
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.api_base, self.model)
    }

    fn request(&self, prompt: &str, image_jpeg: &[u8]) -> GeminiRequest {
        GeminiRequest {
            contents: vec![GeminiContent {
                role: Some("user".into()),
                parts: vec![
                    GeminiPart::Text {
                        text: prompt.to_string(),
                    },
                    GeminiPart::InlineData {
                        inline_data: InlineData {
                            mime_type: "image/jpeg".into(),
                            data: base64::engine::general_purpose::STANDARD.encode(image_jpeg),
                        },
                    },
                ],
            }],
            generation_config: Some(GenerationConfig {
                temperature: self.temperature,
            }),
        }
    }
}

#[async_trait]
impl Reasoner for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn infer(&self, prompt: &str, image_jpeg: &[u8]) -> PilotResult<String> {
        let body = self.request(prompt, image_jpeg);
        tracing::debug!(
            model = %self.model,
            prompt_len = prompt.len(),
            image_bytes = image_jpeg.len(),
            "sending Gemini request"
        );

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let parsed: GeminiResponse = response.json().await?;
        let text = parsed
            .text()
            .ok_or_else(|| PilotError::LlmProvider("Gemini reply had no text".into()))?;
        tracing::info!(content_len = text.len(), "Gemini response received");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_includes_model_and_trims_base() {
        let p = GeminiProvider::new(
            Some("http://localhost:8080/".into()),
            "k".into(),
            "gemini-flash-latest".into(),
            0.1,
        );
        assert_eq!(
            p.endpoint(),
            "http://localhost:8080/v1beta/models/gemini-flash-latest:generateContent"
        );
    }

    #[test]
    fn request_sends_prompt_then_base64_jpeg() {
        let p = GeminiProvider::new(None, "k".into(), "m".into(), 0.1);
        let json = serde_json::to_value(p.request("look", &[0xff, 0xd8])).unwrap();
        let parts = &json["contents"][0]["parts"];
        assert_eq!(parts[0]["text"], "look");
        assert_eq!(parts[1]["inline_data"]["data"], "/9g=");
    }
}
