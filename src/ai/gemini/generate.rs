use super::client::GeminiHttpClient;
use super::types::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part,
};
use crate::ai::GenerationService;
use crate::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;

const MAX_OUTPUT_TOKENS: u32 = 4096;

pub struct GeminiGenerationClient {
    http: GeminiHttpClient,
}

impl GeminiGenerationClient {
    pub fn new(model: String, timeout: Duration) -> Self {
        Self::new_with_client(model, timeout, reqwest::Client::new())
    }

    pub fn new_with_client(model: String, timeout: Duration, client: reqwest::Client) -> Self {
        Self {
            http: GeminiHttpClient::new_with_client(model, timeout, client),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.http = self.http.with_base_url(base_url);
        self
    }

    pub fn model(&self) -> &str {
        self.http.model()
    }
}

#[async_trait]
impl GenerationService for GeminiGenerationClient {
    async fn generate(&self, prompt: &str, credential: &str) -> Result<String> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
            generation_config: Some(GenerationConfig {
                max_output_tokens: Some(MAX_OUTPUT_TOKENS),
            }),
        };

        tracing::debug!(model = self.model(), "Sending generateContent request");
        let response: GenerateContentResponse =
            self.http.generate_content(&request, credential).await?;

        response
            .first_text()
            .ok_or_else(|| Error::Upstream("No text in Gemini response".to_string()))
    }
}
