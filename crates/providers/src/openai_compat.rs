//! OpenAI-compatible chat completion provider.
//!
//! Works with OpenAI itself and any endpoint exposing the same
//! `/chat/completions` contract (OpenRouter, vLLM, Ollama and friends).

use async_trait::async_trait;
use docrelay_core::error::ProviderError;
use docrelay_core::provider::{Provider, ProviderKind};
use serde_json::json;
use tracing::debug;

use crate::http::{JsonPost, build_client};
use crate::normalize::{CHAT_ANSWER_PATH, extract_answer};

/// System message sent ahead of every prompt.
pub const SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// A chat-completions provider.
pub struct OpenAiCompatProvider {
    name: String,
    base_url: String,
    model: String,
    answer_path: String,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Create a provider talking to `{base_url}/chat/completions`.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            answer_path: CHAT_ANSWER_PATH.to_string(),
            timeout_secs,
            client: build_client(timeout_secs)?,
        })
    }

    /// Create an OpenAI provider (convenience constructor).
    pub fn openai(model: impl Into<String>, timeout_secs: u64) -> Result<Self, ProviderError> {
        Self::new("openai", "https://api.openai.com/v1", model, timeout_secs)
    }

    /// Read the answer from a different location in the response body.
    pub fn with_answer_path(mut self, path: impl Into<String>) -> Self {
        self.answer_path = path.into();
        self
    }

    fn request_body(&self, prompt: &str, max_tokens: u32) -> serde_json::Value {
        json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": prompt},
            ],
            "max_tokens": max_tokens,
        })
    }
}

#[async_trait]
impl Provider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn send(
        &self,
        prompt: &str,
        max_tokens: u32,
        api_key: &str,
    ) -> std::result::Result<String, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.request_body(prompt, max_tokens);

        debug!(
            provider = %self.name,
            model = %self.model,
            max_tokens,
            "Sending chat completion request"
        );

        let response = JsonPost {
            provider: &self.name,
            url: &url,
            api_key,
            headers: &[],
            body: &body,
            timeout_secs: self.timeout_secs,
        }
        .send(&self.client)
        .await?;

        extract_answer(&self.name, &self.answer_path, &response)
    }
}
