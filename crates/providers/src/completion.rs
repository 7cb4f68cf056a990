//! Single-prompt completion providers: Claude's text completion API and
//! operator-defined custom endpoints.
//!
//! Both take one prompt field and one output-limit field and put the answer
//! at a single location in the response. Field names are configurable.

use async_trait::async_trait;
use docrelay_core::error::ProviderError;
use docrelay_core::provider::{Provider, ProviderKind};
use serde_json::{Map, Value};
use tracing::debug;

use crate::http::{JsonPost, build_client};
use crate::normalize::{COMPLETION_ANSWER_PATH, RESULT_ANSWER_PATH, extract_answer};

/// API version header sent to Claude.
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// How the final prompt is framed before it goes into the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PromptFrame {
    Raw,
    /// `\n\nHuman: ...\n\nAssistant:` turn markers.
    HumanAssistant,
}

pub struct CompletionProvider {
    name: String,
    kind: ProviderKind,
    endpoint: String,
    model: String,
    prompt_field: String,
    max_tokens_field: String,
    answer_path: String,
    frame: PromptFrame,
    headers: Vec<(String, String)>,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl CompletionProvider {
    /// Claude text completion (`/v1/complete`).
    pub fn claude(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            name: "claude".into(),
            kind: ProviderKind::Claude,
            endpoint: endpoint.into(),
            model: model.into(),
            prompt_field: "prompt".into(),
            max_tokens_field: "max_tokens_to_sample".into(),
            answer_path: COMPLETION_ANSWER_PATH.into(),
            frame: PromptFrame::HumanAssistant,
            headers: vec![("anthropic-version".into(), ANTHROPIC_VERSION.into())],
            timeout_secs,
            client: build_client(timeout_secs)?,
        })
    }

    /// A custom endpoint taking `{model, prompt, max_tokens}` and answering `{result}`.
    pub fn custom(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            name: "custom".into(),
            kind: ProviderKind::Custom,
            endpoint: endpoint.into(),
            model: model.into(),
            prompt_field: "prompt".into(),
            max_tokens_field: "max_tokens".into(),
            answer_path: RESULT_ANSWER_PATH.into(),
            frame: PromptFrame::Raw,
            headers: Vec::new(),
            timeout_secs,
            client: build_client(timeout_secs)?,
        })
    }

    /// Override payload and response field names. `None` keeps the default.
    pub fn with_fields(
        mut self,
        prompt_field: Option<&str>,
        max_tokens_field: Option<&str>,
        answer_path: Option<&str>,
    ) -> Self {
        if let Some(field) = prompt_field {
            self.prompt_field = field.to_string();
        }
        if let Some(field) = max_tokens_field {
            self.max_tokens_field = field.to_string();
        }
        if let Some(path) = answer_path {
            self.answer_path = path.to_string();
        }
        self
    }

    fn request_body(&self, prompt: &str, max_tokens: u32) -> Value {
        let prompt = match self.frame {
            PromptFrame::Raw => prompt.to_string(),
            PromptFrame::HumanAssistant => format!("\n\nHuman: {prompt}\n\nAssistant:"),
        };

        let mut body = Map::new();
        body.insert("model".into(), Value::String(self.model.clone()));
        body.insert(self.prompt_field.clone(), Value::String(prompt));
        body.insert(self.max_tokens_field.clone(), Value::from(max_tokens));
        Value::Object(body)
    }
}

#[async_trait]
impl Provider for CompletionProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ProviderKind {
        self.kind
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
        let body = self.request_body(prompt, max_tokens);
        debug!(
            provider = %self.name,
            model = %self.model,
            max_tokens,
            "Sending completion request"
        );

        let response = JsonPost {
            provider: &self.name,
            url: &self.endpoint,
            api_key,
            headers: &self.headers,
            body: &body,
            timeout_secs: self.timeout_secs,
        }
        .send(&self.client)
        .await?;

        extract_answer(&self.name, &self.answer_path, &response)
    }
}
