//! Inbound relay requests and their one-time normalization.
//!
//! [`PromptRequest`] is what arrives on the wire. [`PromptRequest::normalize`]
//! validates it and fills in every default, so nothing downstream has to
//! re-check or coerce anything.

use serde::{Deserialize, Serialize};

use crate::document::is_valid_document_id;
use crate::error::{Error, Result};
use crate::provider::ProviderKind;

/// Prompt used when the caller sends none (or only whitespace).
pub const DEFAULT_PROMPT: &str = "Summarize";

/// Output-token ceiling used when the caller sends none (or garbage).
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 100;

/// The raw request body of `POST /api/send-to-ai`.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptRequest {
    /// Provider selector: "openai", "claude" or "custom".
    #[serde(default)]
    pub api: String,

    #[serde(default)]
    pub prompt: Option<String>,

    #[serde(default)]
    pub selected_document_ids: Vec<String>,

    /// Use the caller's own key instead of the operator's.
    #[serde(default)]
    pub use_frontend_api_key: bool,

    #[serde(default)]
    pub open_ai_api_key: Option<String>,

    #[serde(default)]
    pub claude_api_key: Option<String>,

    #[serde(default)]
    pub custom_api_key: Option<String>,

    /// Kept loose: anything that is not a positive integer means "default".
    #[serde(default)]
    pub max_tokens: Option<serde_json::Value>,
}

impl std::fmt::Debug for PromptRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |key: &Option<String>| key.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("PromptRequest")
            .field("api", &self.api)
            .field("prompt", &self.prompt)
            .field("selected_document_ids", &self.selected_document_ids)
            .field("use_frontend_api_key", &self.use_frontend_api_key)
            .field("open_ai_api_key", &redact(&self.open_ai_api_key))
            .field("claude_api_key", &redact(&self.claude_api_key))
            .field("custom_api_key", &redact(&self.custom_api_key))
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

/// Which credential a dispatch must use.
#[derive(Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// The key held in server configuration.
    Operator,
    /// A key supplied by the caller in the request body.
    Caller(String),
}

impl std::fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Operator => f.write_str("Operator"),
            Self::Caller(_) => f.write_str("Caller([REDACTED])"),
        }
    }
}

/// A fully validated request with every default applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRequest {
    pub provider: ProviderKind,
    pub prompt: String,
    pub document_ids: Vec<String>,
    pub credential: CredentialSource,
    pub max_output_tokens: u32,
}

impl PromptRequest {
    /// Validate and default this request.
    ///
    /// Checks run in this order, all before any I/O: provider selector,
    /// document selection, then credential availability.
    pub fn normalize(self, default_max_tokens: u32) -> Result<NormalizedRequest> {
        let provider: ProviderKind = self.api.parse()?;

        if self.selected_document_ids.is_empty() {
            return Err(Error::Validation("No documents selected".into()));
        }
        if let Some(bad) = self
            .selected_document_ids
            .iter()
            .find(|id| !is_valid_document_id(id))
        {
            return Err(Error::Validation(format!("Invalid document id: '{bad}'")));
        }

        let credential = if self.use_frontend_api_key {
            let supplied = match provider {
                ProviderKind::OpenAi => self.open_ai_api_key,
                ProviderKind::Claude => self.claude_api_key,
                ProviderKind::Custom => self.custom_api_key,
            };
            match supplied {
                Some(key) if !key.trim().is_empty() => {
                    CredentialSource::Caller(key.trim().to_string())
                }
                _ => {
                    return Err(Error::Credential(format!(
                        "Caller-supplied {provider} API key requested but not provided"
                    )));
                }
            }
        } else {
            CredentialSource::Operator
        };

        let prompt = match self.prompt {
            Some(p) if !p.trim().is_empty() => p,
            _ => DEFAULT_PROMPT.to_string(),
        };

        let max_output_tokens = self
            .max_tokens
            .as_ref()
            .and_then(coerce_positive_tokens)
            .unwrap_or(default_max_tokens);

        let document_ids = self
            .selected_document_ids
            .iter()
            .map(|id| id.to_ascii_lowercase())
            .collect();

        Ok(NormalizedRequest {
            provider,
            prompt,
            document_ids,
            credential,
            max_output_tokens,
        })
    }
}

/// Accept positive integers, integral floats and numeric strings.
fn coerce_positive_tokens(value: &serde_json::Value) -> Option<u32> {
    let n = match value {
        serde_json::Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f > 0.0).map(|f| f as u64)),
        serde_json::Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }?;
    if n == 0 {
        return None;
    }
    Some(u32::try_from(n).unwrap_or(u32::MAX))
}
