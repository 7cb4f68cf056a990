//! Provider trait: the abstraction over LLM backends.
//!
//! A Provider knows how to send one final prompt to an LLM endpoint and hand
//! back the single normalized answer string. One round trip, no retries.
//!
//! Implementations: OpenAI-compatible chat, Claude-compatible completion,
//! custom completion endpoints.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{Error, ProviderError};

/// The message returned for any selector outside the supported set.
pub const INVALID_SELECTION: &str = "Invalid API selection";

/// Which provider variant a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAi,
    Claude,
    Custom,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [Self::OpenAi, Self::Claude, Self::Custom];

    /// The exact selector string accepted on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Claude => "claude",
            Self::Custom => "custom",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = Error;

    /// Exact, case-sensitive match. Anything else is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "openai" => Ok(Self::OpenAi),
            "claude" => Ok(Self::Claude),
            "custom" => Ok(Self::Custom),
            _ => Err(Error::Validation(INVALID_SELECTION.into())),
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The core Provider trait.
///
/// The relay pipeline calls `send()` without knowing which backend answers.
/// `max_tokens` is always the planned output budget, never the caller's raw
/// request.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "openai").
    fn name(&self) -> &str;

    /// Which variant this provider implements.
    fn kind(&self) -> ProviderKind;

    /// The model identifier sent in every payload.
    fn model(&self) -> &str;

    /// Send the final prompt and return the normalized answer text.
    async fn send(
        &self,
        prompt: &str,
        max_tokens: u32,
        api_key: &str,
    ) -> std::result::Result<String, ProviderError>;
}
