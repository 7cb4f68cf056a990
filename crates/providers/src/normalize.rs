//! Response normalization: pull the single answer string out of a
//! provider-specific response body.

use docrelay_core::error::ProviderError;
use serde_json::Value;

/// Where chat-completion style providers put the answer.
pub const CHAT_ANSWER_PATH: &str = "choices.0.message.content";

/// Where Claude-style text completion puts the answer.
pub const COMPLETION_ANSWER_PATH: &str = "completion";

/// Default answer location for custom endpoints.
pub const RESULT_ANSWER_PATH: &str = "result";

/// Follow a dot-separated `path` through `body` and return the string there,
/// trimmed. Numeric segments index into arrays.
///
/// A missing field or a non-string value is a malformed response, never a
/// transport or provider error.
pub fn extract_answer(provider: &str, path: &str, body: &Value) -> Result<String, ProviderError> {
    let malformed = |reason: String| ProviderError::MalformedResponse {
        provider: provider.to_string(),
        reason,
    };

    let mut current = body;
    for segment in path.split('.') {
        let next = match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        };
        current = next.ok_or_else(|| malformed(format!("missing field `{path}`")))?;
    }

    current
        .as_str()
        .map(|s| s.trim().to_string())
        .ok_or_else(|| malformed(format!("field `{path}` is not a string")))
}
