//! Error types for the DocRelay domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; [`Error::kind`] flattens
//! them into the small set of kinds callers branch on.

use serde::Serialize;
use thiserror::Error;

/// The top-level error type for all DocRelay operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Request validation ---
    #[error("{0}")]
    Validation(String),

    // --- Document errors ---
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    // --- Credential errors ---
    #[error("Credential error: {0}")]
    Credential(String),

    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Budget errors ---
    #[error(
        "Prompt for model '{model}' uses {input_tokens} tokens, leaving no room for output \
         within a {context_window}-token context window"
    )]
    ContextOverflow {
        model: String,
        input_tokens: usize,
        context_window: usize,
    },

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Shorthand for a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Classify this error into one of the kinds reported to callers.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Document(DocumentError::NotFound(_)) => ErrorKind::Resolution,
            Self::Document(_) => ErrorKind::Storage,
            Self::Credential(_) => ErrorKind::Credential,
            Self::Provider(e) => e.kind(),
            Self::ContextOverflow { .. } => ErrorKind::ContextOverflow,
            Self::Config { .. } => ErrorKind::Config,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }
}

/// The failure kinds a relay request can end in.
///
/// None of them are retried internally; the caller decides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Resolution,
    Credential,
    Timeout,
    Provider,
    Transport,
    Normalization,
    ContextOverflow,
    Config,
    Storage,
    Internal,
}

impl ErrorKind {
    /// Stable snake_case name, as serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Resolution => "resolution",
            Self::Credential => "credential",
            Self::Timeout => "timeout",
            Self::Provider => "provider",
            Self::Transport => "transport",
            Self::Normalization => "normalization",
            Self::ContextOverflow => "context_overflow",
            Self::Config => "config",
            Self::Storage => "storage",
            Self::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// The provider answered with a non-success status. `body` is the
    /// provider's own error payload, untouched.
    #[error("{provider} returned status {status_code}: {body}")]
    ApiError {
        provider: String,
        status_code: u16,
        body: String,
    },

    #[error("{provider} did not answer within {timeout_secs}s")]
    Timeout { provider: String, timeout_secs: u64 },

    #[error("No response from {provider}: {message}")]
    Network { provider: String, message: String },

    #[error("Malformed response from {provider}: {reason}")]
    MalformedResponse { provider: String, reason: String },

    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

impl ProviderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ApiError { .. } => ErrorKind::Provider,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Network { .. } => ErrorKind::Transport,
            Self::MalformedResponse { .. } => ErrorKind::Normalization,
            Self::NotConfigured(_) => ErrorKind::Config,
        }
    }
}

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Documents not found: {}", .0.join(", "))]
    NotFound(Vec<String>),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),
}
