//! Provider registry: maps a validated selector to its provider and the
//! operator credential configured for it.

use std::collections::HashMap;
use std::sync::Arc;

use docrelay_config::{ProviderConfig, ProvidersConfig};
use docrelay_core::error::ProviderError;
use docrelay_core::provider::{Provider, ProviderKind};
use tracing::info;

use crate::completion::CompletionProvider;
use crate::openai_compat::OpenAiCompatProvider;

/// A provider plus the operator-held key for it, if any.
pub struct RegisteredProvider {
    pub provider: Arc<dyn Provider>,
    operator_key: Option<String>,
}

impl RegisteredProvider {
    pub fn operator_key(&self) -> Option<&str> {
        self.operator_key.as_deref()
    }
}

impl std::fmt::Debug for RegisteredProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredProvider")
            .field("name", &self.provider.name())
            .field("model", &self.provider.model())
            .field("operator_key", &self.operator_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Routes a [`ProviderKind`] to the provider that serves it.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<ProviderKind, RegisteredProvider>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider under its own kind, replacing any previous one.
    pub fn register(&mut self, provider: Arc<dyn Provider>, operator_key: Option<String>) {
        let operator_key = operator_key.filter(|k| !k.trim().is_empty());
        self.providers.insert(
            provider.kind(),
            RegisteredProvider {
                provider,
                operator_key,
            },
        );
    }

    pub fn get(&self, kind: ProviderKind) -> Option<&RegisteredProvider> {
        self.providers.get(&kind)
    }

    /// Registered kinds in selector order.
    pub fn list(&self) -> Vec<ProviderKind> {
        ProviderKind::ALL
            .into_iter()
            .filter(|k| self.providers.contains_key(k))
            .collect()
    }
}

/// Build all three providers from configuration.
pub fn build_from_config(config: &ProvidersConfig) -> Result<ProviderRegistry, ProviderError> {
    let mut registry = ProviderRegistry::new();

    let openai = &config.openai;
    let mut chat = OpenAiCompatProvider::new(
        "openai",
        &openai.api_url,
        &openai.model,
        openai.timeout_secs,
    )?;
    if let Some(path) = &openai.response_field {
        chat = chat.with_answer_path(path);
    }
    registry.register(Arc::new(chat), openai.api_key.clone());

    let claude = &config.claude;
    let claude_provider =
        CompletionProvider::claude(&claude.api_url, &claude.model, claude.timeout_secs)?;
    registry.register(
        Arc::new(with_configured_fields(claude_provider, claude)),
        claude.api_key.clone(),
    );

    let custom = &config.custom;
    let custom_provider =
        CompletionProvider::custom(&custom.api_url, &custom.model, custom.timeout_secs)?;
    registry.register(
        Arc::new(with_configured_fields(custom_provider, custom)),
        custom.api_key.clone(),
    );

    for kind in registry.list() {
        if let Some(entry) = registry.get(kind) {
            info!(
                provider = %kind,
                model = %entry.provider.model(),
                operator_key = entry.operator_key().is_some(),
                "Provider registered"
            );
        }
    }

    Ok(registry)
}

fn with_configured_fields(
    provider: CompletionProvider,
    config: &ProviderConfig,
) -> CompletionProvider {
    provider.with_fields(
        config.prompt_field.as_deref(),
        config.max_tokens_field.as_deref(),
        config.response_field.as_deref(),
    )
}
