//! The relay pipeline.
//!
//! One request flows strictly in sequence:
//!
//! 1. **Normalize** the inbound request (selector, documents, credential, defaults)
//! 2. **Select the credential** (caller key or operator key, never a fallback)
//! 3. **Resolve** documents in caller order
//! 4. **Assemble** the final prompt
//! 5. **Budget** the output against the model's context window
//! 6. **Dispatch** once to the selected provider and return its normalized answer
//!
//! Every step before dispatch fails fast, so a rejected request never costs a
//! provider call.

use std::sync::Arc;

use docrelay_config::{AppConfig, RelayConfig};
use docrelay_core::document::DocumentResolver;
use docrelay_core::error::{Error, Result};
use docrelay_core::provider::ProviderKind;
use docrelay_core::request::{CredentialSource, NormalizedRequest, PromptRequest};
use docrelay_providers::ProviderRegistry;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::context::{BudgetPlan, TokenEstimator, assemble, plan};
use crate::models::{ModelCatalog, ModelProfile};

/// The outcome of one successful relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchResult {
    pub answer_text: String,
    pub provider: ProviderKind,
    pub model: String,
    pub input_tokens: usize,
    pub output_token_budget: u32,
}

pub struct RelayPipeline {
    resolver: Arc<dyn DocumentResolver>,
    registry: Arc<ProviderRegistry>,
    estimator: TokenEstimator,
    config: RelayConfig,
}

impl RelayPipeline {
    pub fn new(
        resolver: Arc<dyn DocumentResolver>,
        registry: Arc<ProviderRegistry>,
        catalog: Arc<ModelCatalog>,
        config: RelayConfig,
    ) -> Self {
        Self {
            resolver,
            registry,
            estimator: TokenEstimator::new(catalog),
            config,
        }
    }

    /// Build the registry and model catalog from configuration.
    pub fn from_config(config: &AppConfig, resolver: Arc<dyn DocumentResolver>) -> Result<Self> {
        let registry = docrelay_providers::build_from_config(&config.providers)?;
        let catalog = ModelCatalog::from_config(&config.models)?;

        for kind in registry.list() {
            if let Some(entry) = registry.get(kind) {
                catalog.get(entry.provider.model())?;
            }
        }

        Ok(Self::new(
            resolver,
            Arc::new(registry),
            Arc::new(catalog),
            config.relay.clone(),
        ))
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn catalog(&self) -> &ModelCatalog {
        self.estimator.catalog()
    }

    /// Normalize and relay an inbound request.
    pub async fn handle(&self, request: PromptRequest) -> Result<DispatchResult> {
        let request = request.normalize(self.config.default_max_tokens)?;
        self.dispatch(request).await
    }

    /// Relay an already-normalized request.
    pub async fn dispatch(&self, request: NormalizedRequest) -> Result<DispatchResult> {
        let entry = self.registry.get(request.provider).ok_or_else(|| {
            Error::config(format!("Provider '{}' is not registered", request.provider))
        })?;
        let provider = &entry.provider;

        let api_key = match &request.credential {
            CredentialSource::Caller(key) => key.as_str(),
            CredentialSource::Operator => entry.operator_key().ok_or_else(|| {
                Error::Credential(format!(
                    "No API key configured for provider '{}'",
                    request.provider
                ))
            })?,
        };

        let profile = self.estimator.catalog().get(provider.model())?;

        info!(
            provider = %request.provider,
            model = %profile.model_id,
            documents = request.document_ids.len(),
            "Relaying prompt"
        );

        let documents = self.resolver.resolve(&request.document_ids).await?;
        let final_prompt = assemble(&documents, &request.prompt);

        let (final_prompt, budget) = self
            .plan_off_runtime(final_prompt, profile.clone(), request.max_output_tokens)
            .await?;

        debug!(
            prompt_bytes = final_prompt.len(),
            input_tokens = budget.input_tokens,
            available = budget.available,
            requested = request.max_output_tokens,
            allowed = budget.allowed_output_tokens,
            "Planned output budget"
        );

        if budget.is_exhausted() {
            warn!(
                model = %profile.model_id,
                input_tokens = budget.input_tokens,
                context_window = profile.context_window_tokens,
                "Prompt leaves no room for output"
            );
            return Err(Error::ContextOverflow {
                model: profile.model_id.clone(),
                input_tokens: budget.input_tokens,
                context_window: profile.context_window_tokens,
            });
        }

        if self.config.warn_on_truncation
            && budget.allowed_output_tokens < request.max_output_tokens
        {
            warn!(
                requested = request.max_output_tokens,
                allowed = budget.allowed_output_tokens,
                "Output budget truncated to fit context window"
            );
        }

        let answer_text = provider
            .send(&final_prompt, budget.allowed_output_tokens, api_key)
            .await?;

        info!(
            provider = %request.provider,
            answer_bytes = answer_text.len(),
            "Provider answered"
        );

        Ok(DispatchResult {
            answer_text,
            provider: request.provider,
            model: profile.model_id.clone(),
            input_tokens: budget.input_tokens,
            output_token_budget: budget.allowed_output_tokens,
        })
    }

    /// Token counting is CPU-bound; it runs on the blocking pool and hands
    /// the prompt back with its plan.
    async fn plan_off_runtime(
        &self,
        final_prompt: String,
        profile: ModelProfile,
        requested: u32,
    ) -> Result<(String, BudgetPlan)> {
        let estimator = self.estimator.clone();
        let safety_margin = self.config.safety_margin;

        tokio::task::spawn_blocking(move || {
            let budget = plan(&final_prompt, &profile, requested, safety_margin, &estimator)?;
            Ok((final_prompt, budget))
        })
        .await
        .map_err(|e| Error::Internal(format!("Token estimation task failed: {e}")))?
    }
}
