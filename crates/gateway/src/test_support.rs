//! Gateway state wired to an in-memory store and a scripted provider.

use async_trait::async_trait;
use axum::Router;
use docrelay_config::{GatewayConfig, RelayConfig};
use docrelay_core::document::{DocumentStore, NewDocument};
use docrelay_core::error::ProviderError;
use docrelay_core::provider::{Provider, ProviderKind};
use docrelay_documents::InMemoryDocumentStore;
use docrelay_providers::ProviderRegistry;
use docrelay_relay::{ModelCatalog, RelayPipeline};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::{GatewayState, SharedState, build_router};

/// A `custom` provider that always gives the same reply.
pub(crate) struct ScriptedProvider {
    reply: Result<String, ProviderError>,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "custom"
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Custom
    }

    fn model(&self) -> &str {
        "custom-model"
    }

    async fn send(
        &self,
        _prompt: &str,
        _max_tokens: u32,
        _api_key: &str,
    ) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply.clone()
    }
}

pub(crate) async fn test_state(
    reply: Result<String, ProviderError>,
) -> (SharedState, Arc<ScriptedProvider>) {
    let store = Arc::new(InMemoryDocumentStore::new());
    let provider = Arc::new(ScriptedProvider {
        reply,
        calls: AtomicUsize::new(0),
    });

    let mut registry = ProviderRegistry::new();
    registry.register(provider.clone(), Some("operator-key".into()));

    let pipeline = RelayPipeline::new(
        store.clone(),
        Arc::new(registry),
        Arc::new(ModelCatalog::builtin()),
        RelayConfig::default(),
    );

    let state = Arc::new(GatewayState {
        pipeline: Arc::new(pipeline),
        store,
        bearer_tokens: Vec::new(),
    });
    (state, provider)
}

pub(crate) fn test_router(state: SharedState) -> Router {
    build_router(state, &GatewayConfig::default())
}

/// Store a document directly and return its id.
pub(crate) async fn seed(state: &SharedState, content: &str) -> String {
    state
        .store
        .insert(NewDocument::text("seed.txt", content))
        .await
        .unwrap()
        .id
}
