//! In-memory document store for tests and ephemeral runs.

use async_trait::async_trait;
use chrono::Utc;
use docrelay_core::document::{
    Document, DocumentResolver, DocumentStore, DocumentSummary, NewDocument, order_by_ids,
};
use docrelay_core::error::DocumentError;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::generate_document_id;

/// A document store that keeps documents in a Vec.
pub struct InMemoryDocumentStore {
    documents: Arc<RwLock<Vec<Document>>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self {
            documents: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentResolver for InMemoryDocumentStore {
    async fn resolve(&self, ids: &[String]) -> Result<Vec<Document>, DocumentError> {
        let documents = self.documents.read().await;
        let found = documents
            .iter()
            .filter(|d| ids.contains(&d.id))
            .cloned()
            .collect();
        order_by_ids(ids, found)
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn insert(&self, document: NewDocument) -> Result<Document, DocumentError> {
        let doc = Document {
            id: generate_document_id(),
            filename: document.filename,
            mime_type: document.mime_type,
            content: document.content,
            created_at: Utc::now(),
        };
        self.documents.write().await.push(doc.clone());
        Ok(doc)
    }

    async fn list(&self) -> Result<Vec<DocumentSummary>, DocumentError> {
        let documents = self.documents.read().await;
        // Insertion order is chronological; newest first.
        Ok(documents.iter().rev().map(Document::summary).collect())
    }

    async fn delete(&self, ids: &[String]) -> Result<usize, DocumentError> {
        let mut documents = self.documents.write().await;
        let len_before = documents.len();
        documents.retain(|d| !ids.contains(&d.id));
        Ok(len_before - documents.len())
    }
}
