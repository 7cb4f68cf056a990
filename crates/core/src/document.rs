//! Document store traits: where uploaded, already-extracted text lives.
//!
//! The relay only ever reads documents through [`DocumentResolver`]; the
//! gateway and CLI additionally use [`DocumentStore`] to manage them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DocumentError;

/// Length of a document id: a 12-byte content id in lowercase hex.
pub const DOCUMENT_ID_LEN: usize = 24;

/// Check whether `id` is a well-formed document id.
pub fn is_valid_document_id(id: &str) -> bool {
    id.len() == DOCUMENT_ID_LEN && id.bytes().all(|b| b.is_ascii_hexdigit())
}

/// A stored document with its plain-text content.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub filename: String,
    pub mime_type: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Document {
    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            id: self.id.clone(),
            filename: self.filename.clone(),
            mime_type: self.mime_type.clone(),
            size_bytes: self.content.len(),
            created_at: self.created_at,
        }
    }
}

/// Listing view of a document, without its content.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    pub id: String,
    pub filename: String,
    pub mime_type: String,
    pub size_bytes: usize,
    pub created_at: DateTime<Utc>,
}

/// A document about to be stored. Content is already plain text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDocument {
    pub filename: String,
    #[serde(default = "default_mime_type")]
    pub mime_type: String,
    pub content: String,
}

fn default_mime_type() -> String {
    "text/plain".into()
}

impl NewDocument {
    pub fn text(filename: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            mime_type: default_mime_type(),
            content: content.into(),
        }
    }
}

/// Resolves document ids to their contents.
#[async_trait]
pub trait DocumentResolver: Send + Sync {
    /// Return the documents for `ids`, in exactly the order requested.
    ///
    /// If any id is unknown the whole call fails with
    /// [`DocumentError::NotFound`] listing every missing id.
    async fn resolve(&self, ids: &[String]) -> Result<Vec<Document>, DocumentError>;
}

/// Full document management on top of resolution.
#[async_trait]
pub trait DocumentStore: DocumentResolver {
    /// A short name for this backend (e.g., "sqlite").
    fn name(&self) -> &str;

    /// Store a new document and return it with its generated id.
    async fn insert(&self, document: NewDocument) -> Result<Document, DocumentError>;

    /// List all documents, newest first.
    async fn list(&self) -> Result<Vec<DocumentSummary>, DocumentError>;

    /// Delete documents by id. Returns how many were removed.
    async fn delete(&self, ids: &[String]) -> Result<usize, DocumentError>;
}

/// Put resolved documents back into the order of `ids`, collecting the ids
/// that have no match. Backends that fetch in arbitrary order use this.
pub fn order_by_ids(
    ids: &[String],
    mut found: Vec<Document>,
) -> Result<Vec<Document>, DocumentError> {
    let mut ordered = Vec::with_capacity(ids.len());
    let mut missing = Vec::new();

    for id in ids {
        match found.iter().position(|d| &d.id == id) {
            // Duplicate ids in a request resolve to the same document twice.
            Some(pos) if ids.iter().filter(|i| *i == id).count() > 1 => {
                ordered.push(found[pos].clone());
            }
            Some(pos) => ordered.push(found.swap_remove(pos)),
            None => missing.push(id.clone()),
        }
    }

    if missing.is_empty() {
        Ok(ordered)
    } else {
        Err(DocumentError::NotFound(missing))
    }
}
