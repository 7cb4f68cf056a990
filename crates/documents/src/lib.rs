//! Document store implementations for DocRelay.

pub mod in_memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use in_memory::InMemoryDocumentStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDocumentStore;

/// Generate a fresh document id: 12 random bytes as lowercase hex.
pub fn generate_document_id() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(docrelay_core::document::DOCUMENT_ID_LEN);
    id
}
