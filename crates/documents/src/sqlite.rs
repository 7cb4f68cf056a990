//! SQLite document store.
//!
//! One table, `documents`, holding already-extracted plain text. The pool is
//! opened once at startup, injected into whoever needs it, and closed on
//! shutdown via [`SqliteDocumentStore::close`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use docrelay_core::document::{
    Document, DocumentResolver, DocumentStore, DocumentSummary, NewDocument, order_by_ids,
};
use docrelay_core::error::DocumentError;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow, SqliteSynchronous,
};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};

use crate::generate_document_id;

/// A SQLite-backed document store sharing one connection pool.
pub struct SqliteDocumentStore {
    pool: SqlitePool,
}

impl SqliteDocumentStore {
    /// Open (or create) the database at `path` and run migrations.
    ///
    /// Accepts `sqlite:` URLs, plain file paths, and `sqlite::memory:` /
    /// `:memory:` for an ephemeral database (useful for tests).
    pub async fn open(path: &str, max_connections: u32) -> Result<Self, DocumentError> {
        let in_memory = path == ":memory:" || path.starts_with("sqlite::memory:");

        let options = if in_memory || path.starts_with("sqlite:") {
            SqliteConnectOptions::from_str(path)
                .map_err(|e| DocumentError::Storage(format!("Invalid SQLite path: {e}")))?
        } else {
            if let Some(parent) = std::path::Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent).await.map_err(|e| {
                        DocumentError::Storage(format!(
                            "Failed to create {}: {e}",
                            parent.display()
                        ))
                    })?;
                }
            }
            SqliteConnectOptions::new().filename(path)
        };
        let options = options
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        // Every connection to `:memory:` is its own database, so an
        // in-memory store must live on exactly one connection that never
        // gets recycled.
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None::<std::time::Duration>)
                .max_lifetime(None::<std::time::Duration>)
        } else {
            SqlitePoolOptions::new().max_connections(max_connections)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| DocumentError::Storage(format!("Failed to open SQLite: {e}")))?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!("SQLite document store initialized at {path}");
        Ok(store)
    }

    /// Create from an existing pool.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, DocumentError> {
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Close the pool. Further calls on this store fail with a storage error.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("SQLite document store closed");
    }

    async fn run_migrations(&self) -> Result<(), DocumentError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                iid         INTEGER PRIMARY KEY AUTOINCREMENT,
                id          TEXT UNIQUE NOT NULL,
                filename    TEXT NOT NULL,
                mime_type   TEXT NOT NULL,
                content     TEXT NOT NULL,
                created_at  TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DocumentError::MigrationFailed(format!("documents table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_documents_created_at ON documents(created_at DESC)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DocumentError::MigrationFailed(format!("created_at index: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }

    fn text_column(row: &SqliteRow, column: &str) -> Result<String, DocumentError> {
        row.try_get(column)
            .map_err(|e| DocumentError::QueryFailed(format!("{column} column: {e}")))
    }

    fn created_at(row: &SqliteRow) -> Result<DateTime<Utc>, DocumentError> {
        DateTime::parse_from_rfc3339(&Self::text_column(row, "created_at")?)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| DocumentError::QueryFailed(format!("created_at column: {e}")))
    }

    fn row_to_document(row: &SqliteRow) -> Result<Document, DocumentError> {
        Ok(Document {
            id: Self::text_column(row, "id")?,
            filename: Self::text_column(row, "filename")?,
            mime_type: Self::text_column(row, "mime_type")?,
            content: Self::text_column(row, "content")?,
            created_at: Self::created_at(row)?,
        })
    }

    /// Listing rows carry `size_bytes` instead of the content itself.
    fn row_to_summary(row: &SqliteRow) -> Result<DocumentSummary, DocumentError> {
        let size_bytes: i64 = row
            .try_get("size_bytes")
            .map_err(|e| DocumentError::QueryFailed(format!("size_bytes column: {e}")))?;

        Ok(DocumentSummary {
            id: Self::text_column(row, "id")?,
            filename: Self::text_column(row, "filename")?,
            mime_type: Self::text_column(row, "mime_type")?,
            size_bytes: usize::try_from(size_bytes).unwrap_or_default(),
            created_at: Self::created_at(row)?,
        })
    }

    /// `?, ?, ?` with one placeholder per id.
    fn placeholders(n: usize) -> String {
        vec!["?"; n].join(", ")
    }
}

#[async_trait]
impl DocumentResolver for SqliteDocumentStore {
    async fn resolve(&self, ids: &[String]) -> Result<Vec<Document>, DocumentError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT id, filename, mime_type, content, created_at FROM documents WHERE id IN ({})",
            Self::placeholders(ids.len())
        );
        let mut query = sqlx::query(&sql);
        for id in ids {
            query = query.bind(id);
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DocumentError::QueryFailed(format!("resolve: {e}")))?;

        let found = rows
            .iter()
            .map(Self::row_to_document)
            .collect::<Result<Vec<_>, _>>()?;

        debug!(requested = ids.len(), found = found.len(), "Resolved documents");
        order_by_ids(ids, found)
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn insert(&self, document: NewDocument) -> Result<Document, DocumentError> {
        let doc = Document {
            id: generate_document_id(),
            filename: document.filename,
            mime_type: document.mime_type,
            content: document.content,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO documents (id, filename, mime_type, content, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&doc.id)
        .bind(&doc.filename)
        .bind(&doc.mime_type)
        .bind(&doc.content)
        .bind(doc.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| DocumentError::Storage(format!("INSERT failed: {e}")))?;

        debug!(id = %doc.id, bytes = doc.content.len(), "Stored document");
        Ok(doc)
    }

    async fn list(&self) -> Result<Vec<DocumentSummary>, DocumentError> {
        let rows = sqlx::query(
            "SELECT id, filename, mime_type, length(CAST(content AS BLOB)) AS size_bytes, \
             created_at FROM documents ORDER BY created_at DESC, iid DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DocumentError::QueryFailed(format!("list: {e}")))?;

        rows.iter().map(Self::row_to_summary).collect()
    }

    async fn delete(&self, ids: &[String]) -> Result<usize, DocumentError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let sql = format!(
            "DELETE FROM documents WHERE id IN ({})",
            Self::placeholders(ids.len())
        );
        let mut query = sqlx::query(&sql);
        for id in ids {
            query = query.bind(id);
        }

        let result = query
            .execute(&self.pool)
            .await
            .map_err(|e| DocumentError::Storage(format!("DELETE failed: {e}")))?;

        Ok(result.rows_affected() as usize)
    }
}
