//! `docrelay docs`: manage stored documents.

use std::path::PathBuf;

use docrelay_core::document::{DocumentStore, NewDocument, is_valid_document_id};
use tracing::warn;

pub async fn add(
    files: &[PathBuf],
    mime_type: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    let store = super::open_store(&config).await?;

    for path in files {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read {} as UTF-8 text: {e}", path.display()))?;

        if content.trim().is_empty() {
            warn!(file = %path.display(), "Skipping empty file");
            continue;
        }

        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let mut document = NewDocument::text(filename, content);
        if let Some(mime_type) = &mime_type {
            document.mime_type = mime_type.clone();
        }

        let stored = store.insert(document).await?;
        println!("{}  {}", stored.id, stored.filename);
    }

    store.close().await;
    Ok(())
}

pub async fn list() -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    let store = super::open_store(&config).await?;
    let documents = store.list().await?;
    store.close().await;

    if documents.is_empty() {
        println!("No documents stored.");
        return Ok(());
    }

    println!("{:<24}  {:>9}  {:<20}  {}", "ID", "BYTES", "CREATED", "FILENAME");
    for doc in documents {
        println!(
            "{:<24}  {:>9}  {:<20}  {}",
            doc.id,
            doc.size_bytes,
            doc.created_at.format("%Y-%m-%d %H:%M:%S"),
            doc.filename
        );
    }

    Ok(())
}

pub async fn remove(ids: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(bad) = ids.iter().find(|id| !is_valid_document_id(id)) {
        return Err(format!("Invalid document id: '{bad}'").into());
    }
    let ids: Vec<String> = ids.iter().map(|id| id.to_ascii_lowercase()).collect();

    let config = super::load_config()?;
    let store = super::open_store(&config).await?;
    let deleted = store.delete(&ids).await?;
    store.close().await;

    println!("Deleted {deleted} of {} document(s).", ids.len());
    Ok(())
}
