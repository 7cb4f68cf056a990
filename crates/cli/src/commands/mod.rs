pub mod ask;
pub mod docs;
pub mod gateway;
pub mod models;
pub mod status;

use docrelay_config::AppConfig;
use docrelay_documents::SqliteDocumentStore;

pub fn load_config() -> Result<AppConfig, Box<dyn std::error::Error>> {
    AppConfig::load().map_err(|e| format!("Failed to load config: {e}").into())
}

pub async fn open_store(
    config: &AppConfig,
) -> Result<SqliteDocumentStore, Box<dyn std::error::Error>> {
    let store = SqliteDocumentStore::open(
        &config.documents.database_url,
        config.documents.max_connections,
    )
    .await?;
    Ok(store)
}
