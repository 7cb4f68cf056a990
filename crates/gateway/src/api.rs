//! `/api` routes: relay a prompt, upload, list and delete documents.

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{delete, get, post},
};
use docrelay_core::document::{DocumentSummary, NewDocument, is_valid_document_id};
use docrelay_core::error::Error;
use docrelay_core::request::PromptRequest;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::SharedState;
use crate::error::{ApiError, ApiJson};

pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route("/api/send-to-ai", post(send_to_ai_handler))
        .route("/api/uploaded-documents", get(list_documents_handler))
        .route("/api/documents", post(upload_document_handler))
        .route("/api/delete-documents", delete(delete_documents_handler))
}

// ── Relay ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct SendToAiResponse {
    pub success: bool,
    pub message: String,
}

async fn send_to_ai_handler(
    State(state): State<SharedState>,
    ApiJson(payload): ApiJson<PromptRequest>,
) -> Result<Json<SendToAiResponse>, ApiError> {
    info!(
        api = %payload.api,
        documents = payload.selected_document_ids.len(),
        "send-to-ai request"
    );

    let result = state.pipeline.handle(payload).await?;

    Ok(Json(SendToAiResponse {
        success: true,
        message: result.answer_text,
    }))
}

// ── Documents ─────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct DocumentListResponse {
    pub documents: Vec<DocumentSummary>,
}

async fn list_documents_handler(
    State(state): State<SharedState>,
) -> Result<Json<DocumentListResponse>, ApiError> {
    let documents = state.store.list().await?;
    Ok(Json(DocumentListResponse { documents }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadDocumentRequest {
    filename: String,
    content: String,
    #[serde(default)]
    mime_type: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadDocumentResponse {
    pub id: String,
}

async fn upload_document_handler(
    State(state): State<SharedState>,
    ApiJson(req): ApiJson<UploadDocumentRequest>,
) -> Result<(StatusCode, Json<UploadDocumentResponse>), ApiError> {
    if req.filename.trim().is_empty() {
        return Err(Error::Validation("Filename is required".into()).into());
    }
    if req.content.trim().is_empty() {
        return Err(Error::Validation("Document content is empty".into()).into());
    }

    let mut document = NewDocument::text(req.filename, req.content);
    if let Some(mime_type) = req.mime_type.filter(|m| !m.trim().is_empty()) {
        document.mime_type = mime_type;
    }

    let stored = state.store.insert(document).await?;
    info!(
        id = %stored.id,
        filename = %stored.filename,
        bytes = stored.content.len(),
        "Document uploaded"
    );

    Ok((
        StatusCode::CREATED,
        Json(UploadDocumentResponse { id: stored.id }),
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteDocumentsRequest {
    #[serde(default)]
    document_ids: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteDocumentsResponse {
    pub deleted: usize,
}

async fn delete_documents_handler(
    State(state): State<SharedState>,
    ApiJson(req): ApiJson<DeleteDocumentsRequest>,
) -> Result<Json<DeleteDocumentsResponse>, ApiError> {
    if req.document_ids.is_empty() {
        return Err(Error::Validation("No documents selected".into()).into());
    }
    if let Some(bad) = req.document_ids.iter().find(|id| !is_valid_document_id(id)) {
        return Err(Error::Validation(format!("Invalid document id: '{bad}'")).into());
    }

    let ids: Vec<String> = req
        .document_ids
        .iter()
        .map(|id| id.to_ascii_lowercase())
        .collect();
    let deleted = state.store.delete(&ids).await?;
    info!(requested = ids.len(), deleted, "Documents deleted");

    Ok(Json(DeleteDocumentsResponse { deleted }))
}
