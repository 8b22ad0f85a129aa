//! Index management endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::response::{DeleteResponse, DocumentListResponse, IngestStatus};

/// GET /documents - List indexed files with their chunk counts
pub async fn list_documents(
    State(state): State<AppState>,
) -> Result<Json<DocumentListResponse>> {
    let sources = state.vector_store_provider().list_sources().await?;
    Ok(Json(DocumentListResponse::new(sources)))
}

/// DELETE /documents/:filename - Remove every chunk of a file
pub async fn delete_document(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<DeleteResponse>> {
    let removed = state.ingest_pipeline().remove(&filename).await?;

    if removed == 0 {
        return Err(Error::DocumentNotFound(filename));
    }

    Ok(Json(DeleteResponse {
        status: IngestStatus::Success,
        filename,
        chunks_removed: removed,
    }))
}
