//! Document ingestion endpoint

use axum::{extract::State, Json};

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::{IngestRequest, IngestResponse};

/// POST /webhook/ingest - Index one base64-encoded file
///
/// Bad uploads are answered with a `"erro"` payload; collaborator
/// failures propagate as server errors.
pub async fn ingest_webhook(
    State(state): State<AppState>,
    Json(request): Json<IngestRequest>,
) -> Result<Json<IngestResponse>> {
    match state
        .ingest_pipeline()
        .ingest(&request.filename, &request.content)
        .await
    {
        Ok(outcome) => Ok(Json(IngestResponse::success(
            outcome.filename,
            outcome.chunk_count,
        ))),
        Err(e) if e.is_client_error() => {
            tracing::warn!("Rejected upload '{}': {}", request.filename, e);
            Ok(Json(IngestResponse::error(e.user_message())))
        }
        Err(e) => Err(e),
    }
}
