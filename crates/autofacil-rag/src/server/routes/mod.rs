//! API routes for the RAG server

pub mod chat;
pub mod documents;
pub mod ingest;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, get_service, post},
    Json, Router,
};
use tower_http::services::ServeFile;

use crate::config::RagConfig;
use crate::server::state::AppState;
use crate::types::response::RootResponse;

/// Build all API routes
pub fn api_routes(config: &RagConfig) -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        // Ingestion - base64 uploads need a larger body limit
        .route(
            "/webhook/ingest",
            post(ingest::ingest_webhook)
                .layer(DefaultBodyLimit::max(config.server.max_upload_size)),
        )
        // Chat page and question answering share a path
        .route(
            "/chat",
            get_service(ServeFile::new(&config.server.chat_page)).post(chat::chat),
        )
        // Index management
        .route("/documents", get(documents::list_documents))
        .route("/documents/:filename", delete(documents::delete_document))
}

/// GET / - Liveness message
async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "AutoFácil RAG API pronta!".to_string(),
    })
}
