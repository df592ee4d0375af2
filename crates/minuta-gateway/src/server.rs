// SPDX-FileCopyrightText: 2026 Minuta Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the API.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    routing::{get, post},
    Router,
};
use minuta_config::model::ServerConfig;
use minuta_core::MinutaError;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::chat::ChatService;
use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<ChatService>,
    /// Process start time for uptime calculation.
    pub started: Instant,
}

impl AppState {
    pub fn new(chat: Arc<ChatService>) -> Self {
        Self {
            chat,
            started: Instant::now(),
        }
    }
}

/// Builds the application router.
///
/// - GET /
/// - GET /health
/// - POST /api/chat
/// - GET /api/sessions
/// - GET, DELETE /api/chat/{session_id}
/// - GET /audio/* (files under `audio_dir`)
pub fn router(state: AppState, audio_dir: &Path) -> Router {
    Router::new()
        .route("/", get(handlers::get_root))
        .route("/health", get(handlers::get_health))
        .route("/api/chat", post(handlers::post_chat))
        .route("/api/sessions", get(handlers::get_sessions))
        .route(
            "/api/chat/{session_id}",
            get(handlers::get_chat_history).delete(handlers::delete_chat),
        )
        .nest_service("/audio", ServeDir::new(audio_dir))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Binds `host:port` and serves until `shutdown` resolves.
pub async fn serve(
    config: &ServerConfig,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), MinutaError> {
    let app = router(state, Path::new(&config.audio_dir));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| MinutaError::Internal(format!("failed to bind server to {addr}: {e}")))?;

    tracing::info!("Minuta API listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| MinutaError::Internal(format!("server error: {e}")))
}
