// SPDX-FileCopyrightText: 2026 Minuta Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the chat REST API.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use minuta_core::MinutaError;
use minuta_memory::MatchTier;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::server::AppState;

/// Request body for POST /api/chat.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    /// Continue an existing session; a new one is started when absent.
    #[serde(default)]
    pub session_id: Option<String>,
    /// Synthesize the reply as audio.
    #[serde(default)]
    pub tts: bool,
}

/// Response body for POST /api/chat.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub session_id: String,
    pub reply: String,
    pub audio_path: Option<String>,
    pub memory: MemoryInfo,
}

#[derive(Debug, Serialize)]
pub struct MemoryInfo {
    pub score: f32,
    pub tier: MatchTier,
}

/// One stored message for GET /api/chat/{session_id}.
#[derive(Debug, Serialize)]
pub struct MessageView {
    pub role: String,
    pub content: String,
    pub audio_path: Option<String>,
    pub created_at: String,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Handler error rendered as `{ "error": ... }`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<MinutaError> for ApiError {
    fn from(e: MinutaError) -> Self {
        error!(error = %e, "request failed");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "internal error".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

/// GET /
pub async fn get_root() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "Minuta meeting-notes API is running" }))
}

/// GET /health
pub async fn get_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.started.elapsed().as_secs(),
    })
}

/// POST /api/chat
pub async fn post_chat(
    State(state): State<AppState>,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if body.message.trim().is_empty() {
        return Err(ApiError::bad_request("message must not be empty"));
    }

    let outcome = state
        .chat
        .chat(&body.message, body.session_id.as_deref(), body.tts)
        .await?;

    Ok(Json(ChatResponse {
        session_id: outcome.session_id,
        reply: outcome.reply,
        audio_path: outcome.audio_path,
        memory: MemoryInfo {
            score: outcome.memory.score,
            tier: outcome.memory.tier,
        },
    }))
}

/// GET /api/sessions
pub async fn get_sessions(
    State(state): State<AppState>,
) -> Result<Json<Vec<minuta_storage::SessionSummary>>, ApiError> {
    Ok(Json(state.chat.sessions().await?))
}

/// GET /api/chat/{session_id}
pub async fn get_chat_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Vec<MessageView>>, ApiError> {
    let messages = state.chat.history(&session_id).await?;
    Ok(Json(
        messages
            .into_iter()
            .map(|m| MessageView {
                role: m.role,
                content: m.content,
                audio_path: m.audio_path,
                created_at: m.created_at,
            })
            .collect(),
    ))
}

/// DELETE /api/chat/{session_id}
pub async fn delete_chat(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    state.chat.delete_session(&session_id).await?;
    Ok(Json(StatusResponse {
        status: "ok".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_request_defaults() {
        let req: ChatRequest = serde_json::from_str(r#"{"message": "Hello"}"#).unwrap();
        assert_eq!(req.message, "Hello");
        assert!(req.session_id.is_none());
        assert!(!req.tts);
    }

    #[test]
    fn chat_request_with_all_fields() {
        let req: ChatRequest = serde_json::from_str(
            r#"{"message": "Hi", "session_id": "20260301T101500_session-a1b2c3", "tts": true}"#,
        )
        .unwrap();
        assert_eq!(req.session_id.as_deref(), Some("20260301T101500_session-a1b2c3"));
        assert!(req.tts);
    }

    #[test]
    fn chat_response_serializes_memory_tier_lowercase() {
        let resp = ChatResponse {
            session_id: "s1".into(),
            reply: "Paris.".into(),
            audio_path: None,
            memory: MemoryInfo {
                score: 1.0,
                tier: MatchTier::Exact,
            },
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["memory"]["tier"], "exact");
        assert_eq!(json["audio_path"], serde_json::Value::Null);
    }

    #[test]
    fn error_response_serializes() {
        let json = serde_json::to_string(&ErrorResponse {
            error: "something went wrong".into(),
        })
        .unwrap();
        assert!(json.contains("something went wrong"));
    }
}
