//! Route handlers for the session and chat endpoints

use crate::api::error::ApiError;
use crate::api::AppState;
use crate::chat::{ChatRequest, ChatResponse};
use crate::storage::{SessionDetail, SessionSummary};
use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Default, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub session_name: Option<String>,
}

/// Body returned by session create and delete
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_name: Option<String>,
    pub message: String,
}

/// GET / - service name, version and endpoint map
pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "Caja Agent API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "create_session": "POST /sessions/create",
            "get_session": "GET /sessions/{session_id}",
            "list_sessions": "GET /sessions",
            "delete_session": "DELETE /sessions/{session_id}",
            "chat": "POST /query/chat"
        }
    }))
}

/// POST /sessions/create - the body and its `session_name` are optional
pub async fn create_session(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SessionResponse>, ApiError> {
    let request: CreateSessionRequest = if body.iter().all(u8::is_ascii_whitespace) {
        CreateSessionRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::BadRequest(format!("Invalid request body: {}", e)))?
    };

    let session = state
        .chat
        .create_session(request.session_name.as_deref())
        .await?;
    tracing::info!("Created session {}", session.id);
    Ok(Json(SessionResponse {
        session_id: session.id,
        session_name: session.session_name,
        message: "Session created successfully".to_string(),
    }))
}

/// GET /sessions/{session_id} - session with its messages
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionDetail>, ApiError> {
    state
        .chat
        .get_session(&session_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Session not found".to_string()))
}

/// GET /sessions - all sessions, most recently updated first
pub async fn list_sessions(
    State(state): State<AppState>,
) -> Result<Json<Vec<SessionSummary>>, ApiError> {
    Ok(Json(state.chat.list_sessions().await?))
}

/// DELETE /sessions/{session_id}
pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionResponse>, ApiError> {
    state.chat.delete_session(&session_id).await?;
    Ok(Json(SessionResponse {
        session_id,
        session_name: None,
        message: "Session deleted successfully".to_string(),
    }))
}

/// POST /query/chat - run one chat turn
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    if request.query.trim().is_empty() {
        return Err(ApiError::BadRequest("query cannot be empty".to_string()));
    }

    Ok(Json(state.chat.chat(request).await?))
}
