//! HTTP API for sessions and chat
//!
//! The router shares one [`ChatService`] across all handlers and adds
//! permissive CORS plus request tracing.

pub mod error;
pub mod handlers;

use crate::chat::ChatService;
use crate::error::{CajaError, Result};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use error::{ApiError, ErrorBody};

/// State handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<ChatService>,
}

impl AppState {
    pub fn new(chat: ChatService) -> Self {
        Self {
            chat: Arc::new(chat),
        }
    }
}

/// Build the router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/sessions", get(handlers::list_sessions))
        .route("/sessions/create", post(handlers::create_session))
        .route(
            "/sessions/{session_id}",
            get(handlers::get_session).delete(handlers::delete_session),
        )
        .route("/query/chat", post(handlers::chat))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `host:port` and serve until the process is stopped
///
/// # Errors
///
/// Returns error if the address cannot be bound or the server fails
pub async fn serve(state: AppState, host: &str, port: u16) -> Result<()> {
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| CajaError::Config(format!("Failed to bind {}: {}", addr, e)))?;
    tracing::info!("Caja API listening on http://{}", addr);

    axum::serve(listener, create_router(state)).await?;
    Ok(())
}
