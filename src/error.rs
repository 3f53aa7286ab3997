//! Error types for Caja
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for Caja operations
///
/// This enum encompasses the errors that can occur while loading
/// configuration, talking to providers, executing tools, persisting
/// sessions and summarizing conversation history.
#[derive(Error, Debug)]
pub enum CajaError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Provider-related errors (API calls, authentication, etc.)
    #[error("Provider error: {0}")]
    Provider(String),

    /// Tool execution errors
    #[error("Tool execution error: {0}")]
    Tool(String),

    /// Session storage errors (database operations)
    #[error("Storage error: {0}")]
    Storage(String),

    /// The requested session does not exist
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// The summarization collaborator failed to produce a summary
    #[error("Summarization error: {0}")]
    Summarization(String),

    /// Agent exceeded maximum iteration limit
    #[error("Agent exceeded maximum iterations: limit={limit}, {message}")]
    MaxIterationsExceeded {
        /// The configured iteration limit
        limit: usize,
        /// Additional context about the failure
        message: String,
    },

    /// Agent exceeded its wall-clock budget
    #[error("Agent execution timed out after {0} seconds")]
    Timeout(u64),
}

/// Result type alias for Caja operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation. Callers that
/// need the error kind downcast to [`CajaError`].
pub type Result<T> = anyhow::Result<T>;
