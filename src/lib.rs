//! Caja - conversational assistant backend library
//!
//! Caja answers user queries with a tool-using LLM agent, keeps every
//! conversation in a persistent session, and bounds the context sent to the
//! model by rolling older turns into stored summaries.
//!
//! # Architecture
//!
//! - `storage`: sessions and messages in SQLite
//! - `history`: windowed chat history with rolling summaries
//! - `providers`: LLM provider abstraction (Ollama, OpenAI-compatible)
//! - `agent`: tool-calling execution loop
//! - `tools`: current time, notes database agent, web search
//! - `chat`: one chat turn, end to end
//! - `api`: axum HTTP API
//! - `config`, `error`, `cli`, `commands`: ambient plumbing
//!
//! # Example
//!
//! ```no_run
//! use caja::{ChatRequest, ChatService, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let service = ChatService::from_config(&config)?;
//!     let session = service.create_session(Some("demo")).await?;
//!     let reply = service.chat(ChatRequest::new(session.id, "What time is it?")).await?;
//!     println!("{}", reply.response);
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod api;
pub mod chat;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod history;
pub mod notes;
pub mod prompts;
pub mod providers;
pub mod storage;
pub mod tools;

// Re-export commonly used types
pub use agent::Agent;
pub use chat::{ChatRequest, ChatResponse, ChatService};
pub use config::Config;
pub use error::{CajaError, Result};
pub use history::{ChatHistory, HistoryManager};
pub use storage::{SessionStore, SqliteStorage};

#[cfg(test)]
pub mod test_utils;
