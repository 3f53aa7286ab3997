//! Chat turn orchestration
//!
//! [`ChatService`] is the single entry point used by both the HTTP API and the
//! interactive CLI.

use crate::agent::Agent;
use crate::config::Config;
use crate::error::{CajaError, Result};
use crate::history::{HistoryManager, LlmSummarizer, Summarizer};
use crate::prompts::ASSISTANT_SYSTEM_PROMPT;
use crate::providers::{create_provider, Message};
use crate::storage::{
    run_blocking, MessageRole, Session, SessionDetail, SessionStore, SessionSummary, SqliteStorage,
};
use crate::tools::build_main_tools;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

fn default_enable_history() -> bool {
    true
}

/// One user query against a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub query: String,
    pub session_id: String,
    #[serde(default = "default_enable_history")]
    pub enable_history: bool,
}

impl ChatRequest {
    pub fn new(session_id: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            session_id: session_id.into(),
            enable_history: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

/// Sessions plus the assistant that answers in them
pub struct ChatService {
    store: Arc<dyn SessionStore>,
    history: HistoryManager,
    agent: Agent,
    window: usize,
}

impl ChatService {
    pub fn new(
        store: Arc<dyn SessionStore>,
        summarizer: Arc<dyn Summarizer>,
        agent: Agent,
        window: usize,
    ) -> Self {
        let history = HistoryManager::new(Arc::clone(&store), summarizer, window);
        Self {
            window: history.window(),
            store,
            history,
            agent,
        }
    }

    /// Wire the service from configuration
    ///
    /// # Errors
    ///
    /// Returns error if the provider, the session store, the notes database
    /// or the tools cannot be set up.
    pub fn from_config(config: &Config) -> Result<Self> {
        let provider = create_provider(&config.provider)?;
        let store: Arc<dyn SessionStore> = Arc::new(match &config.storage.db_path {
            Some(path) => SqliteStorage::new_with_path(path.clone())?,
            None => SqliteStorage::new()?,
        });
        let tools = build_main_tools(config)?;
        let agent = Agent::new(
            Arc::clone(&provider),
            tools,
            ASSISTANT_SYSTEM_PROMPT,
            config.agent.clone(),
        )?;
        tracing::info!(
            "Chat service ready: provider={}, tools={}",
            provider.name(),
            agent.num_tools()
        );

        Ok(Self::new(
            store,
            Arc::new(LlmSummarizer::new(provider)),
            agent,
            config.history.window,
        ))
    }

    pub async fn create_session(&self, name: Option<&str>) -> Result<Session> {
        let name = name.map(str::to_string);
        run_blocking(&self.store, move |store| store.create_session(name.as_deref())).await
    }

    pub async fn get_session(&self, session_id: &str) -> Result<Option<SessionDetail>> {
        let id = session_id.to_string();
        run_blocking(&self.store, move |store| store.get_session_detail(&id)).await
    }

    pub async fn list_sessions(&self) -> Result<Vec<SessionSummary>> {
        run_blocking(&self.store, |store| store.list_sessions()).await
    }

    /// Delete a session and its messages
    ///
    /// # Errors
    ///
    /// Returns `CajaError::SessionNotFound` if there is no such session
    pub async fn delete_session(&self, session_id: &str) -> Result<()> {
        let id = session_id.to_string();
        if run_blocking(&self.store, move |store| store.delete_session(&id)).await? {
            tracing::info!("Deleted session {}", session_id);
            Ok(())
        } else {
            Err(CajaError::SessionNotFound(session_id.to_string()).into())
        }
    }

    /// Answer one query and record the exchange
    ///
    /// The human query and the answer are appended only after the agent
    /// succeeds.
    ///
    /// # Errors
    ///
    /// Returns `CajaError::SessionNotFound` for an unknown session, and any
    /// history, agent or storage error.
    pub async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let id = request.session_id.clone();
        if run_blocking(&self.store, move |store| store.get_session(&id))
            .await?
            .is_none()
        {
            return Err(CajaError::SessionNotFound(request.session_id).into());
        }

        let history: Vec<Message> = if request.enable_history {
            let mut entries = self
                .history
                .get_chat_history(&request.session_id)
                .await?
                .entries;
            if entries.len() > self.window {
                entries.drain(..entries.len() - self.window);
            }
            entries
        } else {
            Vec::new()
        };

        tracing::debug!(
            "Chat turn for session {} with {} history entries",
            request.session_id,
            history.len()
        );
        let response = self.agent.execute(&request.query, &history).await?;

        let ChatRequest {
            query, session_id, ..
        } = request;
        let answer = response.clone();
        run_blocking(&self.store, move |store| {
            store.append_message(&session_id, MessageRole::Human, &query)?;
            store.append_message(&session_id, MessageRole::Ai, &answer)
        })
        .await?;

        Ok(ChatResponse { response })
    }
}
