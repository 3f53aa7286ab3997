//! Chat history windowing and rolling summarization
//!
//! [`HistoryManager::get_chat_history`] turns a session's stored messages into
//! the bounded message list handed to the agent. Once a session reaches the
//! window size its messages are compressed into a `summary` message, which is
//! persisted and becomes the anchor for later turns:
//!
//! - fewer than `window` messages: every message, mapped 1:1
//! - exactly `window`: summarize all of them and persist the summary
//! - more than `window` with a summary among the last `window`: everything
//!   from that summary onward
//! - more than `window` without one: summarize from the most recent earlier
//!   summary (or the last `window` messages) and persist the result

pub mod summarizer;

pub use summarizer::{LlmSummarizer, Summarizer};

use crate::error::Result;
use crate::providers::Message;
use crate::storage::{run_blocking, MessageRole, SessionStore, StoredMessage};
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Default number of messages kept before summarizing
pub const DEFAULT_WINDOW: usize = 10;

/// Prefix put in front of summary content when it is replayed to the model
pub const SUMMARY_MARKER: &str = "[Summary of earlier conversation]: ";

/// History prepared for the next agent turn
#[derive(Debug, Clone, PartialEq)]
pub struct ChatHistory {
    /// Messages in chronological order
    pub entries: Vec<Message>,
    /// Summary persisted while building this history, if any
    pub new_summary: Option<StoredMessage>,
}

impl ChatHistory {
    fn from_stored(messages: &[StoredMessage]) -> Self {
        Self {
            entries: messages.iter().map(to_message).collect(),
            new_summary: None,
        }
    }

    /// Whether building this history appended a summary to the session
    pub fn wrote_summary(&self) -> bool {
        self.new_summary.is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Map a stored message to a provider message
///
/// Summaries are replayed as assistant turns carrying [`SUMMARY_MARKER`].
pub fn to_message(message: &StoredMessage) -> Message {
    match message.role {
        MessageRole::Human => Message::user(message.content.clone()),
        MessageRole::Ai => Message::assistant(message.content.clone()),
        MessageRole::Summary => Message::assistant(format!("{}{}", SUMMARY_MARKER, message.content)),
    }
}

/// Builds per-session chat history with rolling summaries
pub struct HistoryManager {
    store: Arc<dyn SessionStore>,
    summarizer: Arc<dyn Summarizer>,
    window: usize,
}

impl HistoryManager {
    /// Create a manager; a `window` of zero is treated as one
    pub fn new(store: Arc<dyn SessionStore>, summarizer: Arc<dyn Summarizer>, window: usize) -> Self {
        Self {
            store,
            summarizer,
            window: window.max(1),
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Build the history for `session_id`, summarizing when the window fills
    ///
    /// An unknown session has no messages and yields an empty history.
    ///
    /// # Errors
    ///
    /// Returns error if messages cannot be loaded, if summarization fails
    /// past the window, or if a new summary cannot be persisted. A
    /// summarization failure exactly at the window falls back to the raw
    /// messages.
    pub async fn get_chat_history(&self, session_id: &str) -> Result<ChatHistory> {
        let id = session_id.to_string();
        let messages = run_blocking(&self.store, move |store| store.messages(&id)).await?;
        let total = messages.len();
        debug!(
            "Session {} has {} messages (window {})",
            session_id, total, self.window
        );

        match total.cmp(&self.window) {
            Ordering::Less => Ok(ChatHistory::from_stored(&messages)),
            Ordering::Equal => match self.summarizer.summarize(&messages).await {
                Ok(summary) => self.persist_summary(session_id, summary).await,
                Err(e) => {
                    warn!(
                        "Summarization failed for session {}, using raw history: {:#}",
                        session_id, e
                    );
                    Ok(ChatHistory::from_stored(&messages))
                }
            },
            Ordering::Greater => {
                let recent = &messages[total - self.window..];
                if let Some(anchor) = recent.iter().position(|m| m.role == MessageRole::Summary) {
                    return Ok(ChatHistory::from_stored(&recent[anchor..]));
                }

                let to_summarize = match messages
                    .iter()
                    .rposition(|m| m.role == MessageRole::Summary)
                {
                    Some(previous) => &messages[previous..],
                    None => recent,
                };
                debug!(
                    "Re-summarizing {} messages for session {}",
                    to_summarize.len(),
                    session_id
                );

                let summary = self.summarizer.summarize(to_summarize).await?;
                self.persist_summary(session_id, summary).await
            }
        }
    }

    async fn persist_summary(&self, session_id: &str, summary: String) -> Result<ChatHistory> {
        let id = session_id.to_string();
        let stored = run_blocking(&self.store, move |store| {
            store.append_message(&id, MessageRole::Summary, &summary)
        })
        .await?;
        info!("Stored summary {} for session {}", stored.id, session_id);

        Ok(ChatHistory {
            entries: vec![to_message(&stored)],
            new_summary: Some(stored),
        })
    }
}
