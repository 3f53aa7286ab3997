//! Conversation summarization

use crate::error::{CajaError, Result};
use crate::prompts::generate_summary_prompt;
use crate::providers::{Message, Provider};
use crate::storage::StoredMessage;
use async_trait::async_trait;
use std::sync::Arc;

/// Returned instead of calling the provider when there is nothing to summarize
pub const EMPTY_CONVERSATION: &str = "[No conversation provided]";

/// Compresses a run of stored messages into a single text
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, messages: &[StoredMessage]) -> Result<String>;
}

/// Render messages as `role: content` lines
pub fn render_transcript(messages: &[StoredMessage]) -> String {
    messages
        .iter()
        .map(|m| format!("{}: {}", m.role, m.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Summarizer backed by an LLM provider
pub struct LlmSummarizer {
    provider: Arc<dyn Provider>,
}

impl LlmSummarizer {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Summarizer for LlmSummarizer {
    async fn summarize(&self, messages: &[StoredMessage]) -> Result<String> {
        if messages.iter().all(|m| m.content.trim().is_empty()) {
            return Ok(EMPTY_CONVERSATION.to_string());
        }

        let prompt = generate_summary_prompt(&render_transcript(messages));
        tracing::debug!(
            "Summarizing {} messages with {}",
            messages.len(),
            self.provider.name()
        );

        let completion = self
            .provider
            .complete(&[Message::user(prompt)], &[])
            .await
            .map_err(|e| {
                tracing::error!("Summarization request failed: {:#}", e);
                e
            })?;

        completion
            .message
            .content
            .map(|text| text.trim().to_string())
            .ok_or_else(|| {
                CajaError::Summarization("Provider returned no summary text".to_string()).into()
            })
    }
}
