//! OpenAI-compatible provider implementation
//!
//! Talks to any `/chat/completions` endpoint that follows the OpenAI wire
//! format (Groq by default) using bearer-token authentication.

use crate::config::OpenAiConfig;
use crate::error::{CajaError, Result};
use crate::providers::{CompletionResponse, Message, Provider, TokenUsage, ToolCall};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// OpenAI-compatible chat completions provider
pub struct OpenAiProvider {
    client: Client,
    config: OpenAiConfig,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ChatTool>,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatTool {
    r#type: String,
    function: ChatFunction,
}

#[derive(Debug, Serialize)]
struct ChatFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: usize,
    completion_tokens: usize,
}

impl OpenAiProvider {
    /// Create a new OpenAI-compatible provider
    ///
    /// # Errors
    ///
    /// Returns `CajaError::Provider` when no API key is configured or the
    /// HTTP client cannot be built.
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        if config.api_key.as_deref().map_or(true, str::is_empty) {
            return Err(CajaError::Provider(
                "No API key configured; set CAJA_API_KEY or GROQ_API_KEY".to_string(),
            )
            .into());
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .user_agent(concat!("caja/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CajaError::Provider(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!(
            "Initialized OpenAI-compatible provider: base={}, model={}",
            config.api_base,
            config.model
        );

        Ok(Self { client, config })
    }

    /// Get the configured model name
    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.api_base.trim_end_matches('/'))
    }

    fn convert_messages(&self, messages: &[Message]) -> Vec<ChatMessage> {
        crate::providers::validate_message_sequence(messages)
            .into_iter()
            .filter(|m| m.content.is_some() || m.tool_calls.is_some())
            .map(|m| ChatMessage {
                role: m.role,
                content: m.content,
                tool_calls: m.tool_calls,
                tool_call_id: m.tool_call_id,
            })
            .collect()
    }

    fn convert_tools(&self, tools: &[serde_json::Value]) -> Vec<ChatTool> {
        tools
            .iter()
            .filter_map(|t| {
                let obj = t.as_object()?;
                Some(ChatTool {
                    r#type: "function".to_string(),
                    function: ChatFunction {
                        name: obj.get("name")?.as_str()?.to_string(),
                        description: obj.get("description")?.as_str()?.to_string(),
                        parameters: obj.get("parameters")?.clone(),
                    },
                })
            })
            .collect()
    }

    fn convert_response_message(&self, msg: ChatMessage) -> Message {
        match msg.tool_calls {
            Some(calls) if !calls.is_empty() => {
                let mut message = Message::assistant_with_tools(calls);
                message.content = msg.content.filter(|c| !c.is_empty());
                message
            }
            _ => Message {
                role: "assistant".to_string(),
                content: msg.content,
                tool_calls: None,
                tool_call_id: None,
            },
        }
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[serde_json::Value],
    ) -> Result<CompletionResponse> {
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: self.convert_messages(messages),
            tools: self.convert_tools(tools),
            temperature: self.config.temperature,
            stream: false,
        };

        tracing::debug!(
            "Sending chat completion request: {} messages, {} tools",
            request.messages.len(),
            request.tools.len()
        );

        let api_key = self.config.api_key.as_deref().unwrap_or_default();
        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Chat completion request failed: {}", e);
                CajaError::Provider(format!("Chat completion request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Chat completion returned error {}: {}", status, error_text);
            return Err(CajaError::Provider(format!(
                "Chat completion returned error {}: {}",
                status, error_text
            ))
            .into());
        }

        let body: ChatResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse chat completion response: {}", e);
            CajaError::Provider(format!("Failed to parse chat completion response: {}", e))
        })?;

        let choice = body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| CajaError::Provider("Response contained no choices".to_string()))?;

        let message = self.convert_response_message(choice.message);

        Ok(match body.usage {
            Some(usage) => CompletionResponse::with_usage(
                message,
                TokenUsage::new(usage.prompt_tokens, usage.completion_tokens),
            ),
            None => CompletionResponse::new(message),
        })
    }

    fn name(&self) -> &str {
        "openai"
    }
}
