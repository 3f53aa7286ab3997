//! Agent core implementation with tool-calling execution loop
//!
//! This module implements the agent loop that:
//! - Sends the conversation to the AI provider
//! - Executes tool calls requested by the provider
//! - Enforces iteration limits and a wall-clock timeout

use crate::config::AgentConfig;
use crate::error::{CajaError, Result};
use crate::providers::{Message, Provider, ToolCall};
use crate::tools::{ToolRegistry, ToolResult};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// A tool-using agent
///
/// Each `execute` call is independent: the agent keeps no conversation state
/// of its own, callers pass the prior history in.
///
/// # Examples
///
/// ```ignore
/// use caja::agent::Agent;
/// use caja::config::AgentConfig;
/// use caja::tools::ToolRegistry;
///
/// # async fn example() -> caja::error::Result<()> {
/// # let provider = unimplemented!();
/// let agent = Agent::new(provider, ToolRegistry::new(), "You are helpful.", AgentConfig::default())?;
/// let answer = agent.execute("What time is it in Cairo?", &[]).await?;
/// # Ok(())
/// # }
/// ```
pub struct Agent {
    provider: Arc<dyn Provider>,
    tools: ToolRegistry,
    system_prompt: String,
    config: AgentConfig,
}

impl Agent {
    /// Creates a new agent instance
    ///
    /// # Errors
    ///
    /// Returns `CajaError::Config` if `max_turns` is zero
    pub fn new(
        provider: Arc<dyn Provider>,
        tools: ToolRegistry,
        system_prompt: impl Into<String>,
        config: AgentConfig,
    ) -> Result<Self> {
        if config.max_turns == 0 {
            return Err(CajaError::Config("max_turns must be greater than 0".to_string()).into());
        }

        Ok(Self {
            provider,
            tools,
            system_prompt: system_prompt.into(),
            config,
        })
    }

    /// Answer `query` given the prior `history`
    ///
    /// The provider sees `[system, history..., user(query)]`. The run ends on
    /// the first reply without tool calls; its content is the answer.
    ///
    /// # Errors
    ///
    /// - `CajaError::MaxIterationsExceeded` when `max_turns` provider calls do
    ///   not produce an answer
    /// - `CajaError::Timeout` when the run exceeds `timeout_seconds`
    /// - `CajaError::Provider` if a provider call fails
    pub async fn execute(&self, query: &str, history: &[Message]) -> Result<String> {
        let timeout = Duration::from_secs(self.config.timeout_seconds);
        match tokio::time::timeout(timeout, self.run(query, history)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    "Agent execution timeout after {} seconds",
                    self.config.timeout_seconds
                );
                Err(CajaError::Timeout(self.config.timeout_seconds).into())
            }
        }
    }

    async fn run(&self, query: &str, history: &[Message]) -> Result<String> {
        let start_time = Instant::now();
        info!(
            "Starting agent execution with {} history messages",
            history.len()
        );

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(Message::system(self.system_prompt.clone()));
        messages.extend_from_slice(history);
        messages.push(Message::user(query));

        let tool_definitions = self.tools.all_definitions();

        for iteration in 1..=self.config.max_turns {
            debug!("Iteration {}/{}", iteration, self.config.max_turns);

            let completion = self
                .provider
                .complete(&messages, &tool_definitions)
                .await?;
            let message = completion.message;

            if let Some(usage) = completion.usage {
                debug!(
                    "Token usage: prompt={}, completion={}",
                    usage.prompt_tokens, usage.completion_tokens
                );
            }

            match message.tool_calls.clone() {
                Some(tool_calls) if !tool_calls.is_empty() => {
                    debug!("Executing {} tool calls", tool_calls.len());
                    messages.push(message);

                    for tool_call in &tool_calls {
                        let result = self.execute_tool_call(tool_call).await?;
                        messages.push(Message::tool_result(&tool_call.id, result.to_message()));
                    }
                }
                _ => {
                    let answer = message.content.ok_or_else(|| {
                        warn!("Provider returned neither content nor tool calls");
                        CajaError::Provider(
                            "Provider returned invalid response (no content or tool calls)"
                                .to_string(),
                        )
                    })?;

                    info!(
                        "Agent execution completed in {} iterations, {} ms",
                        iteration,
                        start_time.elapsed().as_millis()
                    );
                    return Ok(answer);
                }
            }
        }

        warn!("Maximum iterations ({}) exceeded", self.config.max_turns);
        Err(CajaError::MaxIterationsExceeded {
            limit: self.config.max_turns,
            message: format!(
                "Agent exceeded maximum iteration limit of {}",
                self.config.max_turns
            ),
        }
        .into())
    }

    /// Executes a single tool call
    ///
    /// Unknown tools and unparsable arguments become error results for the
    /// model; only failures inside a tool propagate.
    async fn execute_tool_call(&self, tool_call: &ToolCall) -> Result<ToolResult> {
        let tool_name = &tool_call.function.name;
        debug!("Executing tool: {}", tool_name);

        let Some(tool_executor) = self.tools.get(tool_name) else {
            warn!("Model requested unknown tool: {}", tool_name);
            return Ok(ToolResult::error(format!("Tool not found: {}", tool_name)));
        };

        let raw_args = tool_call.function.arguments.trim();
        let args: serde_json::Value = if raw_args.is_empty() {
            serde_json::json!({})
        } else {
            match serde_json::from_str(raw_args) {
                Ok(args) => args,
                Err(e) => {
                    return Ok(ToolResult::error(format!(
                        "Failed to parse tool arguments for '{}': {}",
                        tool_name, e
                    )))
                }
            }
        };

        let result = tool_executor.execute(args).await.map_err(|e| {
            anyhow::Error::from(CajaError::Tool(format!(
                "Tool '{}' execution failed: {}",
                tool_name, e
            )))
        })?;

        let original_len = result.output.len();
        let truncated = result.truncate_if_needed(self.config.max_output_size);
        if truncated.truncated {
            debug!(
                "Tool output truncated from {} to {} bytes",
                original_len, self.config.max_output_size
            );
        }

        Ok(truncated)
    }

    /// Returns the number of registered tools
    pub fn num_tools(&self) -> usize {
        self.tools.len()
    }
}
