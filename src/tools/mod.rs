//! Tools module for Caja
//!
//! This module contains the tool executor abstraction, the tool registry and
//! the tools exposed to the assistant: current time, the notes database
//! agent (with its SQL tools) and web search.

pub mod current_time;
pub mod database_agent;
pub mod sql;
pub mod web_search;

pub use current_time::CurrentTimeTool;
pub use database_agent::DatabaseAgentTool;
pub use sql::{SqlAttempts, SqlDescribeTableTool, SqlListTablesTool, SqlQueryTool};
pub use web_search::WebSearchTool;

use crate::config::Config;
use crate::error::Result;
use crate::notes::NotesDatabase;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Tool result structure
///
/// Represents the result of a tool execution with truncation support.
#[derive(Debug, Clone)]
pub struct ToolResult {
    /// Whether the tool execution succeeded
    pub success: bool,
    /// Output from the tool
    pub output: String,
    /// Error message if execution failed
    pub error: Option<String>,
    /// Whether the output was truncated
    pub truncated: bool,
}

impl ToolResult {
    /// Create a successful tool result
    pub fn success(output: String) -> Self {
        Self {
            success: true,
            output,
            error: None,
            truncated: false,
        }
    }

    /// Create a failed tool result
    ///
    /// Failed results are still handed back to the model so it can react.
    pub fn error(error: String) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: Some(error),
            truncated: false,
        }
    }

    /// Truncate output if it exceeds the maximum size
    ///
    /// The cut happens on a character boundary at or below `max_size` bytes.
    pub fn truncate_if_needed(mut self, max_size: usize) -> Self {
        if self.output.len() > max_size {
            let mut cut = max_size;
            while !self.output.is_char_boundary(cut) {
                cut -= 1;
            }
            self.output.truncate(cut);
            self.output.push_str("\n... (truncated)");
            self.truncated = true;
        }
        self
    }

    /// Convert to a message string for the conversation
    pub fn to_message(&self) -> String {
        if self.success {
            if self.truncated {
                format!("{}\n(Output truncated to fit context window)", self.output)
            } else {
                self.output.clone()
            }
        } else {
            format!(
                "Error: {}",
                self.error.as_deref().unwrap_or("Unknown error")
            )
        }
    }
}

/// Tool executor trait for implementing tool execution logic
///
/// # Examples
///
/// ```no_run
/// use caja::tools::{ToolExecutor, ToolResult};
/// use caja::error::Result;
/// use async_trait::async_trait;
/// use serde_json::Value;
///
/// struct EchoTool;
///
/// #[async_trait]
/// impl ToolExecutor for EchoTool {
///     fn tool_definition(&self) -> Value {
///         serde_json::json!({
///             "name": "echo",
///             "description": "Echo the input back",
///             "parameters": {"type": "object", "properties": {}}
///         })
///     }
///
///     async fn execute(&self, args: Value) -> Result<ToolResult> {
///         Ok(ToolResult::success(args.to_string()))
///     }
/// }
/// ```
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Returns the tool definition as a JSON value
    ///
    /// The definition uses the flat `{name, description, parameters}` form;
    /// providers wrap it into their own wire format.
    fn tool_definition(&self) -> serde_json::Value;

    /// Executes the tool with the given arguments
    ///
    /// # Errors
    ///
    /// Returns error only for failures the model cannot act on; recoverable
    /// problems are reported through `ToolResult::error`.
    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult>;
}

/// Tool registry for managing available tools
///
/// Tools are kept in name order so the definitions sent to the provider are
/// stable between requests.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn ToolExecutor>>,
}

impl ToolRegistry {
    /// Create a new empty tool registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool executor in the registry
    pub fn register(&mut self, name: impl Into<String>, executor: Arc<dyn ToolExecutor>) {
        self.tools.insert(name.into(), executor);
    }

    /// Get a tool executor by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn ToolExecutor>> {
        self.tools.get(name).cloned()
    }

    /// Get all tool definitions as JSON values
    pub fn all_definitions(&self) -> Vec<serde_json::Value> {
        self.tools
            .values()
            .map(|executor| executor.tool_definition())
            .collect()
    }

    /// Names of the registered tools
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Assemble the tool registry for the main assistant
///
/// Always registers `get_current_time` and `database_agent`; `web_search`
/// is added only when a Tavily API key is configured.
///
/// # Errors
///
/// Returns error if the notes database cannot be opened or the SQL agent's
/// provider cannot be created.
pub fn build_main_tools(config: &Config) -> Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();

    registry.register(
        current_time::TOOL_NAME,
        Arc::new(CurrentTimeTool::new(config.tools.default_timezone.clone())),
    );

    let notes = NotesDatabase::open(&config.notes.db_path)?;
    let sql_provider =
        crate::providers::create_provider_with_model(&config.provider, config.sql_model())?;
    registry.register(
        database_agent::TOOL_NAME,
        Arc::new(DatabaseAgentTool::new(
            sql_provider,
            notes,
            config.sql.clone(),
            config.agent.clone(),
        )),
    );

    match &config.tools.tavily_api_key {
        Some(key) if !key.is_empty() => {
            registry.register(
                web_search::TOOL_NAME,
                Arc::new(WebSearchTool::new(
                    key.clone(),
                    config.tools.tavily_api_base.clone(),
                    config.tools.search_max_results,
                )?),
            );
        }
        _ => tracing::info!("TAVILY_API_KEY not set; web_search disabled"),
    }

    tracing::debug!("Main tools: {:?}", registry.names());
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockToolExecutor {
        name: String,
    }

    #[async_trait]
    impl ToolExecutor for MockToolExecutor {
        fn tool_definition(&self) -> serde_json::Value {
            serde_json::json!({
                "name": self.name,
                "description": "Mock tool",
                "parameters": {"type": "object"}
            })
        }

        async fn execute(&self, _args: serde_json::Value) -> Result<ToolResult> {
            Ok(ToolResult::success("mock output".to_string()))
        }
    }

    #[test]
    fn test_tool_result_success_and_error_messages() {
        assert_eq!(ToolResult::success("ok".to_string()).to_message(), "ok");
        assert_eq!(
            ToolResult::error("bad table".to_string()).to_message(),
            "Error: bad table"
        );
    }

    #[test]
    fn test_tool_result_truncation() {
        let result = ToolResult::success("a".repeat(100)).truncate_if_needed(10);
        assert!(result.truncated);
        assert!(result.output.starts_with("aaaaaaaaaa\n"));
        assert!(result.to_message().contains("Output truncated"));
    }

    #[test]
    fn test_tool_result_truncation_respects_char_boundary() {
        let result = ToolResult::success("ééééé".to_string()).truncate_if_needed(3);
        assert!(result.truncated);
        assert!(result.output.starts_with('é'));
    }

    #[test]
    fn test_tool_result_no_truncation() {
        let result = ToolResult::success("short".to_string()).truncate_if_needed(100);
        assert!(!result.truncated);
        assert_eq!(result.output, "short");
    }

    #[test]
    fn test_tool_registry_register_and_get() {
        let mut registry = ToolRegistry::new();
        assert!(registry.is_empty());
        registry.register(
            "test",
            Arc::new(MockToolExecutor {
                name: "test".to_string(),
            }),
        );
        assert_eq!(registry.len(), 1);
        assert!(registry.get("test").is_some());
        assert!(registry.get("nonexistent").is_none());
    }

    #[test]
    fn test_tool_registry_definitions_are_name_ordered() {
        let mut registry = ToolRegistry::new();
        for name in ["web_search", "database_agent", "get_current_time"] {
            registry.register(
                name,
                Arc::new(MockToolExecutor {
                    name: name.to_string(),
                }),
            );
        }

        let names: Vec<String> = registry
            .all_definitions()
            .iter()
            .map(|d| d["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["database_agent", "get_current_time", "web_search"]);
    }

    #[test]
    fn test_build_main_tools_without_tavily_key() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.provider.provider_type = "ollama".to_string();
        config.notes.db_path = dir.path().join("notes.db");
        config.tools.tavily_api_key = None;

        let registry = build_main_tools(&config).unwrap();
        assert_eq!(registry.names(), vec!["database_agent", "get_current_time"]);
    }

    #[test]
    fn test_build_main_tools_with_tavily_key() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.provider.provider_type = "ollama".to_string();
        config.notes.db_path = dir.path().join("notes.db");
        config.tools.tavily_api_key = Some("tvly-test".to_string());

        let registry = build_main_tools(&config).unwrap();
        assert!(registry.get("web_search").is_some());
        assert_eq!(registry.len(), 3);
    }
}
