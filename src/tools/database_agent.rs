//! database_agent tool
//!
//! Hands a natural-language question about the user's notes to a nested
//! agent that only has the SQL tools. The nested agent's final answer is the
//! tool output.

use crate::agent::Agent;
use crate::config::{AgentConfig, SqlAgentConfig};
use crate::error::Result;
use crate::notes::NotesDatabase;
use crate::prompts::generate_sql_prompt;
use crate::providers::Provider;
use crate::tools::sql::{self, SqlAttempts, SqlDescribeTableTool, SqlListTablesTool, SqlQueryTool};
use crate::tools::{ToolExecutor, ToolRegistry, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

/// Registered tool name
pub const TOOL_NAME: &str = "database_agent";

#[derive(Debug, Deserialize)]
struct DatabaseAgentParams {
    query: String,
}

/// Tool delegating notes questions to the SQL agent
pub struct DatabaseAgentTool {
    provider: Arc<dyn Provider>,
    notes: NotesDatabase,
    sql: SqlAgentConfig,
    agent: AgentConfig,
}

impl DatabaseAgentTool {
    /// Create the tool
    ///
    /// `agent` supplies the timeout and output limits of the nested run;
    /// its `max_turns` is replaced by `sql.max_turns`.
    pub fn new(
        provider: Arc<dyn Provider>,
        notes: NotesDatabase,
        sql: SqlAgentConfig,
        agent: AgentConfig,
    ) -> Self {
        Self {
            provider,
            notes,
            sql,
            agent,
        }
    }

    /// Build the SQL agent for one question
    ///
    /// Every run gets a fresh failed-query budget.
    fn sql_agent(&self) -> Result<Agent> {
        let attempts = SqlAttempts::new(self.sql.max_attempts);

        let mut tools = ToolRegistry::new();
        tools.register(
            sql::LIST_TABLES_TOOL,
            Arc::new(SqlListTablesTool::new(self.notes.clone())),
        );
        tools.register(
            sql::DESCRIBE_TABLE_TOOL,
            Arc::new(SqlDescribeTableTool::new(self.notes.clone())),
        );
        tools.register(
            sql::QUERY_TOOL,
            Arc::new(SqlQueryTool::new(
                self.notes.clone(),
                attempts,
                self.sql.max_rows,
            )),
        );

        let config = AgentConfig {
            max_turns: self.sql.max_turns,
            ..self.agent.clone()
        };

        Agent::new(
            Arc::clone(&self.provider),
            tools,
            generate_sql_prompt(self.sql.max_rows, self.sql.max_attempts),
            config,
        )
    }
}

#[async_trait]
impl ToolExecutor for DatabaseAgentTool {
    fn tool_definition(&self) -> serde_json::Value {
        json!({
            "name": TOOL_NAME,
            "description": "Answer questions about the user's notes and tags stored in the notes database. Pass the user's full question in natural language. The agent can run any SQL needed to read, add, update or delete notes.",
            "parameters": {
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The user's full question or request about their notes"
                    }
                },
                "required": ["query"]
            }
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult> {
        let params: DatabaseAgentParams = match serde_json::from_value(args) {
            Ok(p) => p,
            Err(e) => return Ok(ToolResult::error(format!("Invalid arguments: {}", e))),
        };

        if params.query.trim().is_empty() {
            return Ok(ToolResult::error("query cannot be empty".to_string()));
        }

        tracing::info!("database_agent: {}", params.query);
        let agent = self.sql_agent()?;

        match agent.execute(&params.query, &[]).await {
            Ok(answer) => Ok(ToolResult::success(answer)),
            Err(e) => {
                tracing::warn!("database_agent failed: {:#}", e);
                Ok(ToolResult::error(format!("Database agent failed: {}", e)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::Message;
    use crate::test_utils::{tool_call_message, ScriptedProvider};
    use tempfile::TempDir;

    fn notes_db() -> (NotesDatabase, TempDir) {
        let dir = TempDir::new().unwrap();
        let db = NotesDatabase::open(dir.path().join("notes.db")).unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn test_runs_sql_agent_and_returns_answer() {
        let (db, _dir) = notes_db();
        let provider = Arc::new(ScriptedProvider::new(vec![
            tool_call_message(
                "call_1",
                sql::QUERY_TOOL,
                json!({"query": "SELECT COUNT(*) AS n FROM notes"}),
            ),
            Message::assistant("You have 0 notes."),
        ]));
        let tool = DatabaseAgentTool::new(
            provider.clone(),
            db,
            SqlAgentConfig::default(),
            AgentConfig::default(),
        );

        let result = tool
            .execute(json!({"query": "How many notes do I have?"}))
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.output, "You have 0 notes.");

        let requests = provider.requests();
        assert!(requests[0][0]
            .content
            .as_deref()
            .unwrap()
            .contains("sqlite"));
        assert_eq!(
            requests[0][1].content.as_deref(),
            Some("How many notes do I have?")
        );
        let tool_output = requests[1].last().unwrap().content.clone().unwrap();
        assert!(tool_output.contains('n'));
        assert!(tool_output.contains('0'));
    }

    #[tokio::test]
    async fn test_nested_failure_becomes_error_result() {
        let (db, _dir) = notes_db();
        let provider = Arc::new(ScriptedProvider::failing("model unavailable"));
        let tool = DatabaseAgentTool::new(
            provider,
            db,
            SqlAgentConfig::default(),
            AgentConfig::default(),
        );

        let result = tool.execute(json!({"query": "list my notes"})).await.unwrap();
        assert!(!result.success);
        assert!(result.to_message().contains("model unavailable"));
    }

    #[tokio::test]
    async fn test_nested_agent_uses_sql_max_turns() {
        let (db, _dir) = notes_db();
        let replies = (0..5)
            .map(|i| tool_call_message(&format!("c{}", i), sql::LIST_TABLES_TOOL, json!({})))
            .collect();
        let provider = Arc::new(ScriptedProvider::new(replies));
        let sql = SqlAgentConfig {
            max_turns: 2,
            ..Default::default()
        };
        let tool = DatabaseAgentTool::new(provider.clone(), db, sql, AgentConfig::default());

        let result = tool.execute(json!({"query": "loop"})).await.unwrap();
        assert!(!result.success);
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn test_missing_query_is_error_result() {
        let (db, _dir) = notes_db();
        let tool = DatabaseAgentTool::new(
            Arc::new(ScriptedProvider::new(vec![])),
            db,
            SqlAgentConfig::default(),
            AgentConfig::default(),
        );
        let result = tool.execute(json!({})).await.unwrap();
        assert!(!result.success);
    }
}
