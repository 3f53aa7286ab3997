//! SQL tools over the notes database
//!
//! These are only handed to the SQL agent. Every statement error comes back as
//! a `ToolResult::error` so the model can fix its query; the shared
//! [`SqlAttempts`] budget stops it from retrying forever.

use crate::error::{CajaError, Result};
use crate::notes::NotesDatabase;
use crate::tools::{ToolExecutor, ToolResult};
use async_trait::async_trait;
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Deserialize;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const LIST_TABLES_TOOL: &str = "sql_list_tables";
pub const DESCRIBE_TABLE_TOOL: &str = "sql_describe_table";
pub const QUERY_TOOL: &str = "sql_query";

/// Rows shown by `sql_describe_table` as a sample
const SAMPLE_ROWS: usize = 3;

/// Failed-query budget shared by the SQL tools of one agent run
#[derive(Debug, Clone)]
pub struct SqlAttempts {
    failures: Arc<AtomicUsize>,
    max_attempts: usize,
}

impl SqlAttempts {
    pub fn new(max_attempts: usize) -> Self {
        Self {
            failures: Arc::new(AtomicUsize::new(0)),
            max_attempts,
        }
    }

    fn exhausted(&self) -> bool {
        self.failures.load(Ordering::SeqCst) >= self.max_attempts
    }

    fn record_failure(&self) -> usize {
        self.failures.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Number of failed queries so far
    pub fn failures(&self) -> usize {
        self.failures.load(Ordering::SeqCst)
    }
}

fn render_value(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => "NULL".to_string(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) => String::from_utf8_lossy(t).into_owned(),
        ValueRef::Blob(b) => format!("<blob {} bytes>", b.len()),
    }
}

/// Outcome of running one statement
#[derive(Debug, PartialEq)]
enum StatementOutput {
    Rows {
        columns: Vec<String>,
        rows: Vec<Vec<String>>,
        more: bool,
    },
    Affected(usize),
}

impl StatementOutput {
    fn render(&self) -> String {
        match self {
            StatementOutput::Rows { columns, rows, .. } if rows.is_empty() => {
                format!("{}\n(no rows)", columns.join(" | "))
            }
            StatementOutput::Rows {
                columns,
                rows,
                more,
            } => {
                let mut out = columns.join(" | ");
                for row in rows {
                    out.push('\n');
                    out.push_str(&row.join(" | "));
                }
                if *more {
                    out.push_str(&format!(
                        "\n(showing first {} rows; add an explicit LIMIT to see more)",
                        rows.len()
                    ));
                }
                out
            }
            StatementOutput::Affected(n) => format!("Statement executed. Rows affected: {}", n),
        }
    }
}

/// Whether the statement carries its own LIMIT clause
fn has_limit_clause(sql: &str) -> bool {
    sql.split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .any(|word| word.eq_ignore_ascii_case("limit"))
}

/// Run one statement, keeping at most `max_rows` rows when a cap is given
fn run_statement(
    conn: &Connection,
    sql: &str,
    max_rows: Option<usize>,
) -> std::result::Result<StatementOutput, rusqlite::Error> {
    let mut stmt = conn.prepare(sql)?;

    if stmt.column_count() == 0 {
        let affected = stmt.execute([])?;
        return Ok(StatementOutput::Affected(affected));
    }

    let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
    let column_count = columns.len();
    let mut rows = Vec::new();
    let mut more = false;
    let mut cursor = stmt.query([])?;
    while let Some(row) = cursor.next()? {
        if max_rows == Some(rows.len()) {
            more = true;
            break;
        }
        let mut values = Vec::with_capacity(column_count);
        for idx in 0..column_count {
            values.push(render_value(row.get_ref(idx)?));
        }
        rows.push(values);
    }

    Ok(StatementOutput::Rows {
        columns,
        rows,
        more,
    })
}

async fn with_connection<T, F>(db: &NotesDatabase, f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&Connection) -> T + Send + 'static,
{
    let db = db.clone();
    tokio::task::spawn_blocking(move || -> Result<T> {
        let conn = db.connect()?;
        Ok(f(&conn))
    })
    .await
    .map_err(|e| CajaError::Tool(format!("SQL task failed: {}", e)))?
}

/// Lists user tables in the notes database
pub struct SqlListTablesTool {
    db: NotesDatabase,
}

impl SqlListTablesTool {
    pub fn new(db: NotesDatabase) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ToolExecutor for SqlListTablesTool {
    fn tool_definition(&self) -> serde_json::Value {
        json!({
            "name": LIST_TABLES_TOOL,
            "description": "List the tables in the notes database as a comma-separated string. Always call this first.",
            "parameters": {"type": "object", "properties": {}}
        })
    }

    async fn execute(&self, _args: serde_json::Value) -> Result<ToolResult> {
        let tables = with_connection(&self.db, |conn| -> rusqlite::Result<Vec<String>> {
            let mut stmt = conn.prepare(
                "SELECT name FROM sqlite_master
                WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
                ORDER BY name",
            )?;
            let names = stmt
                .query_map([], |r| r.get(0))?
                .collect::<rusqlite::Result<Vec<String>>>();
            names
        })
        .await?;

        Ok(match tables {
            Ok(names) => ToolResult::success(names.join(", ")),
            Err(e) => ToolResult::error(e.to_string()),
        })
    }
}

#[derive(Debug, Deserialize)]
struct DescribeParams {
    table: String,
}

/// Shows the CREATE statement and a few sample rows of a table
pub struct SqlDescribeTableTool {
    db: NotesDatabase,
}

impl SqlDescribeTableTool {
    pub fn new(db: NotesDatabase) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ToolExecutor for SqlDescribeTableTool {
    fn tool_definition(&self) -> serde_json::Value {
        json!({
            "name": DESCRIBE_TABLE_TOOL,
            "description": "Show the schema and sample rows of a table. Call sql_list_tables first to be sure the table exists.",
            "parameters": {
                "type": "object",
                "properties": {
                    "table": {"type": "string", "description": "Table name"}
                },
                "required": ["table"]
            }
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult> {
        let params: DescribeParams = match serde_json::from_value(args) {
            Ok(p) => p,
            Err(e) => return Ok(ToolResult::error(format!("Invalid arguments: {}", e))),
        };
        let table = params.table.trim().to_string();

        let described = with_connection(&self.db, move |conn| -> rusqlite::Result<Option<String>> {
            let ddl: Option<String> = conn
                .query_row(
                    "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = ?",
                    params![table],
                    |r| r.get(0),
                )
                .optional()?;
            let Some(ddl) = ddl else {
                return Ok(None);
            };

            let quoted = format!("\"{}\"", table.replace('"', "\"\""));
            let sample = run_statement(
                conn,
                &format!("SELECT * FROM {} LIMIT {}", quoted, SAMPLE_ROWS),
                Some(SAMPLE_ROWS),
            )?;
            let shown = match &sample {
                StatementOutput::Rows { rows, .. } => rows.len(),
                StatementOutput::Affected(_) => 0,
            };

            Ok(Some(format!(
                "{}\n\n/*\n{} rows from {} table:\n{}\n*/",
                ddl.trim(),
                shown,
                table,
                sample.render()
            )))
        })
        .await?;

        Ok(match described {
            Ok(Some(text)) => ToolResult::success(text),
            Ok(None) => ToolResult::error(format!(
                "Table '{}' does not exist; use sql_list_tables to see available tables",
                params.table
            )),
            Err(e) => ToolResult::error(e.to_string()),
        })
    }
}

#[derive(Debug, Deserialize)]
struct QueryParams {
    query: String,
}

/// Executes one SQL statement against the notes database
pub struct SqlQueryTool {
    db: NotesDatabase,
    attempts: SqlAttempts,
    max_rows: usize,
}

impl SqlQueryTool {
    pub fn new(db: NotesDatabase, attempts: SqlAttempts, max_rows: usize) -> Self {
        Self {
            db,
            attempts,
            max_rows,
        }
    }
}

#[async_trait]
impl ToolExecutor for SqlQueryTool {
    fn tool_definition(&self) -> serde_json::Value {
        json!({
            "name": QUERY_TOOL,
            "description": format!(
                "Execute a single SQL statement. SELECT results are limited to {} rows unless the query has its own LIMIT clause. If the query fails, read the error, rewrite the query and try again.",
                self.max_rows
            ),
            "parameters": {
                "type": "object",
                "properties": {
                    "query": {"type": "string", "description": "A single, syntactically correct SQLite statement"}
                },
                "required": ["query"]
            }
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult> {
        if self.attempts.exhausted() {
            return Ok(ToolResult::error(format!(
                "Maximum of {} failed query attempts reached. Stop retrying and explain the problem to the user.",
                self.attempts.max_attempts
            )));
        }

        let params: QueryParams = match serde_json::from_value(args) {
            Ok(p) => p,
            Err(e) => return Ok(ToolResult::error(format!("Invalid arguments: {}", e))),
        };

        let max_rows = (!has_limit_clause(&params.query)).then_some(self.max_rows);
        let sql = params.query.clone();
        let outcome = with_connection(&self.db, move |conn| run_statement(conn, &sql, max_rows)).await?;

        match outcome {
            Ok(output) => {
                tracing::debug!("SQL ok: {}", params.query);
                Ok(ToolResult::success(output.render()))
            }
            Err(e) => {
                let failures = self.attempts.record_failure();
                tracing::warn!(
                    "SQL attempt {}/{} failed: {}",
                    failures,
                    self.attempts.max_attempts,
                    e
                );
                Ok(ToolResult::error(format!(
                    "{} (query: {}; failed attempt {} of {})",
                    e, params.query, failures, self.attempts.max_attempts
                )))
            }
        }
    }
}
