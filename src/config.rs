//! Configuration management for Caja
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{CajaError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for Caja
///
/// Holds everything needed to wire the assistant together: the LLM
/// provider, agent limits, history windowing, storage locations, the SQL
/// notes agent, tool settings and the HTTP server bind address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Provider configuration (Ollama, OpenAI-compatible)
    pub provider: ProviderConfig,
    /// Main agent behavior configuration
    #[serde(default)]
    pub agent: AgentConfig,
    /// Chat history windowing configuration
    #[serde(default)]
    pub history: HistoryConfig,
    /// Session storage configuration
    #[serde(default)]
    pub storage: StorageConfig,
    /// Notes database configuration
    #[serde(default)]
    pub notes: NotesConfig,
    /// SQL notes agent configuration
    #[serde(default)]
    pub sql: SqlAgentConfig,
    /// Tool configuration
    #[serde(default)]
    pub tools: ToolsConfig,
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
}

/// Provider configuration
///
/// Specifies which AI provider to use and its settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Type of provider to use ("ollama" or "openai")
    #[serde(rename = "type")]
    pub provider_type: String,

    /// Ollama configuration
    #[serde(default)]
    pub ollama: OllamaConfig,

    /// OpenAI-compatible provider configuration (Groq by default)
    #[serde(default)]
    pub openai: OpenAiConfig,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider_type: "openai".to_string(),
            ollama: OllamaConfig::default(),
            openai: OpenAiConfig::default(),
        }
    }
}

/// Ollama provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Ollama server host
    #[serde(default = "default_ollama_host")]
    pub host: String,

    /// Model to use for Ollama
    #[serde(default = "default_ollama_model")]
    pub model: String,
}

fn default_ollama_host() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3.2:latest".to_string()
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: default_ollama_host(),
            model: default_ollama_model(),
        }
    }
}

/// OpenAI-compatible provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// Base URL of the chat completions API (without `/chat/completions`)
    #[serde(default = "default_openai_api_base")]
    pub api_base: String,

    /// Model to use
    #[serde(default = "default_openai_model")]
    pub model: String,

    /// API key; usually supplied through `CAJA_API_KEY` or `GROQ_API_KEY`
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Sampling temperature
    #[serde(default)]
    pub temperature: f32,
}

fn default_openai_api_base() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_openai_model() -> String {
    "openai/gpt-oss-120b".to_string()
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_base: default_openai_api_base(),
            model: default_openai_model(),
            api_key: None,
            temperature: 0.0,
        }
    }
}

/// Agent behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum number of provider round-trips per query
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,

    /// Timeout for a single agent execution (seconds)
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Maximum size of a tool output fed back to the model (bytes)
    #[serde(default = "default_max_output")]
    pub max_output_size: usize,
}

fn default_max_turns() -> usize {
    25
}

fn default_timeout() -> u64 {
    300
}

fn default_max_output() -> usize {
    65_536
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
            timeout_seconds: default_timeout(),
            max_output_size: default_max_output(),
        }
    }
}

/// Chat history windowing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Number of most recent messages considered active context
    #[serde(default = "default_window")]
    pub window: usize,
}

fn default_window() -> usize {
    crate::history::DEFAULT_WINDOW
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            window: default_window(),
        }
    }
}

/// Session storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path of the sessions database; the user data directory is used when unset
    #[serde(default)]
    pub db_path: Option<PathBuf>,
}

/// Notes database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotesConfig {
    /// Path of the notes database
    #[serde(default = "default_notes_db")]
    pub db_path: PathBuf,
}

fn default_notes_db() -> PathBuf {
    PathBuf::from("notes.db")
}

impl Default for NotesConfig {
    fn default() -> Self {
        Self {
            db_path: default_notes_db(),
        }
    }
}

/// SQL notes agent configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqlAgentConfig {
    /// Model override for the SQL agent (same provider as the main agent)
    ///
    /// The default names a Groq model; see [`Config::sql_model`] for how it
    /// is resolved against the Ollama provider.
    #[serde(default = "default_sql_model")]
    pub model: Option<String>,

    /// Failed queries tolerated per run before further queries are refused
    #[serde(default = "default_sql_max_attempts")]
    pub max_attempts: usize,

    /// Maximum rows rendered from a single query
    #[serde(default = "default_sql_max_rows")]
    pub max_rows: usize,

    /// Maximum provider round-trips for one SQL agent run
    #[serde(default = "default_sql_max_turns")]
    pub max_turns: usize,
}

fn default_sql_model() -> Option<String> {
    Some("qwen/qwen3-32b".to_string())
}

fn default_sql_max_attempts() -> usize {
    3
}

fn default_sql_max_rows() -> usize {
    5
}

fn default_sql_max_turns() -> usize {
    15
}

impl Default for SqlAgentConfig {
    fn default() -> Self {
        Self {
            model: default_sql_model(),
            max_attempts: default_sql_max_attempts(),
            max_rows: default_sql_max_rows(),
            max_turns: default_sql_max_turns(),
        }
    }
}

/// Tool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Timezone used by `get_current_time` when the model does not pass one
    #[serde(default = "default_timezone")]
    pub default_timezone: String,

    /// Tavily API key; web search is disabled when absent
    #[serde(default, skip_serializing)]
    pub tavily_api_key: Option<String>,

    /// Tavily API base URL
    #[serde(default = "default_tavily_api_base")]
    pub tavily_api_base: String,

    /// Maximum number of web search results
    #[serde(default = "default_search_max_results")]
    pub search_max_results: usize,
}

fn default_timezone() -> String {
    "Africa/Cairo".to_string()
}

fn default_tavily_api_base() -> String {
    "https://api.tavily.com".to_string()
}

fn default_search_max_results() -> usize {
    5
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            default_timezone: default_timezone(),
            tavily_api_key: None,
            tavily_api_base: default_tavily_api_base(),
            search_max_results: default_search_max_results(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind host
    #[serde(default = "default_server_host")]
    pub host: String,

    /// Bind port
    #[serde(default = "default_server_port")]
    pub port: u16,
}

fn default_server_host() -> String {
    "0.0.0.0".to_string()
}

fn default_server_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
        }
    }
}

impl Config {
    /// Load configuration from file, environment variables, and CLI
    ///
    /// A missing file is not an error: defaults are used and a warning is
    /// logged.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the YAML configuration file
    /// * `cli` - Parsed CLI arguments used for overrides
    ///
    /// # Errors
    ///
    /// Returns `CajaError::Config` if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| CajaError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| CajaError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(provider_type) = std::env::var("CAJA_PROVIDER") {
            self.provider.provider_type = provider_type;
        }

        if let Ok(model) = std::env::var("CAJA_MODEL") {
            match self.provider.provider_type.as_str() {
                "ollama" => self.provider.ollama.model = model,
                _ => self.provider.openai.model = model,
            }
        }

        if let Ok(host) = std::env::var("CAJA_OLLAMA_HOST") {
            self.provider.ollama.host = host;
        }

        if let Ok(api_base) = std::env::var("CAJA_API_BASE") {
            self.provider.openai.api_base = api_base;
        }

        if let Some(key) = std::env::var("CAJA_API_KEY")
            .ok()
            .or_else(|| std::env::var("GROQ_API_KEY").ok())
        {
            self.provider.openai.api_key = Some(key);
        }

        if let Ok(sql_model) = std::env::var("CAJA_SQL_MODEL") {
            self.sql.model = if sql_model.is_empty() {
                None
            } else {
                Some(sql_model)
            };
        }

        if let Ok(window) = std::env::var("CAJA_HISTORY_WINDOW") {
            match window.parse() {
                Ok(value) => self.history.window = value,
                Err(_) => tracing::warn!("Invalid CAJA_HISTORY_WINDOW: {}", window),
            }
        }

        if let Ok(max_turns) = std::env::var("CAJA_MAX_TURNS") {
            match max_turns.parse() {
                Ok(value) => self.agent.max_turns = value,
                Err(_) => tracing::warn!("Invalid CAJA_MAX_TURNS: {}", max_turns),
            }
        }

        if let Ok(db_path) = std::env::var("CAJA_SESSION_DB") {
            self.storage.db_path = Some(PathBuf::from(db_path));
        }

        if let Ok(db_path) = std::env::var("CAJA_NOTES_DB") {
            self.notes.db_path = PathBuf::from(db_path);
        }

        if let Ok(key) = std::env::var("TAVILY_API_KEY") {
            self.tools.tavily_api_key = Some(key);
        }

        if let Ok(host) = std::env::var("CAJA_SERVER_HOST") {
            self.server.host = host;
        }

        if let Ok(port) = std::env::var("CAJA_SERVER_PORT") {
            match port.parse() {
                Ok(value) => self.server.port = value,
                Err(_) => tracing::warn!("Invalid CAJA_SERVER_PORT: {}", port),
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(db_path) = &cli.storage_path {
            tracing::info!("Using session DB override from CLI: {}", db_path);
            self.storage.db_path = Some(PathBuf::from(db_path));
        }

        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns `CajaError::Config` describing the first invalid setting
    pub fn validate(&self) -> Result<()> {
        let valid_providers = ["ollama", "openai"];
        if !valid_providers.contains(&self.provider.provider_type.as_str()) {
            return Err(CajaError::Config(format!(
                "Invalid provider type: {}. Must be one of: {}",
                self.provider.provider_type,
                valid_providers.join(", ")
            ))
            .into());
        }

        if self.history.window == 0 {
            return Err(
                CajaError::Config("history.window must be greater than 0".to_string()).into(),
            );
        }

        if self.agent.max_turns == 0 || self.agent.max_turns > 1000 {
            return Err(CajaError::Config(
                "agent.max_turns must be between 1 and 1000".to_string(),
            )
            .into());
        }

        if self.agent.timeout_seconds == 0 {
            return Err(CajaError::Config(
                "agent.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.sql.max_attempts == 0 {
            return Err(
                CajaError::Config("sql.max_attempts must be greater than 0".to_string()).into(),
            );
        }

        if self.sql.max_rows == 0 {
            return Err(
                CajaError::Config("sql.max_rows must be greater than 0".to_string()).into(),
            );
        }

        Ok(())
    }
}

impl Config {
    /// Model the SQL agent asks its provider for
    ///
    /// `None` means the provider's own model. The built-in default is an
    /// OpenAI-compatible model name, so with the Ollama provider it falls back
    /// to the Ollama model instead of being sent as-is.
    pub fn sql_model(&self) -> Option<&str> {
        let model = self.sql.model.as_deref()?;
        if self.provider.provider_type == "ollama" && default_sql_model().as_deref() == Some(model) {
            tracing::warn!(
                "sql.model {} is not an Ollama model; the SQL agent uses {} instead",
                model,
                self.provider.ollama.model
            );
            return None;
        }
        Some(model)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            agent: AgentConfig::default(),
            history: HistoryConfig::default(),
            storage: StorageConfig::default(),
            notes: NotesConfig::default(),
            sql: SqlAgentConfig::default(),
            tools: ToolsConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.provider.provider_type, "openai");
        assert_eq!(config.history.window, 10);
        assert_eq!(config.sql.max_attempts, 3);
        assert_eq!(config.sql.max_rows, 5);
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.tools.default_timezone, "Africa/Cairo");
    }

    #[test]
    fn test_config_validation_success() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_config_validation_invalid_provider() {
        let mut config = Config::default();
        config.provider.provider_type = "invalid".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_window() {
        let mut config = Config::default();
        config.history.window = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_max_turns_bounds() {
        let mut config = Config::default();
        config.agent.max_turns = 0;
        assert!(config.validate().is_err());
        config.agent.max_turns = 1001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_sql_attempts() {
        let mut config = Config::default();
        config.sql.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_yaml() {
        let yaml = r#"
provider:
  type: ollama
  ollama:
    host: http://localhost:11434
    model: qwen2.5:7b

agent:
  max_turns: 10
history:
  window: 6
sql:
  model: null
  max_attempts: 2
server:
  port: 9000
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.provider.provider_type, "ollama");
        assert_eq!(config.provider.ollama.model, "qwen2.5:7b");
        assert_eq!(config.agent.max_turns, 10);
        assert_eq!(config.agent.timeout_seconds, 300);
        assert_eq!(config.history.window, 6);
        assert!(config.sql.model.is_none());
        assert_eq!(config.sql.max_attempts, 2);
        assert_eq!(config.sql.max_rows, 5);
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
    }

    #[test]
    fn test_sql_model_default_applies_to_openai_provider() {
        let config = Config::default();
        assert_eq!(config.sql_model(), Some("qwen/qwen3-32b"));
    }

    #[test]
    fn test_sql_model_default_is_not_sent_to_ollama() {
        let mut config = Config::default();
        config.provider.provider_type = "ollama".to_string();
        assert_eq!(config.sql_model(), None);

        config.sql.model = Some("qwen2.5:7b".to_string());
        assert_eq!(config.sql_model(), Some("qwen2.5:7b"));

        config.sql.model = None;
        assert_eq!(config.sql_model(), None);
    }

    #[test]
    fn test_api_key_is_not_serialized() {
        let mut config = Config::default();
        config.provider.openai.api_key = Some("secret".to_string());
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(!yaml.contains("secret"));
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        std::env::set_var("CAJA_HISTORY_WINDOW", "4");
        std::env::set_var("CAJA_NOTES_DB", "/tmp/caja-notes.db");
        std::env::set_var("CAJA_SERVER_PORT", "not-a-port");

        let mut config = Config::default();
        config.apply_env_vars();

        assert_eq!(config.history.window, 4);
        assert_eq!(config.notes.db_path, PathBuf::from("/tmp/caja-notes.db"));
        assert_eq!(config.server.port, 8000);

        std::env::remove_var("CAJA_HISTORY_WINDOW");
        std::env::remove_var("CAJA_NOTES_DB");
        std::env::remove_var("CAJA_SERVER_PORT");
    }

    #[test]
    #[serial]
    fn test_model_env_targets_active_provider() {
        std::env::set_var("CAJA_PROVIDER", "ollama");
        std::env::set_var("CAJA_MODEL", "mistral:latest");

        let mut config = Config::default();
        config.apply_env_vars();

        assert_eq!(config.provider.provider_type, "ollama");
        assert_eq!(config.provider.ollama.model, "mistral:latest");
        assert_eq!(config.provider.openai.model, "openai/gpt-oss-120b");

        std::env::remove_var("CAJA_PROVIDER");
        std::env::remove_var("CAJA_MODEL");
    }

    #[test]
    #[serial]
    fn test_load_missing_file_uses_defaults() {
        let cli = crate::cli::Cli::default();
        let config = Config::load("/nonexistent/caja/config.yaml", &cli).unwrap();
        assert_eq!(config.history.window, 10);
    }

    #[test]
    #[serial]
    fn test_cli_storage_override() {
        let cli = crate::cli::Cli {
            storage_path: Some("/tmp/caja-sessions.db".to_string()),
            ..Default::default()
        };
        let config = Config::load("/nonexistent/caja/config.yaml", &cli).unwrap();
        assert_eq!(
            config.storage.db_path,
            Some(PathBuf::from("/tmp/caja-sessions.db"))
        );
    }
}
