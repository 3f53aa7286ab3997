//! Provider module for Caja
//!
//! This module contains the LLM provider abstraction and the Ollama and
//! OpenAI-compatible implementations.

pub mod base;
pub mod ollama;
pub mod openai;

pub use base::{
    validate_message_sequence, CompletionResponse, FunctionCall, Message, Provider, TokenUsage,
    ToolCall,
};
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

use crate::config::ProviderConfig;
use crate::error::{CajaError, Result};
use std::sync::Arc;

/// Create a provider instance based on configuration
///
/// # Errors
///
/// Returns error if provider type is invalid or initialization fails
pub fn create_provider(config: &ProviderConfig) -> Result<Arc<dyn Provider>> {
    create_provider_with_model(config, None)
}

/// Create a provider instance with an optional model override
///
/// Used for the SQL agent, which runs on the same provider as the main agent
/// but may use a different model.
///
/// # Examples
///
/// ```no_run
/// use caja::config::ProviderConfig;
/// use caja::providers::create_provider_with_model;
///
/// # fn example() -> caja::error::Result<()> {
/// let mut config = ProviderConfig::default();
/// config.provider_type = "ollama".to_string();
/// let provider = create_provider_with_model(&config, Some("qwen2.5:7b"))?;
/// # Ok(())
/// # }
/// ```
pub fn create_provider_with_model(
    config: &ProviderConfig,
    model_override: Option<&str>,
) -> Result<Arc<dyn Provider>> {
    match config.provider_type.as_str() {
        "ollama" => {
            let mut ollama_config = config.ollama.clone();
            if let Some(model) = model_override {
                ollama_config.model = model.to_string();
            }
            Ok(Arc::new(OllamaProvider::new(ollama_config)?))
        }
        "openai" => {
            let mut openai_config = config.openai.clone();
            if let Some(model) = model_override {
                openai_config.model = model.to_string();
            }
            Ok(Arc::new(OpenAiProvider::new(openai_config)?))
        }
        other => Err(CajaError::Provider(format!("Unknown provider type: {}", other)).into()),
    }
}
