//! Interactive chat mode
//!
//! Runs a readline loop against one session. Each line is a chat turn; the
//! exchange is persisted exactly as it would be through the HTTP API.

use crate::chat::{ChatRequest, ChatService};
use crate::config::Config;
use crate::error::{CajaError, Result};
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

/// Words that end the chat loop
fn is_exit_command(input: &str) -> bool {
    matches!(input.to_ascii_lowercase().as_str(), "exit" | "quit")
}

/// Start interactive chat mode
///
/// # Arguments
///
/// * `config` - Global configuration (consumed)
/// * `session_id` - Resume this session instead of creating one
/// * `name` - Name for a newly created session
/// * `no_history` - Send each query without earlier turns
///
/// # Errors
///
/// Returns `CajaError::SessionNotFound` when resuming an unknown session, or
/// any setup error from the chat service.
pub async fn run_chat(
    config: Config,
    session_id: Option<String>,
    name: Option<String>,
    no_history: bool,
) -> Result<()> {
    let service = ChatService::from_config(&config)?;

    let session_id = match session_id {
        Some(id) => {
            let detail = service
                .get_session(&id)
                .await?
                .ok_or_else(|| CajaError::SessionNotFound(id.clone()))?;
            println!(
                "Resuming session {} ({} messages)",
                detail.session.id.cyan(),
                detail.messages.len()
            );
            detail.session.id
        }
        None => {
            let session = service.create_session(name.as_deref()).await?;
            println!("Started session {}", session.id.cyan());
            session.id
        }
    };

    let mut rl = DefaultEditor::new()?;
    println!("Type {} or {} to leave.\n", "exit".bold(), "quit".bold());

    loop {
        match rl.readline(&format!("{} ", ">>".green())) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                if is_exit_command(trimmed) {
                    break;
                }
                rl.add_history_entry(trimmed)?;

                let request = ChatRequest {
                    query: trimmed.to_string(),
                    session_id: session_id.clone(),
                    enable_history: !no_history,
                };
                match service.chat(request).await {
                    Ok(response) => println!("\n{}\n", response.response),
                    Err(e) => eprintln!("{} {}\n", "Error:".red(), e),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => {
                tracing::error!("Readline error: {:?}", err);
                break;
            }
        }
    }

    println!("Goodbye! Resume with {}", format!("caja chat --session {}", session_id).cyan());
    Ok(())
}
