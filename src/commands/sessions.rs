//! `caja sessions ...`

use crate::cli::SessionCommand;
use crate::commands::open_storage;
use crate::config::Config;
use crate::error::{CajaError, Result};
use crate::storage::{MessageRole, SessionStore, SessionSummary};
use colored::Colorize;
use prettytable::{format, row, Table};

const NAME_WIDTH: usize = 40;

fn display_name(name: Option<&str>) -> String {
    match name {
        Some(name) if name.chars().count() > NAME_WIDTH => {
            let cut: String = name.chars().take(NAME_WIDTH - 3).collect();
            format!("{}...", cut)
        }
        Some(name) => name.to_string(),
        None => "-".to_string(),
    }
}

fn sessions_table(sessions: &[SessionSummary]) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
    table.add_row(row![
        "ID".bold(),
        "Name".bold(),
        "Messages".bold(),
        "Last Updated".bold()
    ]);

    for session in sessions {
        table.add_row(row![
            session.id.cyan(),
            display_name(session.session_name.as_deref()),
            session.message_count,
            session.updated_at.format("%Y-%m-%d %H:%M").to_string()
        ]);
    }
    table
}

/// Handle session management commands
pub fn handle_sessions(config: &Config, command: SessionCommand) -> Result<()> {
    let storage = open_storage(config)?;

    match command {
        SessionCommand::List => {
            let sessions = storage.list_sessions()?;
            if sessions.is_empty() {
                println!("{}", "No sessions found.".yellow());
                return Ok(());
            }

            println!("\nSessions:");
            sessions_table(&sessions).printstd();
            println!();
        }
        SessionCommand::Show { id } => {
            let detail = storage
                .get_session_detail(&id)?
                .ok_or_else(|| CajaError::SessionNotFound(id.clone()))?;

            println!(
                "{} {}",
                detail.session.id.cyan(),
                display_name(detail.session.session_name.as_deref())
            );
            for message in &detail.messages {
                let role = match message.role {
                    MessageRole::Human => "human".green(),
                    MessageRole::Ai => "ai".blue(),
                    MessageRole::Summary => "summary".magenta(),
                };
                println!("[{}] {}: {}", message.created_at.format("%H:%M:%S"), role, message.content);
            }
        }
        SessionCommand::Create { name } => {
            let session = storage.create_session(name.as_deref())?;
            println!("{}", format!("Created session {}", session.id).green());
        }
        SessionCommand::Delete { id } => {
            if !storage.delete_session(&id)? {
                return Err(CajaError::SessionNotFound(id).into());
            }
            println!("{}", format!("Deleted session {}", id).green());
        }
    }

    Ok(())
}
