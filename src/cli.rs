//! Command-line interface definition for Caja
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for the HTTP server, interactive chat and session
//! management.

use clap::{Parser, Subcommand};

/// Caja - conversational assistant with persistent sessions
///
/// Chat with an assistant that remembers each session, condensing older
/// turns into summaries as the conversation grows.
#[derive(Parser, Debug, Clone)]
#[command(name = "caja")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the session database path
    #[arg(long, env = "CAJA_SESSION_DB")]
    pub storage_path: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Caja
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the HTTP API server
    Serve {
        /// Bind host (overrides server.host)
        #[arg(long)]
        host: Option<String>,

        /// Bind port (overrides server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Start an interactive chat in a new or existing session
    Chat {
        /// Resume an existing session by ID
        #[arg(short, long)]
        session: Option<String>,

        /// Name for a newly created session
        #[arg(short, long)]
        name: Option<String>,

        /// Do not send earlier turns of the session to the assistant
        #[arg(long)]
        no_history: bool,
    },

    /// Manage stored sessions
    Sessions {
        #[command(subcommand)]
        command: SessionCommand,
    },
}

/// Session management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum SessionCommand {
    /// List all sessions
    List,

    /// Show a session with its messages
    Show {
        /// Session ID
        id: String,
    },

    /// Create an empty session
    Create {
        /// Optional session name
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Delete a session and its messages
    Delete {
        /// Session ID
        id: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            storage_path: None,
            command: Commands::Sessions {
                command: SessionCommand::List,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default() {
        let cli = Cli::default();
        assert_eq!(cli.config, Some("config/config.yaml".to_string()));
        assert!(!cli.verbose);
        assert!(cli.storage_path.is_none());
    }

    #[test]
    fn test_cli_parse_serve_with_overrides() {
        let cli = Cli::try_parse_from(["caja", "serve", "--host", "127.0.0.1", "--port", "9000"])
            .unwrap();
        if let Commands::Serve { host, port } = cli.command {
            assert_eq!(host.as_deref(), Some("127.0.0.1"));
            assert_eq!(port, Some(9000));
        } else {
            panic!("Expected Serve command");
        }
    }

    #[test]
    fn test_cli_parse_chat_resume() {
        let cli = Cli::try_parse_from(["caja", "chat", "--session", "abc", "--no-history"]).unwrap();
        if let Commands::Chat {
            session,
            name,
            no_history,
        } = cli.command
        {
            assert_eq!(session.as_deref(), Some("abc"));
            assert!(name.is_none());
            assert!(no_history);
        } else {
            panic!("Expected Chat command");
        }
    }

    #[test]
    fn test_cli_parse_sessions_subcommands() {
        let cli = Cli::try_parse_from(["caja", "sessions", "show", "abc"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Sessions {
                command: SessionCommand::Show { .. }
            }
        ));

        let cli = Cli::try_parse_from(["caja", "sessions", "create", "--name", "work"]).unwrap();
        if let Commands::Sessions {
            command: SessionCommand::Create { name },
        } = cli.command
        {
            assert_eq!(name.as_deref(), Some("work"));
        } else {
            panic!("Expected sessions create");
        }
    }

    #[test]
    fn test_cli_global_flags() {
        let cli = Cli::try_parse_from([
            "caja",
            "--verbose",
            "--config",
            "custom.yaml",
            "--storage-path",
            "/tmp/s.db",
            "sessions",
            "list",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config.as_deref(), Some("custom.yaml"));
        assert_eq!(cli.storage_path.as_deref(), Some("/tmp/s.db"));
    }

    #[test]
    fn test_cli_requires_command() {
        assert!(Cli::try_parse_from(["caja"]).is_err());
    }
}
