//! Caja - conversational assistant backend
//!
//! Main entry point for the `caja` binary.

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use caja::cli::{Cli, Commands};
use caja::commands;
use caja::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();
    init_tracing(cli.verbose);

    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;
    config.validate()?;

    match cli.command {
        Commands::Serve { host, port } => {
            tracing::info!("Starting API server");
            commands::serve::run_serve(config, host, port).await
        }
        Commands::Chat {
            session,
            name,
            no_history,
        } => {
            tracing::info!("Starting interactive chat mode");
            if let Some(id) = &session {
                tracing::debug!("Resuming session: {}", id);
            }
            commands::chat::run_chat(config, session, name, no_history).await
        }
        Commands::Sessions { command } => commands::sessions::handle_sessions(&config, command),
    }
}

/// Initialize tracing subscriber with environment filter
fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "caja=debug" } else { "caja=info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
