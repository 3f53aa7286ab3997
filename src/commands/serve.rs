//! `caja serve`

use crate::api::{self, AppState};
use crate::chat::ChatService;
use crate::config::Config;
use crate::error::Result;

/// Run the HTTP API until interrupted
///
/// `host` and `port` override the configured bind address.
pub async fn run_serve(config: Config, host: Option<String>, port: Option<u16>) -> Result<()> {
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);

    let service = ChatService::from_config(&config)?;
    api::serve(AppState::new(service), &host, port).await
}
