//! Command handlers for the Caja CLI
//!
//! Each submodule implements one top-level subcommand.

pub mod chat;
pub mod serve;
pub mod sessions;

use crate::config::Config;
use crate::error::Result;
use crate::storage::SqliteStorage;

/// Open the session store selected by configuration
pub(crate) fn open_storage(config: &Config) -> Result<SqliteStorage> {
    match &config.storage.db_path {
        Some(path) => SqliteStorage::new_with_path(path.clone()),
        None => SqliteStorage::new(),
    }
}
