//! CLI command handlers

/// Check command functionality
pub mod check;
/// DDL command functionality
pub mod ddl;
/// Init command functionality
pub mod init;
/// Truncate command functionality
pub mod truncate;
/// Vocabulary command functionality
pub mod vocabulary;

use crate::config::LoaderConfig;
use crate::ddl::ScriptDdlClient;
use crate::manager::ConnectionManager;
use crate::postgres::PostgresDriver;
use anyhow::{Context, Result};
use std::path::Path;

/// Connection manager backed by the PostgreSQL driver and the script DDL client
pub type PgConnectionManager = ConnectionManager<PostgresDriver, ScriptDdlClient<PostgresDriver>>;

/// Load the configuration file, failing with a hint when it is missing
pub fn load_config(path: &Path) -> Result<LoaderConfig> {
    if !path.exists() {
        anyhow::bail!(
            "No configuration file found at {}. Run 'cdmloader init' first.",
            path.display()
        );
    }
    LoaderConfig::from_file(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))
}

/// Build an unconnected manager for `config`
pub fn build_manager(config: &LoaderConfig) -> Result<PgConnectionManager> {
    let ddl = ScriptDdlClient::new(PostgresDriver::new()?, &config.cdm.ddl_dir);
    Ok(ConnectionManager::new(
        config.connection.clone(),
        PostgresDriver::new()?,
        ddl,
    ))
}

/// Build a manager for `config` and open its session
pub fn connect(config: &LoaderConfig) -> Result<PgConnectionManager> {
    let mut manager = build_manager(config)?;
    manager.connect()?;
    Ok(manager)
}
