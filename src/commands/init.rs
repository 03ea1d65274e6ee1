use crate::config::{CdmConfig, ConnectionConfig, Dbms, LoaderConfig, VocabularyConfig};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Starter configuration for a PostgreSQL CDM database
#[must_use]
pub fn starter_config(server: &str, database: &str, user: &str) -> LoaderConfig {
    let mut connection = ConnectionConfig::new(Dbms::Postgresql, server, user, "", database, "");
    connection.set_password_env(Some("CDM_PASSWORD".to_string()));
    LoaderConfig {
        connection,
        cdm: CdmConfig::default(),
        vocabulary: VocabularyConfig::default(),
    }
}

#[allow(clippy::disallowed_methods)]
/// Handle the init command
pub fn handle_init(config_path: &Path, server: &str, database: &str, user: &str) -> Result<()> {
    if config_path.exists() {
        anyhow::bail!(
            "Configuration file {} already exists",
            config_path.display()
        );
    }

    let config = starter_config(server, database, user);
    let content = toml::to_string_pretty(&config)?;
    fs::write(config_path, content)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    println!("Successfully initialized cdmloader configuration");
    println!("Database: {server}/{database}");
    println!("Configuration saved to: {}", config_path.display());
    println!("Set CDM_PASSWORD before running other commands");
    Ok(())
}
