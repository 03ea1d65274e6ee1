use super::{connect, load_config};
use anyhow::Result;
use std::path::Path;

#[allow(clippy::disallowed_methods)]
/// Handle the ddl command
pub fn handle_ddl(
    config_path: &Path,
    cdm_version: Option<String>,
    schema: Option<String>,
) -> Result<()> {
    let config = load_config(config_path)?;
    let cdm_version = cdm_version.unwrap_or_else(|| config.cdm.version.clone());
    let schema = schema.unwrap_or_else(|| config.cdm.schema.clone());

    println!("Creating CDM {cdm_version} in schema '{schema}'");
    println!("Scripts: {}", config.cdm.ddl_dir.display());

    let mut manager = connect(&config)?;
    manager.execute_ddl(&cdm_version, &schema)?;
    manager.close()?;

    println!("✅ CDM {cdm_version} DDL applied");
    Ok(())
}
