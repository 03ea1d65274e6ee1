use super::{connect, load_config};
use anyhow::Result;
use std::path::Path;

#[allow(clippy::disallowed_methods)]
/// Handle the truncate command
pub fn handle_truncate(config_path: &Path, schema: &str, table: &str) -> Result<()> {
    let config = load_config(config_path)?;
    let mut manager = connect(&config)?;
    manager.empty_table(schema, table)?;
    manager.close()?;

    println!("✅ Table '{schema}.{table}' truncated");
    Ok(())
}
