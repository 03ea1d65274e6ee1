use super::{connect, load_config};
use anyhow::Result;
use std::path::Path;

#[allow(clippy::disallowed_methods)]
/// Handle the check command
pub fn handle_check(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let mut manager = connect(&config)?;
    manager.close()?;

    println!(
        "✅ Connected to {} as {}",
        config.connection.server_with_database(),
        config.connection.user()
    );
    Ok(())
}
