use super::{connect, load_config};
use crate::loader::VocabularyLoader;
use anyhow::Result;
use std::path::{Path, PathBuf};

#[allow(clippy::disallowed_methods)]
/// Handle the vocabulary command
pub fn handle_vocabulary(
    config_path: &Path,
    folder: Option<PathBuf>,
    schema: Option<String>,
) -> Result<()> {
    let config = load_config(config_path)?;
    let folder = folder.unwrap_or_else(|| config.vocabulary.folder.clone());
    let schema = schema.unwrap_or_else(|| config.vocabulary.schema.clone());

    println!("Loading vocabulary from {} into '{schema}'", folder.display());

    let mut manager = connect(&config)?;
    let report = VocabularyLoader::new(&mut manager).load_all(&folder, &schema)?;
    manager.close()?;

    for (table, rows) in &report.loaded {
        println!("  {table}: {rows} rows");
    }
    for file in &report.missing {
        println!("  ⚠️  {file} not found");
    }
    println!(
        "✅ Loaded {} tables ({} rows)",
        report.loaded.len(),
        report.total_rows()
    );
    Ok(())
}
