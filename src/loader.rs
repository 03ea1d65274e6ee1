//! Vocabulary loading
//!
//! Loads the tab-delimited vocabulary export (the `*.csv` files produced by
//! Athena) into the CDM vocabulary tables. Tables are loaded in dependency
//! order; each load runs with foreign key checks suppressed for the session
//! and replaces the table's previous content.

use crate::client::{DdlClient, DriverClient};
use crate::error::ManagerError;
use crate::manager::ConnectionManager;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Vocabulary tables in load order
pub const VOCABULARY_TABLES: &[&str] = &[
    "vocabulary",
    "domain",
    "concept_class",
    "concept",
    "relationship",
    "concept_relationship",
    "concept_ancestor",
    "concept_synonym",
    "drug_strength",
];

/// Export file name for a vocabulary table (`concept` -> `CONCEPT.csv`)
#[must_use]
pub fn vocabulary_file_name(table: &str) -> String {
    format!("{}.csv", table.to_ascii_uppercase())
}

/// Vocabulary loading errors
#[derive(Debug, Error)]
pub enum LoadError {
    /// Loading one file into its table failed
    #[error("Failed to load '{file}' into '{table}': {source}")]
    Table {
        /// Export file name
        file: String,
        /// Target table
        table: String,
        /// What went wrong
        #[source]
        source: ManagerError,
    },

    /// The export folder does not exist
    #[error("Vocabulary folder does not exist: {}", .0.display())]
    FolderNotFound(PathBuf),
}

/// Outcome of loading a vocabulary folder
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LoadReport {
    /// Loaded tables with their row counts, in load order
    pub loaded: Vec<(String, u64)>,
    /// Export files that were not found
    pub missing: Vec<String>,
}

impl LoadReport {
    /// Total number of rows loaded
    #[must_use]
    pub fn total_rows(&self) -> u64 {
        self.loaded.iter().map(|(_, rows)| rows).sum()
    }
}

/// Loads vocabulary exports through a connected [`ConnectionManager`]
pub struct VocabularyLoader<'a, D, C>
where
    D: DriverClient,
    C: DdlClient<Details = D::Details>,
{
    manager: &'a mut ConnectionManager<D, C>,
}

impl<'a, D, C> VocabularyLoader<'a, D, C>
where
    D: DriverClient,
    C: DdlClient<Details = D::Details>,
{
    /// Create a loader using `manager`'s session
    pub fn new(manager: &'a mut ConnectionManager<D, C>) -> Self {
        Self { manager }
    }

    /// Replace the content of `schema.table` with the rows in `file`
    pub fn load_table(&mut self, file: &Path, table: &str, schema: &str) -> Result<u64, LoadError> {
        let wrap = |source| LoadError::Table {
            file: file.display().to_string(),
            table: table.to_string(),
            source,
        };

        self.manager.disable_foreign_key_checks().map_err(wrap)?;
        self.manager.empty_table(schema, table).map_err(wrap)?;
        let rows = self
            .manager
            .copy_from_file(schema, table, file)
            .map_err(wrap)?;
        self.manager.enable_foreign_key_checks().map_err(wrap)?;

        info!("Loaded data into table '{}.{}'.", schema, table);
        Ok(rows)
    }

    /// Load every vocabulary export found in `folder` into `schema`.
    ///
    /// Missing files are skipped and reported; the first failing table stops
    /// the load.
    pub fn load_all(&mut self, folder: &Path, schema: &str) -> Result<LoadReport, LoadError> {
        if !folder.is_dir() {
            return Err(LoadError::FolderNotFound(folder.to_path_buf()));
        }

        let mut report = LoadReport::default();
        for table in VOCABULARY_TABLES {
            let file_name = vocabulary_file_name(table);
            let path = folder.join(&file_name);
            if !path.exists() {
                warn!(
                    "File '{}' not found in folder '{}'.",
                    file_name,
                    folder.display()
                );
                report.missing.push(file_name);
                continue;
            }

            let rows = self.load_table(&path, table, schema)?;
            report.loaded.push(((*table).to_string(), rows));
        }

        if !report.missing.is_empty() {
            warn!("Missing files: {:?}", report.missing);
        }
        info!(
            "All vocabulary files have been processed ({} rows).",
            report.total_rows()
        );
        Ok(report)
    }
}
