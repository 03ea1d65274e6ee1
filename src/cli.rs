use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Main CLI interface for `cdmloader`
#[derive(Parser)]
#[command(name = "cdmloader")]
#[command(version = crate::VERSION)]
#[command(about = "cdmloader - OMOP CDM schema and vocabulary loader")]
#[command(
    long_about = "Create OMOP Common Data Model schemas and load vocabulary exports into PostgreSQL"
)]
pub struct Cli {
    /// Configuration file
    #[arg(long, short, global = true, value_name = "FILE", default_value = "cdmloader.toml")]
    pub config: PathBuf,

    /// The command to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Write a starter configuration file
    Init {
        /// Database host
        #[arg(long, value_name = "HOST", default_value = "localhost")]
        server: String,
        /// Database name
        #[arg(long, value_name = "NAME")]
        database: String,
        /// Database user
        #[arg(long, value_name = "USER", default_value = "postgres")]
        user: String,
    },
    /// Connect and disconnect to verify the configuration
    Check,
    /// Create the CDM tables, keys, constraints and indices
    Ddl {
        /// CDM version, overrides the configured one
        #[arg(long, value_name = "VERSION")]
        cdm_version: Option<String>,
        /// Target schema, overrides the configured one
        #[arg(long, value_name = "SCHEMA")]
        schema: Option<String>,
    },
    /// Load the vocabulary export files
    Vocabulary {
        /// Folder holding the export files, overrides the configured one
        #[arg(long, value_name = "DIR")]
        folder: Option<PathBuf>,
        /// Target schema, overrides the configured one
        #[arg(long, value_name = "SCHEMA")]
        schema: Option<String>,
    },
    /// Truncate one table and everything referencing it
    Truncate {
        /// Schema holding the table
        #[arg(long, value_name = "SCHEMA")]
        schema: String,
        /// Table to truncate
        #[arg(long, value_name = "TABLE")]
        table: String,
    },
}

impl Cli {
    /// Parse command line arguments
    #[must_use]
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}
