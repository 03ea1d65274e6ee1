//! `cdmloader` - OMOP Common Data Model loading
//!
//! Manages one database connection for loading data into an OMOP CDM schema:
//! connect, toggle foreign key enforcement for the session, truncate tables,
//! apply a CDM version's DDL and load vocabulary exports.
//!
//! The [`ConnectionManager`] delegates all database work to two collaborators
//! injected at construction, a [`DriverClient`] and a [`DdlClient`].
//! [`PostgresDriver`] and [`ScriptDdlClient`] are the bundled implementations.

#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    missing_docs,
    rust_2018_idioms
)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

/// Command line interface
pub mod cli;
/// Collaborator traits
pub mod client;
/// CLI command handlers
pub mod commands;
/// Configuration management for cdmloader
pub mod config;
/// CDM DDL scripts
pub mod ddl;
/// Error types
pub mod error;
/// Vocabulary loading
pub mod loader;
/// Connection lifecycle management
pub mod manager;
/// PostgreSQL driver
pub mod postgres;
/// SQL script splitting
pub mod sql;

pub use client::{DdlClient, DriverClient};
pub use config::{ConnectionConfig, Dbms, LoaderConfig};
pub use ddl::ScriptDdlClient;
pub use error::{DriverError, ManagerError};
pub use loader::{LoadReport, VocabularyLoader};
pub use manager::ConnectionManager;
pub use postgres::PostgresDriver;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(VERSION, env!("CARGO_PKG_VERSION"));
    }
}
