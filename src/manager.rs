//! # Connection Lifecycle Manager
//!
//! [`ConnectionManager`] holds the connection parameters, the live session and
//! the connection details for one CDM database, and guards every operation on
//! the connection state:
//!
//! ```text
//! Unconnected --connect--> Connected --close/drop--> Unconnected
//! ```
//!
//! All database work is delegated to the injected [`DriverClient`] and
//! [`DdlClient`].
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use cdmloader::{ConnectionConfig, ConnectionManager, Dbms, PostgresDriver, ScriptDdlClient};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConnectionConfig::new(Dbms::Postgresql, "localhost", "postgres", "secret", "ohdsi", "");
//! let ddl = ScriptDdlClient::new(PostgresDriver::new()?, "./ddl");
//! let mut manager = ConnectionManager::new(config, PostgresDriver::new()?, ddl);
//!
//! manager.connect()?;
//! manager.execute_ddl("5.4", "cdm")?;
//! manager.disable_foreign_key_checks()?;
//! manager.empty_table("cdm", "concept")?;
//! manager.enable_foreign_key_checks()?;
//! manager.close()?;
//! # Ok(())
//! # }
//! ```

use crate::client::{DdlClient, DriverClient};
use crate::config::ConnectionConfig;
use crate::error::{ManagerError, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, error, info, info_span, warn, Span};

/// Statement suppressing foreign key and trigger enforcement for the session
pub const DISABLE_FOREIGN_KEY_CHECKS_SQL: &str = "SET session_replication_role = 'replica';";

/// Statement restoring foreign key and trigger enforcement for the session
pub const ENABLE_FOREIGN_KEY_CHECKS_SQL: &str = "SET session_replication_role = 'origin';";

/// Build the statement truncating `schema.table` and every table referencing it
#[must_use]
pub fn truncate_statement(schema: &str, table_name: &str) -> String {
    format!("TRUNCATE {schema}.{table_name} CASCADE;")
}

/// Build the statement loading a tab-delimited vocabulary export into `schema.table`
///
/// Athena exports never quote fields, so the quote character is set to a
/// backspace to keep literal `"` in concept names.
#[must_use]
pub fn copy_statement(schema: &str, table_name: &str) -> String {
    format!(
        "COPY {schema}.{table_name} FROM STDIN WITH (FORMAT csv, DELIMITER E'\\t', HEADER true, QUOTE E'\\b')"
    )
}

/// Owns one database session and the details it was opened from
pub struct ConnectionManager<D, C>
where
    D: DriverClient,
    C: DdlClient<Details = D::Details>,
{
    config: ConnectionConfig,
    driver: D,
    ddl: C,
    handle: Option<D::Handle>,
    details: Option<D::Details>,
    span: Span,
}

impl<D, C> ConnectionManager<D, C>
where
    D: DriverClient,
    C: DdlClient<Details = D::Details>,
{
    /// Create an unconnected manager
    #[must_use]
    pub fn new(config: ConnectionConfig, driver: D, ddl: C) -> Self {
        let span = info_span!(
            "connection_manager",
            dbms = %config.dbms(),
            server = %config.server(),
            database = %config.database()
        );
        Self {
            config,
            driver,
            ddl,
            handle: None,
            details: None,
            span,
        }
    }

    /// Record this manager's log events under `span` instead of the default one
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Connection parameters
    #[must_use]
    pub const fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Mutable connection parameters, used by the next [`Self::connect`]
    pub fn config_mut(&mut self) -> &mut ConnectionConfig {
        &mut self.config
    }

    /// The driver collaborator
    #[must_use]
    pub const fn driver(&self) -> &D {
        &self.driver
    }

    /// The DDL collaborator
    #[must_use]
    pub const fn ddl_client(&self) -> &C {
        &self.ddl
    }

    /// Whether a session is open
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.handle.is_some()
    }

    /// The live session, if connected
    #[must_use]
    pub const fn handle(&self) -> Option<&D::Handle> {
        self.handle.as_ref()
    }

    /// The details the live session was opened from, if connected
    #[must_use]
    pub const fn details(&self) -> Option<&D::Details> {
        self.details.as_ref()
    }

    /// Open a session to the configured database.
    ///
    /// Details and handle are stored together only when both driver calls
    /// succeed. Calling `connect` while a session is open is refused.
    pub fn connect(&mut self) -> Result<&D::Handle> {
        let span = self.span.clone();
        let _enter = span.enter();

        if self.handle.is_some() {
            return Err(ManagerError::Precondition {
                operation: "connect",
                reason: "a database connection is already open; close it first",
            });
        }

        let server = self.config.server_with_database();
        debug!(
            "Creating connection details: dbms={}, server={}, user={}",
            self.config.dbms(),
            server,
            self.config.user()
        );

        let details = self
            .driver
            .create_connection_details(
                self.config.dbms(),
                &server,
                self.config.user(),
                self.config.password(),
                self.config.driver_path(),
            )
            .map_err(|e| {
                error!("Failed to create connection details: {}", e);
                ManagerError::collaborator("Error creating database connection", e)
            })?;

        let handle = self.driver.connect(&details).map_err(|e| {
            error!("Failed to connect to {}: {}", server, e);
            ManagerError::collaborator("Error creating database connection", e)
        })?;

        info!("Database connection established successfully.");
        self.details = Some(details);
        Ok(&*self.handle.insert(handle))
    }

    /// Suppress foreign key and trigger enforcement for this session
    pub fn disable_foreign_key_checks(&mut self) -> Result<()> {
        let span = self.span.clone();
        let _enter = span.enter();

        self.execute(
            "disable foreign key checks",
            DISABLE_FOREIGN_KEY_CHECKS_SQL,
            || "Failed to disable foreign key checks".to_string(),
        )?;
        info!("Foreign key checks disabled.");
        Ok(())
    }

    /// Restore foreign key and trigger enforcement for this session
    pub fn enable_foreign_key_checks(&mut self) -> Result<()> {
        let span = self.span.clone();
        let _enter = span.enter();

        self.execute(
            "enable foreign key checks",
            ENABLE_FOREIGN_KEY_CHECKS_SQL,
            || "Failed to enable foreign key checks".to_string(),
        )?;
        info!("Foreign key checks enabled.");
        Ok(())
    }

    /// Truncate `schema.table_name` with `CASCADE`.
    ///
    /// Every table holding a foreign key to the target is truncated as well.
    pub fn empty_table(&mut self, schema: &str, table_name: &str) -> Result<()> {
        let span = self.span.clone();
        let _enter = span.enter();

        self.execute(
            "truncate table",
            &truncate_statement(schema, table_name),
            || format!("Failed to truncate table '{schema}.{table_name}'"),
        )?;
        info!("Table '{}.{}' truncated successfully.", schema, table_name);
        Ok(())
    }

    /// Apply the CDM DDL for `cdm_version` to `cdm_database_schema`
    pub fn execute_ddl(&mut self, cdm_version: &str, cdm_database_schema: &str) -> Result<()> {
        let span = self.span.clone();
        let _enter = span.enter();

        let details = self
            .details
            .as_ref()
            .ok_or_else(|| ManagerError::not_connected("execute CDM DDL"))?;

        info!(
            "Executing CDM {} DDL in schema '{}'",
            cdm_version, cdm_database_schema
        );
        self.ddl
            .execute_ddl(details, cdm_version, cdm_database_schema)
            .map_err(|e| {
                error!("CDM DDL execution failed: {}", e);
                ManagerError::collaborator("Error executing CDM DDL", e)
            })?;
        info!("CDM DDL execution completed.");
        Ok(())
    }

    /// Stream a tab-delimited file with a header row into `schema.table_name`,
    /// returning the number of rows copied
    pub fn copy_from_file(
        &mut self,
        schema: &str,
        table_name: &str,
        path: impl AsRef<Path>,
    ) -> Result<u64> {
        let span = self.span.clone();
        let _enter = span.enter();
        let path = path.as_ref();

        let handle = self
            .handle
            .as_mut()
            .ok_or_else(|| ManagerError::not_connected("copy file into table"))?;

        let file = File::open(path).map_err(|source| ManagerError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut reader = BufReader::new(file);

        debug!("Copying '{}' into {}.{}", path.display(), schema, table_name);
        let rows = self
            .driver
            .copy_in(handle, &copy_statement(schema, table_name), &mut reader)
            .map_err(|e| {
                error!("Copy into {}.{} failed: {}", schema, table_name, e);
                ManagerError::collaborator(
                    format!(
                        "Failed to load '{}' into '{schema}.{table_name}'",
                        path.display()
                    ),
                    e,
                )
            })?;

        info!("Copied {} rows into '{}.{}'.", rows, schema, table_name);
        Ok(rows)
    }

    /// Close the session and forget its details. Does nothing when unconnected.
    pub fn close(&mut self) -> Result<()> {
        let span = self.span.clone();
        let _enter = span.enter();

        let Some(handle) = self.handle.take() else {
            return Ok(());
        };
        self.details = None;

        self.driver.disconnect(handle).map_err(|e| {
            error!("Failed to close database connection: {}", e);
            ManagerError::collaborator("Error closing database connection", e)
        })?;
        info!("Database connection closed.");
        Ok(())
    }

    fn execute(
        &mut self,
        operation: &'static str,
        sql: &str,
        failure: impl FnOnce() -> String,
    ) -> Result<()> {
        let handle = self
            .handle
            .as_mut()
            .ok_or_else(|| ManagerError::not_connected(operation))?;

        debug!("Executing SQL: {}", sql);
        self.driver.execute_sql(handle, sql).map_err(|e| {
            let message = failure();
            error!("{}: {}", message, e);
            ManagerError::collaborator(message, e)
        })
    }
}

impl<D, C> Drop for ConnectionManager<D, C>
where
    D: DriverClient,
    C: DdlClient<Details = D::Details>,
{
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _enter = self.span.enter();
            match self.driver.disconnect(handle) {
                Ok(()) => debug!("Database connection released on drop"),
                Err(e) => warn!("Failed to release database connection on drop: {}", e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_statement_shape() {
        assert_eq!(
            truncate_statement("cdm", "drug_exposure"),
            "TRUNCATE cdm.drug_exposure CASCADE;"
        );
    }

    #[test]
    fn test_copy_statement_targets_qualified_table() {
        let sql = copy_statement("vocab", "concept");
        assert!(sql.starts_with("COPY vocab.concept FROM STDIN"));
        assert!(sql.contains("DELIMITER E'\\t'"));
        assert!(sql.contains("HEADER true"));
    }
}
