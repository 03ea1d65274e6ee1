//! Collaborator interfaces used by [`crate::ConnectionManager`]
//!
//! The manager never talks to a database itself. Every operation is delegated
//! to a [`DriverClient`], which owns sessions and SQL execution, or to a
//! [`DdlClient`], which applies a CDM version's schema definition given the
//! connection details.

use crate::config::Dbms;
use crate::error::DriverError;
use std::io::Read;

/// Database driver: builds connection details, opens sessions and runs SQL
pub trait DriverClient {
    /// Reusable descriptor from which sessions are opened
    type Details;
    /// Live session
    type Handle;

    /// Build a connection descriptor.
    ///
    /// `server` carries the target database as `{server}/{database}`.
    fn create_connection_details(
        &self,
        dbms: Dbms,
        server: &str,
        user: &str,
        password: &str,
        path_to_driver: &str,
    ) -> Result<Self::Details, DriverError>;

    /// Open a session from connection details
    fn connect(&self, details: &Self::Details) -> Result<Self::Handle, DriverError>;

    /// Execute one or more SQL statements on a session
    fn execute_sql(&self, handle: &mut Self::Handle, sql: &str) -> Result<(), DriverError>;

    /// Stream `data` into a `COPY ... FROM STDIN` statement, returning the row count
    fn copy_in(
        &self,
        handle: &mut Self::Handle,
        statement: &str,
        data: &mut dyn Read,
    ) -> Result<u64, DriverError>;

    /// Close a session
    fn disconnect(&self, handle: Self::Handle) -> Result<(), DriverError>;
}

/// CDM schema generator
pub trait DdlClient {
    /// Connection descriptor this client opens its own sessions from
    type Details;

    /// Create every table, key, constraint and index of `cdm_version` in
    /// `cdm_database_schema`
    fn execute_ddl(
        &self,
        details: &Self::Details,
        cdm_version: &str,
        cdm_database_schema: &str,
    ) -> Result<(), DriverError>;
}
