//! # PostgreSQL Driver
//!
//! Blocking [`DriverClient`] over `tokio-postgres`. The driver owns a
//! current-thread tokio runtime and blocks on every call; each session's
//! connection task is spawned onto that runtime and makes progress whenever
//! the driver is blocking on one of its calls.
//!
//! Redshift speaks the PostgreSQL wire protocol and is accepted as well.

use crate::client::DriverClient;
use crate::config::Dbms;
use crate::error::DriverError;
use bytes::Bytes;
use futures::{pin_mut, SinkExt};
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::runtime::{Builder, Runtime};
use tokio::task::JoinHandle;
use tokio_postgres::{Client, CopyInSink, NoTls};
use tracing::{debug, info};

/// Default PostgreSQL port
pub const POSTGRES_PORT: u16 = 5432;

/// Default Redshift port
pub const REDSHIFT_PORT: u16 = 5439;

const COPY_CHUNK_SIZE: usize = 64 * 1024;

/// PostgreSQL driver errors
#[derive(Debug, Error)]
pub enum PostgresError {
    /// The dbms cannot be reached with the PostgreSQL protocol
    #[error("Unsupported dbms for the PostgreSQL driver: {0}")]
    UnsupportedDbms(Dbms),

    /// The server string could not be parsed
    #[error("Invalid server string '{0}', expected host[:port]/database")]
    InvalidServer(String),

    /// A driver path was given but does not exist
    #[error("Driver path does not exist: {}", .0.display())]
    DriverPathNotFound(PathBuf),

    /// Error reported by the server or the protocol layer
    #[error("Database error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// IO error wrapper
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The background connection task panicked or was cancelled
    #[error("Connection task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Where and as whom to connect
#[derive(Clone, PartialEq, Eq)]
pub struct PgConnectionDetails {
    dbms: Dbms,
    host: String,
    port: u16,
    database: String,
    user: String,
    password: String,
}

impl PgConnectionDetails {
    /// Database management system these details were created for
    #[must_use]
    pub const fn dbms(&self) -> Dbms {
        self.dbms
    }

    /// Server host
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Server port
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Target database
    #[must_use]
    pub fn database(&self) -> &str {
        &self.database
    }

    /// User name
    #[must_use]
    pub fn user(&self) -> &str {
        &self.user
    }

    fn pg_config(&self) -> tokio_postgres::Config {
        let mut config = tokio_postgres::Config::new();
        config
            .host(&self.host)
            .port(self.port)
            .dbname(&self.database)
            .user(&self.user)
            .application_name("cdmloader");
        if !self.password.is_empty() {
            config.password(&self.password);
        }
        config
    }
}

impl fmt::Debug for PgConnectionDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgConnectionDetails")
            .field("dbms", &self.dbms)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

/// Live PostgreSQL session
pub struct PgSession {
    client: Client,
    connection: JoinHandle<Result<(), tokio_postgres::Error>>,
}

impl fmt::Debug for PgSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgSession")
            .field("closed", &self.client.is_closed())
            .finish_non_exhaustive()
    }
}

/// Blocking PostgreSQL driver
pub struct PostgresDriver {
    runtime: Runtime,
}

impl PostgresDriver {
    /// Create a driver with its own single-threaded runtime
    pub fn new() -> Result<Self, PostgresError> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        Ok(Self { runtime })
    }
}

impl fmt::Debug for PostgresDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresDriver").finish_non_exhaustive()
    }
}

/// Split `host[:port]/database` into its parts
pub fn parse_server(server: &str, default_port: u16) -> Result<(String, u16, String), PostgresError> {
    let invalid = || PostgresError::InvalidServer(server.to_string());

    let (address, database) = server.split_once('/').ok_or_else(invalid)?;
    let (host, port) = match address.rsplit_once(':') {
        Some((host, port)) => (host, port.parse::<u16>().map_err(|_| invalid())?),
        None => (address, default_port),
    };

    if host.trim().is_empty() || database.trim().is_empty() {
        return Err(invalid());
    }
    Ok((host.to_string(), port, database.to_string()))
}

impl DriverClient for PostgresDriver {
    type Details = PgConnectionDetails;
    type Handle = PgSession;

    fn create_connection_details(
        &self,
        dbms: Dbms,
        server: &str,
        user: &str,
        password: &str,
        path_to_driver: &str,
    ) -> Result<Self::Details, DriverError> {
        let default_port = match dbms {
            Dbms::Postgresql => POSTGRES_PORT,
            Dbms::Redshift => REDSHIFT_PORT,
            Dbms::SqlServer => return Err(PostgresError::UnsupportedDbms(dbms).into()),
        };

        // the native protocol needs no driver artifact, but a configured one must exist
        if !path_to_driver.is_empty() && !Path::new(path_to_driver).exists() {
            return Err(PostgresError::DriverPathNotFound(PathBuf::from(path_to_driver)).into());
        }

        let (host, port, database) = parse_server(server, default_port)?;
        debug!(
            "Connection details: host={}:{}, database={}, user={}",
            host, port, database, user
        );
        Ok(PgConnectionDetails {
            dbms,
            host,
            port,
            database,
            user: user.to_string(),
            password: password.to_string(),
        })
    }

    fn connect(&self, details: &Self::Details) -> Result<Self::Handle, DriverError> {
        let config = details.pg_config();
        let session = self.runtime.block_on(async {
            let (client, connection) = config.connect(NoTls).await?;
            let connection = tokio::spawn(connection);
            Ok::<_, PostgresError>(PgSession { client, connection })
        })?;
        info!(
            "Connected to {}:{}/{}",
            details.host, details.port, details.database
        );
        Ok(session)
    }

    fn execute_sql(&self, handle: &mut Self::Handle, sql: &str) -> Result<(), DriverError> {
        self.runtime
            .block_on(handle.client.batch_execute(sql))
            .map_err(PostgresError::from)?;
        Ok(())
    }

    fn copy_in(
        &self,
        handle: &mut Self::Handle,
        statement: &str,
        data: &mut dyn Read,
    ) -> Result<u64, DriverError> {
        let rows = self.runtime.block_on(async {
            let sink: CopyInSink<Bytes> = handle.client.copy_in(statement).await?;
            pin_mut!(sink);

            let mut buffer = vec![0_u8; COPY_CHUNK_SIZE];
            loop {
                let read = data.read(&mut buffer)?;
                if read == 0 {
                    break;
                }
                sink.send(Bytes::copy_from_slice(&buffer[..read])).await?;
            }
            let rows = sink.finish().await?;
            Ok::<_, PostgresError>(rows)
        })?;
        Ok(rows)
    }

    fn disconnect(&self, handle: Self::Handle) -> Result<(), DriverError> {
        let PgSession { client, connection } = handle;
        // dropping the client ends the connection task
        drop(client);
        self.runtime
            .block_on(connection)
            .map_err(PostgresError::from)?
            .map_err(PostgresError::from)?;
        debug!("PostgreSQL session closed");
        Ok(())
    }
}
