//! Connection parameters and the TOML configuration file
//!
//! ```toml
//! [connection]
//! dbms = "postgresql"
//! server = "localhost"
//! user = "postgres"
//! password_env = "CDM_PASSWORD"
//! database = "ohdsi"
//! driver_path = ""
//!
//! [cdm]
//! version = "5.4"
//! schema = "cdm"
//! ddl_dir = "./ddl"
//!
//! [vocabulary]
//! folder = "./vocabulary"
//! schema = "cdm"
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error occurred while reading config file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error occurred
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Unknown database management system name
    #[error("Unsupported dbms '{0}', expected one of: postgresql, redshift, sql server")]
    UnknownDbms(String),
}

/// Database management system kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub enum Dbms {
    /// PostgreSQL
    Postgresql,
    /// Amazon Redshift
    Redshift,
    /// Microsoft SQL Server
    SqlServer,
}

impl Dbms {
    /// Name as understood by database drivers
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Postgresql => "postgresql",
            Self::Redshift => "redshift",
            Self::SqlServer => "sql server",
        }
    }
}

impl fmt::Display for Dbms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dbms {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgresql" | "postgres" => Ok(Self::Postgresql),
            "redshift" => Ok(Self::Redshift),
            "sql server" | "sqlserver" | "sql_server" => Ok(Self::SqlServer),
            _ => Err(ConfigError::UnknownDbms(s.to_string())),
        }
    }
}

impl TryFrom<String> for Dbms {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Dbms> for String {
    fn from(dbms: Dbms) -> Self {
        dbms.as_str().to_string()
    }
}

/// Parameters used to reach the CDM database
#[derive(Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ConnectionConfig {
    dbms: Dbms,
    server: String,
    user: String,
    #[serde(default, skip_serializing)]
    password: String,
    /// Environment variable containing the password
    #[serde(default, skip_serializing_if = "Option::is_none")]
    password_env: Option<String>,
    database: String,
    #[serde(default)]
    driver_path: String,
}

impl ConnectionConfig {
    /// Create connection parameters from their parts
    #[must_use]
    pub fn new(
        dbms: Dbms,
        server: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
        driver_path: impl Into<String>,
    ) -> Self {
        Self {
            dbms,
            server: server.into(),
            user: user.into(),
            password: password.into(),
            password_env: None,
            database: database.into(),
            driver_path: driver_path.into(),
        }
    }

    /// Get the database management system type
    #[must_use]
    pub const fn dbms(&self) -> Dbms {
        self.dbms
    }

    /// Set the database management system type
    pub fn set_dbms(&mut self, dbms: Dbms) {
        self.dbms = dbms;
    }

    /// Get the server address
    #[must_use]
    pub fn server(&self) -> &str {
        &self.server
    }

    /// Set the server address
    pub fn set_server(&mut self, server: impl Into<String>) {
        self.server = server.into();
    }

    /// Get the user name
    #[must_use]
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Set the user name
    pub fn set_user(&mut self, user: impl Into<String>) {
        self.user = user.into();
    }

    /// Get the password
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Set the password
    pub fn set_password(&mut self, password: impl Into<String>) {
        self.password = password.into();
    }

    /// Get the database name
    #[must_use]
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Set the database name
    pub fn set_database(&mut self, database: impl Into<String>) {
        self.database = database.into();
    }

    /// Get the path to the database driver
    #[must_use]
    pub fn driver_path(&self) -> &str {
        &self.driver_path
    }

    /// Set the path to the database driver
    pub fn set_driver_path(&mut self, driver_path: impl Into<String>) {
        self.driver_path = driver_path.into();
    }

    /// Get the environment variable the password is read from
    #[must_use]
    pub fn password_env(&self) -> Option<&str> {
        self.password_env.as_deref()
    }

    /// Set the environment variable the password is read from when loading
    /// a configuration file
    pub fn set_password_env(&mut self, password_env: Option<String>) {
        self.password_env = password_env;
    }

    /// Server string handed to drivers: `{server}/{database}`
    #[must_use]
    pub fn server_with_database(&self) -> String {
        format!("{}/{}", self.server, self.database)
    }

    /// Replace the password with the value of `password_env`, when set
    fn resolve_password(&mut self) {
        let Some(password_env) = self.password_env.as_deref() else {
            return;
        };
        debug!(
            "Reading password from environment variable: {}",
            password_env
        );
        match env::var(password_env) {
            Ok(password) => self.password = password,
            Err(_) => warn!(
                "Environment variable {} not found, keeping configured password",
                password_env
            ),
        }
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("dbms", &self.dbms)
            .field("server", &self.server)
            .field("user", &self.user)
            .field("password", &"***")
            .field("database", &self.database)
            .field("driver_path", &self.driver_path)
            .finish()
    }
}

/// CDM schema settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CdmConfig {
    /// CDM version, e.g. "5.4"
    #[serde(default = "default_cdm_version")]
    pub version: String,
    /// Target schema for the CDM tables
    #[serde(default = "default_schema")]
    pub schema: String,
    /// Directory holding the versioned DDL scripts
    #[serde(default = "default_ddl_dir")]
    pub ddl_dir: PathBuf,
}

impl Default for CdmConfig {
    fn default() -> Self {
        Self {
            version: default_cdm_version(),
            schema: default_schema(),
            ddl_dir: default_ddl_dir(),
        }
    }
}

/// Vocabulary export settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VocabularyConfig {
    /// Folder containing the Athena vocabulary files
    #[serde(default = "default_vocabulary_folder")]
    pub folder: PathBuf,
    /// Schema holding the vocabulary tables
    #[serde(default = "default_schema")]
    pub schema: String,
}

impl Default for VocabularyConfig {
    fn default() -> Self {
        Self {
            folder: default_vocabulary_folder(),
            schema: default_schema(),
        }
    }
}

fn default_cdm_version() -> String {
    "5.4".to_string()
}

fn default_schema() -> String {
    "cdm".to_string()
}

fn default_ddl_dir() -> PathBuf {
    PathBuf::from("ddl")
}

fn default_vocabulary_folder() -> PathBuf {
    PathBuf::from("vocabulary")
}

/// Main configuration structure for cdmloader
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoaderConfig {
    /// Database connection parameters
    pub connection: ConnectionConfig,
    /// CDM DDL settings
    #[serde(default)]
    pub cdm: CdmConfig,
    /// Vocabulary loading settings
    #[serde(default)]
    pub vocabulary: VocabularyConfig,
}

impl LoaderConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        contents.parse()
    }
}

impl FromStr for LoaderConfig {
    type Err = ConfigError;

    fn from_str(contents: &str) -> Result<Self, Self::Err> {
        let mut config: Self = toml::from_str(contents)?;
        config.connection.resolve_password();
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dbms_parsing() {
        assert_eq!("postgresql".parse::<Dbms>().unwrap(), Dbms::Postgresql);
        assert_eq!("PostgreSQL".parse::<Dbms>().unwrap(), Dbms::Postgresql);
        assert_eq!("redshift".parse::<Dbms>().unwrap(), Dbms::Redshift);
        assert_eq!("sql server".parse::<Dbms>().unwrap(), Dbms::SqlServer);
        assert!("oracle".parse::<Dbms>().is_err());
    }

    #[test]
    fn test_server_with_database_uses_literal_slash() {
        let config =
            ConnectionConfig::new(Dbms::Postgresql, "localhost", "u", "p", "ohdsi", "");
        assert_eq!(config.server_with_database(), "localhost/ohdsi");
    }

    #[test]
    fn test_setters_replace_fields() {
        let mut config = ConnectionConfig::new(Dbms::Postgresql, "a", "b", "c", "d", "e");
        config.set_dbms(Dbms::Redshift);
        config.set_server("host");
        config.set_user("user");
        config.set_password("secret");
        config.set_database("db");
        config.set_driver_path("/drivers");

        assert_eq!(config.dbms(), Dbms::Redshift);
        assert_eq!(config.server(), "host");
        assert_eq!(config.user(), "user");
        assert_eq!(config.password(), "secret");
        assert_eq!(config.database(), "db");
        assert_eq!(config.driver_path(), "/drivers");
    }

    #[test]
    fn test_debug_hides_password() {
        let config = ConnectionConfig::new(Dbms::Postgresql, "h", "u", "hunter2", "d", "");
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("***"));
    }

    #[test]
    fn test_sections_default_when_missing() {
        let config: LoaderConfig = r#"
[connection]
dbms = "postgresql"
server = "localhost"
user = "postgres"
password = "pw"
database = "ohdsi"
"#
        .parse()
        .unwrap();

        assert_eq!(config.connection.password(), "pw");
        assert_eq!(config.connection.driver_path(), "");
        assert_eq!(config.cdm.version, "5.4");
        assert_eq!(config.cdm.schema, "cdm");
        assert_eq!(config.vocabulary.folder, PathBuf::from("vocabulary"));
    }

    #[test]
    fn test_unknown_dbms_is_rejected() {
        let result: Result<LoaderConfig, _> = r#"
[connection]
dbms = "oracle"
server = "localhost"
user = "postgres"
database = "ohdsi"
"#
        .parse();
        assert!(result.is_err());
    }
}
