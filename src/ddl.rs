//! CDM DDL application from versioned script directories
//!
//! Scripts follow the layout published with the OHDSI CommonDataModel
//! project, one directory per CDM version:
//!
//! ```text
//! ddl/
//!   5.4/
//!     OMOPCDM_postgresql_5.4_ddl.sql
//!     OMOPCDM_postgresql_5.4_primary_keys.sql
//!     OMOPCDM_postgresql_5.4_constraints.sql
//!     OMOPCDM_postgresql_5.4_indices.sql
//! ```
//!
//! Only the table script is required. The client opens its own session from
//! the connection details it is given and closes it again when done.

use crate::client::{DdlClient, DriverClient};
use crate::error::DriverError;
use crate::sql::{render_script, split_statements};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// CDM versions with published DDL
pub const SUPPORTED_CDM_VERSIONS: &[&str] = &["5.3", "5.4"];

/// DDL application errors
#[derive(Debug, Error)]
pub enum DdlError {
    /// No DDL is published for this version
    #[error("Unsupported CDM version '{0}', supported versions: 5.3, 5.4")]
    UnsupportedVersion(String),

    /// The target schema name is empty
    #[error("CDM database schema must not be empty")]
    EmptySchema,

    /// The required table script is missing
    #[error("DDL script not found: {}", .0.display())]
    ScriptNotFound(PathBuf),

    /// A script could not be read
    #[error("Failed to read DDL script {}: {source}", .path.display())]
    Read {
        /// Script path
        path: PathBuf,
        /// IO error wrapper
        #[source]
        source: std::io::Error,
    },

    /// A statement was rejected by the database
    #[error("Statement {index} of {} failed: {source}", .script.display())]
    Statement {
        /// Script the statement came from
        script: PathBuf,
        /// One-based position of the statement in its script
        index: usize,
        /// The driver's error
        #[source]
        source: DriverError,
    },
}

/// The scripts making up one CDM version's DDL, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DdlPart {
    /// Tables
    Tables,
    /// Primary keys
    PrimaryKeys,
    /// Foreign key constraints
    Constraints,
    /// Indices
    Indices,
}

impl DdlPart {
    /// All parts in execution order
    pub const ALL: [Self; 4] = [
        Self::Tables,
        Self::PrimaryKeys,
        Self::Constraints,
        Self::Indices,
    ];

    const fn suffix(self) -> &'static str {
        match self {
            Self::Tables => "ddl",
            Self::PrimaryKeys => "primary_keys",
            Self::Constraints => "constraints",
            Self::Indices => "indices",
        }
    }

    /// Script file name for `version`
    #[must_use]
    pub fn file_name(self, version: &str) -> String {
        format!("OMOPCDM_postgresql_{version}_{}.sql", self.suffix())
    }
}

/// Normalize a version identifier (`v5.4` and `5.4` are the same) and check
/// that DDL exists for it
pub fn normalize_version(cdm_version: &str) -> Result<&str, DdlError> {
    let trimmed = cdm_version.trim();
    let version = trimmed
        .strip_prefix('v')
        .or_else(|| trimmed.strip_prefix('V'))
        .unwrap_or(trimmed);
    if SUPPORTED_CDM_VERSIONS.contains(&version) {
        Ok(version)
    } else {
        Err(DdlError::UnsupportedVersion(cdm_version.to_string()))
    }
}

/// Applies the CDM DDL scripts found under a directory
#[derive(Debug)]
pub struct ScriptDdlClient<D> {
    driver: D,
    script_dir: PathBuf,
}

impl<D: DriverClient> ScriptDdlClient<D> {
    /// Create a client executing scripts from `script_dir` through `driver`
    pub fn new(driver: D, script_dir: impl Into<PathBuf>) -> Self {
        Self {
            driver,
            script_dir: script_dir.into(),
        }
    }

    /// Directory scripts are read from
    #[must_use]
    pub fn script_dir(&self) -> &Path {
        &self.script_dir
    }

    /// Read and render the scripts for `cdm_version`, returning each script
    /// path with its statements
    pub fn plan(
        &self,
        cdm_version: &str,
        cdm_database_schema: &str,
    ) -> Result<Vec<(PathBuf, Vec<String>)>, DdlError> {
        let version = normalize_version(cdm_version)?;
        if cdm_database_schema.trim().is_empty() {
            return Err(DdlError::EmptySchema);
        }

        let version_dir = self.script_dir.join(version);
        let mut plan = Vec::new();
        for part in DdlPart::ALL {
            let path = version_dir.join(part.file_name(version));
            if !path.exists() {
                if part == DdlPart::Tables {
                    return Err(DdlError::ScriptNotFound(path));
                }
                debug!("Skipping missing DDL script {}", path.display());
                continue;
            }

            let script = fs::read_to_string(&path).map_err(|source| DdlError::Read {
                path: path.clone(),
                source,
            })?;
            let statements = split_statements(&render_script(&script, cdm_database_schema));
            debug!(
                "Parsed {} statements from {}",
                statements.len(),
                path.display()
            );
            plan.push((path, statements));
        }
        Ok(plan)
    }
}

impl<D: DriverClient> DdlClient for ScriptDdlClient<D> {
    type Details = D::Details;

    fn execute_ddl(
        &self,
        details: &Self::Details,
        cdm_version: &str,
        cdm_database_schema: &str,
    ) -> Result<(), DriverError> {
        let plan = self.plan(cdm_version, cdm_database_schema)?;

        let mut session = self.driver.connect(details)?;
        let mut outcome = Ok(());
        'scripts: for (script, statements) in &plan {
            info!(
                "Executing {} ({} statements)",
                script.display(),
                statements.len()
            );
            for (index, statement) in statements.iter().enumerate() {
                if let Err(source) = self.driver.execute_sql(&mut session, statement) {
                    outcome = Err(DdlError::Statement {
                        script: script.clone(),
                        index: index + 1,
                        source,
                    });
                    break 'scripts;
                }
            }
        }

        if let Err(e) = self.driver.disconnect(session) {
            warn!("Failed to close DDL session: {}", e);
        }
        Ok(outcome?)
    }
}
