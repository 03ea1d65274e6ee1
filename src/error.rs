use std::path::PathBuf;
use thiserror::Error;

/// Error returned by a driver or DDL collaborator.
///
/// Collaborators own their error types; the manager only needs to carry them
/// as the source of a [`ManagerError::Collaborator`].
pub type DriverError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised by [`crate::ConnectionManager`]
#[derive(Error, Debug)]
pub enum ManagerError {
    /// The driver or DDL collaborator rejected the operation
    #[error("{message}: {source}")]
    Collaborator {
        /// What the manager was doing when the collaborator failed
        message: String,
        /// The collaborator's original error
        #[source]
        source: DriverError,
    },

    /// Operation invoked in the wrong connection state
    #[error("Cannot {operation}: {reason}")]
    Precondition {
        /// The operation that was refused
        operation: &'static str,
        /// Why it was refused
        reason: &'static str,
    },

    /// Local file access failed before reaching the driver
    #[error("Failed to read '{}': {source}", .path.display())]
    Io {
        /// The file that could not be read
        path: PathBuf,
        /// IO error wrapper
        #[source]
        source: std::io::Error,
    },
}

impl ManagerError {
    pub(crate) fn collaborator(message: impl Into<String>, source: DriverError) -> Self {
        Self::Collaborator {
            message: message.into(),
            source,
        }
    }

    pub(crate) const fn not_connected(operation: &'static str) -> Self {
        Self::Precondition {
            operation,
            reason: "no database connection has been established",
        }
    }

    /// Whether this error is a connection-state violation rather than a failure
    /// reported by a collaborator
    #[must_use]
    pub const fn is_precondition(&self) -> bool {
        matches!(self, Self::Precondition { .. })
    }
}

/// Result type alias for connection manager operations
pub type Result<T> = std::result::Result<T, ManagerError>;
