//! Error handling module for the installer
//!
//! Provides centralized error handling with proper error types using thiserror.
//! Every stage returns these errors up to `main`, which is the only place that
//! decides to terminate the process.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the installer
#[derive(Error, Debug)]
pub enum InstallerError {
    /// An external tool exited with a non-zero status (or was killed by a signal)
    #[error("Error executing: {command} (exit status: {})", .code.map_or_else(|| "signal".to_string(), |c| c.to_string()))]
    CommandFailed { command: String, code: Option<i32> },

    /// An external tool could not be launched at all
    #[error("Error executing: {command} ({source})")]
    CommandSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Reading a system configuration file failed
    #[error("Error reading {}: {source}", .path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing a system configuration file failed
    #[error("Error writing {}: {source}", .path.display())]
    ConfigWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Creating a mount-point directory failed
    #[error("Error creating directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The operator used up every attempt for a validated field
    #[error("Maximum invalid attempts reached for {field}! Exiting.")]
    RetriesExhausted { field: String },

    /// Validation errors (disk path, mapping name, plan consistency)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration file errors (loading, parsing, validation)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Terminal prompt failures (stdin closed, not a terminal)
    #[error("Prompt error: {0}")]
    Prompt(dialoguer::Error),

    /// The operator pressed Ctrl+C
    #[error("Interrupted by user")]
    Interrupted,

    /// Install state machine transition errors
    #[error("Install transition error: {0}")]
    InstallTransition(String),

    /// Pre-flight environment check failures
    #[error("Pre-flight check failed: {0}")]
    Preflight(String),

    /// The operator declined the destructive confirmation
    #[error("Operation canceled: {} was left untouched", .disk.display())]
    Cancelled { disk: PathBuf },
}

/// Result type alias for installer operations
pub type Result<T> = std::result::Result<T, InstallerError>;

impl InstallerError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a pre-flight error
    pub fn preflight(msg: impl Into<String>) -> Self {
        Self::Preflight(msg.into())
    }

    /// Process exit code reported for this error.
    ///
    /// Operator interrupt is a voluntary exit with 0; every other failure is
    /// fatal with status 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Interrupted => 0,
            _ => 1,
        }
    }

    pub fn is_interrupt(&self) -> bool {
        matches!(self, Self::Interrupted)
    }
}

impl From<dialoguer::Error> for InstallerError {
    fn from(err: dialoguer::Error) -> Self {
        match err {
            // console raises SIGINT and hands back EINTR when Ctrl+C hits a prompt
            dialoguer::Error::IO(ref e) if e.kind() == std::io::ErrorKind::Interrupted => {
                Self::Interrupted
            }
            other => Self::Prompt(other),
        }
    }
}

impl From<anyhow::Error> for InstallerError {
    fn from(err: anyhow::Error) -> Self {
        // `{:#}` keeps the whole context chain on one line
        Self::Config(format!("{:#}", err))
    }
}
