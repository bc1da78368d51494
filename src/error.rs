//! Errors reported by the non-real-time setup path.
//!
//! The RT path never returns errors: bad levels fall back to `info`, overflow
//! drops. Only logger initialization and global-logger lookup can fail, and
//! they report it once, synchronously, to the caller that set things up.

use std::io;

use thiserror::Error;

/// Why a backend logger could not be started.
#[derive(Debug, Error)]
pub enum StartFailure {
    #[error("a logger with this name is already registered")]
    DuplicateName,

    #[error("could not open log file: {0}")]
    Io(#[from] io::Error),

    #[error("could not spawn worker thread: {0}")]
    Thread(#[source] io::Error),
}

/// Logger setup error.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("Invalid log level '{0}'")]
    InvalidLogLevel(String),

    #[error("Failed to start logger '{name}': {reason}")]
    FailedToStartLogger {
        name: String,
        #[source]
        reason: StartFailure,
    },

    #[error("Logger is not initialized")]
    LoggerNotInitialized,
}

impl LogError {
    pub(crate) fn start_failed(name: &str, reason: impl Into<StartFailure>) -> Self {
        LogError::FailedToStartLogger {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    /// Stable status name, for logs and FFI-style status reporting.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidLogLevel(_) => "INVALID_LOG_LEVEL",
            Self::FailedToStartLogger { .. } => "FAILED_TO_START_LOGGER",
            Self::LoggerNotInitialized => "LOGGER_NOT_INITIALIZED",
        }
    }

    /// Short human-readable description, without the details.
    pub fn message(&self) -> &'static str {
        match self {
            Self::InvalidLogLevel(_) => "Invalid log level",
            Self::FailedToStartLogger { .. } => "Failed to initialize logger instance",
            Self::LoggerNotInitialized => "Logger is not initialized",
        }
    }
}
