//! CLI-specific error types
//!
//! Every error carries a stable code printed ahead of the message.

use std::io;

use thiserror::Error;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// I/O error (stdin/stdout)
    IoError,
    /// Profile already exists
    AlreadyInitialized,
    /// Profile store or profile missing
    NotInitialized,
    /// Input records rejected
    InvalidInput,
    /// XP could not be added
    GainFailed,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "FINQUEST_CLI_CONFIG_ERROR",
            Self::IoError => "FINQUEST_CLI_IO_ERROR",
            Self::AlreadyInitialized => "FINQUEST_CLI_ALREADY_INITIALIZED",
            Self::NotInitialized => "FINQUEST_CLI_NOT_INITIALIZED",
            Self::InvalidInput => "FINQUEST_CLI_INVALID_INPUT",
            Self::GainFailed => "FINQUEST_CLI_GAIN_FAILED",
        }
    }
}

/// CLI error
#[derive(Debug, Error)]
#[error("{}: {message}", code.code())]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    /// Create a new CLI error
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Config error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    /// I/O error
    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    /// Profile already exists
    pub fn already_initialized(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::AlreadyInitialized, msg)
    }

    /// Not initialized
    pub fn not_initialized(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::NotInitialized, msg)
    }

    /// Invalid input records
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::InvalidInput, msg)
    }

    /// XP could not be added
    pub fn gain_failed(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::GainFailed, msg)
    }

    /// Get the error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
