//! Error types for the harness
//!
//! Harness errors abort the running scenario and are reported as a failed
//! verdict. Messages carry enough context (command text, expected rule,
//! captured output) to diagnose a failure from the report alone.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the harness
#[derive(Error, Debug)]
pub enum Error {
    // === Connection Errors ===
    #[error("Remote platform '{platform}' is unavailable: {reason}")]
    PlatformUnavailable { platform: String, reason: String },

    #[error("Failed to connect to '{url}': {reason} (retries exhausted: {exhausted_retries})")]
    ConnectionFailed {
        url: String,
        reason: String,
        exhausted_retries: bool,
    },

    #[error("Failed to attach to process {pid}: {reason}")]
    AttachFailed { pid: u32, reason: String },

    #[error("Command interpreter unavailable: {0}")]
    InterpreterUnavailable(String),

    // === Session Errors ===
    #[error("Could not determine source path of '{file}': {reason}")]
    SourcePathUnresolved { file: String, reason: String },

    #[error("Command '{command}' could not be executed: {message}")]
    ExecutionFailure { command: String, message: String },

    #[error("Command '{command}' output did not match {expected}\n--- actual output ---\n{actual}")]
    AssertionFailure {
        command: String,
        expected: String,
        actual: String,
    },

    #[error("Unable to match function roles for {combination:?} after {iterations} resumes (never observed: {pending:?})")]
    RoleCoverageIncomplete {
        combination: Vec<String>,
        pending: Vec<String>,
        iterations: u32,
    },

    // === Bridge / Device Errors ===
    #[error("Debugger bridge error: {0}")]
    Bridge(String),

    #[error("Device command failed: {0}")]
    Device(String),

    // === Scenario Errors ===
    #[error("Unknown scenario '{0}'. Use 'lldb-harness list' to see available scenarios")]
    UnknownScenario(String),

    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },
}

impl Error {
    /// Create a connection failure
    pub fn connection_failed(url: &str, reason: &str, exhausted_retries: bool) -> Self {
        Self::ConnectionFailed {
            url: url.to_string(),
            reason: reason.to_string(),
            exhausted_retries,
        }
    }

    /// Create an attach failure
    pub fn attach_failed(pid: u32, reason: &str) -> Self {
        Self::AttachFailed {
            pid,
            reason: reason.to_string(),
        }
    }

    /// Create a source path resolution failure
    pub fn source_path_unresolved(file: &str, reason: &str) -> Self {
        Self::SourcePathUnresolved {
            file: file.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create an execution failure
    pub fn execution_failure(command: &str, message: &str) -> Self {
        Self::ExecutionFailure {
            command: command.to_string(),
            message: message.to_string(),
        }
    }

    /// Create an assertion failure
    pub fn assertion_failure(command: &str, expected: &str, actual: &str) -> Self {
        Self::AssertionFailure {
            command: command.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Stable code for the error kind, used in reports
    pub fn kind(&self) -> &'static str {
        match self {
            Error::PlatformUnavailable { .. } => "PLATFORM_UNAVAILABLE",
            Error::ConnectionFailed { .. } => "CONNECTION_FAILED",
            Error::AttachFailed { .. } => "ATTACH_FAILED",
            Error::InterpreterUnavailable(_) => "INTERPRETER_UNAVAILABLE",
            Error::SourcePathUnresolved { .. } => "SOURCE_PATH_UNRESOLVED",
            Error::ExecutionFailure { .. } => "EXECUTION_FAILURE",
            Error::AssertionFailure { .. } => "ASSERTION_FAILURE",
            Error::RoleCoverageIncomplete { .. } => "ROLE_COVERAGE_INCOMPLETE",
            Error::Bridge(_) => "BRIDGE_ERROR",
            Error::Device(_) => "DEVICE_ERROR",
            Error::UnknownScenario(_) => "UNKNOWN_SCENARIO",
            Error::InvalidPattern { .. } => "INVALID_PATTERN",
            Error::Config(_) | Error::ConfigParse(_) => "CONFIG_ERROR",
            Error::Io(_) => "IO_ERROR",
            Error::FileRead { .. } => "FILE_READ_ERROR",
        }
    }
}
