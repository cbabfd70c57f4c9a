//! Debugger backend boundary
//!
//! The harness never links the debugger library itself. Everything it needs
//! from the backend is expressed by the [`Debugger`] trait; [`BridgeDebugger`]
//! implements it by talking to an external bridge process that hosts the
//! real debugger.

mod client;
pub mod protocol;
pub mod transport;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use client::BridgeDebugger;

/// Captured result of one interpreter command
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutput {
    /// Text written to the command's output stream
    #[serde(default)]
    pub output: String,
    /// Text written to the command's error stream
    #[serde(default)]
    pub error: String,
    /// Whether the interpreter reported the command as successful
    pub succeeded: bool,
}

impl CommandOutput {
    /// Successful command with the given output
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            error: String::new(),
            succeeded: true,
        }
    }

    /// Failed command with the given error text
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            output: String::new(),
            error: error.into(),
            succeeded: false,
        }
    }

    /// Output and error streams as one text blob
    ///
    /// The streams are separated by a newline so text cannot match across
    /// their boundary.
    pub fn combined(&self) -> String {
        let mut text = String::with_capacity(self.output.len() + self.error.len() + 1);
        text.push_str(&self.output);
        if !self.output.is_empty() && !self.error.is_empty() && !self.output.ends_with('\n') {
            text.push('\n');
        }
        text.push_str(&self.error);
        text
    }
}

/// State of the backend's command interpreter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterpreterStatus {
    pub valid: bool,
    pub has_commands: bool,
}

impl InterpreterStatus {
    /// Interpreter can accept commands
    pub fn is_usable(&self) -> bool {
        self.valid && self.has_commands
    }
}

/// Failure reported by the backend
///
/// Only the message text is available; callers classify it by content.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct BackendError {
    pub message: String,
}

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Result type for backend calls
pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Operations the harness needs from a debugger backend
///
/// Calls are issued strictly one at a time; implementations may block for as
/// long as the remote side takes.
#[async_trait]
pub trait Debugger: Send {
    /// Select the platform plugin used for remote attach
    async fn select_platform(&mut self, name: &str) -> BackendResult<()>;

    /// Open the platform transport (e.g. `adb://emulator-5554:1234`)
    async fn connect_platform(&mut self, url: &str) -> BackendResult<()>;

    /// Close the platform transport
    async fn disconnect_platform(&mut self) -> BackendResult<()>;

    /// Create an empty target and select it
    async fn create_target(&mut self) -> BackendResult<()>;

    /// Attach the selected target to a remote process
    ///
    /// Returns the attached process id, or `None` if the backend produced no
    /// process.
    async fn attach(&mut self, pid: u32) -> BackendResult<Option<u32>>;

    /// Query the command interpreter
    async fn interpreter_status(&mut self) -> BackendResult<InterpreterStatus>;

    /// Run one textual command through the interpreter
    async fn handle_command(&mut self, command: &str) -> BackendResult<CommandOutput>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combined_separates_streams() {
        let output = CommandOutput {
            output: "Kernels: ".to_string(),
            error: "2".to_string(),
            succeeded: true,
        };
        assert_eq!(output.combined(), "Kernels: \n2");
        assert!(!output.combined().contains("Kernels: 2"));
    }

    #[test]
    fn test_combined_single_stream_is_unchanged() {
        assert_eq!(CommandOutput::success("-> 47\n").combined(), "-> 47\n");
        assert_eq!(CommandOutput::failure("invalid frame").combined(), "invalid frame");

        let output = CommandOutput {
            output: "line\n".to_string(),
            error: "warning".to_string(),
            succeeded: true,
        };
        assert_eq!(output.combined(), "line\nwarning");
    }

    #[test]
    fn test_interpreter_usable_needs_both_flags() {
        let usable = InterpreterStatus { valid: true, has_commands: true };
        assert!(usable.is_usable());
        assert!(!InterpreterStatus { valid: false, has_commands: true }.is_usable());
        assert!(!InterpreterStatus { valid: true, has_commands: false }.is_usable());
    }
}
