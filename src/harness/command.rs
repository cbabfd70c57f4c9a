//! Issuing commands on an attached session

use crate::common::{Error, Result};

use super::connection::Session;
use super::matcher::Expectation;

/// Deletes every breakpoint without prompting
const DELETE_ALL_BREAKPOINTS: &str = "breakpoint delete -f";

/// Error text of a breakpoint delete when none exist
const NO_BREAKPOINTS: &str = "No breakpoints exist";

impl Session<'_> {
    /// Run a command and return its combined output and error text
    ///
    /// Fails with [`Error::ExecutionFailure`] if the interpreter could not
    /// run the command at all.
    pub async fn do_command(&mut self, command: &str) -> Result<String> {
        tracing::debug!(command, "Running command");

        let result = self
            .debugger()
            .handle_command(command)
            .await
            .map_err(|e| Error::execution_failure(command, &e.message))?;

        if !result.succeeded {
            let message = match result.error.trim() {
                "" => "command failed without error text",
                text => text,
            };
            tracing::error!(command, error = %message, "Command failed");
            return Err(Error::execution_failure(command, message));
        }

        let output = result.combined();
        tracing::trace!(command, output = %output, "Command output");
        Ok(output)
    }

    /// Run a command and check its output against `expectation`
    ///
    /// Fails with [`Error::AssertionFailure`] carrying the expected rule and
    /// the actual output when the check does not pass.
    pub async fn run(&mut self, command: &str, expectation: &Expectation) -> Result<String> {
        let output = self.do_command(command).await?;

        if !expectation.check(&output) {
            let missing = expectation.missing(&output);
            tracing::error!(command, missing = ?missing, "Command output did not match");
            return Err(Error::assertion_failure(
                command,
                &format!("{} (missing {})", expectation.describe(), missing.join(", ")),
                &output,
            ));
        }

        Ok(output)
    }

    /// Remove every breakpoint; succeeds when there were none
    pub async fn delete_breakpoints(&mut self) -> Result<()> {
        match self.do_command(DELETE_ALL_BREAKPOINTS).await {
            Ok(_) => Ok(()),
            Err(Error::ExecutionFailure { message, .. }) if message.contains(NO_BREAKPOINTS) => {
                tracing::debug!("No breakpoints to delete");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}
