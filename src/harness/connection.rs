//! Remote attach and teardown
//!
//! [`ConnectionManager`] owns the debugger backend. A successful
//! [`ConnectionManager::attach`] lends it out as a [`Session`]; once the
//! session is dropped, [`ConnectionManager::detach`] releases the platform
//! connection.

use std::time::Duration;

use crate::bridge::Debugger;
use crate::common::config::RemoteConfig;
use crate::common::{Error, Result};

/// Phrase in a connect failure that means the debug server is not listening yet
const CONNECTION_REFUSED: &str = "Connection refused";

/// Whether a platform connect failure is worth retrying
///
/// A refused connection usually means the debug server on the device has not
/// started listening yet. Any other failure is treated as permanent.
pub fn is_connection_refused(message: &str) -> bool {
    message.contains(CONNECTION_REFUSED)
}

/// Remote process to attach to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTarget {
    /// Device id understood by the transport
    pub device: String,
    /// Debug server port on the device
    pub port: u16,
    /// Process to attach to
    pub pid: u32,
}

/// How to reach the remote platform
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    pub platform: String,
    pub scheme: String,
    pub attempts: u32,
    pub retry_delay: Duration,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self::from(&RemoteConfig::default())
    }
}

impl From<&RemoteConfig> for ConnectOptions {
    fn from(config: &RemoteConfig) -> Self {
        Self {
            platform: config.platform.clone(),
            scheme: config.scheme.clone(),
            attempts: config.connect_attempts,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        }
    }
}

impl ConnectOptions {
    /// Platform connect URL for a target, `<scheme>://<device>:<port>`
    pub fn connect_url(&self, target: &RemoteTarget) -> String {
        format!("{}://{}:{}", self.scheme, target.device, target.port)
    }
}

/// A debugger attached to one remote process
///
/// Only [`ConnectionManager::attach`] creates sessions, and only once every
/// attach step has succeeded.
pub struct Session<'a> {
    debugger: &'a mut dyn Debugger,
    endpoint: String,
    platform: String,
    pid: u32,
}

impl<'a> Session<'a> {
    /// Platform connect URL
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Selected platform
    pub fn platform(&self) -> &str {
        &self.platform
    }

    /// Attached process id
    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub(crate) fn debugger(&mut self) -> &mut dyn Debugger {
        &mut *self.debugger
    }
}

impl std::fmt::Debug for Session<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("endpoint", &self.endpoint)
            .field("platform", &self.platform)
            .field("pid", &self.pid)
            .finish()
    }
}

/// Establishes and tears down the remote debugging connection
pub struct ConnectionManager {
    debugger: Box<dyn Debugger>,
    options: ConnectOptions,
    /// Whether the platform transport is open and needs disconnecting
    connected: bool,
}

impl ConnectionManager {
    pub fn new(debugger: Box<dyn Debugger>, options: ConnectOptions) -> Self {
        Self {
            debugger,
            options,
            connected: false,
        }
    }

    /// Whether the platform transport is currently open
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Connect to the remote platform and attach to `target.pid`
    #[tracing::instrument(skip(self), fields(device = %target.device, port = target.port, pid = target.pid))]
    pub async fn attach(&mut self, target: &RemoteTarget) -> Result<Session<'_>> {
        let platform = self.options.platform.clone();
        if let Err(e) = self.debugger.select_platform(&platform).await {
            tracing::error!(platform = %platform, error = %e, "Failed to select platform");
            return Err(Error::PlatformUnavailable {
                platform,
                reason: e.message,
            });
        }

        let url = self.options.connect_url(target);
        self.connect(&url).await?;

        self.debugger
            .create_target()
            .await
            .map_err(|e| Error::attach_failed(target.pid, &format!("failed to create target: {}", e)))?;

        match self.debugger.attach(target.pid).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                tracing::error!("Attach produced no process");
                return Err(Error::attach_failed(target.pid, "no process returned"));
            }
            Err(e) => {
                tracing::error!(error = %e, "Attach failed");
                return Err(Error::attach_failed(target.pid, &e.message));
            }
        }

        let status = self
            .debugger
            .interpreter_status()
            .await
            .map_err(|e| Error::InterpreterUnavailable(e.message))?;
        if !status.is_usable() {
            return Err(Error::InterpreterUnavailable(format!(
                "command interpreter not usable (valid: {}, has commands: {})",
                status.valid, status.has_commands
            )));
        }

        tracing::info!(url = %url, "Attached to remote process");

        Ok(Session {
            debugger: &mut *self.debugger,
            endpoint: url,
            platform,
            pid: target.pid,
        })
    }

    /// Open the platform transport, retrying refused connections
    async fn connect(&mut self, url: &str) -> Result<()> {
        let attempts = self.options.attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            let err = match self.debugger.connect_platform(url).await {
                Ok(()) => {
                    self.connected = true;
                    tracing::debug!(attempt, "Platform connected");
                    return Ok(());
                }
                Err(e) => e,
            };

            tracing::error!(attempt, error = %err, "Platform connect failed");

            if !is_connection_refused(&err.message) {
                return Err(Error::connection_failed(url, &err.message, false));
            }
            if attempt >= attempts {
                tracing::error!("Not trying again, maximum retries exceeded");
                return Err(Error::connection_failed(url, &err.message, true));
            }

            tracing::warn!("Connection to debug server was refused, trying again");
            if !self.options.retry_delay.is_zero() {
                tokio::time::sleep(self.options.retry_delay).await;
            }
        }
    }

    /// Release the platform connection
    ///
    /// Never fails; disconnect errors are only logged. Does nothing when no
    /// platform connection was opened, so it may be called more than once.
    pub async fn detach(&mut self) {
        if !self.connected {
            tracing::debug!("No platform connection to tear down");
            return;
        }
        self.connected = false;

        match self.debugger.disconnect_platform().await {
            Ok(()) => tracing::debug!("Platform disconnected"),
            Err(e) => tracing::warn!(error = %e, "Failed to disconnect platform"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_refused_classification() {
        assert!(is_connection_refused(
            "error: Failed to connect port: Connection refused"
        ));
        assert!(!is_connection_refused("error: device 'emulator-5554' not found"));
        assert!(!is_connection_refused("connection refused"));
    }

    #[test]
    fn test_connect_url() {
        let options = ConnectOptions::default();
        let target = RemoteTarget {
            device: "emulator-5554".to_string(),
            port: 1234,
            pid: 4321,
        };
        assert_eq!(options.connect_url(&target), "adb://emulator-5554:1234");
    }
}
