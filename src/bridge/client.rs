//! Client side of the debugger bridge
//!
//! The bridge is a separate process hosting the debugger library. The harness
//! spawns it and exchanges framed JSON messages over its stdin/stdout.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

use crate::common::{Error, Result};

use super::protocol::{AttachResult, BridgeRequest, Request, Response};
use super::transport;
use super::{BackendError, BackendResult, CommandOutput, Debugger, InterpreterStatus};

/// [`Debugger`] implementation backed by a bridge process
pub struct BridgeDebugger<R = ChildStdout, W = ChildStdin> {
    /// Bridge subprocess, if we spawned it; killed on drop
    _child: Option<Child>,
    /// Reader for bridge responses
    reader: R,
    /// Writer for bridge requests
    writer: W,
    /// ID of the next request
    next_id: u64,
}

impl BridgeDebugger {
    /// Spawn the bridge executable and connect to its pipes
    pub async fn spawn(bridge_path: &Path, args: &[String]) -> Result<Self> {
        let mut cmd = Command::new(bridge_path);
        cmd.args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit()) // Let bridge diagnostics go to stderr
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| {
            Error::Bridge(format!(
                "Failed to start {}: {}",
                bridge_path.display(),
                e
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::Bridge("Failed to get bridge stdin".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Bridge("Failed to get bridge stdout".to_string()))?;

        tracing::debug!(bridge = %bridge_path.display(), "Spawned debugger bridge");

        let mut bridge = Self::from_streams(stdout, stdin);
        bridge._child = Some(child);
        Ok(bridge)
    }
}

impl<R, W> BridgeDebugger<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    /// Use an already connected byte stream pair
    pub fn from_streams(reader: R, writer: W) -> Self {
        Self {
            _child: None,
            reader,
            writer,
            next_id: 1,
        }
    }

    /// Send a request and wait for its response
    async fn request(&mut self, request: BridgeRequest) -> BackendResult<Value> {
        let id = self.next_id;
        self.next_id += 1;

        let name = request.name();
        let json = serde_json::to_vec(&Request { id, request })
            .map_err(|e| BackendError::new(format!("Failed to encode {} request: {}", name, e)))?;
        tracing::trace!(id, request = name, "Bridge request");

        transport::send_message(&mut self.writer, &json)
            .await
            .map_err(|e| BackendError::new(format!("Bridge write failed: {}", e)))?;

        let data = transport::recv_message(&mut self.reader)
            .await
            .map_err(|e| BackendError::new(format!("Bridge read failed: {}", e)))?;

        let response: Response = serde_json::from_slice(&data)
            .map_err(|e| BackendError::new(format!("Invalid bridge response: {}", e)))?;

        if response.id != id {
            return Err(BackendError::new(format!(
                "Response ID mismatch: expected {}, got {}",
                id, response.id
            )));
        }

        if response.success {
            Ok(response.result.unwrap_or(Value::Null))
        } else {
            Err(BackendError::new(
                response.error.unwrap_or_else(|| "Unknown error".to_string()),
            ))
        }
    }

    async fn request_as<T: serde::de::DeserializeOwned>(
        &mut self,
        request: BridgeRequest,
    ) -> BackendResult<T> {
        let name = request.name();
        let value = self.request(request).await?;
        serde_json::from_value(value)
            .map_err(|e| BackendError::new(format!("Failed to parse {} result: {}", name, e)))
    }
}

#[async_trait]
impl<R, W> Debugger for BridgeDebugger<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn select_platform(&mut self, name: &str) -> BackendResult<()> {
        self.request(BridgeRequest::SelectPlatform {
            name: name.to_string(),
        })
        .await
        .map(|_| ())
    }

    async fn connect_platform(&mut self, url: &str) -> BackendResult<()> {
        self.request(BridgeRequest::ConnectPlatform {
            url: url.to_string(),
        })
        .await
        .map(|_| ())
    }

    async fn disconnect_platform(&mut self) -> BackendResult<()> {
        self.request(BridgeRequest::DisconnectPlatform)
            .await
            .map(|_| ())
    }

    async fn create_target(&mut self) -> BackendResult<()> {
        self.request(BridgeRequest::CreateTarget).await.map(|_| ())
    }

    async fn attach(&mut self, pid: u32) -> BackendResult<Option<u32>> {
        let result: AttachResult = self.request_as(BridgeRequest::Attach { pid }).await?;
        Ok(result.pid)
    }

    async fn interpreter_status(&mut self) -> BackendResult<InterpreterStatus> {
        self.request_as(BridgeRequest::InterpreterStatus).await
    }

    async fn handle_command(&mut self, command: &str) -> BackendResult<CommandOutput> {
        self.request_as(BridgeRequest::HandleCommand {
            command: command.to_string(),
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{duplex, split, DuplexStream, ReadHalf, WriteHalf};

    type TestBridge = BridgeDebugger<ReadHalf<DuplexStream>, WriteHalf<DuplexStream>>;

    /// Serve `count` requests on the far end of the pipe with `reply`
    fn serve<F>(count: usize, reply: F) -> (TestBridge, tokio::task::JoinHandle<Vec<BridgeRequest>>)
    where
        F: Fn(u64, &BridgeRequest) -> Response + Send + 'static,
    {
        let (near, far) = duplex(64 * 1024);
        let (near_read, near_write) = split(near);
        let (mut far_read, mut far_write) = split(far);

        let handle = tokio::spawn(async move {
            let mut seen = Vec::new();
            for _ in 0..count {
                let data = transport::recv_message(&mut far_read).await.unwrap();
                let request: Request = serde_json::from_slice(&data).unwrap();
                let response = reply(request.id, &request.request);
                seen.push(request.request);
                let bytes = serde_json::to_vec(&response).unwrap();
                transport::send_message(&mut far_write, &bytes).await.unwrap();
            }
            seen
        });

        (BridgeDebugger::from_streams(near_read, near_write), handle)
    }

    #[tokio::test]
    async fn test_handle_command_round_trip() {
        let (mut bridge, handle) = serve(1, |id, _| {
            Response::success(
                id,
                json!({"output": "Process 42 resuming\n", "error": "", "succeeded": true}),
            )
        });

        let output = bridge.handle_command("process continue").await.unwrap();
        assert!(output.succeeded);
        assert_eq!(output.output, "Process 42 resuming\n");

        let seen = handle.await.unwrap();
        assert_eq!(
            seen,
            vec![BridgeRequest::HandleCommand {
                command: "process continue".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_error_response_becomes_backend_error() {
        let (mut bridge, _handle) = serve(1, |id, _| {
            Response::error(id, "error: Connection refused")
        });

        let err = bridge
            .connect_platform("adb://emulator-5554:1234")
            .await
            .unwrap_err();
        assert_eq!(err.message, "error: Connection refused");
    }

    #[tokio::test]
    async fn test_attach_without_process() {
        let (mut bridge, _handle) = serve(1, |id, _| Response::success(id, json!({"pid": null})));
        assert_eq!(bridge.attach(1234).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_response_id_mismatch() {
        let (mut bridge, _handle) = serve(1, |id, _| Response::ok(id + 100));
        let err = bridge.create_target().await.unwrap_err();
        assert!(err.message.contains("Response ID mismatch"));
    }
}
