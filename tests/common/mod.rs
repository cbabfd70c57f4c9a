//! Shared test doubles for harness integration tests

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use lldb_harness::bridge::{BackendError, BackendResult, CommandOutput, Debugger, InterpreterStatus};
use lldb_harness::device::{Device, PropertyStore};
use lldb_harness::harness::RemoteTarget;
use lldb_harness::Result;

/// Shared record of backend calls, in order
pub type CallLog = Arc<Mutex<Vec<String>>>;

type Responder = Box<dyn FnMut(&str) -> BackendResult<CommandOutput> + Send>;

/// Scripted in-memory debugger backend
pub struct FakeDebugger {
    calls: CallLog,
    select_error: Option<String>,
    connect_results: VecDeque<BackendResult<()>>,
    attach_result: BackendResult<Option<u32>>,
    status: InterpreterStatus,
    disconnect_error: Option<String>,
    responder: Responder,
}

impl FakeDebugger {
    /// Backend where every call succeeds and commands print nothing
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            select_error: None,
            connect_results: VecDeque::new(),
            attach_result: Ok(Some(TARGET_PID)),
            status: InterpreterStatus {
                valid: true,
                has_commands: true,
            },
            disconnect_error: None,
            responder: Box::new(|_| Ok(CommandOutput::success(""))),
        }
    }

    pub fn calls(&self) -> CallLog {
        self.calls.clone()
    }

    pub fn failing_select(mut self, message: &str) -> Self {
        self.select_error = Some(message.to_string());
        self
    }

    /// Queue connect failures; later connects succeed
    pub fn connect_failures(mut self, messages: &[&str]) -> Self {
        self.connect_results = messages
            .iter()
            .map(|m| Err(BackendError::new(*m)))
            .collect();
        self
    }

    pub fn attach_result(mut self, result: BackendResult<Option<u32>>) -> Self {
        self.attach_result = result;
        self
    }

    pub fn interpreter(mut self, status: InterpreterStatus) -> Self {
        self.status = status;
        self
    }

    pub fn failing_disconnect(mut self, message: &str) -> Self {
        self.disconnect_error = Some(message.to_string());
        self
    }

    pub fn responder<F>(mut self, responder: F) -> Self
    where
        F: FnMut(&str) -> BackendResult<CommandOutput> + Send + 'static,
    {
        self.responder = Box::new(responder);
        self
    }

    /// Answer commands from a script; see [`Script`]
    pub fn script(self, script: Script) -> Self {
        let mut script = script;
        self.responder(move |command| Ok(script.reply(command)))
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Debugger for FakeDebugger {
    async fn select_platform(&mut self, name: &str) -> BackendResult<()> {
        self.record(format!("select_platform {}", name));
        match &self.select_error {
            Some(message) => Err(BackendError::new(message.clone())),
            None => Ok(()),
        }
    }

    async fn connect_platform(&mut self, url: &str) -> BackendResult<()> {
        self.record(format!("connect_platform {}", url));
        self.connect_results.pop_front().unwrap_or(Ok(()))
    }

    async fn disconnect_platform(&mut self) -> BackendResult<()> {
        self.record("disconnect_platform".to_string());
        match &self.disconnect_error {
            Some(message) => Err(BackendError::new(message.clone())),
            None => Ok(()),
        }
    }

    async fn create_target(&mut self) -> BackendResult<()> {
        self.record("create_target".to_string());
        Ok(())
    }

    async fn attach(&mut self, pid: u32) -> BackendResult<Option<u32>> {
        self.record(format!("attach {}", pid));
        self.attach_result.clone()
    }

    async fn interpreter_status(&mut self) -> BackendResult<InterpreterStatus> {
        self.record("interpreter_status".to_string());
        Ok(self.status)
    }

    async fn handle_command(&mut self, command: &str) -> BackendResult<CommandOutput> {
        self.record(format!("command {}", command));
        (self.responder)(command)
    }
}

/// Canned replies per command text
///
/// Each command has a queue of replies; the last one repeats. Commands with
/// no entry succeed with empty output.
#[derive(Default)]
pub struct Script {
    replies: HashMap<String, VecDeque<CommandOutput>>,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, command: &str, output: &str) -> Self {
        self.replies
            .entry(command.to_string())
            .or_default()
            .push_back(CommandOutput::success(output));
        self
    }

    pub fn fail(mut self, command: &str, error: &str) -> Self {
        self.replies
            .entry(command.to_string())
            .or_default()
            .push_back(CommandOutput::failure(error));
        self
    }

    /// Drop earlier replies for `command` and answer with `output`
    pub fn replace(mut self, command: &str, output: &str) -> Self {
        self.replies.remove(command);
        self.on(command, output)
    }

    pub fn reply(&mut self, command: &str) -> CommandOutput {
        match self.replies.get_mut(command) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue.front().cloned().unwrap_or_default(),
            None => CommandOutput::success(""),
        }
    }
}

/// Number of `command <text>` entries in the log
pub fn count_commands(calls: &CallLog, command: &str) -> usize {
    let entry = format!("command {}", command);
    calls.lock().unwrap().iter().filter(|c| **c == entry).count()
}

pub fn count_calls(calls: &CallLog, prefix: &str) -> usize {
    calls
        .lock()
        .unwrap()
        .iter()
        .filter(|c| c.starts_with(prefix))
        .count()
}

pub const TARGET_PID: u32 = 4242;

pub fn target() -> RemoteTarget {
    RemoteTarget {
        device: "emulator-5554".to_string(),
        port: 1234,
        pid: TARGET_PID,
    }
}

/// In-memory device properties
#[derive(Clone, Default)]
pub struct MemoryProps(pub Arc<Mutex<HashMap<String, String>>>);

impl MemoryProps {
    pub fn with(name: &str, value: &str) -> Self {
        let props = Self::default();
        props.0.lock().unwrap().insert(name.to_string(), value.to_string());
        props
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.0.lock().unwrap().get(name).cloned()
    }

    pub fn device(&self) -> Device {
        Device::new(Box::new(self.clone()))
    }
}

#[async_trait]
impl PropertyStore for MemoryProps {
    async fn get_prop(&mut self, name: &str) -> Result<String> {
        Ok(self.get(name).unwrap_or_default())
    }

    async fn set_prop(&mut self, name: &str, value: &str) -> Result<()> {
        self.0.lock().unwrap().insert(name.to_string(), value.to_string());
        Ok(())
    }
}
