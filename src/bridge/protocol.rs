//! Bridge protocol message types
//!
//! Defines the request/response format for harness ↔ bridge communication.
//! Uses the same length-prefixed JSON framing as [`super::transport`].

use serde::{Deserialize, Serialize};

/// Request from the harness to the bridge
#[derive(Debug, Serialize, Deserialize)]
pub struct Request {
    /// Request ID for matching responses
    pub id: u64,
    /// The operation to perform
    pub request: BridgeRequest,
}

/// Response from the bridge
#[derive(Debug, Serialize, Deserialize)]
pub struct Response {
    /// Request ID this response corresponds to
    pub id: u64,
    /// Whether the operation succeeded
    pub success: bool,
    /// Result data on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// Error text reported by the debugger on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    /// Create a success response
    pub fn success(id: u64, result: serde_json::Value) -> Self {
        Self {
            id,
            success: true,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response
    pub fn error(id: u64, message: impl Into<String>) -> Self {
        Self {
            id,
            success: false,
            result: None,
            error: Some(message.into()),
        }
    }

    /// Create a success response with no data
    pub fn ok(id: u64) -> Self {
        Self::success(id, serde_json::json!({}))
    }
}

/// Operations the bridge performs on the debugger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BridgeRequest {
    SelectPlatform { name: String },
    ConnectPlatform { url: String },
    DisconnectPlatform,
    CreateTarget,
    Attach { pid: u32 },
    InterpreterStatus,
    HandleCommand { command: String },
}

impl BridgeRequest {
    /// Short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Self::SelectPlatform { .. } => "select_platform",
            Self::ConnectPlatform { .. } => "connect_platform",
            Self::DisconnectPlatform => "disconnect_platform",
            Self::CreateTarget => "create_target",
            Self::Attach { .. } => "attach",
            Self::InterpreterStatus => "interpreter_status",
            Self::HandleCommand { .. } => "handle_command",
        }
    }
}

/// Result body of an attach request
#[derive(Debug, Serialize, Deserialize)]
pub struct AttachResult {
    /// Attached process id; absent when the debugger produced no process
    pub pid: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_format() {
        let request = Request {
            id: 7,
            request: BridgeRequest::HandleCommand {
                command: "process continue".to_string(),
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["request"]["type"], "handle_command");
        assert_eq!(json["request"]["command"], "process continue");
    }

    #[test]
    fn test_error_response_omits_result() {
        let json = serde_json::to_string(&Response::error(3, "Connection refused")).unwrap();
        assert!(!json.contains("result"));
        assert!(json.contains("Connection refused"));
    }
}
