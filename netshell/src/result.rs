//! Result value for a device operation.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Outcome of a single operation against a device.
///
/// This is the value handed back to the workflow wrapper: sanitized
/// output, a success flag, and timing metadata. It is a pure value;
/// nothing in it keeps the session alive.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResult {
    /// The command (or summary of commands) that was executed.
    pub command: String,

    /// Sanitized output: no echo, trailing prompt, ANSI, or pager markers.
    pub output: String,

    /// Whether the operation succeeded.
    pub success: bool,

    /// Failure message when `success` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Device-type tag the session was dispatched as.
    pub device_type: String,

    /// Target host.
    pub host: String,

    /// When the operation completed.
    pub timestamp: DateTime<Utc>,

    /// Wall-clock duration of the operation.
    pub execution_time_millis: u64,

    /// Connection attempts beyond the first, when retries happened.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_retries: Option<u32>,

    /// Command re-executions beyond the first, when retries happened.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_retries: Option<u32>,
}

impl CommandResult {
    /// Create a successful result.
    pub fn ok(
        command: impl Into<String>,
        output: impl Into<String>,
        device_type: impl Into<String>,
        host: impl Into<String>,
    ) -> Self {
        Self {
            command: command.into(),
            output: output.into(),
            success: true,
            error: None,
            device_type: device_type.into(),
            host: host.into(),
            timestamp: Utc::now(),
            execution_time_millis: 0,
            connection_retries: None,
            command_retries: None,
        }
    }

    /// Create a failed result.
    pub fn failed(
        command: impl Into<String>,
        output: impl Into<String>,
        error: impl Into<String>,
        device_type: impl Into<String>,
        host: impl Into<String>,
    ) -> Self {
        Self {
            command: command.into(),
            output: output.into(),
            success: false,
            error: Some(error.into()),
            device_type: device_type.into(),
            host: host.into(),
            timestamp: Utc::now(),
            execution_time_millis: 0,
            connection_retries: None,
            command_retries: None,
        }
    }

    /// Set the execution duration.
    pub fn with_elapsed(mut self, elapsed: std::time::Duration) -> Self {
        self.execution_time_millis = elapsed.as_millis() as u64;
        self
    }

    /// Check if the output contains a substring.
    pub fn contains(&self, pattern: &str) -> bool {
        self.output.contains(pattern)
    }
}

impl std::fmt::Display for CommandResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_shape() {
        let result = CommandResult::ok("show version", "Cisco IOS", "cisco_ios", "10.0.0.1");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["command"], "show version");
        assert_eq!(json["deviceType"], "cisco_ios");
        assert_eq!(json["success"], true);
        // Optional fields are omitted when unset
        assert!(json.get("error").is_none());
        assert!(json.get("connectionRetries").is_none());
    }

    #[test]
    fn test_failed_result_carries_error() {
        let result = CommandResult::failed("bad", "", "invalid command", "cisco_ios", "h");
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("invalid command"));
    }
}
