//! Per-operation options merged with defaults at the request boundary.

use std::time::Duration;

use serde::Deserialize;

/// Advanced options supplied by the caller for a single operation.
///
/// This is an immutable record: every field has a default, and the JSON
/// shape from the workflow wrapper uses camelCase keys. Unknown keys are
/// rejected so misspelled options fail loudly instead of silently using
/// a default.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AdvancedOptions {
    /// Deadline for a single command exchange, in seconds.
    #[serde(default = "default_command_timeout")]
    pub command_timeout: u64,

    /// Deadline for transport setup, in seconds.
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout: u64,

    /// Shorten timeouts and skip non-essential session preparation steps.
    #[serde(default)]
    pub fast_mode: bool,

    /// Consult the process-wide connection pool before opening a new session.
    #[serde(default)]
    pub connection_pooling: bool,

    /// Require reuse of the pooled session; a busy entry then fails the
    /// request instead of falling back to a fresh connection.
    #[serde(default)]
    pub reuse_connection: bool,

    /// Connection attempts before giving up.
    #[serde(default = "default_connection_retry_count")]
    pub connection_retry_count: u32,

    /// Re-executions of a failed command before giving up.
    #[serde(default = "default_command_retry_count")]
    pub command_retry_count: u32,

    /// Delay between retries, in seconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay: u64,

    /// Surface errors to the caller instead of folding them into an
    /// unsuccessful `CommandResult`.
    #[serde(default = "default_fail_on_error")]
    pub fail_on_error: bool,
}

fn default_command_timeout() -> u64 {
    10
}

fn default_connection_timeout() -> u64 {
    15
}

fn default_connection_retry_count() -> u32 {
    3
}

fn default_command_retry_count() -> u32 {
    2
}

fn default_retry_delay() -> u64 {
    2
}

fn default_fail_on_error() -> bool {
    true
}

impl Default for AdvancedOptions {
    fn default() -> Self {
        Self {
            command_timeout: default_command_timeout(),
            connection_timeout: default_connection_timeout(),
            fast_mode: false,
            connection_pooling: false,
            reuse_connection: false,
            connection_retry_count: default_connection_retry_count(),
            command_retry_count: default_command_retry_count(),
            retry_delay: default_retry_delay(),
            fail_on_error: default_fail_on_error(),
        }
    }
}

impl AdvancedOptions {
    /// Effective command deadline; fast mode caps it at 5 seconds.
    pub fn command_timeout(&self) -> Duration {
        if self.fast_mode {
            Duration::from_secs(self.command_timeout.min(5))
        } else {
            Duration::from_secs(self.command_timeout)
        }
    }

    /// Effective transport-setup deadline.
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout)
    }

    /// Delay between connection or command retries.
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay)
    }

    /// Settle interval after the shell opens, before the channel is usable.
    pub fn settle_interval(&self) -> Duration {
        if self.fast_mode {
            Duration::from_millis(200)
        } else {
            Duration::from_millis(700)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = AdvancedOptions::default();
        assert_eq!(opts.command_timeout, 10);
        assert_eq!(opts.connection_timeout, 15);
        assert!(!opts.fast_mode);
        assert!(!opts.connection_pooling);
        assert_eq!(opts.connection_retry_count, 3);
        assert_eq!(opts.command_retry_count, 2);
        assert_eq!(opts.retry_delay, 2);
        assert!(opts.fail_on_error);
    }

    #[test]
    fn test_fast_mode_caps_command_timeout() {
        let opts = AdvancedOptions {
            fast_mode: true,
            ..Default::default()
        };
        assert_eq!(opts.command_timeout(), Duration::from_secs(5));
        assert_eq!(opts.settle_interval(), Duration::from_millis(200));
    }

    #[test]
    fn test_deserialize_camel_case() {
        let opts: AdvancedOptions = serde_json::from_str(
            r#"{"commandTimeout": 30, "fastMode": true, "connectionPooling": true}"#,
        )
        .unwrap();
        assert_eq!(opts.command_timeout, 30);
        assert!(opts.fast_mode);
        assert!(opts.connection_pooling);
        // Unspecified keys fall back to defaults
        assert_eq!(opts.connection_retry_count, 3);
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let result =
            serde_json::from_str::<AdvancedOptions>(r#"{"comandTimeout": 30}"#);
        assert!(result.is_err());
    }
}
