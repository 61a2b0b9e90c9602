//! Error types for netshell.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Main error type for netshell operations.
#[derive(Error, Debug)]
pub enum Error {
    /// SSH transport-level errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Shell channel errors
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Session-level errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Connection pool errors
    #[error("Pool error: {0}")]
    Pool(#[from] PoolError),

    /// Device-type dispatch errors
    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),
}

/// Transport layer errors (TCP, SSH negotiation, authentication).
#[derive(Error, Debug)]
pub enum TransportError {
    /// Failed to reach the host at the TCP/SSH level
    #[error("Connection failed to {host}:{port}: {message}")]
    ConnectionFailed {
        host: String,
        port: u16,
        message: String,
    },

    /// Authentication failed, or every algorithm profile was rejected
    #[error("Authentication or algorithm negotiation failed for user '{user}': {message}")]
    AuthOrAlgorithm { user: String, message: String },

    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Private key could not be loaded or decoded
    #[error("SSH key error: {0}")]
    Key(String),

    /// Transport setup exceeded the connection timeout
    #[error("Connection timed out after {0:?}")]
    Timeout(Duration),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Channel layer errors (shell I/O, prompt detection).
#[derive(Error, Debug)]
pub enum ChannelError {
    /// No prompt observed within the operation deadline.
    ///
    /// Carries whatever output had been collected when the deadline hit,
    /// so callers can report partial results.
    #[error("No prompt within {timeout:?} ({} bytes collected)", .partial.len())]
    PromptTimeout { partial: String, timeout: Duration },

    /// The device produced output but no recognizable prompt
    #[error("No recognizable prompt in device output")]
    PromptNotFound,

    /// Channel closed unexpectedly
    #[error("Channel closed")]
    Closed,

    /// SSH protocol error on the channel
    #[error("Channel SSH error: {0}")]
    Ssh(russh::Error),
}

/// Session layer errors (mode transitions, command execution).
#[derive(Error, Debug)]
pub enum SessionError {
    /// Operation called before a successful connect
    #[error("Session not connected - call connect() first")]
    NotConnected,

    /// connect() called on an already-connected session
    #[error("Session already connected")]
    AlreadyConnected,

    /// Could not enter enable (privileged) mode
    #[error("Failed to enter enable mode: {message}")]
    EnableFailed { message: String },

    /// Could not enter or exit configuration mode
    #[error("Configuration mode error: {message}")]
    ConfigMode { message: String },

    /// Commit rejected by a commit-based device
    #[error("Commit failed: {message}")]
    Commit { message: String },

    /// A vendor error pattern matched in the command output
    #[error("Command '{command}' failed: {message}")]
    Command { command: String, message: String },

    /// A confirmation dialog did not match the expected pattern
    #[error("Confirmation dialog mismatch: expected {expected}, got '{got}'")]
    ConfirmationMismatch { expected: String, got: String },

    /// The operation was not supported by this device type
    #[error("Operation not supported on {device_type}: {operation}")]
    Unsupported {
        device_type: String,
        operation: &'static str,
    },

    /// The caller cancelled the operation
    #[error("Operation cancelled by caller")]
    Canceled,
}

/// Connection pool errors.
#[derive(Error, Debug)]
pub enum PoolError {
    /// An exclusive acquire was requested while the entry is in use
    #[error("Pooled session for {key} is busy")]
    Busy { key: String },

    /// A live entry already exists for the key
    #[error("A live pooled session already exists for {key}")]
    DuplicateKey { key: String },
}

/// Device-type dispatch errors.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// Unknown device-type tag
    #[error("Unsupported device type '{tag}'. Supported types: {}", .supported.join(", "))]
    UnsupportedDeviceType { tag: String, supported: Vec<String> },

    /// The credentials are structurally invalid for the request
    #[error("Invalid credentials: {message}")]
    InvalidCredentials { message: String },
}

/// Result type alias using netshell's Error.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether the error came from the caller cancelling the operation.
    pub fn is_canceled(&self) -> bool {
        matches!(self, Error::Session(SessionError::Canceled))
    }

    /// Whether the error is a prompt/connect deadline expiry.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Error::Channel(ChannelError::PromptTimeout { .. })
                | Error::Transport(TransportError::Timeout(_))
        )
    }
}
