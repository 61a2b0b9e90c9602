//! Transport-level connection configuration.

use std::time::Duration;

use crate::credentials::{AuthMethod, Credentials, JumpHost};

/// Pseudo-terminal request parameters for the shell channel.
#[derive(Debug, Clone)]
pub struct PtyRequest {
    /// Terminal type reported to the device.
    pub term: String,

    /// Terminal width in columns.
    pub width: u32,

    /// Terminal height in rows.
    pub height: u32,
}

impl Default for PtyRequest {
    fn default() -> Self {
        // Wide terminal so devices do not wrap long config lines.
        Self {
            term: "vt100".to_string(),
            width: 200,
            height: 24,
        }
    }
}

/// Connection parameters for a single SSH transport.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Target host (hostname or IP address).
    pub host: String,

    /// SSH port.
    pub port: u16,

    /// Username presented to the SSH server. May differ from the
    /// credentials username (MikroTik encodes terminal geometry here).
    pub username: String,

    /// Authentication method.
    pub auth: AuthMethod,

    /// Transport-setup deadline.
    pub timeout: Duration,

    /// SSH keepalive interval, when enabled.
    pub keepalive_interval: Option<Duration>,

    /// Unanswered keepalives before the connection is considered dead.
    pub keepalive_max: usize,
}

impl TransportConfig {
    /// Build a transport config from device credentials.
    ///
    /// `username` is passed separately so vendor plugins can rewrite the
    /// login name without touching the credentials.
    pub fn from_credentials(
        credentials: &Credentials,
        username: String,
        default_timeout: Duration,
    ) -> Self {
        let timeout = credentials
            .connection_timeout
            .map(Duration::from_secs)
            .unwrap_or(default_timeout);

        Self {
            host: credentials.host.clone(),
            port: credentials.port,
            username,
            auth: credentials.auth.clone(),
            timeout,
            keepalive_interval: credentials
                .keep_alive
                .then(|| Duration::from_secs(30)),
            keepalive_max: 3,
        }
    }

    /// Build a transport config for the bastion of a jump-host block.
    pub fn from_jump_host(jump: &JumpHost, timeout: Duration) -> Self {
        Self {
            host: jump.host.clone(),
            port: jump.port,
            username: jump.username.clone(),
            auth: jump.auth.clone(),
            timeout,
            keepalive_interval: Some(Duration::from_secs(30)),
            keepalive_max: 3,
        }
    }
}
