//! Device credentials and authentication material.

use std::path::PathBuf;

use secrecy::SecretString;
use serde::Deserialize;

/// Authentication method for SSH connections.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AuthMethod {
    /// Password authentication.
    Password(SecretString),

    /// Private key supplied inline (PEM/OpenSSH text).
    PrivateKey {
        key: SecretString,
        #[serde(default)]
        passphrase: Option<SecretString>,
    },

    /// Private key loaded from a file on disk.
    PrivateKeyFile {
        path: PathBuf,
        #[serde(default)]
        passphrase: Option<SecretString>,
    },
}

/// Bastion (jump host) connection block.
///
/// A jump host is only used when the block is complete: host, username
/// and an authentication method.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JumpHost {
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    pub username: String,

    pub auth: AuthMethod,
}

/// Credentials for a single device, immutable for the session lifetime.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    /// Target host (hostname or IP address).
    pub host: String,

    /// SSH port (default: 22).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Username for authentication.
    pub username: String,

    /// Authentication method.
    pub auth: AuthMethod,

    /// Device-type tag (e.g. "cisco_ios", "juniper_junos").
    pub device_type: String,

    /// Enable/privileged-mode password for vendors that gate privilege.
    #[serde(default)]
    pub enable_password: Option<SecretString>,

    /// Optional bastion to tunnel through.
    #[serde(default)]
    pub jump_host: Option<JumpHost>,

    /// Transport-setup deadline override, in seconds.
    #[serde(default)]
    pub connection_timeout: Option<u64>,

    /// Send SSH keepalive packets on the transport.
    #[serde(default)]
    pub keep_alive: bool,
}

fn default_port() -> u16 {
    22
}

impl Credentials {
    /// Build credentials for a password login with everything else defaulted.
    pub fn password_login(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        device_type: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: default_port(),
            username: username.into(),
            auth: AuthMethod::Password(SecretString::from(password.into())),
            device_type: device_type.into(),
            enable_password: None,
            jump_host: None,
            connection_timeout: None,
            keep_alive: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_deserialize_password_credentials() {
        let creds: Credentials = serde_json::from_str(
            r#"{
                "host": "10.0.0.1",
                "username": "admin",
                "auth": {"password": "secret"},
                "deviceType": "cisco_ios"
            }"#,
        )
        .unwrap();
        assert_eq!(creds.host, "10.0.0.1");
        assert_eq!(creds.port, 22);
        assert_eq!(creds.device_type, "cisco_ios");
        match &creds.auth {
            AuthMethod::Password(p) => assert_eq!(p.expose_secret(), "secret"),
            other => panic!("unexpected auth method: {:?}", other),
        }
        assert!(creds.jump_host.is_none());
    }

    #[test]
    fn test_deserialize_jump_host_block() {
        let creds: Credentials = serde_json::from_str(
            r#"{
                "host": "10.0.0.1",
                "username": "admin",
                "auth": {"password": "secret"},
                "deviceType": "linux",
                "jumpHost": {
                    "host": "bastion",
                    "username": "jump",
                    "auth": {"password": "hop"}
                }
            }"#,
        )
        .unwrap();
        let jump = creds.jump_host.expect("jump host block");
        assert_eq!(jump.host, "bastion");
        assert_eq!(jump.port, 22);
        assert_eq!(jump.username, "jump");
    }

    #[test]
    fn test_deserialize_key_auth() {
        let creds: Credentials = serde_json::from_str(
            r#"{
                "host": "h",
                "username": "u",
                "auth": {"privateKey": {"key": "-----BEGIN...", "passphrase": "pw"}},
                "deviceType": "linux"
            }"#,
        )
        .unwrap();
        assert!(matches!(creds.auth, AuthMethod::PrivateKey { .. }));
    }
}
