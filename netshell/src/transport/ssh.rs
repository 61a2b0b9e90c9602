//! SSH transport implementation using russh.

use std::sync::Arc;

use log::{debug, trace};
use russh::client::{self, Handle, Msg};
use russh::keys::{PrivateKeyWithHashAlg, PublicKey, decode_secret_key, load_secret_key};
use russh::{Channel, ChannelStream, Disconnect};
use secrecy::ExposeSecret;
use tokio::io::{AsyncRead, AsyncWrite};

use super::algorithms::AlgorithmProfile;
use super::config::{PtyRequest, TransportConfig};
use crate::credentials::AuthMethod;
use crate::error::{Result, TransportError};

/// Whether `SSH_DEBUG=true` is set, enabling verbose negotiation logging.
fn ssh_debug() -> bool {
    std::env::var("SSH_DEBUG").map(|v| v == "true").unwrap_or(false)
}

/// SSH transport wrapping a russh client.
///
/// A transport owns exactly one authenticated SSH connection. Shell and
/// `direct-tcpip` channels are opened on top of it.
pub struct SshTransport {
    /// The russh session handle.
    session: Handle<SshHandler>,

    /// The algorithm profile the connection was negotiated with.
    profile: AlgorithmProfile,
}

impl SshTransport {
    /// Connect and authenticate, walking the algorithm fallback chain.
    ///
    /// Profiles are tried modern → legacy → ultra-legacy. Only negotiation
    /// failures advance the chain; an authentication rejection is permanent.
    pub async fn connect(config: &TransportConfig) -> Result<Self> {
        let mut last_error: Option<TransportError> = None;

        for profile in AlgorithmProfile::FALLBACK_CHAIN {
            if ssh_debug() {
                debug!(
                    "connecting to {}:{} with {} algorithm profile",
                    config.host, config.port, profile
                );
            }

            let ssh_config = Arc::new(Self::client_config(config, profile));
            let connected = tokio::time::timeout(
                config.timeout,
                client::connect(
                    ssh_config,
                    (config.host.as_str(), config.port),
                    SshHandler::new(&config.host),
                ),
            )
            .await;

            match connected {
                Err(_) => {
                    return Err(TransportError::Timeout(config.timeout).into());
                }
                Ok(Err(e)) if is_negotiation_failure(&e) => {
                    debug!(
                        "{} profile rejected by {}:{}: {}",
                        profile, config.host, config.port, e
                    );
                    last_error = Some(TransportError::Ssh(e));
                    continue;
                }
                Ok(Err(russh::Error::IO(e))) => {
                    return Err(TransportError::ConnectionFailed {
                        host: config.host.clone(),
                        port: config.port,
                        message: e.to_string(),
                    }
                    .into());
                }
                Ok(Err(e)) => {
                    return Err(TransportError::Ssh(e).into());
                }
                Ok(Ok(mut session)) => {
                    Self::authenticate(&mut session, config).await?;
                    if ssh_debug() {
                        debug!(
                            "connected to {}:{} ({} profile)",
                            config.host, config.port, profile
                        );
                    }
                    return Ok(Self { session, profile });
                }
            }
        }

        Err(TransportError::AuthOrAlgorithm {
            user: config.username.clone(),
            message: match last_error {
                Some(e) => format!("all algorithm profiles exhausted: {}", e),
                None => "all algorithm profiles exhausted".to_string(),
            },
        }
        .into())
    }

    /// Connect and authenticate over an already-established byte stream,
    /// using a single algorithm profile.
    ///
    /// This is the tunneled half of a jump-host connection: the stream is a
    /// `direct-tcpip` channel on the bastion transport, consumed by the
    /// handshake, so the caller drives the fallback chain by opening a fresh
    /// tunnel per attempt.
    pub async fn connect_over_stream<S>(
        config: &TransportConfig,
        stream: S,
        profile: AlgorithmProfile,
    ) -> Result<Self>
    where
        S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        if ssh_debug() {
            debug!(
                "connecting to {}:{} through tunnel with {} algorithm profile",
                config.host, config.port, profile
            );
        }

        let ssh_config = Arc::new(Self::client_config(config, profile));
        let mut session = tokio::time::timeout(
            config.timeout,
            client::connect_stream(ssh_config, stream, SshHandler::new(&config.host)),
        )
        .await
        .map_err(|_| TransportError::Timeout(config.timeout))?
        .map_err(TransportError::Ssh)?;

        Self::authenticate(&mut session, config).await?;
        Ok(Self { session, profile })
    }

    /// The algorithm profile this connection negotiated.
    pub fn profile(&self) -> AlgorithmProfile {
        self.profile
    }

    /// Whether the underlying SSH connection is still open.
    pub fn is_open(&self) -> bool {
        !self.session.is_closed()
    }

    /// Open an interactive shell channel with the requested PTY.
    pub async fn open_shell(&self, pty: &PtyRequest) -> Result<Channel<Msg>> {
        let channel = self
            .session
            .channel_open_session()
            .await
            .map_err(TransportError::Ssh)?;

        channel
            .request_pty(true, &pty.term, pty.width, pty.height, 0, 0, &[])
            .await
            .map_err(TransportError::Ssh)?;

        channel
            .request_shell(true)
            .await
            .map_err(TransportError::Ssh)?;

        trace!("shell channel open ({} {}x{})", pty.term, pty.width, pty.height);
        Ok(channel)
    }

    /// Ask the server to open a `direct-tcpip` channel to a further target
    /// and return it as a byte stream.
    pub async fn open_tunnel(&self, host: &str, port: u16) -> Result<ChannelStream<Msg>> {
        let channel = self
            .session
            .channel_open_direct_tcpip(host, u32::from(port), "127.0.0.1", 0)
            .await
            .map_err(TransportError::Ssh)?;

        debug!("direct-tcpip tunnel open to {}:{}", host, port);
        Ok(channel.into_stream())
    }

    /// Close the connection.
    pub async fn close(&self) -> Result<()> {
        self.session
            .disconnect(Disconnect::ByApplication, "", "en")
            .await
            .map_err(TransportError::Ssh)?;
        Ok(())
    }

    /// Build the russh client config for one profile.
    fn client_config(config: &TransportConfig, profile: AlgorithmProfile) -> client::Config {
        client::Config {
            preferred: profile.preferred(),
            keepalive_interval: config.keepalive_interval,
            keepalive_max: config.keepalive_max,
            ..Default::default()
        }
    }

    /// Authenticate with the server.
    async fn authenticate(session: &mut Handle<SshHandler>, config: &TransportConfig) -> Result<()> {
        let success = match &config.auth {
            AuthMethod::Password(password) => session
                .authenticate_password(&config.username, password.expose_secret())
                .await
                .map_err(TransportError::Ssh)?
                .success(),
            AuthMethod::PrivateKey { key, passphrase } => {
                let key = decode_secret_key(
                    key.expose_secret(),
                    passphrase.as_ref().map(|p| p.expose_secret()),
                )
                .map_err(|e| TransportError::Key(e.to_string()))?;
                Self::authenticate_key(session, config, key).await?
            }
            AuthMethod::PrivateKeyFile { path, passphrase } => {
                let key = load_secret_key(path, passphrase.as_ref().map(|p| p.expose_secret()))
                    .map_err(|e| TransportError::Key(e.to_string()))?;
                Self::authenticate_key(session, config, key).await?
            }
        };

        if !success {
            return Err(TransportError::AuthOrAlgorithm {
                user: config.username.clone(),
                message: "authentication rejected by server".to_string(),
            }
            .into());
        }

        Ok(())
    }

    /// Public-key authentication with RSA hash negotiation.
    async fn authenticate_key(
        session: &mut Handle<SshHandler>,
        config: &TransportConfig,
        key: russh::keys::PrivateKey,
    ) -> Result<bool> {
        let hash_alg = session
            .best_supported_rsa_hash()
            .await
            .map_err(TransportError::Ssh)?
            .flatten();

        Ok(session
            .authenticate_publickey(
                &config.username,
                PrivateKeyWithHashAlg::new(Arc::new(key), hash_alg),
            )
            .await
            .map_err(TransportError::Ssh)?
            .success())
    }
}

/// Whether a handshake error should advance the algorithm fallback chain.
pub(crate) fn is_negotiation_failure(error: &russh::Error) -> bool {
    matches!(
        error,
        russh::Error::NoCommonAlgo { .. } | russh::Error::Disconnect
    )
}

/// SSH client handler for russh.
///
/// Host keys are accepted without verification: network gear is reached by
/// management address, frequently reinstalled, and the surrounding system
/// does not maintain a known-hosts store.
struct SshHandler {
    host: String,
}

impl SshHandler {
    fn new(host: &str) -> Self {
        Self {
            host: host.to_string(),
        }
    }
}

impl client::Handler for SshHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        if ssh_debug() {
            debug!(
                "accepting {} host key from {}",
                server_public_key.algorithm(),
                self.host
            );
        } else {
            trace!("accepting host key from {}", self.host);
        }
        Ok(true)
    }
}

