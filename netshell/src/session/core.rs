//! Shared per-session state.

use crate::channel::{SessionChannel, ShellStream};
use crate::credentials::Credentials;
use crate::error::{Result, SessionError};
use crate::options::AdvancedOptions;
use crate::transport::SshTransport;

use super::prompt::PromptModel;

/// State shared by every vendor session: the owned transport and channel,
/// the learned prompts, and the mode flags.
///
/// A connected core owns exactly one SSH transport and at most one shell
/// channel; tests may attach a bare shell with no transport behind it.
pub struct SessionCore {
    pub(crate) credentials: Credentials,
    pub(crate) options: AdvancedOptions,

    transport: Option<SshTransport>,
    channel: Option<SessionChannel>,

    pub(crate) prompt: PromptModel,

    /// Accumulated login banner / early output, kept for auto-detection.
    pub(crate) banner: String,

    pub(crate) in_enable_mode: bool,
    pub(crate) in_config_mode: bool,
    pub(crate) in_shell_mode: bool,
    pub(crate) in_operational_mode: bool,

    unhealthy: bool,
}

impl SessionCore {
    pub fn new(credentials: Credentials, options: AdvancedOptions) -> Self {
        Self {
            credentials,
            options,
            transport: None,
            channel: None,
            prompt: PromptModel::default(),
            banner: String::new(),
            in_enable_mode: false,
            in_config_mode: false,
            in_shell_mode: false,
            in_operational_mode: false,
            unhealthy: false,
        }
    }

    /// The credentials this session was built with.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// The options this session was built with.
    pub fn options(&self) -> &AdvancedOptions {
        &self.options
    }

    /// The learned prompt state.
    pub fn prompt(&self) -> &PromptModel {
        &self.prompt
    }

    /// Banner and early output collected during login.
    pub fn banner(&self) -> &str {
        &self.banner
    }

    /// Whether the session has escalated to privileged mode.
    pub fn in_enable_mode(&self) -> bool {
        self.in_enable_mode
    }

    /// Whether the session is sitting at a configuration prompt.
    pub fn in_config_mode(&self) -> bool {
        self.in_config_mode
    }

    /// Whether the session is in a vendor's shell stage (Versa boot
    /// shell, UniFi login shell).
    pub fn in_shell_mode(&self) -> bool {
        self.in_shell_mode
    }

    /// Whether the session is in operational (non-config) CLI mode.
    pub fn in_operational_mode(&self) -> bool {
        self.in_operational_mode
    }

    /// Attach a transport and its shell channel.
    ///
    /// `transport` is `None` when the shell is injected from outside (mock
    /// shells in tests; tunneled shells own their transport elsewhere).
    pub fn attach(&mut self, transport: Option<SshTransport>, shell: Box<dyn ShellStream>) {
        self.transport = transport;
        self.channel = Some(SessionChannel::new(shell));
        self.unhealthy = false;
    }

    /// The shell channel, or `NotConnected`.
    pub fn channel_mut(&mut self) -> Result<&mut SessionChannel> {
        self.channel
            .as_mut()
            .ok_or_else(|| SessionError::NotConnected.into())
    }

    /// Whether the session currently owns a live channel (and transport,
    /// when one is attached).
    pub fn is_connected(&self) -> bool {
        let channel_open = self.channel.as_ref().map(|c| c.is_open()).unwrap_or(false);
        let transport_open = self.transport.as_ref().map(|t| t.is_open()).unwrap_or(true);
        channel_open && transport_open
    }

    /// Mark the session unusable; the pool will not hand it out again.
    pub fn mark_unhealthy(&mut self) {
        self.unhealthy = true;
    }

    /// Whether the session is still fit for reuse.
    pub fn is_healthy(&self) -> bool {
        !self.unhealthy
    }

    /// Close the channel and transport and reset mode state. Safe to call
    /// repeatedly.
    pub async fn teardown(&mut self) {
        if let Some(channel) = self.channel.as_mut() {
            let _ = channel.close().await;
        }
        self.channel = None;

        if let Some(transport) = self.transport.take() {
            let _ = transport.close().await;
        }

        self.in_enable_mode = false;
        self.in_config_mode = false;
        self.in_shell_mode = false;
        self.in_operational_mode = false;
    }
}
