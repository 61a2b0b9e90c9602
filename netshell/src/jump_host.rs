//! Jump-host (bastion) session decorator.
//!
//! `JumpHostSession` is itself a session: its `connect` opens SSH to the
//! bastion, asks it for a `direct-tcpip` channel to the target, and runs
//! the wrapped vendor session's handshake over that stream. Everything
//! else delegates to the wrapped session, so the vendor dialect is
//! unchanged by the hop. Disconnect closes the inner session before the
//! bastion transport.
//!
//! The bastion leg lives behind [`JumpLink`]; `SshJumpLink` is the live
//! implementation, and tests substitute their own link to drive the
//! decorator without two live SSH servers (the same seam idea as
//! [`ShellStream`](crate::channel::ShellStream)).

use async_trait::async_trait;
use log::debug;
use regex::Regex;

use crate::channel::ShellStream;
use crate::error::{DispatchError, Error, Result, SessionError, TransportError};
use crate::result::CommandResult;
use crate::session::{DeviceSession, SessionCore};
use crate::transport::{
    AlgorithmProfile, PtyRequest, SshTransport, TransportConfig, is_negotiation_failure,
};

/// The bastion leg of a tunneled connection.
#[async_trait]
pub trait JumpLink: Send {
    /// Connect the bastion, tunnel to the target, and leave the wrapped
    /// session connected and prepared.
    async fn establish(&mut self, inner: &mut Box<dyn DeviceSession>) -> Result<()>;

    /// Close the bastion transport. Called after the wrapped session has
    /// disconnected.
    async fn close(&mut self) -> Result<()>;

    /// Whether the bastion leg is still open.
    fn is_open(&self) -> bool;
}

/// Live bastion leg over SSH.
#[derive(Default)]
pub struct SshJumpLink {
    outer: Option<SshTransport>,
}

impl SshJumpLink {
    pub fn new() -> Self {
        Self { outer: None }
    }
}

#[async_trait]
impl JumpLink for SshJumpLink {
    /// Bastion first, then the target over a tunneled stream.
    ///
    /// Each algorithm-profile attempt for the target consumes its tunnel
    /// channel, so the fallback chain opens a fresh `direct-tcpip` channel
    /// per profile.
    async fn establish(&mut self, inner: &mut Box<dyn DeviceSession>) -> Result<()> {
        let jump = inner
            .core()
            .credentials()
            .jump_host
            .clone()
            .ok_or_else(|| DispatchError::InvalidCredentials {
                message: "jump-host session without a jump-host block".to_string(),
            })?;

        let target_host = inner.core().credentials().host.clone();
        let target_port = inner.core().credentials().port;
        let timeout = inner.core().options().connection_timeout();

        let outer = SshTransport::connect(&TransportConfig::from_jump_host(&jump, timeout)).await?;
        debug!("bastion {} connected, tunneling to {}:{}", jump.host, target_host, target_port);

        let inner_config = inner.transport_config();
        let mut last_error: Option<Error> = None;

        for profile in AlgorithmProfile::FALLBACK_CHAIN {
            let stream = outer.open_tunnel(&target_host, target_port).await?;
            match SshTransport::connect_over_stream(&inner_config, stream, profile).await {
                Ok(transport) => {
                    self.outer = Some(outer);
                    return inner.connect_via(transport).await;
                }
                Err(Error::Transport(TransportError::Ssh(e))) if is_negotiation_failure(&e) => {
                    debug!("tunneled {} profile rejected: {}", profile, e);
                    last_error = Some(TransportError::Ssh(e).into());
                }
                Err(e) => {
                    let _ = outer.close().await;
                    return Err(e);
                }
            }
        }

        let _ = outer.close().await;
        Err(last_error.unwrap_or_else(|| {
            TransportError::AuthOrAlgorithm {
                user: inner_config.username.clone(),
                message: "all algorithm profiles exhausted through tunnel".to_string(),
            }
            .into()
        }))
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(outer) = self.outer.take() {
            outer.close().await?;
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.outer.as_ref().map(|t| t.is_open()).unwrap_or(false)
    }
}

/// A vendor session tunneled through a bastion.
pub struct JumpHostSession {
    inner: Box<dyn DeviceSession>,
    link: Box<dyn JumpLink>,
}

impl JumpHostSession {
    /// Wrap a vendor session whose credentials carry a jump-host block.
    pub fn new(inner: Box<dyn DeviceSession>) -> Self {
        Self::with_link(inner, Box::new(SshJumpLink::new()))
    }

    /// Wrap a vendor session with an explicit bastion link.
    pub fn with_link(inner: Box<dyn DeviceSession>, link: Box<dyn JumpLink>) -> Self {
        Self { inner, link }
    }
}

#[async_trait]
impl DeviceSession for JumpHostSession {
    fn core(&self) -> &SessionCore {
        self.inner.core()
    }

    fn core_mut(&mut self) -> &mut SessionCore {
        self.inner.core_mut()
    }

    fn device_type(&self) -> &str {
        self.inner.device_type()
    }

    // The wrapped vendor's dialect applies verbatim.

    fn newline(&self) -> &'static str {
        self.inner.newline()
    }

    fn prompt_terminators(&self) -> &'static str {
        self.inner.prompt_terminators()
    }

    fn config_enter_command(&self) -> Option<&'static str> {
        self.inner.config_enter_command()
    }

    fn config_exit_command(&self) -> Option<&'static str> {
        self.inner.config_exit_command()
    }

    fn commit_command(&self) -> Option<&'static str> {
        self.inner.commit_command()
    }

    fn paging_command(&self) -> Option<&'static str> {
        self.inner.paging_command()
    }

    fn terminal_width_command(&self) -> Option<&'static str> {
        self.inner.terminal_width_command()
    }

    fn current_config_command(&self) -> &'static str {
        self.inner.current_config_command()
    }

    fn save_command(&self) -> Option<&'static str> {
        self.inner.save_command()
    }

    fn reboot_command(&self) -> &'static str {
        self.inner.reboot_command()
    }

    fn requires_enable(&self) -> bool {
        self.inner.requires_enable()
    }

    fn logout_command(&self) -> Option<&'static str> {
        self.inner.logout_command()
    }

    fn error_patterns(&self) -> &'static [&'static str] {
        self.inner.error_patterns()
    }

    fn confirmation_pattern(&self) -> &'static Regex {
        self.inner.confirmation_pattern()
    }

    fn confirmation_reply(&self) -> &'static str {
        self.inner.confirmation_reply()
    }

    fn auth_username(&self) -> String {
        self.inner.auth_username()
    }

    fn normalize_learned_prompt(&self, line: &str) -> String {
        self.inner.normalize_learned_prompt(line)
    }

    fn is_config_prompt(&self, line: &str) -> bool {
        self.inner.is_config_prompt(line)
    }

    fn sanitize_output(&self, raw: &str, command: &str) -> String {
        self.inner.sanitize_output(raw, command)
    }

    fn transport_config(&self) -> TransportConfig {
        self.inner.transport_config()
    }

    fn pty_request(&self) -> PtyRequest {
        self.inner.pty_request()
    }

    fn attach_shell(&mut self, shell: Box<dyn ShellStream>) {
        self.inner.attach_shell(shell);
    }

    /// Establish the bastion leg and the tunneled target session.
    async fn connect(&mut self) -> Result<()> {
        if self.is_connected() {
            return Err(SessionError::AlreadyConnected.into());
        }
        self.link.establish(&mut self.inner).await
    }

    async fn connect_via(&mut self, transport: SshTransport) -> Result<()> {
        self.inner.connect_via(transport).await
    }

    async fn session_preparation(&mut self) -> Result<()> {
        self.inner.session_preparation().await
    }

    async fn set_base_prompt(&mut self) -> Result<String> {
        self.inner.set_base_prompt().await
    }

    async fn probe_banner(&mut self) -> Result<String> {
        self.inner.probe_banner().await
    }

    async fn before_command(&mut self) -> Result<()> {
        self.inner.before_command().await
    }

    async fn enter_enable_mode(&mut self) -> Result<()> {
        self.inner.enter_enable_mode().await
    }

    async fn enter_config_mode(&mut self) -> Result<()> {
        self.inner.enter_config_mode().await
    }

    async fn exit_config_mode(&mut self) -> Result<()> {
        self.inner.exit_config_mode().await
    }

    async fn send_command(&mut self, command: &str) -> Result<CommandResult> {
        self.inner.send_command(command).await
    }

    async fn send_config(&mut self, commands: &[String]) -> Result<CommandResult> {
        self.inner.send_config(commands).await
    }

    async fn get_current_config(&mut self) -> Result<CommandResult> {
        self.inner.get_current_config().await
    }

    async fn save_config(&mut self) -> Result<CommandResult> {
        self.inner.save_config().await
    }

    async fn reboot_device(&mut self) -> Result<CommandResult> {
        self.inner.reboot_device().await
    }

    /// Inner session first, then the bastion transport.
    async fn disconnect(&mut self) -> Result<()> {
        let inner_result = self.inner.disconnect().await;
        if let Err(e) = self.link.close().await {
            debug!("closing bastion transport failed: {}", e);
        }
        inner_result
    }

    fn is_connected(&self) -> bool {
        self.link.is_open() && self.inner.is_connected()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::Credentials;
    use crate::options::AdvancedOptions;
    use crate::vendors::LinuxSession;

    fn wrapped() -> JumpHostSession {
        let creds: Credentials = serde_json::from_str(
            r#"{
                "host": "10.0.0.9",
                "username": "admin",
                "auth": {"password": "pw"},
                "deviceType": "linux",
                "jumpHost": {
                    "host": "bastion",
                    "username": "jump",
                    "auth": {"password": "hop"}
                }
            }"#,
        )
        .unwrap();
        JumpHostSession::new(Box::new(LinuxSession::new(creds, AdvancedOptions::default())))
    }

    #[test]
    fn test_delegates_vendor_dialect() {
        let s = wrapped();
        assert_eq!(s.device_type(), "linux");
        assert!(s.config_enter_command().is_none());
        assert_eq!(s.reboot_command(), "sudo reboot");
    }

    #[test]
    fn test_not_connected_until_tunnel_exists() {
        let s = wrapped();
        assert!(!s.is_connected());
    }
}
