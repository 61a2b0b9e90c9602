//! The polymorphic device session.
//!
//! `DeviceSession` is the capability set every vendor plugin implements:
//! connect, session preparation, command and configuration execution,
//! config fetch/save, reboot, and disconnect, plus the dialect hooks
//! (newline, config-mode verbs, paging, confirmations, prompt learning,
//! sanitization) that vendors override. The provided implementations
//! cover the common Cisco-like flow; a plugin overrides exactly its
//! deltas.

mod core;
mod prompt;

pub use core::SessionCore;
pub use prompt::{PromptModel, strip_prompt_terminator};

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use secrecy::ExposeSecret;
use tokio::time::Instant;

use crate::channel::{PROMPT_TERMINATORS, PromptWait, RusshShell, ShellStream, last_non_empty_line};
use crate::error::{ChannelError, Error, Result, SessionError};
use crate::result::CommandResult;
use crate::sanitize;
use crate::transport::{PtyRequest, SshTransport, TransportConfig};

/// Error substrings recognized in command output, lowercase.
pub const DEFAULT_ERROR_PATTERNS: &[&str] = &[
    "invalid command",
    "invalid input",
    "syntax error",
    "unknown command",
    "error:",
    "not found",
    "failed",
];

/// Default confirmation-dialog pattern, answered with `y`.
pub static DEFAULT_CONFIRMATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\[y(?:es)?/n(?:o)?\]|\(y/n\)|\[confirm\]|are you sure").unwrap()
});

static PASSWORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)password").unwrap());

/// Window the enable-password prompt is expected within.
const ENABLE_PASSWORD_WINDOW: Duration = Duration::from_secs(2);

/// A live interactive session against one device.
#[async_trait]
pub trait DeviceSession: Send {
    /// Shared session state.
    fn core(&self) -> &SessionCore;

    /// Shared session state, mutable.
    fn core_mut(&mut self) -> &mut SessionCore;

    /// The device-type tag this session was dispatched as.
    fn device_type(&self) -> &str;

    // ------------------------------------------------------------------
    // Dialect hooks
    // ------------------------------------------------------------------

    /// Line ending appended to every command.
    fn newline(&self) -> &'static str {
        "\n"
    }

    /// Characters accepted as prompt terminators.
    fn prompt_terminators(&self) -> &'static str {
        PROMPT_TERMINATORS
    }

    /// Command entering configuration mode; `None` when the vendor has no
    /// config mode and configuration statements are sent directly.
    fn config_enter_command(&self) -> Option<&'static str> {
        Some("configure terminal")
    }

    /// Command leaving configuration mode.
    fn config_exit_command(&self) -> Option<&'static str> {
        Some("end")
    }

    /// Commit verb for commit-based vendors, issued before config exit.
    fn commit_command(&self) -> Option<&'static str> {
        None
    }

    /// Command disabling the output pager.
    fn paging_command(&self) -> Option<&'static str> {
        None
    }

    /// Command widening the terminal.
    fn terminal_width_command(&self) -> Option<&'static str> {
        None
    }

    /// Command printing the running configuration.
    fn current_config_command(&self) -> &'static str {
        "show running-config"
    }

    /// Command persisting the configuration, when the vendor has one.
    fn save_command(&self) -> Option<&'static str> {
        None
    }

    /// Command rebooting the device.
    fn reboot_command(&self) -> &'static str {
        "reload"
    }

    /// Whether privileged (enable) mode gates configuration.
    fn requires_enable(&self) -> bool {
        false
    }

    /// Graceful logout command issued on disconnect.
    fn logout_command(&self) -> Option<&'static str> {
        Some("exit")
    }

    /// Error substrings (lowercase) that mark a command as failed.
    fn error_patterns(&self) -> &'static [&'static str] {
        DEFAULT_ERROR_PATTERNS
    }

    /// Pattern recognizing confirmation dialogs.
    fn confirmation_pattern(&self) -> &'static Regex {
        &DEFAULT_CONFIRMATION_RE
    }

    /// Reply sent when a confirmation dialog appears. An empty reply sends
    /// a bare line ending (Cisco's `[confirm]`).
    fn confirmation_reply(&self) -> &'static str {
        "y"
    }

    /// Username presented to the SSH server. MikroTik appends terminal
    /// geometry here; everyone else logs in as-is.
    fn auth_username(&self) -> String {
        self.core().credentials.username.clone()
    }

    /// Reduce a learned prompt line to the base prompt.
    fn normalize_learned_prompt(&self, line: &str) -> String {
        strip_prompt_terminator(line).to_string()
    }

    /// Whether a prompt line indicates configuration mode.
    fn is_config_prompt(&self, line: &str) -> bool {
        let line = line.trim_end();
        line.contains("(config") || line.ends_with(")#")
    }

    /// Sanitize raw command output.
    fn sanitize_output(&self, raw: &str, command: &str) -> String {
        sanitize::clean_output(
            raw,
            command,
            &self.core().prompt.base,
            self.prompt_terminators(),
        )
    }

    /// Hook run before each `send_command` exchange. Extreme EXOS re-learns
    /// its mutating prompt here.
    async fn before_command(&mut self) -> Result<()> {
        Ok(())
    }

    // ------------------------------------------------------------------
    // Connection lifecycle
    // ------------------------------------------------------------------

    /// Transport parameters derived from the credentials.
    fn transport_config(&self) -> TransportConfig {
        TransportConfig::from_credentials(
            &self.core().credentials,
            self.auth_username(),
            self.core().options.connection_timeout(),
        )
    }

    /// PTY geometry requested for the shell.
    fn pty_request(&self) -> PtyRequest {
        PtyRequest::default()
    }

    /// Establish the transport, open the shell, and prepare the session.
    async fn connect(&mut self) -> Result<()> {
        if self.core().is_connected() {
            return Err(SessionError::AlreadyConnected.into());
        }
        let config = self.transport_config();
        let transport = SshTransport::connect(&config).await?;
        self.connect_via(transport).await
    }

    /// Finish connecting over an already-authenticated transport.
    ///
    /// The jump-host wrapper calls this with the tunneled transport.
    async fn connect_via(&mut self, transport: SshTransport) -> Result<()> {
        let pty = self.pty_request();
        let channel = transport.open_shell(&pty).await?;
        self.core_mut()
            .attach(Some(transport), Box::new(RusshShell::new(channel)));

        // Let the device finish printing its banner before we talk.
        tokio::time::sleep(self.core().options.settle_interval()).await;

        self.session_preparation().await
    }

    /// Attach an externally created shell (tests, tunneled channels).
    fn attach_shell(&mut self, shell: Box<dyn ShellStream>) {
        self.core_mut().attach(None, shell);
    }

    /// Learn the prompt and apply terminal settings.
    ///
    /// Preparation succeeds iff the base prompt is learned; pager and width
    /// setup are best-effort. Fast mode stops after the prompt. Vendors with
    /// extra ritual override this and usually still call `prepare_common`.
    async fn session_preparation(&mut self) -> Result<()> {
        self.prepare_common().await
    }

    /// The standard preparation steps: learn the prompt, then best-effort
    /// privilege escalation, pager, and width setup.
    async fn prepare_common(&mut self) -> Result<()> {
        self.set_base_prompt().await?;

        if self.core().options.fast_mode {
            return Ok(());
        }

        if self.requires_enable() {
            if let Err(e) = self.enter_enable_mode().await {
                warn!("{}: could not enter enable mode: {}", self.device_type(), e);
            }
        }

        if let Some(cmd) = self.paging_command() {
            if let Err(e) = self.run_exchange(cmd).await {
                debug!("{}: disable paging failed: {}", self.device_type(), e);
            }
        }

        if let Some(cmd) = self.terminal_width_command() {
            if let Err(e) = self.run_exchange(cmd).await {
                debug!("{}: set terminal width failed: {}", self.device_type(), e);
            }
        }

        Ok(())
    }

    /// Elicit a prompt with a bare line ending and learn the base prompt.
    async fn set_base_prompt(&mut self) -> Result<String> {
        let newline = self.newline();
        let terminators = self.prompt_terminators();
        let timeout = self.core().options.command_timeout();

        let channel = self.core_mut().channel_mut()?;
        channel.write_channel(newline).await?;

        let wait = PromptWait {
            expect: None,
            base: None,
            terminators,
            fast: true,
        };
        let output = channel.read_until_prompt(wait, timeout).await?;

        let line = last_non_empty_line(&output)
            .ok_or(ChannelError::PromptNotFound)?
            .to_string();
        let base = self.normalize_learned_prompt(&line);
        if base.is_empty() {
            return Err(ChannelError::PromptNotFound.into());
        }

        debug!("{}: base prompt is {:?}", self.device_type(), base);
        let core = self.core_mut();
        core.banner.push_str(&output);
        core.prompt.base = base.clone();
        Ok(base)
    }

    /// Write a bare line ending and collect whatever the device prints.
    ///
    /// Used by auto-detection; the result includes everything captured
    /// since login, not just this probe.
    async fn probe_banner(&mut self) -> Result<String> {
        let newline = self.newline();
        let channel = self.core_mut().channel_mut()?;
        channel.write_channel(newline).await?;

        let mut collected = String::new();
        for _ in 0..8 {
            match channel.read_channel(Duration::from_millis(150)).await {
                Ok(chunk) if chunk.is_empty() => {
                    if !collected.is_empty() {
                        break;
                    }
                }
                Ok(chunk) => collected.push_str(&chunk),
                Err(_) => break,
            }
        }

        let core = self.core_mut();
        core.banner.push_str(&collected);
        Ok(core.banner.clone())
    }

    /// Exit config mode if needed, log out gracefully, and release the
    /// transport. Calling this on a disconnected session is a no-op.
    async fn disconnect(&mut self) -> Result<()> {
        if self.core().is_connected() {
            if self.core().in_config_mode {
                if let Err(e) = self.exit_config_mode().await {
                    debug!("{}: exit config on disconnect failed: {}", self.device_type(), e);
                }
            }
            if let Some(cmd) = self.logout_command() {
                let newline = self.newline();
                if let Ok(channel) = self.core_mut().channel_mut() {
                    let _ = channel.write_channel(&format!("{}{}", cmd, newline)).await;
                }
            }
        }
        self.core_mut().teardown().await;
        Ok(())
    }

    /// Whether the session is connected and usable.
    fn is_connected(&self) -> bool {
        self.core().is_connected()
    }

    // ------------------------------------------------------------------
    // Mode transitions
    // ------------------------------------------------------------------

    /// Escalate to privileged mode via `enable`.
    ///
    /// A password dialog appearing within 2 seconds is answered with the
    /// enable password; the `#` terminator confirms the transition.
    async fn enter_enable_mode(&mut self) -> Result<()> {
        if !self.requires_enable() || self.core().in_enable_mode {
            return Ok(());
        }

        let newline = self.newline();
        let terminators = self.prompt_terminators();
        let base = self.core().prompt.base.clone();
        let timeout = self.core().options.command_timeout();

        let channel = self.core_mut().channel_mut()?;
        channel.write_channel(&format!("enable{}", newline)).await?;

        let wait = PromptWait {
            expect: None,
            base: Some(&base),
            terminators,
            fast: false,
        };

        let output = match channel.read_until_prompt(wait, ENABLE_PASSWORD_WINDOW).await {
            Ok(output) => output,
            Err(Error::Channel(ChannelError::PromptTimeout { partial, .. }))
                if PASSWORD_RE.is_match(&partial) =>
            {
                let secret = self
                    .core()
                    .credentials
                    .enable_password
                    .clone()
                    .ok_or_else(|| SessionError::EnableFailed {
                        message: "device asked for an enable password but none was supplied"
                            .to_string(),
                    })?;

                let channel = self.core_mut().channel_mut()?;
                channel
                    .write_channel(&format!("{}{}", secret.expose_secret(), newline))
                    .await?;
                channel.read_until_prompt(wait, timeout).await?
            }
            Err(e) => return Err(e),
        };

        let line = last_non_empty_line(&output).unwrap_or_default().trim_end();
        if !line.ends_with('#') {
            return Err(SessionError::EnableFailed {
                message: format!("prompt did not turn privileged: {:?}", line),
            }
            .into());
        }

        let core = self.core_mut();
        core.in_enable_mode = true;
        core.prompt.enabled_prompt = Some(line.to_string());
        Ok(())
    }

    /// Enter configuration mode, escalating privilege first when required.
    async fn enter_config_mode(&mut self) -> Result<()> {
        let Some(command) = self.config_enter_command() else {
            return Ok(());
        };
        if self.core().in_config_mode {
            return Ok(());
        }

        if self.requires_enable() {
            self.enter_enable_mode().await?;
        }

        let output = self.run_exchange(command).await?;
        let line = last_non_empty_line(&output).unwrap_or_default().to_string();
        if !self.is_config_prompt(&line) {
            return Err(SessionError::ConfigMode {
                message: format!("no config prompt after {:?}: {:?}", command, line),
            }
            .into());
        }

        let core = self.core_mut();
        core.in_config_mode = true;
        core.prompt.config_prompt = Some(line.trim().to_string());
        Ok(())
    }

    /// Leave configuration mode.
    async fn exit_config_mode(&mut self) -> Result<()> {
        if !self.core().in_config_mode {
            return Ok(());
        }
        let Some(command) = self.config_exit_command() else {
            // Commit verbs that also exit (Juniper's `commit and-quit`)
            // leave nothing to send here.
            self.core_mut().in_config_mode = false;
            return Ok(());
        };

        let output = self.run_exchange_with_confirmation(command).await?;
        let line = last_non_empty_line(&output).unwrap_or_default().to_string();
        if self.is_config_prompt(&line) {
            return Err(SessionError::ConfigMode {
                message: format!("still at a config prompt after {:?}", command),
            }
            .into());
        }

        let core = self.core_mut();
        core.in_config_mode = false;
        core.prompt.config_prompt = None;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Exchanges
    // ------------------------------------------------------------------

    /// Write a command and read raw output until the prompt returns.
    async fn run_exchange(&mut self, command: &str) -> Result<String> {
        let timeout = self.core().options.command_timeout();
        self.run_exchange_with_timeout(command, timeout).await
    }

    /// `run_exchange` with an explicit deadline.
    async fn run_exchange_with_timeout(
        &mut self,
        command: &str,
        timeout: Duration,
    ) -> Result<String> {
        let newline = self.newline();
        let terminators = self.prompt_terminators();
        let fast = self.core().options.fast_mode;
        let base = self.core().prompt.base.clone();

        let channel = self.core_mut().channel_mut()?;
        channel
            .write_channel(&format!("{}{}", command, newline))
            .await?;

        let wait = PromptWait {
            expect: None,
            base: if base.is_empty() { None } else { Some(&base) },
            terminators,
            fast,
        };
        channel.read_until_prompt(wait, timeout).await
    }

    /// Like `run_exchange`, answering confirmation dialogs along the way.
    async fn run_exchange_with_confirmation(&mut self, command: &str) -> Result<String> {
        let newline = self.newline();
        let terminators = self.prompt_terminators();
        let fast = self.core().options.fast_mode;
        let base = self.core().prompt.base.clone();
        let timeout = self.core().options.command_timeout();
        let confirm = self.confirmation_pattern();
        let reply = self.confirmation_reply();

        let channel = self.core_mut().channel_mut()?;
        channel
            .write_channel(&format!("{}{}", command, newline))
            .await?;

        let wait = PromptWait {
            expect: None,
            base: if base.is_empty() { None } else { Some(&base) },
            terminators,
            fast,
        };

        let deadline = Instant::now() + timeout;
        let mut collected = String::new();
        // Dialog text stays in the buffer after we answer it; only look at
        // output that arrived since the last reply.
        let mut answered_up_to = 0;

        loop {
            let now = Instant::now();
            if now >= deadline {
                return Err(ChannelError::PromptTimeout {
                    partial: collected,
                    timeout,
                }
                .into());
            }

            let chunk = channel
                .read_channel(Duration::from_millis(100).min(deadline - now))
                .await?;
            if chunk.is_empty() {
                continue;
            }
            collected.push_str(&chunk);

            if wait.matches(&collected) {
                return Ok(collected);
            }

            if let Some(line) = last_non_empty_line(&collected[answered_up_to..]) {
                if confirm.is_match(line) {
                    debug!("answering confirmation dialog: {:?}", line.trim());
                    channel
                        .write_channel(&format!("{}{}", reply, newline))
                        .await?;
                    answered_up_to = collected.len();
                }
            }
        }
    }

    /// Execute one command: exchange, sanitize, scan for error patterns.
    async fn run_command(&mut self, command: &str) -> Result<String> {
        let raw = self.run_exchange(command).await?;
        let clean = self.sanitize_output(&raw, command);
        self.scan_for_errors(command, &clean)?;
        Ok(clean)
    }

    /// Check sanitized output against the vendor error patterns.
    fn scan_for_errors(&self, command: &str, output: &str) -> Result<()> {
        let lower = output.to_lowercase();
        for pattern in self.error_patterns() {
            if lower.contains(pattern) {
                return Err(SessionError::Command {
                    command: command.to_string(),
                    message: format!("output matched error pattern {:?}", pattern),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Fold an error into a failed `CommandResult`, or surface it when
    /// `failOnError` is set.
    fn failure_result(
        &self,
        command: &str,
        output: String,
        error: Error,
        started: Instant,
    ) -> Result<CommandResult> {
        if self.core().options.fail_on_error {
            return Err(error);
        }
        let output = match &error {
            Error::Channel(ChannelError::PromptTimeout { partial, .. }) if output.is_empty() => {
                partial.clone()
            }
            _ => output,
        };
        Ok(CommandResult::failed(
            command,
            output,
            error.to_string(),
            self.device_type(),
            &self.core().credentials.host,
        )
        .with_elapsed(started.elapsed()))
    }

    // ------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------

    /// Send one command and return its sanitized output. Does not enter
    /// configuration mode.
    async fn send_command(&mut self, command: &str) -> Result<CommandResult> {
        let started = Instant::now();
        if let Err(e) = self.before_command().await {
            return self.failure_result(command, String::new(), e, started);
        }
        match self.run_command(command).await {
            Ok(output) => Ok(CommandResult::ok(
                command,
                output,
                self.device_type(),
                &self.core().credentials.host,
            )
            .with_elapsed(started.elapsed())),
            Err(e) => self.failure_result(command, String::new(), e, started),
        }
    }

    /// Apply a sequence of configuration statements.
    ///
    /// Enters config mode (when the vendor has one), sends each statement,
    /// commits on commit-based vendors, and exits. The first statement
    /// whose output matches an error pattern stops the run; config mode is
    /// still exited before returning.
    async fn send_config(&mut self, commands: &[String]) -> Result<CommandResult> {
        let started = Instant::now();
        let label = commands.join("; ");

        if commands.is_empty() {
            return Ok(CommandResult::ok(
                label,
                String::new(),
                self.device_type(),
                &self.core().credentials.host,
            ));
        }

        if let Err(e) = self.before_command().await {
            return self.failure_result(&label, String::new(), e, started);
        }
        if let Err(e) = self.enter_config_mode().await {
            return self.failure_result(&label, String::new(), e, started);
        }

        let mut outputs: Vec<String> = Vec::with_capacity(commands.len());
        let mut failure: Option<Error> = None;

        for command in commands {
            match self.run_command(command).await {
                Ok(output) => outputs.push(output),
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }

        if failure.is_none() {
            if let Some(commit) = self.commit_command() {
                match self.run_command(commit).await {
                    Ok(output) => outputs.push(output),
                    Err(Error::Session(SessionError::Command { message, .. })) => {
                        failure = Some(SessionError::Commit { message }.into());
                    }
                    Err(e) => failure = Some(e),
                }
            }
        }

        if let Err(e) = self.exit_config_mode().await {
            if failure.is_none() {
                failure = Some(e);
            } else {
                warn!("{}: exit config after failure also failed: {}", self.device_type(), e);
            }
        }

        let output = outputs
            .iter()
            .filter(|o| !o.is_empty())
            .cloned()
            .collect::<Vec<_>>()
            .join("\n");

        match failure {
            None => Ok(CommandResult::ok(
                label,
                output,
                self.device_type(),
                &self.core().credentials.host,
            )
            .with_elapsed(started.elapsed())),
            Some(e) => self.failure_result(&label, output, e, started),
        }
    }

    /// Fetch the running configuration.
    async fn get_current_config(&mut self) -> Result<CommandResult> {
        let started = Instant::now();
        let command = self.current_config_command();

        if self.requires_enable() {
            if let Err(e) = self.enter_enable_mode().await {
                return self.failure_result(command, String::new(), e, started);
            }
        }

        // Whole configurations take longer than ordinary commands.
        let timeout = self.core().options.command_timeout() * 3;
        let result = async {
            let raw = self.run_exchange_with_timeout(command, timeout).await?;
            let clean = self.sanitize_output(&raw, command);
            self.scan_for_errors(command, &clean)?;
            Ok::<_, Error>(clean)
        }
        .await;

        match result {
            Ok(output) => Ok(CommandResult::ok(
                command,
                output,
                self.device_type(),
                &self.core().credentials.host,
            )
            .with_elapsed(started.elapsed())),
            Err(e) => self.failure_result(command, String::new(), e, started),
        }
    }

    /// Persist the configuration, answering confirmation dialogs.
    async fn save_config(&mut self) -> Result<CommandResult> {
        let started = Instant::now();
        let Some(command) = self.save_command() else {
            let error: Error = SessionError::Unsupported {
                device_type: self.device_type().to_string(),
                operation: "saveConfig",
            }
            .into();
            return self.failure_result("saveConfig", String::new(), error, started);
        };

        if self.requires_enable() {
            if let Err(e) = self.enter_enable_mode().await {
                return self.failure_result(command, String::new(), e, started);
            }
        }

        match self.run_exchange_with_confirmation(command).await {
            Ok(raw) => {
                let output = self.sanitize_output(&raw, command);
                Ok(CommandResult::ok(
                    command,
                    output,
                    self.device_type(),
                    &self.core().credentials.host,
                )
                .with_elapsed(started.elapsed()))
            }
            Err(e) => self.failure_result(command, String::new(), e, started),
        }
    }

    /// Persist by running a command inside configuration mode.
    ///
    /// Commit-based vendors save with `commit`, VyOS-family devices with
    /// `save`; both run at the config prompt.
    async fn save_via_config_command(&mut self, command: &str) -> Result<CommandResult> {
        let started = Instant::now();
        if let Err(e) = self.enter_config_mode().await {
            return self.failure_result(command, String::new(), e, started);
        }
        let saved = self.run_command(command).await;
        if let Err(e) = self.exit_config_mode().await {
            debug!("{}: exit config after save failed: {}", self.device_type(), e);
        }
        match saved {
            Ok(output) => Ok(CommandResult::ok(
                command,
                output,
                self.device_type(),
                &self.core().credentials.host,
            )
            .with_elapsed(started.elapsed())),
            Err(e) => self.failure_result(command, String::new(), e, started),
        }
    }

    /// Reboot the device.
    ///
    /// The operation succeeds as soon as the confirmation is accepted (or a
    /// prompt returns); it does not wait for the device to come back, and
    /// the session is unusable afterwards.
    async fn reboot_device(&mut self) -> Result<CommandResult> {
        let started = Instant::now();
        let command = self.reboot_command();

        if self.requires_enable() {
            if let Err(e) = self.enter_enable_mode().await {
                return self.failure_result(command, String::new(), e, started);
            }
        }

        let newline = self.newline();
        let terminators = self.prompt_terminators();
        let base = self.core().prompt.base.clone();
        let timeout = self.core().options.command_timeout();
        let confirm = self.confirmation_pattern();
        let reply = self.confirmation_reply();
        let device_type = self.device_type().to_string();
        let host = self.core().credentials.host.clone();

        let channel = match self.core_mut().channel_mut() {
            Ok(c) => c,
            Err(e) => return self.failure_result(command, String::new(), e, started),
        };
        if let Err(e) = channel.write_channel(&format!("{}{}", command, newline)).await {
            return self.failure_result(command, String::new(), e, started);
        }

        let wait = PromptWait {
            expect: None,
            base: if base.is_empty() { None } else { Some(&base) },
            terminators,
            fast: false,
        };

        let deadline = Instant::now() + timeout;
        let mut collected = String::new();
        let mut confirmed = false;
        loop {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            let chunk = match channel
                .read_channel(Duration::from_millis(100).min(deadline - now))
                .await
            {
                Ok(chunk) => chunk,
                // The device tearing the channel down mid-reboot is expected.
                Err(_) => break,
            };
            if chunk.is_empty() {
                continue;
            }
            collected.push_str(&chunk);

            if let Some(line) = last_non_empty_line(&collected) {
                if confirm.is_match(line) {
                    let _ = channel.write_channel(&format!("{}{}", reply, newline)).await;
                    confirmed = true;
                    break;
                }
            }
            if wait.matches(&collected) {
                break;
            }
        }

        // The transport is not expected to survive; keep it out of the pool.
        self.core_mut().mark_unhealthy();

        // A dialog we could not answer means the reboot never started.
        let unanswered_dialog = !confirmed
            && last_non_empty_line(&collected)
                .map(|line| {
                    let line = line.trim_end();
                    line.ends_with('?') || line.ends_with(':')
                })
                .unwrap_or(false);
        if unanswered_dialog {
            let error: Error = SessionError::ConfirmationMismatch {
                expected: confirm.as_str().to_string(),
                got: last_non_empty_line(&collected).unwrap_or_default().to_string(),
            }
            .into();
            return self.failure_result(command, collected, error, started);
        }

        Ok(CommandResult::ok(command, collected, device_type, host)
            .with_elapsed(started.elapsed()))
    }
}
