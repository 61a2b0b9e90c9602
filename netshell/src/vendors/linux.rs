//! Linux host sessions.
//!
//! The simplest dialect: `$`/`#` prompts, no config mode, no pager, no
//! saved configuration. Reboot goes through `sudo`, answering the password
//! prompt with the login password.

use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use secrecy::ExposeSecret;
use tokio::time::Instant;

use crate::channel::last_non_empty_line;
use crate::credentials::{AuthMethod, Credentials};
use crate::error::{Result, SessionError};
use crate::options::AdvancedOptions;
use crate::result::CommandResult;
use crate::session::{DeviceSession, SessionCore};

static SUDO_PASSWORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)password(?: for \S+)?\s*:").unwrap());

const LINUX_ERROR_PATTERNS: &[&str] = &[
    "command not found",
    "no such file or directory",
    "permission denied",
    "operation not permitted",
];

/// Session for Linux hosts.
pub struct LinuxSession {
    core: SessionCore,
}

impl LinuxSession {
    pub fn new(credentials: Credentials, options: AdvancedOptions) -> Self {
        Self {
            core: SessionCore::new(credentials, options),
        }
    }
}

#[async_trait]
impl DeviceSession for LinuxSession {
    fn core(&self) -> &SessionCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SessionCore {
        &mut self.core
    }

    fn device_type(&self) -> &str {
        "linux"
    }

    fn config_enter_command(&self) -> Option<&'static str> {
        None
    }

    fn config_exit_command(&self) -> Option<&'static str> {
        None
    }

    // Best-effort; plenty of appliances with a Linux shell lack stty.
    fn terminal_width_command(&self) -> Option<&'static str> {
        Some("stty cols 511")
    }

    fn reboot_command(&self) -> &'static str {
        "sudo reboot"
    }

    fn error_patterns(&self) -> &'static [&'static str] {
        LINUX_ERROR_PATTERNS
    }

    async fn get_current_config(&mut self) -> Result<CommandResult> {
        let started = Instant::now();
        let error = SessionError::Unsupported {
            device_type: self.device_type().to_string(),
            operation: "getCurrentConfig",
        };
        self.failure_result("getCurrentConfig", String::new(), error.into(), started)
    }

    async fn save_config(&mut self) -> Result<CommandResult> {
        let started = Instant::now();
        let error = SessionError::Unsupported {
            device_type: self.device_type().to_string(),
            operation: "saveConfig",
        };
        self.failure_result("saveConfig", String::new(), error.into(), started)
    }

    /// `sudo reboot`, answering the sudo password prompt with the login
    /// password. Succeeds as soon as the reboot is underway.
    async fn reboot_device(&mut self) -> Result<CommandResult> {
        let started = Instant::now();
        let command = self.reboot_command();
        let newline = self.newline();
        let timeout = self.core().options().command_timeout();
        let host = self.core().credentials().host.clone();

        let password = match &self.core().credentials().auth {
            AuthMethod::Password(p) => Some(p.expose_secret().to_string()),
            _ => None,
        };

        let channel = match self.core_mut().channel_mut() {
            Ok(c) => c,
            Err(e) => return self.failure_result(command, String::new(), e, started),
        };
        if let Err(e) = channel
            .write_channel(&format!("{}{}", command, newline))
            .await
        {
            return self.failure_result(command, String::new(), e, started);
        }

        let deadline = Instant::now() + timeout;
        let mut collected = String::new();
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
                Err(_) => break,
            };
            if chunk.is_empty() {
                continue;
            }
            collected.push_str(&chunk);

            if let Some(line) = last_non_empty_line(&collected) {
                if SUDO_PASSWORD_RE.is_match(line) {
                    let Some(ref password) = password else {
                        break;
                    };
                    let _ = channel
                        .write_channel(&format!("{}{}", password, newline))
                        .await;
                    break;
                }
            }
        }

        self.core_mut().mark_unhealthy();
        Ok(CommandResult::ok(command, collected, "linux", host).with_elapsed(started.elapsed()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect() {
        let s = LinuxSession::new(
            Credentials::password_login("host", "user", "pw", "linux"),
            AdvancedOptions::default(),
        );
        assert!(s.config_enter_command().is_none());
        assert!(s.save_command().is_none());
        assert!(!s.requires_enable());
        assert_eq!(s.reboot_command(), "sudo reboot");
    }

    #[test]
    fn test_sudo_password_prompt_matches() {
        assert!(SUDO_PASSWORD_RE.is_match("[sudo] password for user:"));
        assert!(SUDO_PASSWORD_RE.is_match("Password:"));
        assert!(!SUDO_PASSWORD_RE.is_match("passwordless sudo enabled"));
    }

    #[test]
    fn test_error_patterns() {
        let s = LinuxSession::new(
            Credentials::password_login("host", "user", "pw", "linux"),
            AdvancedOptions::default(),
        );
        assert!(s.error_patterns().contains(&"command not found"));
        assert!(s.error_patterns().contains(&"permission denied"));
    }
}
