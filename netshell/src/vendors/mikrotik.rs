//! MikroTik RouterOS / SwOS sessions.
//!
//! RouterOS has no config mode; commands carry their full menu path. The
//! terminal is shaped at login by appending `+ct511w4098h` to the
//! username (plain terminal, 511 columns), and the prompt looks like
//! `[admin@MikroTik] >`.

use std::time::Duration;

use async_trait::async_trait;

use crate::credentials::Credentials;
use crate::options::AdvancedOptions;
use crate::session::{DeviceSession, SessionCore};

/// Username suffix requesting a plain 511-column terminal.
const USERNAME_SUFFIX: &str = "+ct511w4098h";

const MIKROTIK_ERROR_PATTERNS: &[&str] = &[
    "bad command name",
    "syntax error",
    "expected end of command",
    "no such item",
    "failure:",
];

/// Session for MikroTik RouterOS and SwOS devices.
pub struct MikrotikSession {
    core: SessionCore,
    tag: &'static str,
}

impl MikrotikSession {
    pub fn new(credentials: Credentials, options: AdvancedOptions, tag: &'static str) -> Self {
        Self {
            core: SessionCore::new(credentials, options),
            tag,
        }
    }
}

#[async_trait]
impl DeviceSession for MikrotikSession {
    fn core(&self) -> &SessionCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SessionCore {
        &mut self.core
    }

    fn device_type(&self) -> &str {
        self.tag
    }

    fn newline(&self) -> &'static str {
        "\r\n"
    }

    fn config_enter_command(&self) -> Option<&'static str> {
        None
    }

    fn config_exit_command(&self) -> Option<&'static str> {
        None
    }

    fn current_config_command(&self) -> &'static str {
        "/export"
    }

    fn save_command(&self) -> Option<&'static str> {
        Some("/system backup save name=backup")
    }

    fn reboot_command(&self) -> &'static str {
        "/system reboot"
    }

    fn logout_command(&self) -> Option<&'static str> {
        Some("/quit")
    }

    fn error_patterns(&self) -> &'static [&'static str] {
        MIKROTIK_ERROR_PATTERNS
    }

    /// Login name with the terminal-shaping suffix appended.
    fn auth_username(&self) -> String {
        let username = &self.core().credentials().username;
        if username.ends_with(USERNAME_SUFFIX) {
            username.clone()
        } else {
            format!("{}{}", username, USERNAME_SUFFIX)
        }
    }

    /// `[admin@MikroTik] >` learns as `[admin@MikroTik]`; the terminal
    /// suffix never belongs in the base prompt.
    fn normalize_learned_prompt(&self, line: &str) -> String {
        let trimmed = line.trim();
        let without_terminator = trimmed.strip_suffix('>').unwrap_or(trimmed).trim_end();
        without_terminator.replace(USERNAME_SUFFIX, "")
    }

    /// Answer the software-license question some builds ask at login.
    async fn session_preparation(&mut self) -> crate::error::Result<()> {
        let newline = self.newline();
        let channel = self.core_mut().channel_mut()?;
        if let Ok(early) = channel.read_channel(Duration::from_millis(300)).await {
            if early.to_lowercase().contains("license") {
                channel.write_channel(&format!("n{}", newline)).await?;
            }
        }
        self.prepare_common().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> MikrotikSession {
        MikrotikSession::new(
            Credentials::password_login("10.0.0.5", "admin", "pw", "mikrotik_routeros"),
            AdvancedOptions::default(),
            "mikrotik_routeros",
        )
    }

    #[test]
    fn test_auth_username_gets_suffix() {
        let s = session();
        assert_eq!(s.auth_username(), "admin+ct511w4098h");
        // The reported credentials keep the bare username
        assert_eq!(s.core().credentials().username, "admin");
    }

    #[test]
    fn test_auth_username_suffix_not_doubled() {
        let s = MikrotikSession::new(
            Credentials::password_login("h", "admin+ct511w4098h", "pw", "mikrotik_routeros"),
            AdvancedOptions::default(),
            "mikrotik_routeros",
        );
        assert_eq!(s.auth_username(), "admin+ct511w4098h");
    }

    #[test]
    fn test_prompt_learning() {
        let s = session();
        assert_eq!(
            s.normalize_learned_prompt("[admin@MikroTik] > "),
            "[admin@MikroTik]"
        );
        assert_eq!(
            s.normalize_learned_prompt("[admin+ct511w4098h@MikroTik] >"),
            "[admin@MikroTik]"
        );
    }

    #[test]
    fn test_dialect() {
        let s = session();
        assert_eq!(s.newline(), "\r\n");
        assert!(s.config_enter_command().is_none());
        assert_eq!(s.current_config_command(), "/export");
        assert_eq!(s.reboot_command(), "/system reboot");
    }
}
