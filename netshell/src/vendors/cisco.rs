//! Cisco family sessions.
//!
//! `CiscoIosSession` covers the classic IOS dialect shared by IOS, IOS-XE,
//! NX-OS, and ASA: enable mode, `configure terminal`/`end`, `terminal
//! length 0`, `write memory`. IOS-XR is commit-based and SG-300 runs the
//! small-business CLI; each gets its own type.

use async_trait::async_trait;

use crate::credentials::Credentials;
use crate::error::Result;
use crate::options::AdvancedOptions;
use crate::result::CommandResult;
use crate::session::{DeviceSession, SessionCore};

/// Session for IOS-style Cisco devices (IOS, IOS-XE, NX-OS, ASA).
pub struct CiscoIosSession {
    core: SessionCore,
    tag: &'static str,
}

impl CiscoIosSession {
    pub fn new(credentials: Credentials, options: AdvancedOptions, tag: &'static str) -> Self {
        Self {
            core: SessionCore::new(credentials, options),
            tag,
        }
    }
}

#[async_trait]
impl DeviceSession for CiscoIosSession {
    fn core(&self) -> &SessionCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SessionCore {
        &mut self.core
    }

    fn device_type(&self) -> &str {
        self.tag
    }

    fn requires_enable(&self) -> bool {
        true
    }

    fn paging_command(&self) -> Option<&'static str> {
        Some("terminal length 0")
    }

    fn terminal_width_command(&self) -> Option<&'static str> {
        Some("terminal width 511")
    }

    fn save_command(&self) -> Option<&'static str> {
        Some("write memory")
    }

    // `[confirm]` and `Destination filename [startup-config]?` both take a
    // bare carriage return.
    fn confirmation_reply(&self) -> &'static str {
        ""
    }
}

/// Session for commit-based Cisco IOS-XR devices.
pub struct CiscoXrSession {
    core: SessionCore,
}

impl CiscoXrSession {
    pub fn new(credentials: Credentials, options: AdvancedOptions) -> Self {
        Self {
            core: SessionCore::new(credentials, options),
        }
    }
}

#[async_trait]
impl DeviceSession for CiscoXrSession {
    fn core(&self) -> &SessionCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SessionCore {
        &mut self.core
    }

    fn device_type(&self) -> &str {
        "cisco_ios_xr"
    }

    fn requires_enable(&self) -> bool {
        true
    }

    fn config_enter_command(&self) -> Option<&'static str> {
        Some("configure")
    }

    fn commit_command(&self) -> Option<&'static str> {
        Some("commit")
    }

    fn paging_command(&self) -> Option<&'static str> {
        Some("terminal length 0")
    }

    fn terminal_width_command(&self) -> Option<&'static str> {
        Some("terminal width 511")
    }

    /// Persisting on IOS-XR means committing the target configuration.
    async fn save_config(&mut self) -> Result<CommandResult> {
        self.save_via_config_command("commit").await
    }
}

/// Session for Cisco SG-300 small-business switches.
pub struct CiscoSg300Session {
    core: SessionCore,
}

impl CiscoSg300Session {
    pub fn new(credentials: Credentials, options: AdvancedOptions) -> Self {
        Self {
            core: SessionCore::new(credentials, options),
        }
    }
}

#[async_trait]
impl DeviceSession for CiscoSg300Session {
    fn core(&self) -> &SessionCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SessionCore {
        &mut self.core
    }

    fn device_type(&self) -> &str {
        "cisco_sg300"
    }

    fn config_enter_command(&self) -> Option<&'static str> {
        Some("configure")
    }

    fn paging_command(&self) -> Option<&'static str> {
        Some("terminal datadump")
    }

    fn save_command(&self) -> Option<&'static str> {
        Some("write memory")
    }

    fn confirmation_reply(&self) -> &'static str {
        "y"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> CiscoIosSession {
        CiscoIosSession::new(
            Credentials::password_login("10.0.0.1", "admin", "pw", "cisco_ios"),
            AdvancedOptions::default(),
            "cisco_ios",
        )
    }

    #[test]
    fn test_dialect() {
        let s = session();
        assert_eq!(s.device_type(), "cisco_ios");
        assert!(s.requires_enable());
        assert_eq!(s.config_enter_command(), Some("configure terminal"));
        assert_eq!(s.config_exit_command(), Some("end"));
        assert_eq!(s.paging_command(), Some("terminal length 0"));
        assert_eq!(s.save_command(), Some("write memory"));
        assert_eq!(s.newline(), "\n");
    }

    #[test]
    fn test_config_prompt_detection() {
        let s = session();
        assert!(s.is_config_prompt("Router(config)# "));
        assert!(s.is_config_prompt("Router(config-if)#"));
        assert!(!s.is_config_prompt("Router# "));
        assert!(!s.is_config_prompt("Router> "));
    }

    #[test]
    fn test_sanitize_round_trip() {
        let mut s = session();
        s.core_mut().prompt.base = "Router".to_string();
        let raw = "show version\r\nCisco IOS Software\r\nRouter#";
        assert_eq!(s.sanitize_output(raw, "show version"), "Cisco IOS Software");
    }

    #[test]
    fn test_xr_is_commit_based() {
        let s = CiscoXrSession::new(
            Credentials::password_login("h", "u", "p", "cisco_ios_xr"),
            AdvancedOptions::default(),
        );
        assert_eq!(s.config_enter_command(), Some("configure"));
        assert_eq!(s.commit_command(), Some("commit"));
        assert_eq!(s.config_exit_command(), Some("end"));
    }
}
