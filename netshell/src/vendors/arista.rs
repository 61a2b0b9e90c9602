//! Arista EOS sessions.
//!
//! EOS is IOS-like with two quirks: the config prompt can carry a
//! `(s1)`/`(s2)` configuration-stage marker, and a resized terminal makes
//! the device echo the command a second time.

use async_trait::async_trait;

use crate::credentials::Credentials;
use crate::options::AdvancedOptions;
use crate::sanitize;
use crate::session::{DeviceSession, SessionCore};

/// Session for Arista EOS devices.
pub struct AristaSession {
    core: SessionCore,
}

impl AristaSession {
    pub fn new(credentials: Credentials, options: AdvancedOptions) -> Self {
        Self {
            core: SessionCore::new(credentials, options),
        }
    }
}

#[async_trait]
impl DeviceSession for AristaSession {
    fn core(&self) -> &SessionCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SessionCore {
        &mut self.core
    }

    fn device_type(&self) -> &str {
        "arista_eos"
    }

    fn requires_enable(&self) -> bool {
        true
    }

    fn paging_command(&self) -> Option<&'static str> {
        Some("terminal length 0")
    }

    // The device answers with "Width set to 511 columns."
    fn terminal_width_command(&self) -> Option<&'static str> {
        Some("terminal width 511")
    }

    fn save_command(&self) -> Option<&'static str> {
        Some("write memory")
    }

    fn sanitize_output(&self, raw: &str, command: &str) -> String {
        let cleaned = sanitize::clean_output(
            raw,
            command,
            &self.core().prompt().base,
            self.prompt_terminators(),
        );
        let cleaned = sanitize::strip_tokens(&cleaned, &["(s1)", "(s2)"]);
        // Second echo of the command, if the device repeated it.
        sanitize::strip_command_echo(&cleaned, command)
            .trim()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> AristaSession {
        AristaSession::new(
            Credentials::password_login("10.0.0.3", "admin", "pw", "arista_eos"),
            AdvancedOptions::default(),
        )
    }

    #[test]
    fn test_dialect() {
        let s = session();
        assert_eq!(s.device_type(), "arista_eos");
        assert_eq!(s.config_enter_command(), Some("configure terminal"));
        assert_eq!(s.terminal_width_command(), Some("terminal width 511"));
    }

    #[test]
    fn test_sanitize_strips_stage_markers() {
        let mut s = session();
        s.core_mut().prompt.base = "switch".to_string();
        let raw = "show hostname\nswitch(s1)(config)# output line\nswitch#";
        let cleaned = s.sanitize_output(raw, "show hostname");
        assert!(!cleaned.contains("(s1)"));
        assert!(!cleaned.contains("(s2)"));
    }

    #[test]
    fn test_sanitize_deduplicates_echo() {
        let mut s = session();
        s.core_mut().prompt.base = "switch".to_string();
        let raw = "show version\nshow version\nArista DCS-7050\nswitch#";
        assert_eq!(s.sanitize_output(raw, "show version"), "Arista DCS-7050");
    }
}
