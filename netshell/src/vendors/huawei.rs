//! Huawei VRP sessions.
//!
//! VRP wraps its prompts in angle brackets (`<HOST>` in user view) and
//! square brackets (`[HOST]` in system view), so `]` joins the terminator
//! set and the learned base is the text inside the brackets. Saving asks
//! `Are you sure to continue?[Y/N]`, answered `y`.

use async_trait::async_trait;

use crate::credentials::Credentials;
use crate::options::AdvancedOptions;
use crate::sanitize;
use crate::session::{DeviceSession, SessionCore};

/// Session for Huawei VRP devices.
pub struct HuaweiSession {
    core: SessionCore,
}

impl HuaweiSession {
    pub fn new(credentials: Credentials, options: AdvancedOptions) -> Self {
        Self {
            core: SessionCore::new(credentials, options),
        }
    }
}

#[async_trait]
impl DeviceSession for HuaweiSession {
    fn core(&self) -> &SessionCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SessionCore {
        &mut self.core
    }

    fn device_type(&self) -> &str {
        "huawei_vrp"
    }

    fn prompt_terminators(&self) -> &'static str {
        "#>$%]"
    }

    fn config_enter_command(&self) -> Option<&'static str> {
        Some("system-view")
    }

    fn config_exit_command(&self) -> Option<&'static str> {
        Some("return")
    }

    fn paging_command(&self) -> Option<&'static str> {
        Some("screen-length 0 temporary")
    }

    fn terminal_width_command(&self) -> Option<&'static str> {
        Some("screen-width 300")
    }

    fn current_config_command(&self) -> &'static str {
        "display current-configuration"
    }

    fn save_command(&self) -> Option<&'static str> {
        Some("save")
    }

    fn reboot_command(&self) -> &'static str {
        "reboot"
    }

    fn logout_command(&self) -> Option<&'static str> {
        Some("quit")
    }

    fn normalize_learned_prompt(&self, line: &str) -> String {
        let trimmed = line.trim();
        let inner = trimmed
            .strip_prefix('<')
            .and_then(|s| s.strip_suffix('>'))
            .or_else(|| trimmed.strip_prefix('[').and_then(|s| s.strip_suffix(']')))
            .unwrap_or(trimmed);
        inner.trim().to_string()
    }

    fn is_config_prompt(&self, line: &str) -> bool {
        let line = line.trim();
        line.starts_with('[') && line.ends_with(']')
    }

    fn sanitize_output(&self, raw: &str, command: &str) -> String {
        let base = self.core().prompt().base.clone();
        let cleaned = sanitize::clean_output(raw, command, &base, self.prompt_terminators());
        sanitize::strip_bracketed_prompt(&cleaned, &base)
            .trim()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> HuaweiSession {
        HuaweiSession::new(
            Credentials::password_login("10.0.0.4", "admin", "pw", "huawei_vrp"),
            AdvancedOptions::default(),
        )
    }

    #[test]
    fn test_prompt_learning_strips_brackets() {
        let s = session();
        assert_eq!(s.normalize_learned_prompt("<HUAWEI>"), "HUAWEI");
        assert_eq!(s.normalize_learned_prompt("[HUAWEI]"), "HUAWEI");
        assert_eq!(s.normalize_learned_prompt("<NE8000-X4>"), "NE8000-X4");
    }

    #[test]
    fn test_config_prompt_detection() {
        let s = session();
        assert!(s.is_config_prompt("[HUAWEI]"));
        assert!(s.is_config_prompt("[HUAWEI-GigabitEthernet0/0/1]"));
        assert!(!s.is_config_prompt("<HUAWEI>"));
    }

    #[test]
    fn test_sanitize_strips_embedded_prompts() {
        let mut s = session();
        s.core_mut().prompt.base = "HUAWEI".to_string();
        let raw = "save\nAre you sure to continue?[Y/N]:y\nInfo: Save complete\n<HUAWEI>";
        let cleaned = s.sanitize_output(raw, "save");
        assert!(cleaned.contains("Save complete"));
        assert!(!cleaned.contains("<HUAWEI>"));
    }

    #[test]
    fn test_dialect() {
        let s = session();
        assert_eq!(s.config_enter_command(), Some("system-view"));
        assert_eq!(s.config_exit_command(), Some("return"));
        assert_eq!(s.save_command(), Some("save"));
        assert_eq!(s.confirmation_reply(), "y");
    }
}
