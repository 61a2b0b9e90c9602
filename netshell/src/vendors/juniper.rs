//! Juniper JUNOS family sessions (JUNOS and SRX).
//!
//! JUNOS is commit-based: configuration statements are staged under
//! `configure` and applied atomically by `commit`. Leaving config mode
//! with uncommitted changes raises a `[yes,no]` dialog, answered `yes`.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::credentials::Credentials;
use crate::error::Result;
use crate::options::AdvancedOptions;
use crate::result::CommandResult;
use crate::sanitize;
use crate::session::{DeviceSession, SessionCore};

static JUNIPER_CONFIRMATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\[yes,no\]|\[y/n\]|uncommitted changes").unwrap()
});

const JUNIPER_ERROR_PATTERNS: &[&str] = &[
    "syntax error",
    "unknown command",
    "error:",
    "missing argument",
    "is ambiguous",
    "not found",
];

/// Session for Juniper JUNOS and SRX devices.
pub struct JuniperSession {
    core: SessionCore,
    tag: &'static str,
}

impl JuniperSession {
    pub fn new(credentials: Credentials, options: AdvancedOptions, tag: &'static str) -> Self {
        Self {
            core: SessionCore::new(credentials, options),
            tag,
        }
    }
}

#[async_trait]
impl DeviceSession for JuniperSession {
    fn core(&self) -> &SessionCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SessionCore {
        &mut self.core
    }

    fn device_type(&self) -> &str {
        self.tag
    }

    fn config_enter_command(&self) -> Option<&'static str> {
        Some("configure")
    }

    fn config_exit_command(&self) -> Option<&'static str> {
        Some("exit")
    }

    fn commit_command(&self) -> Option<&'static str> {
        Some("commit")
    }

    fn paging_command(&self) -> Option<&'static str> {
        Some("set cli screen-length 0")
    }

    fn terminal_width_command(&self) -> Option<&'static str> {
        Some("set cli screen-width 511")
    }

    fn current_config_command(&self) -> &'static str {
        "show configuration"
    }

    fn reboot_command(&self) -> &'static str {
        "request system reboot"
    }

    fn error_patterns(&self) -> &'static [&'static str] {
        JUNIPER_ERROR_PATTERNS
    }

    fn confirmation_pattern(&self) -> &'static Regex {
        &JUNIPER_CONFIRMATION_RE
    }

    fn confirmation_reply(&self) -> &'static str {
        "yes"
    }

    // JUNOS prompts are `user@host>` (operational) and `user@host#` (config);
    // there is no `(config)` decoration.
    fn is_config_prompt(&self, line: &str) -> bool {
        line.trim_end().ends_with('#')
    }

    fn sanitize_output(&self, raw: &str, command: &str) -> String {
        let cleaned = sanitize::clean_output(
            raw,
            command,
            &self.core().prompt().base,
            self.prompt_terminators(),
        );
        sanitize::strip_context_lines(&cleaned).trim().to_string()
    }

    async fn save_config(&mut self) -> Result<CommandResult> {
        self.save_via_config_command("commit").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> JuniperSession {
        JuniperSession::new(
            Credentials::password_login("10.0.0.2", "admin", "pw", "juniper_junos"),
            AdvancedOptions::default(),
            "juniper_junos",
        )
    }

    #[test]
    fn test_dialect() {
        let s = session();
        assert_eq!(s.config_enter_command(), Some("configure"));
        assert_eq!(s.commit_command(), Some("commit"));
        assert_eq!(s.confirmation_reply(), "yes");
        assert!(!s.requires_enable());
    }

    #[test]
    fn test_config_prompt_detection() {
        let s = session();
        assert!(s.is_config_prompt("admin@router# "));
        assert!(!s.is_config_prompt("admin@router> "));
    }

    #[test]
    fn test_sanitize_strips_edit_context() {
        let mut s = session();
        s.core_mut().prompt.base = "admin@router".to_string();
        let raw = "commit\n[edit]\ncommit complete\n{master:0}\nadmin@router# ";
        let cleaned = s.sanitize_output(raw, "commit");
        assert!(cleaned.contains("commit complete"));
        assert!(!cleaned.contains("[edit]"));
        assert!(!cleaned.contains("{master"));
    }

    #[test]
    fn test_uncommitted_changes_dialog_matches() {
        assert!(JUNIPER_CONFIRMATION_RE.is_match("Discard uncommitted changes? [yes,no] (yes)"));
    }
}
