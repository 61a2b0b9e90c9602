//! Versa FlexVNF sessions.
//!
//! FlexVNF boots into a Linux shell; the CLI is entered with `cli` and
//! behaves Juniper-like: commit-based config mode, `[edit]`/`{master:N}`
//! context lines in the output.

use async_trait::async_trait;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::channel::last_non_empty_line;
use crate::credentials::Credentials;
use crate::error::Result;
use crate::options::AdvancedOptions;
use crate::result::CommandResult;
use crate::sanitize;
use crate::session::{DeviceSession, SessionCore};

static VERSA_CONFIRMATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\[yes,no\]|\[y/n\]|uncommitted changes").unwrap()
});

/// Session for Versa FlexVNF appliances.
pub struct VersaSession {
    core: SessionCore,
}

impl VersaSession {
    pub fn new(credentials: Credentials, options: AdvancedOptions) -> Self {
        Self {
            core: SessionCore::new(credentials, options),
        }
    }
}

#[async_trait]
impl DeviceSession for VersaSession {
    fn core(&self) -> &SessionCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SessionCore {
        &mut self.core
    }

    fn device_type(&self) -> &str {
        "versa_flexvnf"
    }

    fn config_enter_command(&self) -> Option<&'static str> {
        Some("configure")
    }

    fn config_exit_command(&self) -> Option<&'static str> {
        Some("exit configuration-mode")
    }

    fn commit_command(&self) -> Option<&'static str> {
        Some("commit")
    }

    fn paging_command(&self) -> Option<&'static str> {
        Some("set screen length 0")
    }

    fn terminal_width_command(&self) -> Option<&'static str> {
        Some("set screen width 511")
    }

    fn current_config_command(&self) -> &'static str {
        "show configuration"
    }

    fn confirmation_pattern(&self) -> &'static Regex {
        &VERSA_CONFIRMATION_RE
    }

    fn confirmation_reply(&self) -> &'static str {
        "yes"
    }

    fn is_config_prompt(&self, line: &str) -> bool {
        line.contains("(config")
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

    /// Hop from the boot shell into the CLI before the usual preparation.
    async fn session_preparation(&mut self) -> Result<()> {
        self.set_base_prompt().await?;

        let landed_in_shell = {
            let banner = self.core().banner();
            last_non_empty_line(banner)
                .map(|line| line.trim_end().ends_with('$'))
                .unwrap_or(false)
        };
        if landed_in_shell {
            self.core_mut().in_shell_mode = true;
            if let Err(e) = self.run_exchange("cli").await {
                debug!("versa_flexvnf: entering cli failed: {}", e);
            }
            self.core_mut().in_shell_mode = false;
            // The CLI prompt replaces the shell prompt.
            self.set_base_prompt().await?;
        }
        self.core_mut().in_operational_mode = true;

        if self.core().options().fast_mode {
            return Ok(());
        }
        for command in ["set screen length 0", "set screen width 511"] {
            if let Err(e) = self.run_exchange(command).await {
                debug!("versa_flexvnf: {:?} failed: {}", command, e);
            }
        }
        Ok(())
    }

    async fn save_config(&mut self) -> Result<CommandResult> {
        self.save_via_config_command("commit").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> VersaSession {
        VersaSession::new(
            Credentials::password_login("vnf", "admin", "pw", "versa_flexvnf"),
            AdvancedOptions::default(),
        )
    }

    #[test]
    fn test_dialect() {
        let s = session();
        assert_eq!(s.config_enter_command(), Some("configure"));
        assert_eq!(s.config_exit_command(), Some("exit configuration-mode"));
        assert_eq!(s.commit_command(), Some("commit"));
        assert_eq!(s.confirmation_reply(), "yes");
    }

    #[test]
    fn test_sanitize_strips_context_markers() {
        let mut s = session();
        s.core_mut().prompt.base = "admin@vnf-cli".to_string();
        let raw = "commit\n[edit]\ncommit complete\n{master:0}\nadmin@vnf-cli(config)% ";
        let cleaned = s.sanitize_output(raw, "commit");
        assert!(cleaned.contains("commit complete"));
        assert!(!cleaned.contains("[edit]"));
        assert!(!cleaned.contains("{master:0}"));
    }
}
