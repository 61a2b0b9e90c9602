//! Palo Alto PAN-OS sessions.
//!
//! PAN-OS logs into operational mode (`>` prompt). Configuration mode
//! (`#` prompt) is commit-based, and leaving it with uncommitted changes
//! raises a confirmation answered `yes`.

use async_trait::async_trait;
use log::debug;

use crate::credentials::Credentials;
use crate::error::Result;
use crate::options::AdvancedOptions;
use crate::result::CommandResult;
use crate::session::{DeviceSession, SessionCore};

const PAGING_COMMANDS: &[&str] = &["set cli pager off", "set cli screen-length 0"];

/// Session for Palo Alto PAN-OS firewalls.
pub struct PaloAltoSession {
    core: SessionCore,
}

impl PaloAltoSession {
    pub fn new(credentials: Credentials, options: AdvancedOptions) -> Self {
        Self {
            core: SessionCore::new(credentials, options),
        }
    }
}

#[async_trait]
impl DeviceSession for PaloAltoSession {
    fn core(&self) -> &SessionCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SessionCore {
        &mut self.core
    }

    fn device_type(&self) -> &str {
        "paloalto_panos"
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

    fn terminal_width_command(&self) -> Option<&'static str> {
        Some("set cli terminal width 511")
    }

    fn current_config_command(&self) -> &'static str {
        "show config running"
    }

    fn reboot_command(&self) -> &'static str {
        "request restart system"
    }

    fn confirmation_reply(&self) -> &'static str {
        "yes"
    }

    fn is_config_prompt(&self, line: &str) -> bool {
        line.trim_end().ends_with('#')
    }

    async fn session_preparation(&mut self) -> Result<()> {
        self.set_base_prompt().await?;
        self.core_mut().in_operational_mode = true;

        if self.core().options().fast_mode {
            return Ok(());
        }

        for command in PAGING_COMMANDS {
            if let Err(e) = self.run_exchange(command).await {
                debug!("paloalto_panos: {:?} failed: {}", command, e);
            }
        }
        if let Some(command) = self.terminal_width_command() {
            if let Err(e) = self.run_exchange(command).await {
                debug!("paloalto_panos: {:?} failed: {}", command, e);
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

    #[test]
    fn test_dialect() {
        let s = PaloAltoSession::new(
            Credentials::password_login("fw", "admin", "pw", "paloalto_panos"),
            AdvancedOptions::default(),
        );
        assert_eq!(s.config_enter_command(), Some("configure"));
        assert_eq!(s.commit_command(), Some("commit"));
        assert_eq!(s.reboot_command(), "request restart system");
        assert_eq!(s.confirmation_reply(), "yes");
        assert!(s.is_config_prompt("admin@fw# "));
        assert!(!s.is_config_prompt("admin@fw> "));
    }
}
