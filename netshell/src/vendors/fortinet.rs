//! Fortinet FortiOS sessions.
//!
//! FortiOS configuration is expressed as `config ... / set ... / end`
//! blocks sent as ordinary commands, and changes persist automatically on
//! `end`. Paging is disabled through the console block. VDOM-enabled
//! units show the same dialect inside each VDOM.

use async_trait::async_trait;
use log::debug;
use tokio::time::Instant;

use crate::credentials::Credentials;
use crate::error::Result;
use crate::options::AdvancedOptions;
use crate::result::CommandResult;
use crate::session::{DeviceSession, SessionCore};

const CONSOLE_SETUP: &[&str] = &["config system console", "set output standard", "end"];

const FORTINET_ERROR_PATTERNS: &[&str] = &[
    "unknown action",
    "command parse error",
    "command fail",
    "invalid",
    "not found",
];

/// Session for Fortinet FortiOS firewalls.
pub struct FortinetSession {
    core: SessionCore,
}

impl FortinetSession {
    pub fn new(credentials: Credentials, options: AdvancedOptions) -> Self {
        Self {
            core: SessionCore::new(credentials, options),
        }
    }
}

#[async_trait]
impl DeviceSession for FortinetSession {
    fn core(&self) -> &SessionCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SessionCore {
        &mut self.core
    }

    fn device_type(&self) -> &str {
        "fortinet_fortios"
    }

    // Config blocks are ordinary commands; there is no mode to enter.
    fn config_enter_command(&self) -> Option<&'static str> {
        None
    }

    fn config_exit_command(&self) -> Option<&'static str> {
        None
    }

    fn current_config_command(&self) -> &'static str {
        "show full-configuration"
    }

    fn reboot_command(&self) -> &'static str {
        "execute reboot"
    }

    fn error_patterns(&self) -> &'static [&'static str] {
        FORTINET_ERROR_PATTERNS
    }

    /// Standard preparation plus the console-output block.
    async fn session_preparation(&mut self) -> Result<()> {
        self.prepare_common().await?;

        if !self.core().options().fast_mode {
            for command in CONSOLE_SETUP {
                if let Err(e) = self.run_exchange(command).await {
                    debug!("fortinet_fortios: {:?} failed: {}", command, e);
                }
            }
        }
        Ok(())
    }

    /// FortiOS persists configuration as soon as a block is closed.
    async fn save_config(&mut self) -> Result<CommandResult> {
        let started = Instant::now();
        Ok(CommandResult::ok(
            "saveConfig",
            "configuration is saved automatically when a config block ends",
            self.device_type(),
            &self.core().credentials().host,
        )
        .with_elapsed(started.elapsed()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_is_automatic() {
        let mut s = FortinetSession::new(
            Credentials::password_login("fw", "admin", "pw", "fortinet_fortios"),
            AdvancedOptions::default(),
        );
        let result = s.save_config().await.unwrap();
        assert!(result.success);
        assert!(result.output.contains("automatically"));
    }

    #[test]
    fn test_dialect() {
        let s = FortinetSession::new(
            Credentials::password_login("fw", "admin", "pw", "fortinet_fortios"),
            AdvancedOptions::default(),
        );
        assert!(s.config_enter_command().is_none());
        assert_eq!(s.current_config_command(), "show full-configuration");
        assert_eq!(s.reboot_command(), "execute reboot");
    }
}
