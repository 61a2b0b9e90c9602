//! VyOS sessions.
//!
//! Commit-based: statements are staged under `configure`, applied with
//! `commit`, and persisted with `save` at the config prompt.

use async_trait::async_trait;

use crate::credentials::Credentials;
use crate::error::Result;
use crate::options::AdvancedOptions;
use crate::result::CommandResult;
use crate::session::{DeviceSession, SessionCore};

/// Session for VyOS routers.
pub struct VyosSession {
    core: SessionCore,
}

impl VyosSession {
    pub fn new(credentials: Credentials, options: AdvancedOptions) -> Self {
        Self {
            core: SessionCore::new(credentials, options),
        }
    }
}

#[async_trait]
impl DeviceSession for VyosSession {
    fn core(&self) -> &SessionCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SessionCore {
        &mut self.core
    }

    fn device_type(&self) -> &str {
        "vyos"
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

    fn current_config_command(&self) -> &'static str {
        "show configuration"
    }

    fn reboot_command(&self) -> &'static str {
        "reboot now"
    }

    fn is_config_prompt(&self, line: &str) -> bool {
        line.trim_end().ends_with('#')
    }

    async fn save_config(&mut self) -> Result<CommandResult> {
        self.save_via_config_command("save").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect() {
        let s = VyosSession::new(
            Credentials::password_login("r", "vyos", "pw", "vyos"),
            AdvancedOptions::default(),
        );
        assert_eq!(s.config_enter_command(), Some("configure"));
        assert_eq!(s.commit_command(), Some("commit"));
        assert!(s.is_config_prompt("vyos@r# "));
        assert!(!s.is_config_prompt("vyos@r:~$ "));
    }
}
