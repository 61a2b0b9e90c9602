//! Ubiquiti sessions: EdgeSwitch, EdgeRouter, and UniFi switches.
//!
//! EdgeSwitch is an IOS-like CLI behind enable mode. EdgeRouter is
//! VyOS-derived and commit-based. UniFi switches land in a Linux shell
//! first; the switch CLI is reached with `telnet localhost`.

use async_trait::async_trait;
use log::debug;

use crate::channel::{PROMPT_TERMINATORS, PromptWait};
use crate::credentials::Credentials;
use crate::error::Result;
use crate::options::AdvancedOptions;
use crate::result::CommandResult;
use crate::session::{DeviceSession, SessionCore};

/// Session for Ubiquiti EdgeSwitch devices.
pub struct EdgeSwitchSession {
    core: SessionCore,
}

impl EdgeSwitchSession {
    pub fn new(credentials: Credentials, options: AdvancedOptions) -> Self {
        Self {
            core: SessionCore::new(credentials, options),
        }
    }
}

#[async_trait]
impl DeviceSession for EdgeSwitchSession {
    fn core(&self) -> &SessionCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SessionCore {
        &mut self.core
    }

    fn device_type(&self) -> &str {
        "ubiquiti_edgeswitch"
    }

    fn requires_enable(&self) -> bool {
        true
    }

    fn config_enter_command(&self) -> Option<&'static str> {
        Some("configure")
    }

    fn config_exit_command(&self) -> Option<&'static str> {
        Some("exit")
    }

    // "Are you sure you want to save? (y/n)"
    fn save_command(&self) -> Option<&'static str> {
        Some("write memory")
    }
}

/// Session for Ubiquiti EdgeRouter (EdgeOS) devices.
pub struct EdgeRouterSession {
    core: SessionCore,
}

impl EdgeRouterSession {
    pub fn new(credentials: Credentials, options: AdvancedOptions) -> Self {
        Self {
            core: SessionCore::new(credentials, options),
        }
    }
}

#[async_trait]
impl DeviceSession for EdgeRouterSession {
    fn core(&self) -> &SessionCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SessionCore {
        &mut self.core
    }

    fn device_type(&self) -> &str {
        "ubiquiti_edgerouter"
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
        Some("terminal length 0")
    }

    fn terminal_width_command(&self) -> Option<&'static str> {
        Some("terminal width 512")
    }

    fn is_config_prompt(&self, line: &str) -> bool {
        line.trim_end().ends_with('#')
    }

    /// `save` runs at the config prompt and reports `Done`.
    async fn save_config(&mut self) -> Result<CommandResult> {
        let mut result = self.save_via_config_command("save").await?;
        if result.success && !result.output.contains("Done") {
            result.success = false;
            result.error = Some("save did not report Done".to_string());
        }
        Ok(result)
    }
}

/// Session for UniFi switches (EdgeSwitch CLI behind `telnet localhost`).
pub struct UnifiSession {
    core: SessionCore,
}

impl UnifiSession {
    pub fn new(credentials: Credentials, options: AdvancedOptions) -> Self {
        Self {
            core: SessionCore::new(credentials, options),
        }
    }
}

#[async_trait]
impl DeviceSession for UnifiSession {
    fn core(&self) -> &SessionCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SessionCore {
        &mut self.core
    }

    fn device_type(&self) -> &str {
        "ubiquiti_unifi"
    }

    fn requires_enable(&self) -> bool {
        true
    }

    fn config_enter_command(&self) -> Option<&'static str> {
        Some("configure")
    }

    fn config_exit_command(&self) -> Option<&'static str> {
        Some("exit")
    }

    fn save_command(&self) -> Option<&'static str> {
        Some("write memory")
    }

    /// Two-stage login: learn the Linux shell prompt, hop into the switch
    /// CLI over local telnet, then prepare as an EdgeSwitch.
    async fn session_preparation(&mut self) -> Result<()> {
        self.set_base_prompt().await?;
        self.core_mut().in_shell_mode = true;

        let newline = self.newline();
        let timeout = self.core().options().command_timeout();
        let channel = self.core_mut().channel_mut()?;
        channel
            .write_channel(&format!("telnet localhost{}", newline))
            .await?;
        // The CLI prompt ("(UBNT) >") shares nothing with the shell prompt.
        let wait = PromptWait {
            expect: None,
            base: None,
            terminators: PROMPT_TERMINATORS,
            fast: true,
        };
        channel.read_until_prompt(wait, timeout).await?;
        self.core_mut().in_shell_mode = false;

        self.prepare_common().await
    }

    /// Leave the telnet CLI before closing SSH.
    async fn disconnect(&mut self) -> Result<()> {
        if self.core().is_connected() {
            if self.core().in_config_mode {
                if let Err(e) = self.exit_config_mode().await {
                    debug!("ubiquiti_unifi: exit config on disconnect failed: {}", e);
                }
            }
            let newline = self.newline();
            if let Ok(channel) = self.core_mut().channel_mut() {
                // First exit leaves telnet and lands back in the shell,
                // the second logs the shell out.
                let _ = channel.write_channel(&format!("exit{}", newline)).await;
                let _ = channel
                    .read_channel(std::time::Duration::from_millis(300))
                    .await;
                let _ = channel.write_channel(&format!("exit{}", newline)).await;
            }
        }
        self.core_mut().teardown().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edgeswitch_dialect() {
        let s = EdgeSwitchSession::new(
            Credentials::password_login("sw", "ubnt", "pw", "ubiquiti_edgeswitch"),
            AdvancedOptions::default(),
        );
        assert!(s.requires_enable());
        assert_eq!(s.config_enter_command(), Some("configure"));
        assert_eq!(s.save_command(), Some("write memory"));
    }

    #[test]
    fn test_edgerouter_is_commit_based() {
        let s = EdgeRouterSession::new(
            Credentials::password_login("er", "ubnt", "pw", "ubiquiti_edgerouter"),
            AdvancedOptions::default(),
        );
        assert_eq!(s.commit_command(), Some("commit"));
        assert_eq!(s.terminal_width_command(), Some("terminal width 512"));
        assert!(s.is_config_prompt("ubnt@er# "));
    }
}
