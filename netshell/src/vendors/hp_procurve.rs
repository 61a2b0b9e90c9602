//! HP ProCurve sessions.
//!
//! ProCurve greets with "Press any key to continue" before showing a
//! prompt, and asks whether to save the configuration when logging out.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;

use crate::credentials::Credentials;
use crate::error::Result;
use crate::options::AdvancedOptions;
use crate::session::{DeviceSession, SessionCore};

/// Session for HP ProCurve switches.
pub struct HpProcurveSession {
    core: SessionCore,
}

impl HpProcurveSession {
    pub fn new(credentials: Credentials, options: AdvancedOptions) -> Self {
        Self {
            core: SessionCore::new(credentials, options),
        }
    }
}

#[async_trait]
impl DeviceSession for HpProcurveSession {
    fn core(&self) -> &SessionCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SessionCore {
        &mut self.core
    }

    fn device_type(&self) -> &str {
        "hp_procurve"
    }

    fn requires_enable(&self) -> bool {
        true
    }

    fn config_exit_command(&self) -> Option<&'static str> {
        Some("exit")
    }

    fn paging_command(&self) -> Option<&'static str> {
        Some("no page")
    }

    fn terminal_width_command(&self) -> Option<&'static str> {
        Some("terminal width 511")
    }

    fn save_command(&self) -> Option<&'static str> {
        Some("write memory")
    }

    async fn session_preparation(&mut self) -> Result<()> {
        // Dismiss the "Press any key to continue" greeter before the
        // prompt can be elicited.
        let newline = self.newline();
        let channel = self.core_mut().channel_mut()?;
        channel.write_channel(newline).await?;
        let _ = channel.read_channel(Duration::from_millis(300)).await;

        self.prepare_common().await
    }

    async fn disconnect(&mut self) -> Result<()> {
        if self.core().is_connected() {
            if self.core().in_config_mode {
                if let Err(e) = self.exit_config_mode().await {
                    debug!("hp_procurve: exit config on disconnect failed: {}", e);
                }
            }
            // Logout raises "Do you want to log out" and possibly "Do you
            // want to save current configuration" dialogs.
            if let Err(e) = self.run_exchange_with_confirmation("logout").await {
                debug!("hp_procurve: logout dialog: {}", e);
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
    fn test_dialect() {
        let s = HpProcurveSession::new(
            Credentials::password_login("sw", "admin", "pw", "hp_procurve"),
            AdvancedOptions::default(),
        );
        assert!(s.requires_enable());
        assert_eq!(s.paging_command(), Some("no page"));
        assert_eq!(s.config_exit_command(), Some("exit"));
        assert_eq!(s.save_command(), Some("write memory"));
    }
}
