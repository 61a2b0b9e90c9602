//! Ciena SAOS sessions.
//!
//! SAOS takes configuration statements at the main prompt; there is no
//! separate config mode.

use async_trait::async_trait;

use crate::credentials::Credentials;
use crate::options::AdvancedOptions;
use crate::session::{DeviceSession, SessionCore};

/// Session for Ciena SAOS devices.
pub struct CienaSaosSession {
    core: SessionCore,
}

impl CienaSaosSession {
    pub fn new(credentials: Credentials, options: AdvancedOptions) -> Self {
        Self {
            core: SessionCore::new(credentials, options),
        }
    }
}

#[async_trait]
impl DeviceSession for CienaSaosSession {
    fn core(&self) -> &SessionCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SessionCore {
        &mut self.core
    }

    fn device_type(&self) -> &str {
        "ciena_saos"
    }

    fn config_enter_command(&self) -> Option<&'static str> {
        None
    }

    fn config_exit_command(&self) -> Option<&'static str> {
        None
    }

    fn paging_command(&self) -> Option<&'static str> {
        Some("system shell set more off")
    }

    fn current_config_command(&self) -> &'static str {
        "configuration show"
    }

    fn save_command(&self) -> Option<&'static str> {
        Some("configuration save")
    }

    fn reboot_command(&self) -> &'static str {
        "chassis reboot"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect() {
        let s = CienaSaosSession::new(
            Credentials::password_login("olt", "admin", "pw", "ciena_saos"),
            AdvancedOptions::default(),
        );
        assert!(s.config_enter_command().is_none());
        assert_eq!(s.paging_command(), Some("system shell set more off"));
        assert_eq!(s.save_command(), Some("configuration save"));
    }
}
