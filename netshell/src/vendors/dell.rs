//! Dell OS10 sessions.
//!
//! IOS-like dialect; reload asks `yes/no` and a Linux shell is reachable
//! through `system "<command>"` without leaving the CLI.

use async_trait::async_trait;

use crate::credentials::Credentials;
use crate::options::AdvancedOptions;
use crate::session::{DeviceSession, SessionCore};

/// Session for Dell OS10 switches.
pub struct DellOs10Session {
    core: SessionCore,
}

impl DellOs10Session {
    pub fn new(credentials: Credentials, options: AdvancedOptions) -> Self {
        Self {
            core: SessionCore::new(credentials, options),
        }
    }
}

#[async_trait]
impl DeviceSession for DellOs10Session {
    fn core(&self) -> &SessionCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SessionCore {
        &mut self.core
    }

    fn device_type(&self) -> &str {
        "dell_os10"
    }

    fn config_exit_command(&self) -> Option<&'static str> {
        Some("exit")
    }

    fn paging_command(&self) -> Option<&'static str> {
        Some("terminal length 0")
    }

    fn terminal_width_command(&self) -> Option<&'static str> {
        Some("terminal width 511")
    }

    fn save_command(&self) -> Option<&'static str> {
        Some("copy running-configuration startup-configuration")
    }

    fn confirmation_reply(&self) -> &'static str {
        "yes"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect() {
        let s = DellOs10Session::new(
            Credentials::password_login("sw", "admin", "pw", "dell_os10"),
            AdvancedOptions::default(),
        );
        assert_eq!(s.config_enter_command(), Some("configure terminal"));
        assert_eq!(s.config_exit_command(), Some("exit"));
        assert_eq!(
            s.save_command(),
            Some("copy running-configuration startup-configuration")
        );
        assert_eq!(s.confirmation_reply(), "yes");
    }
}
