//! Aruba sessions: ArubaOS mobility controllers and AOS-CX switches.
//!
//! Both dialects want a bare carriage return as the line ending.

use async_trait::async_trait;

use crate::credentials::Credentials;
use crate::options::AdvancedOptions;
use crate::session::{DeviceSession, SessionCore};

/// Session for ArubaOS mobility controllers.
pub struct ArubaOsSession {
    core: SessionCore,
}

impl ArubaOsSession {
    pub fn new(credentials: Credentials, options: AdvancedOptions) -> Self {
        Self {
            core: SessionCore::new(credentials, options),
        }
    }
}

#[async_trait]
impl DeviceSession for ArubaOsSession {
    fn core(&self) -> &SessionCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SessionCore {
        &mut self.core
    }

    fn device_type(&self) -> &str {
        "aruba_os"
    }

    fn newline(&self) -> &'static str {
        "\r"
    }

    fn requires_enable(&self) -> bool {
        true
    }

    fn config_enter_command(&self) -> Option<&'static str> {
        Some("configure term")
    }

    fn paging_command(&self) -> Option<&'static str> {
        Some("no paging")
    }

    fn save_command(&self) -> Option<&'static str> {
        Some("write memory")
    }
}

/// Session for Aruba AOS-CX switches.
pub struct ArubaCxSession {
    core: SessionCore,
}

impl ArubaCxSession {
    pub fn new(credentials: Credentials, options: AdvancedOptions) -> Self {
        Self {
            core: SessionCore::new(credentials, options),
        }
    }
}

#[async_trait]
impl DeviceSession for ArubaCxSession {
    fn core(&self) -> &SessionCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SessionCore {
        &mut self.core
    }

    fn device_type(&self) -> &str {
        "aruba_aoscx"
    }

    fn newline(&self) -> &'static str {
        "\r"
    }

    fn config_enter_command(&self) -> Option<&'static str> {
        Some("configure term")
    }

    fn paging_command(&self) -> Option<&'static str> {
        Some("no page")
    }

    fn save_command(&self) -> Option<&'static str> {
        Some("write memory")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aruba_os_dialect() {
        let s = ArubaOsSession::new(
            Credentials::password_login("wc", "admin", "pw", "aruba_os"),
            AdvancedOptions::default(),
        );
        assert_eq!(s.newline(), "\r");
        assert!(s.requires_enable());
        assert_eq!(s.paging_command(), Some("no paging"));
    }

    #[test]
    fn test_aoscx_dialect() {
        let s = ArubaCxSession::new(
            Credentials::password_login("sw", "admin", "pw", "aruba_aoscx"),
            AdvancedOptions::default(),
        );
        assert_eq!(s.newline(), "\r");
        assert!(!s.requires_enable());
        assert_eq!(s.paging_command(), Some("no page"));
    }
}
