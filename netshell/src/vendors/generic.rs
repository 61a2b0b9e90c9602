//! Generic session for unknown devices.
//!
//! The minimal dialect: prompt learning and command execution only. The
//! auto-detector probes with this session before a real device type is
//! known.

use async_trait::async_trait;

use crate::credentials::Credentials;
use crate::options::AdvancedOptions;
use crate::session::{DeviceSession, SessionCore};

/// Session for devices without a vendor plugin.
pub struct GenericSession {
    core: SessionCore,
}

impl GenericSession {
    pub fn new(credentials: Credentials, options: AdvancedOptions) -> Self {
        Self {
            core: SessionCore::new(credentials, options),
        }
    }
}

#[async_trait]
impl DeviceSession for GenericSession {
    fn core(&self) -> &SessionCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SessionCore {
        &mut self.core
    }

    fn device_type(&self) -> &str {
        "generic"
    }

    fn config_enter_command(&self) -> Option<&'static str> {
        None
    }

    fn config_exit_command(&self) -> Option<&'static str> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generic_is_minimal() {
        let s = GenericSession::new(
            Credentials::password_login("h", "u", "p", "generic"),
            AdvancedOptions::default(),
        );
        assert!(s.config_enter_command().is_none());
        assert!(s.save_command().is_none());
        assert!(s.paging_command().is_none());
        assert!(!s.requires_enable());
    }
}
