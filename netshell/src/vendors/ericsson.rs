//! Ericsson sessions: IPOS routers and MINI-LINK radios.

use async_trait::async_trait;

use crate::credentials::Credentials;
use crate::options::AdvancedOptions;
use crate::session::{DeviceSession, SessionCore};

/// Session for Ericsson IPOS (SSR/Redback lineage) routers.
pub struct EricssonIposSession {
    core: SessionCore,
}

impl EricssonIposSession {
    pub fn new(credentials: Credentials, options: AdvancedOptions) -> Self {
        Self {
            core: SessionCore::new(credentials, options),
        }
    }
}

#[async_trait]
impl DeviceSession for EricssonIposSession {
    fn core(&self) -> &SessionCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SessionCore {
        &mut self.core
    }

    fn device_type(&self) -> &str {
        "ericsson_ipos"
    }

    fn config_enter_command(&self) -> Option<&'static str> {
        Some("configure")
    }

    fn paging_command(&self) -> Option<&'static str> {
        Some("terminal length 0")
    }

    fn terminal_width_command(&self) -> Option<&'static str> {
        Some("terminal width 511")
    }

    fn save_command(&self) -> Option<&'static str> {
        Some("save configuration")
    }
}

/// Session for Ericsson MINI-LINK microwave radios.
///
/// A deliberately small dialect: no paging control, configuration
/// statements at the main prompt.
pub struct EricssonMinilinkSession {
    core: SessionCore,
}

impl EricssonMinilinkSession {
    pub fn new(credentials: Credentials, options: AdvancedOptions) -> Self {
        Self {
            core: SessionCore::new(credentials, options),
        }
    }
}

#[async_trait]
impl DeviceSession for EricssonMinilinkSession {
    fn core(&self) -> &SessionCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SessionCore {
        &mut self.core
    }

    fn device_type(&self) -> &str {
        "ericsson_minilink"
    }

    fn config_enter_command(&self) -> Option<&'static str> {
        None
    }

    fn config_exit_command(&self) -> Option<&'static str> {
        None
    }
}
