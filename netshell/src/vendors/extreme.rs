//! Extreme EXOS sessions.
//!
//! EXOS appends a counter to its prompt that increments on every command
//! (`* Switch.3 #`), so the base prompt is re-learned before each
//! exchange and only the hostname part is kept.

use async_trait::async_trait;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::credentials::Credentials;
use crate::error::Result;
use crate::options::AdvancedOptions;
use crate::session::{DeviceSession, SessionCore, strip_prompt_terminator};

/// Captures the hostname out of `* HOST.<N>` style prompts.
static EXOS_PROMPT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\s*!]*(.+?)\.\d+\s*$").unwrap());

/// Session for Extreme EXOS switches.
pub struct ExtremeExosSession {
    core: SessionCore,
}

impl ExtremeExosSession {
    pub fn new(credentials: Credentials, options: AdvancedOptions) -> Self {
        Self {
            core: SessionCore::new(credentials, options),
        }
    }
}

#[async_trait]
impl DeviceSession for ExtremeExosSession {
    fn core(&self) -> &SessionCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SessionCore {
        &mut self.core
    }

    fn device_type(&self) -> &str {
        "extreme_exos"
    }

    // Configuration commands run at the main prompt.
    fn config_enter_command(&self) -> Option<&'static str> {
        None
    }

    fn config_exit_command(&self) -> Option<&'static str> {
        None
    }

    fn paging_command(&self) -> Option<&'static str> {
        Some("disable clipaging")
    }

    fn current_config_command(&self) -> &'static str {
        "show configuration"
    }

    fn save_command(&self) -> Option<&'static str> {
        Some("save configuration primary")
    }

    fn reboot_command(&self) -> &'static str {
        "reboot"
    }

    fn normalize_learned_prompt(&self, line: &str) -> String {
        let stripped = strip_prompt_terminator(line);
        match EXOS_PROMPT_RE.captures(stripped) {
            Some(caps) => caps[1].trim().to_string(),
            None => stripped.trim_start_matches(['*', '!', ' ']).to_string(),
        }
    }

    /// The prompt counter advanced on the previous command; re-learn the
    /// base before relying on it.
    async fn before_command(&mut self) -> Result<()> {
        self.set_base_prompt().await?;
        Ok(())
    }

    /// Standard preparation plus turning interactive confirmations off.
    async fn session_preparation(&mut self) -> Result<()> {
        self.prepare_common().await?;

        if !self.core().options().fast_mode {
            if let Err(e) = self.run_exchange("disable cli prompting").await {
                debug!("extreme_exos: disable cli prompting failed: {}", e);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> ExtremeExosSession {
        ExtremeExosSession::new(
            Credentials::password_login("10.0.0.6", "admin", "pw", "extreme_exos"),
            AdvancedOptions::default(),
        )
    }

    #[test]
    fn test_prompt_counter_is_stripped() {
        let s = session();
        assert_eq!(s.normalize_learned_prompt("* Switch.3 #"), "Switch");
        assert_eq!(s.normalize_learned_prompt("Switch.12 >"), "Switch");
        assert_eq!(s.normalize_learned_prompt("! X440G2.7 #"), "X440G2");
    }

    #[test]
    fn test_counter_never_reaches_output() {
        let mut s = session();
        s.core_mut().prompt.base = "Switch".to_string();
        let raw = "show version\nExtremeXOS version 31.7\n* Switch.4 # ";
        let cleaned = s.sanitize_output(raw, "show version");
        assert_eq!(cleaned, "ExtremeXOS version 31.7");
        assert!(!cleaned.contains(".4"));
    }

    #[test]
    fn test_dialect() {
        let s = session();
        assert!(s.config_enter_command().is_none());
        assert_eq!(s.paging_command(), Some("disable clipaging"));
        assert_eq!(s.save_command(), Some("save configuration primary"));
    }
}
