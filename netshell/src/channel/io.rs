//! Prompt-bounded channel I/O.
//!
//! `SessionChannel` layers two primitives over a `ShellStream`: timed
//! window reads (`read_channel`) and `read_until_prompt`, which polls the
//! stream and returns as soon as the accumulated tail looks like a
//! prompt.

use std::time::Duration;

use log::trace;
use tokio::time::Instant;

use super::buffer::PatternBuffer;
use super::shell::ShellStream;
use crate::error::{ChannelError, Result};

/// Poll interval while waiting for a prompt.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Tail inspection depth for prompt detection.
const SEARCH_DEPTH: usize = 1000;

/// Prompt terminators recognized at the end of a prompt line.
pub const PROMPT_TERMINATORS: &str = "#>$%";

/// What `read_until_prompt` is waiting for.
///
/// The three rules are checked against the last non-empty line of the
/// accumulated tail, in order:
/// 1. the expected prompt, verbatim;
/// 2. the base prompt followed by a terminator character;
/// 3. in fast mode, any non-empty line ending in a terminator.
#[derive(Debug, Clone, Copy)]
pub struct PromptWait<'a> {
    /// Exact prompt to wait for, when known.
    pub expect: Option<&'a str>,

    /// Learned base prompt (hostname-like prefix).
    pub base: Option<&'a str>,

    /// Terminator characters accepted after the base prompt.
    pub terminators: &'a str,

    /// Accept any terminator-ended tail line.
    pub fast: bool,
}

impl<'a> PromptWait<'a> {
    /// Wait for the base prompt with the default terminator set.
    pub fn base(base: &'a str) -> Self {
        Self {
            expect: None,
            base: Some(base),
            terminators: PROMPT_TERMINATORS,
            fast: false,
        }
    }

    /// Wait for an exact prompt string.
    pub fn exact(expect: &'a str) -> Self {
        Self {
            expect: Some(expect),
            base: None,
            terminators: PROMPT_TERMINATORS,
            fast: false,
        }
    }

    /// Check whether the accumulated tail satisfies the wait.
    pub fn matches(&self, tail: &str) -> bool {
        let Some(line) = last_non_empty_line(tail) else {
            return false;
        };
        let line = line.trim_end();

        if let Some(expect) = self.expect {
            if line.ends_with(expect.trim_end()) {
                return true;
            }
        }

        let terminated = line
            .chars()
            .last()
            .map(|c| self.terminators.contains(c))
            .unwrap_or(false);

        if let Some(base) = self.base {
            if !base.is_empty() && line.contains(base) && terminated {
                return true;
            }
        }

        if self.fast && !line.is_empty() && terminated {
            return true;
        }

        false
    }
}

/// The last line of `text` that contains a non-whitespace character.
pub fn last_non_empty_line(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let mut end = bytes.len();
    loop {
        let start = memchr::memrchr(b'\n', &bytes[..end]).map(|i| i + 1).unwrap_or(0);
        let line = text[start..end].trim_end_matches('\r');
        if !line.trim().is_empty() {
            return Some(line);
        }
        if start == 0 {
            return None;
        }
        end = start - 1;
    }
}

/// Channel I/O for one interactive session.
pub struct SessionChannel {
    shell: Box<dyn ShellStream>,
}

impl SessionChannel {
    pub fn new(shell: Box<dyn ShellStream>) -> Self {
        Self { shell }
    }

    /// Write raw bytes to the shell.
    pub async fn write_channel(&mut self, data: &str) -> Result<()> {
        self.shell.write(data.as_bytes()).await
    }

    /// Read whatever arrives within the window; empty string on a quiet
    /// channel.
    pub async fn read_channel(&mut self, window: Duration) -> Result<String> {
        let chunk = self.shell.read(window).await?;
        if chunk.is_empty() {
            return Ok(String::new());
        }
        let cleaned = strip_ansi_escapes::strip(&chunk);
        Ok(String::from_utf8_lossy(&cleaned).into_owned())
    }

    /// Poll the shell until the accumulated output tail matches the wait,
    /// or the deadline expires.
    ///
    /// On timeout the collected output travels inside the error, so the
    /// caller can still report partial results.
    pub async fn read_until_prompt(
        &mut self,
        wait: PromptWait<'_>,
        timeout: Duration,
    ) -> Result<String> {
        let deadline = Instant::now() + timeout;
        let mut buffer = PatternBuffer::new(SEARCH_DEPTH);

        loop {
            let now = Instant::now();
            if now >= deadline {
                return Err(ChannelError::PromptTimeout {
                    partial: buffer.take_string(),
                    timeout,
                }
                .into());
            }

            let window = POLL_INTERVAL.min(deadline - now);
            let chunk = match self.shell.read(window).await {
                Ok(chunk) => chunk,
                Err(e) => {
                    // Stream ended mid-read: surface what was collected.
                    if buffer.is_empty() {
                        return Err(e);
                    }
                    return Err(ChannelError::PromptTimeout {
                        partial: buffer.take_string(),
                        timeout,
                    }
                    .into());
                }
            };

            if chunk.is_empty() {
                continue;
            }

            buffer.extend(&chunk);
            trace!("read {} bytes ({} buffered)", chunk.len(), buffer.len());

            if wait.matches(&buffer.tail()) {
                return Ok(buffer.take_string());
            }
        }
    }

    /// Close the underlying shell. Idempotent.
    pub async fn close(&mut self) -> Result<()> {
        self.shell.close().await
    }

    /// Whether the underlying shell is still open.
    pub fn is_open(&self) -> bool {
        self.shell.is_open()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_non_empty_line() {
        assert_eq!(last_non_empty_line("a\nb\nc"), Some("c"));
        assert_eq!(last_non_empty_line("a\nb\n\n  \n"), Some("b"));
        assert_eq!(last_non_empty_line("single"), Some("single"));
        assert_eq!(last_non_empty_line("line\r\n"), Some("line"));
        assert_eq!(last_non_empty_line(""), None);
        assert_eq!(last_non_empty_line("\n\n  \n"), None);
    }

    #[test]
    fn test_exact_prompt_match() {
        let wait = PromptWait::exact("Router#");
        assert!(wait.matches("show version\noutput\nRouter# "));
        assert!(!wait.matches("show version\noutput\nRouter> "));
    }

    #[test]
    fn test_base_prompt_with_terminator() {
        let wait = PromptWait::base("Router");
        assert!(wait.matches("output\nRouter#"));
        assert!(wait.matches("output\nRouter> "));
        assert!(wait.matches("output\nRouter(config)# "));
        // Base present but no terminator at end of line
        assert!(!wait.matches("output\nRouter is reloading"));
        // Terminator but no base
        assert!(!wait.matches("output\nSwitch# "));
    }

    #[test]
    fn test_fast_mode_accepts_bare_terminator() {
        let wait = PromptWait {
            expect: None,
            base: None,
            terminators: PROMPT_TERMINATORS,
            fast: true,
        };
        assert!(wait.matches("output\nsomething$ "));
        assert!(wait.matches("output\n% "));
        assert!(!wait.matches("output\nstill going"));
    }

    #[test]
    fn test_custom_terminators() {
        // Huawei config prompts end in ']'
        let wait = PromptWait {
            expect: None,
            base: Some("HUAWEI"),
            terminators: "#>$%]",
            fast: false,
        };
        assert!(wait.matches("output\n[HUAWEI]"));
        assert!(wait.matches("output\n<HUAWEI>"));
    }

    #[test]
    fn test_blank_tail_never_matches() {
        let wait = PromptWait::base("Router");
        assert!(!wait.matches(""));
        assert!(!wait.matches("\n\n"));
    }
}
