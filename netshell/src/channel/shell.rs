//! Byte-level shell stream abstraction.
//!
//! `ShellStream` is the seam between the session engine and the SSH
//! channel: the engine only needs timed reads and ordered writes, so
//! tests drive the exact same code paths with a scripted implementation.

use std::time::Duration;

use async_trait::async_trait;
use log::trace;
use russh::client::Msg;
use russh::{Channel, ChannelMsg};

use crate::error::{ChannelError, Result};

/// A duplex byte stream speaking to an interactive shell.
#[async_trait]
pub trait ShellStream: Send {
    /// Write bytes to the shell. Writes are not buffered across calls.
    async fn write(&mut self, data: &[u8]) -> Result<()>;

    /// Read whatever arrives within the window.
    ///
    /// Returns an empty vector when the channel stays quiet for the whole
    /// window, and `ChannelError::Closed` once the stream has ended.
    async fn read(&mut self, window: Duration) -> Result<Vec<u8>>;

    /// Close the stream. Idempotent.
    async fn close(&mut self) -> Result<()>;

    /// Whether the stream is still open.
    fn is_open(&self) -> bool;
}

/// `ShellStream` over a russh shell channel.
pub struct RusshShell {
    channel: Channel<Msg>,
    open: bool,
}

impl RusshShell {
    pub fn new(channel: Channel<Msg>) -> Self {
        Self {
            channel,
            open: true,
        }
    }
}

#[async_trait]
impl ShellStream for RusshShell {
    async fn write(&mut self, data: &[u8]) -> Result<()> {
        if !self.open {
            return Err(ChannelError::Closed.into());
        }
        self.channel
            .data(data)
            .await
            .map_err(|e| ChannelError::Ssh(e.into()))?;
        trace!("wrote {} bytes to shell", data.len());
        Ok(())
    }

    async fn read(&mut self, window: Duration) -> Result<Vec<u8>> {
        if !self.open {
            return Err(ChannelError::Closed.into());
        }

        match tokio::time::timeout(window, self.channel.wait()).await {
            // Quiet window: nothing arrived, which is not an error.
            Err(_) => Ok(Vec::new()),
            Ok(None) => {
                self.open = false;
                Err(ChannelError::Closed.into())
            }
            Ok(Some(msg)) => match msg {
                ChannelMsg::Data { ref data } => Ok(data.to_vec()),
                ChannelMsg::ExtendedData { ref data, .. } => Ok(data.to_vec()),
                ChannelMsg::Eof | ChannelMsg::Close => {
                    self.open = false;
                    Err(ChannelError::Closed.into())
                }
                ChannelMsg::ExitStatus { exit_status } => {
                    trace!("shell exited with status {}", exit_status);
                    self.open = false;
                    Err(ChannelError::Closed.into())
                }
                // Window-change acks and the like carry no payload.
                _ => Ok(Vec::new()),
            },
        }
    }

    async fn close(&mut self) -> Result<()> {
        if self.open {
            self.open = false;
            let _ = self.channel.eof().await;
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }
}
