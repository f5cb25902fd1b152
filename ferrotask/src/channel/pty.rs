//! PTY shell channel with prompt-driven reads.

use std::time::Duration;

use bytes::Bytes;
use log::trace;
use regex::bytes::Regex;
use russh::client::Msg;
use russh::{Channel, ChannelMsg};
use tokio::time::Instant;

use super::buffer::PatternBuffer;
use crate::error::{ChannelError, Result};

/// Interactive shell channel on an open SSH session.
///
/// Output is accumulated in a [`PatternBuffer`]; reads return once a
/// pattern shows up in the buffer tail. Anything received after the match
/// stays buffered for the next read.
pub struct PtyChannel {
    channel: Channel<Msg>,
    buffer: PatternBuffer,
}

impl PtyChannel {
    /// Wrap a shell channel, searching `search_depth` trailing bytes for prompts.
    pub fn new(channel: Channel<Msg>, search_depth: usize) -> Self {
        Self {
            channel,
            buffer: PatternBuffer::new(search_depth),
        }
    }

    /// Send a line of input followed by a newline.
    pub async fn send(&mut self, input: &str) -> Result<()> {
        let mut line = Vec::with_capacity(input.len() + 1);
        line.extend_from_slice(input.as_bytes());
        line.push(b'\n');
        self.write_raw(&line).await
    }

    /// Send bytes as-is.
    pub async fn write_raw(&mut self, data: &[u8]) -> Result<()> {
        self.channel
            .data(data)
            .await
            .map_err(ChannelError::Ssh)?;
        Ok(())
    }

    /// Read until `pattern` matches in the buffer tail.
    ///
    /// Returns everything up to and including the match.
    pub async fn read_until(&mut self, pattern: &Regex, timeout: Duration) -> Result<Bytes> {
        let deadline = Instant::now() + timeout;

        loop {
            if let Some((_, end)) = self.buffer.search_tail(pattern) {
                return Ok(self.buffer.take_through(end));
            }

            let msg = tokio::time::timeout_at(deadline, self.channel.wait())
                .await
                .map_err(|_| ChannelError::PatternTimeout(timeout))?;

            match msg {
                Some(ChannelMsg::Data { data }) => {
                    trace!("read {} bytes", data.len());
                    self.buffer.extend(&data);
                }
                Some(ChannelMsg::ExtendedData { data, .. }) => self.buffer.extend(&data),
                Some(ChannelMsg::Eof) | Some(ChannelMsg::Close) | None => {
                    return Err(ChannelError::Closed.into());
                }
                Some(_) => {}
            }
        }
    }

    /// Close the channel.
    pub async fn close(self) -> Result<()> {
        self.channel.close().await.map_err(ChannelError::Ssh)?;
        Ok(())
    }
}
