//! Pattern buffer with tail-search.
//!
//! Only the last `search_depth` bytes are searched for prompt patterns, so
//! large outputs (full configurations, routing tables) stay cheap to scan.

use std::fmt;

use bytes::{Bytes, BytesMut};
use regex::bytes::Regex;
use vte::{Parser, Perform};

/// Buffer for accumulating output and searching its tail for patterns.
///
/// Incoming bytes go through a terminal parser: escape sequences are
/// dropped, carriage returns are removed and backspaces erase the previous
/// byte, so the buffer holds what a human would see on screen.
pub struct PatternBuffer {
    buffer: BytesMut,
    search_depth: usize,
    parser: Parser,
}

/// Collects the printable output of the terminal parser.
struct Screen<'a>(&'a mut BytesMut);

impl Perform for Screen<'_> {
    fn print(&mut self, c: char) {
        let mut utf8 = [0u8; 4];
        self.0.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
    }

    fn execute(&mut self, byte: u8) {
        match byte {
            b'\n' | b'\t' => self.0.extend_from_slice(&[byte]),
            // backspace
            0x08 => {
                let len = self.0.len();
                self.0.truncate(len.saturating_sub(1));
            }
            _ => {}
        }
    }
}

impl PatternBuffer {
    /// Create a buffer that searches the last `search_depth` bytes.
    pub fn new(search_depth: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(4096),
            search_depth,
            parser: Parser::new(),
        }
    }

    /// Feed raw channel data into the buffer.
    pub fn extend(&mut self, data: &[u8]) {
        let mut screen = Screen(&mut self.buffer);
        self.parser.advance(&mut screen, data);
    }

    /// Find the last match of `pattern` within the tail.
    ///
    /// Returns `(start, end)` offsets into the whole buffer.
    pub fn search_tail(&self, pattern: &Regex) -> Option<(usize, usize)> {
        let offset = self.buffer.len().saturating_sub(self.search_depth);
        pattern
            .find_iter(&self.buffer[offset..])
            .last()
            .map(|m| (offset + m.start(), offset + m.end()))
    }

    /// Search the entire buffer for a pattern.
    pub fn search_full(&self, pattern: &Regex) -> Option<(usize, usize)> {
        pattern.find(&self.buffer).map(|m| (m.start(), m.end()))
    }

    /// Split off everything up to `end`, leaving the remainder buffered.
    pub fn take_through(&mut self, end: usize) -> Bytes {
        let end = end.min(self.buffer.len());
        self.buffer.split_to(end).freeze()
    }

    /// Take the whole buffer and reset.
    pub fn take(&mut self) -> Bytes {
        self.buffer.split().freeze()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

impl fmt::Debug for PatternBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternBuffer")
            .field("len", &self.buffer.len())
            .field("search_depth", &self.search_depth)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_extend() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"Hello, world!");
        assert_eq!(buffer.as_slice(), b"Hello, world!");
    }

    #[test]
    fn test_ansi_and_carriage_return_stripping() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"\x1b[32mGreen\x1b[0m text\r\nR1#");
        assert_eq!(buffer.as_slice(), b"Green text\nR1#");
    }

    #[test]
    fn test_escape_split_across_chunks() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"abc\x1b[3");
        buffer.extend(b"2mdef");
        assert_eq!(buffer.as_slice(), b"abcdef");
    }

    #[test]
    fn test_backspace_erases() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"show verr\x08sion");
        assert_eq!(buffer.as_slice(), b"show version");
    }

    #[test]
    fn test_tail_search_finds_last_match() {
        let mut buffer = PatternBuffer::new(50);
        buffer.extend(&[b'x'; 100]);
        buffer.extend(b"\nR1#\nmore\nR1#");

        let pattern = Regex::new(r"(?m)^R1#$").unwrap();
        let (start, end) = buffer.search_tail(&pattern).unwrap();
        assert_eq!(end, buffer.len());
        assert_eq!(&buffer.as_slice()[start..end], b"R1#");
    }

    #[test]
    fn test_tail_search_not_in_tail() {
        let mut buffer = PatternBuffer::new(10);
        buffer.extend(b"router#");
        buffer.extend(&[b'x'; 100]);

        let pattern = Regex::new(r"router#").unwrap();
        assert!(buffer.search_tail(&pattern).is_none());
        assert!(buffer.search_full(&pattern).is_some());
    }

    #[test]
    fn test_take_through_keeps_remainder() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"output\nR1#trailing");
        let head = buffer.take_through(10);
        assert_eq!(&head[..], b"output\nR1#");
        assert_eq!(buffer.as_slice(), b"trailing");
        assert_eq!(&buffer.take()[..], b"trailing");
        assert!(buffer.is_empty());
    }
}
