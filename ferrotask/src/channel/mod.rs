//! Channel layer: output buffering and prompt-driven reads.
//!
//! Device output is accumulated with ANSI escape sequences removed, and
//! prompts are only searched for in the tail of the buffer.

mod buffer;
mod pty;

pub use buffer::PatternBuffer;
pub use pty::PtyChannel;
