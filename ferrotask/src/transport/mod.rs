//! SSH transport layer wrapping russh.
//!
//! Connection setup, authentication and shell channel creation.

pub mod config;
mod ssh;

pub use config::{AuthMethod, HostKeyVerification, SshConfig};
pub use ssh::SshTransport;
