//! SSH session settings.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::TransportError;

/// How the server's host key is checked against known_hosts.
///
/// Inventories select it with `host_key_checking` in connection extras:
/// `"strict"`, `"accept-new"` or `"off"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HostKeyVerification {
    /// Unknown and changed keys are refused.
    Strict,

    /// Unknown keys are recorded, changed keys are refused.
    #[default]
    AcceptNew,

    /// Any key is accepted.
    Disabled,
}

impl FromStr for HostKeyVerification {
    type Err = TransportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strict" | "yes" => Ok(Self::Strict),
            "accept-new" | "accept_new" => Ok(Self::AcceptNew),
            "off" | "no" | "disabled" => Ok(Self::Disabled),
            other => Err(TransportError::KnownHosts(format!(
                "unknown host key checking mode '{}'",
                other
            ))),
        }
    }
}

/// Everything needed to open one SSH session.
#[derive(Debug)]
pub struct SshConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub auth: AuthMethod,
    /// Bounds the TCP connect, the handshake and each prompt wait.
    pub timeout: Duration,
    pub terminal_width: u32,
    pub terminal_height: u32,
    pub host_key_verification: HostKeyVerification,
    /// known_hosts file. `None` means `~/.ssh/known_hosts`.
    pub known_hosts_path: Option<PathBuf>,
}

impl SshConfig {
    /// `host:port` for log lines.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Credentials presented to the server.
#[derive(Debug)]
pub enum AuthMethod {
    /// "none" method; only lab servers accept it.
    None,

    Password(SecretString),

    PrivateKey {
        path: PathBuf,
        /// For encrypted key files.
        passphrase: Option<SecretString>,
    },
}

impl AuthMethod {
    /// SSH method name, safe to log.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthMethod::None => "none",
            AuthMethod::Password(_) => "password",
            AuthMethod::PrivateKey { .. } => "publickey",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_key_checking_names() {
        assert_eq!("strict".parse::<HostKeyVerification>().unwrap(), HostKeyVerification::Strict);
        assert_eq!(
            "Accept-New".parse::<HostKeyVerification>().unwrap(),
            HostKeyVerification::AcceptNew
        );
        assert_eq!("off".parse::<HostKeyVerification>().unwrap(), HostKeyVerification::Disabled);
        assert!("sometimes".parse::<HostKeyVerification>().is_err());
    }

    #[test]
    fn test_auth_kind_hides_secret() {
        let auth = AuthMethod::Password(SecretString::from("hunter2".to_string()));
        assert_eq!(auth.kind(), "password");
        assert!(!format!("{:?}", auth).contains("hunter2"));
    }
}
