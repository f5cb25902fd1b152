//! Builder for creating device drivers.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use super::generic::GenericDriver;
use crate::error::{DriverError, PlatformError, Result};
use crate::inventory::{ConnectionParams, Defaults, Device};
use crate::platform::{PlatformDefinition, PlatformRegistry};
use crate::transport::{AuthMethod, HostKeyVerification, SshConfig};

/// Builder for constructing device drivers.
///
/// # Example
///
/// ```rust,no_run
/// use ferrotask::driver::DriverBuilder;
///
/// # fn example() -> Result<(), ferrotask::Error> {
/// let driver = DriverBuilder::new("192.168.1.1")
///     .username("admin")
///     .password("secret")
///     .enable_secret("enable-secret")
///     .platform("ios")
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct DriverBuilder {
    host: String,
    port: u16,
    username: Option<String>,
    auth: AuthMethod,
    enable_secret: Option<SecretString>,
    platform_name: Option<String>,
    custom_platform: Option<PlatformDefinition>,
    timeout: Duration,
    host_key_verification: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
}

impl DriverBuilder {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 22,
            username: None,
            auth: AuthMethod::None,
            enable_secret: None,
            platform_name: None,
            custom_platform: None,
            timeout: Duration::from_secs(30),
            host_key_verification: HostKeyVerification::default(),
            known_hosts_path: None,
        }
    }

    /// Start from resolved inventory parameters.
    pub fn from_params(params: ConnectionParams) -> Self {
        let mut builder = Self::new(params.hostname)
            .port(params.port)
            .username(params.username)
            .platform(params.platform);
        builder.auth = match params.password {
            Some(password) => AuthMethod::Password(password),
            None => AuthMethod::None,
        };
        builder.enable_secret = params.secret;
        if let Some(timeout) = params.timeout {
            builder.timeout = timeout;
        }
        if let Some(mode) = params.host_key_verification {
            builder.host_key_verification = mode;
        }
        builder
    }

    /// Start from an inventory device's parameters for a connection kind.
    pub fn from_device(device: &Device, kind: &str, defaults: &Defaults) -> Result<Self> {
        Ok(Self::from_params(device.params(kind, defaults)?))
    }

    /// Set the SSH port (default: 22).
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set password authentication.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.auth = AuthMethod::Password(SecretString::from(password.into()));
        self
    }

    /// Set private key authentication.
    pub fn private_key(mut self, key_path: impl Into<PathBuf>) -> Self {
        self.auth = AuthMethod::PrivateKey {
            path: key_path.into(),
            passphrase: None,
        };
        self
    }

    /// Password for escalating to privileged mode (`enable`).
    pub fn enable_secret(mut self, secret: impl Into<String>) -> Self {
        self.enable_secret = Some(SecretString::from(secret.into()));
        self
    }

    /// Platform name or alias (e.g. "ios", "cisco_ios").
    pub fn platform(mut self, platform: impl Into<String>) -> Self {
        self.platform_name = Some(platform.into());
        self
    }

    pub fn custom_platform(mut self, platform: PlatformDefinition) -> Self {
        self.custom_platform = Some(platform);
        self
    }

    /// Connect and read timeout (default: 30 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn host_key_verification(mut self, mode: HostKeyVerification) -> Self {
        self.host_key_verification = mode;
        self
    }

    pub fn known_hosts_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.known_hosts_path = Some(path.into());
        self
    }

    /// Skip host key checks. Lab use only.
    pub fn danger_disable_host_key_verification(self) -> Self {
        self.host_key_verification(HostKeyVerification::Disabled)
    }

    /// Build a disconnected driver. Call `open()` to connect.
    pub fn build(self) -> Result<GenericDriver> {
        let username = self.username.ok_or_else(|| DriverError::InvalidConfig {
            message: "username is required".to_string(),
        })?;

        let platform = match (self.custom_platform, self.platform_name) {
            (Some(custom), _) => custom,
            (None, Some(name)) => PlatformRegistry::lookup(&name)?,
            (None, None) => {
                return Err(PlatformError::InvalidDefinition {
                    message: "platform must be specified".to_string(),
                }
                .into());
            }
        };

        let ssh_config = SshConfig {
            host: self.host,
            port: self.port,
            username,
            auth: self.auth,
            timeout: self.timeout,
            terminal_width: platform.terminal_width,
            terminal_height: platform.terminal_height,
            host_key_verification: self.host_key_verification,
            known_hosts_path: self.known_hosts_path,
        };

        GenericDriver::new(ssh_config, platform, self.enable_secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::Driver;

    #[test]
    fn test_build_resolves_platform_alias() {
        let driver = DriverBuilder::new("10.0.0.1")
            .username("admin")
            .password("pw")
            .platform("ios")
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();

        assert_eq!(driver.platform().name, "cisco_ios");
        assert_eq!(driver.host(), "10.0.0.1");
        assert_eq!(driver.timeout(), Duration::from_secs(5));
        assert!(!driver.is_open());
        assert!(!driver.is_alive());
        assert!(driver.current_privilege().is_none());
    }

    #[test]
    fn test_from_device_uses_kind_overrides() {
        let device = Device::new("R1")
            .with_hostname("10.0.0.9")
            .with_username("admin")
            .with_password("pw")
            .with_platform("ios")
            .with_connection_options(
                "napalm",
                crate::inventory::ConnectionOptions::new()
                    .with_extras(serde_json::json!({"optional_args": {"timeout": 7}})),
            );

        let driver = DriverBuilder::from_device(&device, "napalm", &Defaults::default())
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(driver.host(), "10.0.0.9");
        assert_eq!(driver.timeout(), Duration::from_secs(7));
        assert_eq!(driver.platform().name, "cisco_ios");

        let bare = Device::new("R2");
        assert!(DriverBuilder::from_device(&bare, "netmiko", &Defaults::default()).is_err());
    }

    #[test]
    fn test_build_requires_username() {
        let err = DriverBuilder::new("10.0.0.1").platform("ios").build().err().unwrap();
        assert!(err.to_string().contains("username"));
    }

    #[test]
    fn test_build_requires_known_platform() {
        assert!(DriverBuilder::new("h").username("u").build().is_err());
        assert!(
            DriverBuilder::new("h")
                .username("u")
                .platform("plan9")
                .build()
                .is_err()
        );
    }

    #[test]
    fn test_combined_prompt_pattern() {
        let driver = DriverBuilder::new("h")
            .username("u")
            .platform("cisco_ios")
            .build()
            .unwrap();
        let pattern = driver.prompt_pattern();
        assert!(pattern.is_match(b"banner\nR1>"));
        assert!(pattern.is_match(b"output\nR1#"));
        assert!(pattern.is_match(b"R1(config-if)#"));
        assert!(!pattern.is_match(b"Password: "));
    }

    #[tokio::test]
    async fn test_send_without_open_fails() {
        let mut driver = DriverBuilder::new("h")
            .username("u")
            .platform("ios")
            .build()
            .unwrap();
        let err = driver.send_command("show clock").await.unwrap_err();
        assert!(err.to_string().contains("not connected"));
        // closing a closed driver is fine
        driver.close().await.unwrap();
    }
}
