//! Devices and their connection parameters.

use std::fmt;
use std::time::Duration;

use indexmap::IndexMap;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;

use super::Defaults;
use crate::error::InventoryError;
use crate::transport::HostKeyVerification;

/// Per-connection overrides for one device.
///
/// Fields set here win over the device's own fields for connections of this
/// kind. `extras` carries connection-specific settings such as the enable
/// `secret`, a `device_type`, or an `optional_args` table.
#[derive(Default)]
pub struct ConnectionOptions {
    pub hostname: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub platform: Option<String>,
    pub extras: Value,
}

/// Keys in `extras` whose values are never printed.
const SECRET_KEYS: &[&str] = &["secret", "password"];

/// Copy of `value` with every secret key, at any depth, masked.
fn redact(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| {
                    let value = if SECRET_KEYS.contains(&key.as_str()) {
                        Value::String("[REDACTED]".to_string())
                    } else {
                        redact(value)
                    };
                    (key.clone(), value)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact).collect()),
        other => other.clone(),
    }
}

impl fmt::Debug for ConnectionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionOptions")
            .field("hostname", &self.hostname)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password)
            .field("platform", &self.platform)
            .field("extras", &redact(&self.extras))
            .finish()
    }
}

impl ConnectionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_extras(mut self, extras: Value) -> Self {
        self.extras = extras;
        self
    }

    /// String value at `extras.<key>` or `extras.optional_args.<key>`.
    fn extra_str(&self, key: &str) -> Option<&str> {
        self.extra(key).and_then(Value::as_str)
    }

    fn extra(&self, key: &str) -> Option<&Value> {
        self.extras
            .get(key)
            .or_else(|| self.extras.get("optional_args")?.get(key))
    }
}

/// A manageable device.
#[derive(Debug)]
pub struct Device {
    name: String,
    /// Address to connect to. Falls back to the device name.
    pub hostname: Option<String>,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    /// Platform tag (e.g. "ios").
    pub platform: Option<String>,
    pub port: Option<u16>,
    /// Free-form host data, available to templates.
    pub data: IndexMap<String, Value>,
    /// Overrides keyed by connection kind ("netmiko", "napalm").
    pub connection_options: IndexMap<String, ConnectionOptions>,
}

/// Connection parameters after applying overrides and defaults.
#[derive(Debug)]
pub struct ConnectionParams {
    pub hostname: String,
    pub port: u16,
    pub username: String,
    pub password: Option<SecretString>,
    pub platform: String,
    /// Enable password.
    pub secret: Option<SecretString>,
    pub timeout: Option<Duration>,
    pub host_key_verification: Option<HostKeyVerification>,
}

impl Device {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hostname: None,
            username: None,
            password: None,
            platform: None,
            port: None,
            data: IndexMap::new(),
            connection_options: IndexMap::new(),
        }
    }

    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(SecretString::from(password.into()));
        self
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_data(mut self, key: impl Into<String>, value: Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }

    pub fn with_connection_options(
        mut self,
        kind: impl Into<String>,
        options: ConnectionOptions,
    ) -> Self {
        self.connection_options.insert(kind.into(), options);
        self
    }

    /// Inventory key of this device.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Address to connect to for a connection kind.
    pub fn address(&self, kind: &str) -> &str {
        self.options(kind)
            .and_then(|o| o.hostname.as_deref())
            .or(self.hostname.as_deref())
            .unwrap_or(&self.name)
    }

    pub fn options(&self, kind: &str) -> Option<&ConnectionOptions> {
        self.connection_options.get(kind)
    }

    /// Enable password for a connection kind.
    ///
    /// Read from `extras.secret` or `extras.optional_args.secret`, falling
    /// back to the login password.
    pub fn secret(&self, kind: &str) -> Option<SecretString> {
        let options = self.options(kind);
        options
            .and_then(|o| o.extra_str("secret"))
            .map(|s| SecretString::from(s.to_string()))
            .or_else(|| {
                options
                    .and_then(|o| o.password.as_ref())
                    .or(self.password.as_ref())
                    .map(copy_secret)
            })
    }

    /// Timeout in seconds from `extras.timeout` or `extras.optional_args.timeout`.
    ///
    /// Values that are not positive or do not fit a `Duration` are ignored.
    pub fn timeout(&self, kind: &str) -> Option<Duration> {
        self.options(kind)?
            .extra("timeout")?
            .as_f64()
            .filter(|secs| *secs > 0.0)
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
    }

    /// Driver platform override from `extras.device_type`.
    pub fn device_type(&self, kind: &str) -> Option<&str> {
        self.options(kind)?.extra_str("device_type")
    }

    /// Resolve parameters for a connection kind.
    ///
    /// Per-kind options win over device fields, which win over `defaults`.
    pub fn params(&self, kind: &str, defaults: &Defaults) -> Result<ConnectionParams, InventoryError> {
        let options = self.options(kind);
        let missing = |field| InventoryError::MissingField {
            host: self.name.clone(),
            field,
        };

        let username = options
            .and_then(|o| o.username.clone())
            .or_else(|| self.username.clone())
            .or_else(|| defaults.username.clone())
            .ok_or_else(|| missing("username"))?;

        let platform = self
            .device_type(kind)
            .map(String::from)
            .or_else(|| options.and_then(|o| o.platform.clone()))
            .or_else(|| self.platform.clone())
            .or_else(|| defaults.platform.clone())
            .ok_or_else(|| missing("platform"))?;

        let password = options
            .and_then(|o| o.password.as_ref())
            .or(self.password.as_ref())
            .or(defaults.password.as_ref())
            .map(copy_secret);

        let host_key_verification = match options.and_then(|o| o.extra_str("host_key_checking")) {
            Some(value) => Some(value.parse().map_err(|_| InventoryError::InvalidOption {
                host: self.name.clone(),
                option: "host_key_checking",
                value: value.to_string(),
            })?),
            None => None,
        };

        let port = options
            .and_then(|o| o.port)
            .or(self.port)
            .or(defaults.port)
            .unwrap_or(22);

        Ok(ConnectionParams {
            hostname: self.address(kind).to_string(),
            port,
            username,
            secret: self.secret(kind).or_else(|| password.as_ref().map(copy_secret)),
            password,
            platform,
            timeout: self.timeout(kind),
            host_key_verification,
        })
    }
}

pub(crate) fn copy_secret(secret: &SecretString) -> SecretString {
    SecretString::from(secret.expose_secret().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn router() -> Device {
        Device::new("R1")
            .with_hostname("10.0.0.1")
            .with_username("admin")
            .with_password("login-pw")
            .with_platform("ios")
            .with_port(22)
            .with_connection_options(
                "netmiko",
                ConnectionOptions::new()
                    .with_extras(json!({"device_type": "cisco_ios", "secret": "en-pw"})),
            )
            .with_connection_options(
                "napalm",
                ConnectionOptions::new()
                    .with_extras(json!({"optional_args": {"secret": "napalm-pw", "timeout": 1}})),
            )
    }

    #[test]
    fn test_secret_lookup_both_layouts() {
        let device = router();
        assert_eq!(device.secret("netmiko").unwrap().expose_secret(), "en-pw");
        assert_eq!(device.secret("napalm").unwrap().expose_secret(), "napalm-pw");
        // no options for this kind: falls back to the login password
        assert_eq!(device.secret("other").unwrap().expose_secret(), "login-pw");
    }

    #[test]
    fn test_timeout_and_device_type() {
        let device = router();
        assert_eq!(device.timeout("napalm"), Some(Duration::from_secs(1)));
        assert_eq!(device.timeout("netmiko"), None);
        assert_eq!(device.device_type("netmiko"), Some("cisco_ios"));
        assert_eq!(device.device_type("napalm"), None);
    }

    #[test]
    fn test_params_resolution_order() {
        let mut device = router();
        device.connection_options.insert(
            "napalm".to_string(),
            ConnectionOptions {
                port: Some(2222),
                username: Some("napalm-user".into()),
                ..ConnectionOptions::new()
            },
        );

        let defaults = Defaults::default();
        let netmiko = device.params("netmiko", &defaults).unwrap();
        assert_eq!(netmiko.hostname, "10.0.0.1");
        assert_eq!(netmiko.username, "admin");
        assert_eq!(netmiko.platform, "cisco_ios");
        assert_eq!(netmiko.port, 22);

        let napalm = device.params("napalm", &defaults).unwrap();
        assert_eq!(napalm.username, "napalm-user");
        assert_eq!(napalm.port, 2222);
        assert_eq!(napalm.platform, "ios");
        assert_eq!(napalm.secret.unwrap().expose_secret(), "login-pw");
    }

    #[test]
    fn test_params_fall_back_to_defaults() {
        let device = Device::new("edge1");
        let defaults = Defaults {
            username: Some("ops".into()),
            password: Some(SecretString::from("pw".to_string())),
            platform: Some("ios".into()),
            port: Some(8022),
        };

        let params = device.params("netmiko", &defaults).unwrap();
        assert_eq!(params.hostname, "edge1");
        assert_eq!(params.username, "ops");
        assert_eq!(params.port, 8022);
        assert_eq!(params.password.unwrap().expose_secret(), "pw");
        assert_eq!(params.secret.unwrap().expose_secret(), "pw");
    }

    #[test]
    fn test_params_host_key_checking() {
        let device = router().with_connection_options(
            "netmiko",
            ConnectionOptions::new().with_extras(json!({"host_key_checking": "strict"})),
        );
        let params = device.params("netmiko", &Defaults::default()).unwrap();
        assert_eq!(params.host_key_verification, Some(HostKeyVerification::Strict));
        assert_eq!(
            device.params("napalm", &Defaults::default()).unwrap().host_key_verification,
            None
        );

        let bad = router().with_connection_options(
            "netmiko",
            ConnectionOptions::new().with_extras(json!({"host_key_checking": "maybe"})),
        );
        let err = bad.params("netmiko", &Defaults::default()).unwrap_err();
        assert!(err.to_string().contains("maybe"));
    }

    #[test]
    fn test_params_missing_username() {
        let device = Device::new("edge1").with_platform("ios");
        let err = device.params("netmiko", &Defaults::default()).unwrap_err();
        assert!(err.to_string().contains("username"));
    }

    #[test]
    fn test_timeout_out_of_range_is_ignored() {
        let device = Device::new("R1").with_connection_options(
            "napalm",
            ConnectionOptions::new().with_extras(json!({"optional_args": {"timeout": 1e20}})),
        );
        assert_eq!(device.timeout("napalm"), None);

        let negative = Device::new("R1").with_connection_options(
            "napalm",
            ConnectionOptions::new().with_extras(json!({"timeout": -5})),
        );
        assert_eq!(negative.timeout("napalm"), None);
    }

    #[test]
    fn test_debug_redacts_password() {
        let rendered = format!("{:?}", router());
        assert!(!rendered.contains("login-pw"));
        assert!(!rendered.contains("en-pw"));
        assert!(!rendered.contains("napalm-pw"));
        assert!(rendered.contains("cisco_ios"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
