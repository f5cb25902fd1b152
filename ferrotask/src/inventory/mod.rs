//! Inventory of devices and their connection parameters.
//!
//! Hosts files map a device name to its address, credentials, platform,
//! port, free-form data and per-connection overrides:
//!
//! ```json
//! {
//!   "R1": {
//!     "hostname": "10.0.0.1",
//!     "username": "admin",
//!     "password": "secret",
//!     "platform": "ios",
//!     "port": 22,
//!     "connection_options": {
//!       "netmiko": { "extras": { "device_type": "cisco_ios", "secret": "enable" } },
//!       "napalm": { "extras": { "optional_args": { "secret": "enable" } } }
//!     }
//!   }
//! }
//! ```

mod device;
mod file;

pub use device::{ConnectionOptions, ConnectionParams, Device};
pub(crate) use device::copy_secret;

use std::path::Path;

use indexmap::IndexMap;
use log::debug;
use secrecy::SecretString;

use crate::error::{InventoryError, Result};

/// Values used when neither a device nor its connection options set a field.
#[derive(Debug, Default)]
pub struct Defaults {
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub platform: Option<String>,
    pub port: Option<u16>,
}

/// Ordered collection of devices.
#[derive(Debug, Default)]
pub struct Inventory {
    hosts: IndexMap<String, Device>,
    defaults: Defaults,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a hosts file. `.toml` files are parsed as TOML, anything else as JSON.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| InventoryError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let inventory = match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Self::from_toml_str(&text)?,
            _ => Self::from_json_str(&text)?,
        };
        debug!("Loaded {} host(s) from {}", inventory.len(), path.display());
        Ok(inventory)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let hosts: file::HostsFile = serde_json::from_str(text).map_err(InventoryError::Json)?;
        Ok(file::into_inventory(hosts))
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let hosts: file::HostsFile = toml::from_str(text).map_err(InventoryError::Toml)?;
        Ok(file::into_inventory(hosts))
    }

    /// Serialize to the hosts-file layout. Secrets are written in clear text.
    pub fn to_json(&self) -> Result<String> {
        let hosts = file::from_inventory(self);
        Ok(serde_json::to_string_pretty(&hosts).map_err(InventoryError::Json)?)
    }

    pub fn with_defaults(mut self, defaults: Defaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_device(mut self, device: Device) -> Self {
        self.add(device);
        self
    }

    /// Add or replace a device.
    pub fn add(&mut self, device: Device) {
        self.hosts.insert(device.name().to_string(), device);
    }

    pub fn defaults(&self) -> &Defaults {
        &self.defaults
    }

    pub fn get(&self, name: &str) -> Option<&Device> {
        self.hosts.get(name)
    }

    /// Look up a device, failing for unknown names.
    pub fn device(&self, name: &str) -> Result<&Device> {
        self.get(name)
            .ok_or_else(|| InventoryError::UnknownHost(name.to_string()).into())
    }

    pub fn hosts(&self) -> impl Iterator<Item = &Device> {
        self.hosts.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.hosts.keys().map(String::as_str)
    }

    /// Sub-inventory of the devices matching `predicate`, in inventory
    /// order. Defaults carry over.
    pub fn filter<F>(self, predicate: F) -> Self
    where
        F: Fn(&Device) -> bool,
    {
        let Self { hosts, defaults } = self;
        Self {
            hosts: hosts
                .into_iter()
                .filter(|(_, device)| predicate(device))
                .collect(),
            defaults,
        }
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    pub(crate) fn into_parts(self) -> (IndexMap<String, Device>, Defaults) {
        (self.hosts, self.defaults)
    }
}

impl FromIterator<Device> for Inventory {
    fn from_iter<I: IntoIterator<Item = Device>>(iter: I) -> Self {
        let mut inventory = Self::new();
        for device in iter {
            inventory.add(device);
        }
        inventory
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::io::Write;

    const HOSTS_JSON: &str = r#"{
        "R1": {
            "hostname": "10.0.0.1",
            "username": "admin",
            "password": "pw",
            "platform": "ios",
            "port": 22,
            "data": {"site": "lab"},
            "connection_options": {
                "netmiko": {"extras": {"device_type": "cisco_ios", "secret": "en"}},
                "napalm": {"extras": {"optional_args": {"secret": "en", "timeout": 1}}}
            }
        },
        "R2": {"hostname": "10.0.0.2"}
    }"#;

    #[test]
    fn test_from_json_keeps_order_and_fields() {
        let inventory = Inventory::from_json_str(HOSTS_JSON).unwrap();
        assert_eq!(inventory.names().collect::<Vec<_>>(), vec!["R1", "R2"]);

        let r1 = inventory.device("R1").unwrap();
        assert_eq!(r1.hostname.as_deref(), Some("10.0.0.1"));
        assert_eq!(r1.password.as_ref().unwrap().expose_secret(), "pw");
        assert_eq!(r1.data["site"], "lab");
        assert_eq!(r1.secret("napalm").unwrap().expose_secret(), "en");
        assert!(inventory.device("R9").is_err());
    }

    #[test]
    fn test_json_round_trip_preserves_credentials() {
        let inventory = Inventory::from_json_str(HOSTS_JSON).unwrap();
        let reloaded = Inventory::from_json_str(&inventory.to_json().unwrap()).unwrap();

        let r1 = reloaded.device("R1").unwrap();
        assert_eq!(r1.username.as_deref(), Some("admin"));
        assert_eq!(r1.device_type("netmiko"), Some("cisco_ios"));
        assert_eq!(reloaded.device("R2").unwrap().port, None);
    }

    #[test]
    fn test_from_toml_path() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[R1]
hostname = "10.0.0.1"
platform = "ios"

[R1.connection_options.netmiko.extras]
secret = "en"
"#
        )
        .unwrap();

        let inventory = Inventory::from_path(file.path()).unwrap();
        let r1 = inventory.device("R1").unwrap();
        assert_eq!(r1.platform.as_deref(), Some("ios"));
        assert_eq!(r1.secret("netmiko").unwrap().expose_secret(), "en");
    }

    #[test]
    fn test_from_path_missing_file() {
        let err = Inventory::from_path("/nonexistent/hosts.json").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/hosts.json"));
    }

    #[test]
    fn test_filter_and_defaults() {
        let inventory = Inventory::from_json_str(HOSTS_JSON)
            .unwrap()
            .with_defaults(Defaults {
                username: Some("ops".into()),
                platform: Some("ios".into()),
                ..Defaults::default()
            });

        let r2 = inventory.device("R2").unwrap();
        let params = r2.params("netmiko", inventory.defaults()).unwrap();
        assert_eq!(params.username, "ops");
        assert_eq!(params.hostname, "10.0.0.2");

        let ios = inventory.filter(|d| d.platform.as_deref() == Some("ios"));
        assert_eq!(ios.names().collect::<Vec<_>>(), vec!["R1"]);
        assert!(ios.get("R2").is_none());
        assert_eq!(ios.defaults().username.as_deref(), Some("ops"));
    }
}
