//! On-disk hosts-file layout.

use indexmap::IndexMap;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ConnectionOptions, Device, Inventory};

pub(super) type HostsFile = IndexMap<String, HostEntry>;

#[derive(Default, Serialize, Deserialize)]
pub(super) struct HostEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    hostname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    platform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    port: Option<u16>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    data: IndexMap<String, Value>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    connection_options: IndexMap<String, OptionsEntry>,
}

#[derive(Default, Serialize, Deserialize)]
pub(super) struct OptionsEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    hostname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    platform: Option<String>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    extras: Value,
}

fn secret(value: Option<String>) -> Option<SecretString> {
    value.map(SecretString::from)
}

fn exposed(value: &Option<SecretString>) -> Option<String> {
    value.as_ref().map(|s| s.expose_secret().to_string())
}

pub(super) fn into_inventory(hosts: HostsFile) -> Inventory {
    hosts
        .into_iter()
        .map(|(name, entry)| {
            let mut device = Device::new(name);
            device.hostname = entry.hostname;
            device.username = entry.username;
            device.password = secret(entry.password);
            device.platform = entry.platform;
            device.port = entry.port;
            device.data = entry.data;
            device.connection_options = entry
                .connection_options
                .into_iter()
                .map(|(kind, o)| {
                    let options = ConnectionOptions {
                        hostname: o.hostname,
                        port: o.port,
                        username: o.username,
                        password: secret(o.password),
                        platform: o.platform,
                        extras: o.extras,
                    };
                    (kind, options)
                })
                .collect();
            device
        })
        .collect()
}

pub(super) fn from_inventory(inventory: &Inventory) -> HostsFile {
    inventory
        .hosts()
        .map(|device| {
            let entry = HostEntry {
                hostname: device.hostname.clone(),
                username: device.username.clone(),
                password: exposed(&device.password),
                platform: device.platform.clone(),
                port: device.port,
                data: device.data.clone(),
                connection_options: device
                    .connection_options
                    .iter()
                    .map(|(kind, o)| {
                        let entry = OptionsEntry {
                            hostname: o.hostname.clone(),
                            port: o.port,
                            username: o.username.clone(),
                            password: exposed(&o.password),
                            platform: o.platform.clone(),
                            extras: o.extras.clone(),
                        };
                        (kind.clone(), entry)
                    })
                    .collect(),
            };
            (device.name().to_string(), entry)
        })
        .collect()
}
