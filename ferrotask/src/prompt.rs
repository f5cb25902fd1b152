//! Interactive collection of router credentials.

use dialoguer::{Confirm, Input, Password};
use log::info;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;

use crate::error::Result;
use crate::inventory::{ConnectionOptions, Device};
use crate::resolve::{is_ipv4, is_resolvable};
use crate::task::{CLI_CONNECTION, GETTER_CONNECTION};

/// Seconds the getter connection waits for the device.
const GETTER_TIMEOUT_SECS: u64 = 60;

/// Answers collected from the terminal.
#[derive(Debug)]
pub struct RouterAnswers {
    pub name: String,
    pub address: String,
    pub username: String,
    pub password: SecretString,
    pub secret: SecretString,
}

impl RouterAnswers {
    /// Build an IOS device with options for both connection kinds.
    pub fn into_device(self) -> Device {
        let secret = self.secret.expose_secret();
        let netmiko = ConnectionOptions::new()
            .with_extras(json!({ "device_type": "cisco_ios", "secret": secret }));
        let napalm = ConnectionOptions::new()
            .with_extras(json!({
                "optional_args": { "secret": secret, "timeout": GETTER_TIMEOUT_SECS }
            }));

        Device::new(self.name)
            .with_hostname(self.address)
            .with_username(self.username)
            .with_password(self.password.expose_secret())
            .with_platform("ios")
            .with_port(22)
            .with_connection_options(CLI_CONNECTION, netmiko)
            .with_connection_options(GETTER_CONNECTION, napalm)
    }
}

/// Ask for a router's name, address and credentials.
///
/// The address comes from DNS when the name resolves; otherwise the user is
/// asked for an IPv4 address until a valid one is given.
pub async fn prompt_router() -> Result<RouterAnswers> {
    let name: String = Input::new()
        .with_prompt("Hostname of router")
        .interact_text()?;

    let resolution = is_resolvable(&name).await;
    let address = if resolution.resolved {
        info!("{} resolves to {}", name, resolution.host);
        resolution.host
    } else {
        Input::new()
            .with_prompt(format!("IPv4 address of {}", name))
            .validate_with(|input: &String| {
                if is_ipv4(input) {
                    Ok(())
                } else {
                    Err("not a dotted-quad IPv4 address")
                }
            })
            .interact_text()?
    };

    let username: String = Input::new()
        .with_prompt(format!("Username of {}", name))
        .interact_text()?;
    let password = SecretString::from(
        Password::new()
            .with_prompt(format!("Password of {}", address))
            .interact()?,
    );

    let same = Confirm::new()
        .with_prompt("Is enable password the same as management password?")
        .interact()?;
    let secret = if same {
        password.clone()
    } else {
        SecretString::from(
            Password::new()
                .with_prompt(format!("Enable password for {}", address))
                .interact()?,
        )
    };

    Ok(RouterAnswers {
        name,
        address,
        username,
        password,
        secret,
    })
}

/// Prompt for a router and build its [`Device`].
pub async fn prompt_device() -> Result<Device> {
    Ok(prompt_router().await?.into_device())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::Defaults;

    fn answers() -> RouterAnswers {
        RouterAnswers {
            name: "R1".into(),
            address: "10.0.0.1".into(),
            username: "admin".into(),
            password: SecretString::from("login".to_string()),
            secret: SecretString::from("enable".to_string()),
        }
    }

    #[test]
    fn test_device_carries_both_connection_layouts() {
        let device = answers().into_device();
        assert_eq!(device.name(), "R1");
        assert_eq!(device.port, Some(22));
        assert_eq!(device.device_type(CLI_CONNECTION), Some("cisco_ios"));
        assert_eq!(device.secret(CLI_CONNECTION).unwrap().expose_secret(), "enable");
        assert_eq!(device.secret(GETTER_CONNECTION).unwrap().expose_secret(), "enable");
        assert_eq!(
            device.timeout(GETTER_CONNECTION),
            Some(std::time::Duration::from_secs(GETTER_TIMEOUT_SECS))
        );
        assert_eq!(device.timeout(CLI_CONNECTION), None);
    }

    #[test]
    fn test_debug_hides_credentials() {
        let rendered = format!("{:?}", answers());
        assert!(!rendered.contains("login"));
        assert!(!rendered.contains("enable"));

        let device = format!("{:?}", answers().into_device());
        assert!(!device.contains("login"));
        assert!(!device.contains("enable"));
    }

    #[test]
    fn test_params_use_platform_per_kind() {
        let device = answers().into_device();
        let defaults = Defaults::default();
        assert_eq!(device.params(CLI_CONNECTION, &defaults).unwrap().platform, "cisco_ios");
        assert_eq!(device.params(GETTER_CONNECTION, &defaults).unwrap().platform, "ios");
    }
}
