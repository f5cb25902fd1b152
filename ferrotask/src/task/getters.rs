//! Structured getters: device facts and configuration retrieval.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

use super::{GETTER_CONNECTION, HostContext, Payload, Task, TaskOutput};
use crate::driver::{Driver, GenericDriver};
use crate::error::{Result, TaskError};

static HOSTNAME_UPTIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(\S+)\s+uptime is\s+(.+)$").expect("static regex"));
static UPTIME_PART: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s+(year|week|day|hour|minute)s?").expect("static regex"));
static OS_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^Cisco IOS[^,\n]*,\s*(.+?)\s*$").expect("static regex"));
static SERIAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^Processor board ID\s+(\S+)").expect("static regex"));
static MODEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?mi)^cisco\s+(\S+)\s+.*(?:processor|bytes of memory)").expect("static regex")
});
static DOMAIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^Default domain is\s+(?:not set|(\S+))").expect("static regex"));

/// Getters understood by [`Get`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Getter {
    Facts,
    Config,
}

impl Getter {
    fn key(self) -> &'static str {
        match self {
            Getter::Facts => "facts",
            Getter::Config => "config",
        }
    }
}

impl FromStr for Getter {
    type Err = TaskError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim_start_matches("get_") {
            "facts" => Ok(Getter::Facts),
            "config" => Ok(Getter::Config),
            _ => Err(TaskError::UnsupportedGetter(s.to_string())),
        }
    }
}

/// Which configurations the config getter fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfigRetrieve {
    #[default]
    All,
    Running,
    Startup,
    Candidate,
}

impl FromStr for ConfigRetrieve {
    type Err = TaskError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "all" => Ok(ConfigRetrieve::All),
            "running" => Ok(ConfigRetrieve::Running),
            "startup" => Ok(ConfigRetrieve::Startup),
            "candidate" => Ok(ConfigRetrieve::Candidate),
            _ => Err(TaskError::UnsupportedGetter(format!("config retrieve '{}'", s))),
        }
    }
}

/// Basic device facts.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Facts {
    pub vendor: String,
    pub model: String,
    pub os_version: String,
    pub serial_number: String,
    pub hostname: String,
    pub fqdn: String,
    /// Seconds since boot.
    pub uptime: u64,
    pub interface_list: Vec<String>,
}

/// Device configurations. Fields not retrieved are empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeviceConfig {
    pub running: String,
    pub startup: String,
    /// IOS has no candidate configuration; always empty there.
    pub candidate: String,
}

/// Run one or more getters over the getter connection.
///
/// The payload is a JSON object keyed by getter name (`facts`, `config`).
#[derive(Debug, Clone)]
pub struct Get {
    name: String,
    getters: Vec<Getter>,
    retrieve: ConfigRetrieve,
}

impl Get {
    pub fn new(getters: impl IntoIterator<Item = Getter>) -> Self {
        Self {
            name: "get".to_string(),
            getters: getters.into_iter().collect(),
            retrieve: ConfigRetrieve::default(),
        }
    }

    pub fn facts() -> Self {
        Self::new([Getter::Facts]).with_name("get facts")
    }

    pub fn config(retrieve: ConfigRetrieve) -> Self {
        Self::new([Getter::Config])
            .with_name("get config")
            .with_retrieve(retrieve)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_retrieve(mut self, retrieve: ConfigRetrieve) -> Self {
        self.retrieve = retrieve;
        self
    }
}

impl Task for Get {
    fn name(&self) -> &str {
        &self.name
    }

    fn connection(&self) -> Option<&str> {
        Some(GETTER_CONNECTION)
    }

    async fn run(&self, ctx: &mut HostContext<'_>) -> Result<TaskOutput> {
        let driver = ctx.connection(GETTER_CONNECTION).await?;

        let mut results = Map::new();
        for getter in &self.getters {
            let value = match getter {
                Getter::Facts => serde_json::to_value(get_facts(driver).await?),
                Getter::Config => serde_json::to_value(get_config(driver, self.retrieve).await?),
            }
            .map_err(TaskError::Serialize)?;
            results.insert(getter.key().to_string(), value);
        }

        Ok(TaskOutput::new(Payload::Json(Value::Object(results))))
    }
}

async fn show(driver: &mut GenericDriver, command: &str) -> Result<String> {
    Ok(driver.send_command(command).await?.into_success()?.result)
}

async fn get_facts(driver: &mut GenericDriver) -> Result<Facts> {
    let version = show(driver, "show version").await?;
    let hosts = show(driver, "show hosts").await?;
    let interfaces = show(driver, "show ip interface brief").await?;
    Ok(parse_facts(&version, &hosts, &interfaces))
}

async fn get_config(driver: &mut GenericDriver, retrieve: ConfigRetrieve) -> Result<DeviceConfig> {
    let mut config = DeviceConfig::default();
    if matches!(retrieve, ConfigRetrieve::All | ConfigRetrieve::Running) {
        config.running = strip_config_header(&show(driver, "show running-config").await?);
    }
    if matches!(retrieve, ConfigRetrieve::All | ConfigRetrieve::Startup) {
        config.startup = strip_config_header(&show(driver, "show startup-config").await?);
    }
    Ok(config)
}

/// Build [`Facts`] from `show version`, `show hosts` and
/// `show ip interface brief` output.
pub fn parse_facts(show_version: &str, show_hosts: &str, ip_interface_brief: &str) -> Facts {
    let (hostname, uptime) = match HOSTNAME_UPTIME.captures(show_version) {
        Some(c) => (c[1].to_string(), parse_uptime(&c[2])),
        None => (String::new(), 0),
    };

    let fqdn = match DOMAIN.captures(show_hosts).and_then(|c| c.get(1)) {
        Some(domain) if !hostname.is_empty() => format!("{}.{}", hostname, domain.as_str()),
        _ => hostname.clone(),
    };

    let interface_list = ip_interface_brief
        .lines()
        .filter(|line| !line.starts_with("Interface"))
        .filter_map(|line| line.split_whitespace().next())
        .map(String::from)
        .collect();

    Facts {
        vendor: "Cisco".to_string(),
        model: first_capture(&MODEL, show_version),
        os_version: first_capture(&OS_VERSION, show_version),
        serial_number: first_capture(&SERIAL, show_version),
        hostname,
        fqdn,
        uptime,
        interface_list,
    }
}

fn first_capture(re: &Regex, text: &str) -> String {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// "1 year, 2 weeks, 3 days, 4 hours, 5 minutes" in seconds.
fn parse_uptime(text: &str) -> u64 {
    UPTIME_PART
        .captures_iter(text)
        .map(|c| {
            let count: u64 = c[1].parse().unwrap_or(0);
            let unit = match &c[2] {
                "year" => 31_536_000,
                "week" => 604_800,
                "day" => 86_400,
                "hour" => 3_600,
                _ => 60,
            };
            count * unit
        })
        .sum()
}

/// Drop the banner lines IOS prints before a configuration.
fn strip_config_header(text: &str) -> String {
    let mut lines = text.lines().peekable();
    while let Some(&line) = lines.peek() {
        let line = line.trim();
        if line.is_empty()
            || line.starts_with("Building configuration")
            || line.starts_with("Current configuration")
            || line.starts_with("Using ")
        {
            lines.next();
        } else {
            break;
        }
    }
    lines.collect::<Vec<_>>().join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHOW_VERSION: &str = "\
Cisco IOS Software, C2900 Software (C2900-UNIVERSALK9-M), Version 15.1(4)M4, RELEASE SOFTWARE (fc1)
Technical Support: http://www.cisco.com/techsupport
ROM: System Bootstrap, Version 15.0(1r)M15, RELEASE SOFTWARE (fc1)

R1 uptime is 1 week, 2 days, 3 hours, 4 minutes
System returned to ROM by power-on

cisco CISCO2911/K9 (revision 1.0) with 483328K/40960K bytes of memory.
Processor board ID FTX1234ABCD
3 Gigabit Ethernet interfaces
";

    const SHOW_HOSTS: &str = "\
Default domain is lab.example.com
Name/address lookup uses domain service
";

    const IP_INT_BRIEF: &str = "\
Interface              IP-Address      OK? Method Status                Protocol
GigabitEthernet0/0     10.0.0.1        YES NVRAM  up                    up
GigabitEthernet0/1     unassigned      YES NVRAM  administratively down down
Loopback0              1.1.1.1         YES NVRAM  up                    up
";

    #[test]
    fn test_parse_facts() {
        let facts = parse_facts(SHOW_VERSION, SHOW_HOSTS, IP_INT_BRIEF);
        assert_eq!(facts.vendor, "Cisco");
        assert_eq!(facts.hostname, "R1");
        assert_eq!(facts.fqdn, "R1.lab.example.com");
        assert_eq!(facts.model, "CISCO2911/K9");
        assert_eq!(facts.serial_number, "FTX1234ABCD");
        assert_eq!(
            facts.os_version,
            "C2900 Software (C2900-UNIVERSALK9-M), Version 15.1(4)M4, RELEASE SOFTWARE (fc1)"
        );
        assert_eq!(facts.uptime, 604_800 + 2 * 86_400 + 3 * 3_600 + 4 * 60);
        assert_eq!(
            facts.interface_list,
            vec!["GigabitEthernet0/0", "GigabitEthernet0/1", "Loopback0"]
        );
    }

    #[test]
    fn test_fqdn_without_domain() {
        let facts = parse_facts(SHOW_VERSION, "Default domain is not set\n", "");
        assert_eq!(facts.fqdn, "R1");
        assert!(facts.interface_list.is_empty());
    }

    #[test]
    fn test_parse_facts_tolerates_unknown_output() {
        let facts = parse_facts("", "", "");
        assert_eq!(facts.hostname, "");
        assert_eq!(facts.uptime, 0);
        assert_eq!(facts.vendor, "Cisco");
    }

    #[test]
    fn test_strip_config_header() {
        let raw = "Building configuration...\n\nCurrent configuration : 1234 bytes\n!\nversion 15.1\nhostname R1\n!\nend";
        assert_eq!(strip_config_header(raw), "!\nversion 15.1\nhostname R1\n!\nend");

        let startup = "Using 1234 out of 262136 bytes\n!\nhostname R1\nend";
        assert_eq!(strip_config_header(startup), "!\nhostname R1\nend");
    }

    #[test]
    fn test_getter_names() {
        assert_eq!("facts".parse::<Getter>().unwrap(), Getter::Facts);
        assert_eq!("get_config".parse::<Getter>().unwrap(), Getter::Config);
        assert!("get_bgp_neighbors".parse::<Getter>().is_err());
        assert_eq!(Getter::Facts.key(), "facts");
        assert_eq!(Getter::Config.key(), "config");
        assert_eq!("startup".parse::<ConfigRetrieve>().unwrap(), ConfigRetrieve::Startup);
        assert!("nvram".parse::<ConfigRetrieve>().is_err());
    }

    #[test]
    fn test_task_names() {
        assert_eq!(Get::facts().name(), "get facts");
        assert_eq!(Get::facts().connection(), Some(GETTER_CONNECTION));
        assert_eq!(Get::config(ConfigRetrieve::All).name(), "get config");
    }
}
