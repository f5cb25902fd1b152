//! Platform definition for vendor-specific configurations.

use indexmap::IndexMap;

use super::privilege_level::PrivilegeLevel;

/// Everything the driver needs to know about one kind of device.
#[derive(Debug, Clone)]
pub struct PlatformDefinition {
    /// Canonical platform name (e.g. "cisco_ios").
    pub name: String,

    /// Alternative names this platform is registered under (e.g. "ios").
    pub aliases: Vec<String>,

    /// Privilege levels, root first.
    pub privilege_levels: IndexMap<String, PrivilegeLevel>,

    /// Level the driver moves to right after connecting.
    pub default_privilege: String,

    /// Output substrings that mark a command as failed.
    pub failed_when_contains: Vec<String>,

    /// Commands run once the session is open (paging off, width).
    pub on_open_commands: Vec<String>,

    /// Commands run before the session is closed.
    pub on_close_commands: Vec<String>,

    /// Command that persists the running configuration.
    pub save_command: Option<String>,

    pub terminal_width: u32,

    pub terminal_height: u32,
}

impl PlatformDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: vec![],
            privilege_levels: IndexMap::new(),
            default_privilege: String::new(),
            failed_when_contains: vec![],
            on_open_commands: vec![],
            on_close_commands: vec![],
            save_command: None,
            terminal_width: 511,
            terminal_height: 24,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn with_privilege(mut self, level: PrivilegeLevel) -> Self {
        self.privilege_levels.insert(level.name.clone(), level);
        self
    }

    pub fn with_default_privilege(mut self, name: impl Into<String>) -> Self {
        self.default_privilege = name.into();
        self
    }

    pub fn with_failure_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.failed_when_contains.push(pattern.into());
        self
    }

    pub fn with_on_open_command(mut self, command: impl Into<String>) -> Self {
        self.on_open_commands.push(command.into());
        self
    }

    pub fn with_on_close_command(mut self, command: impl Into<String>) -> Self {
        self.on_close_commands.push(command.into());
        self
    }

    pub fn with_save_command(mut self, command: impl Into<String>) -> Self {
        self.save_command = Some(command.into());
        self
    }

    pub fn with_terminal_size(mut self, width: u32, height: u32) -> Self {
        self.terminal_width = width;
        self.terminal_height = height;
        self
    }

    pub fn get_privilege(&self, name: &str) -> Option<&PrivilegeLevel> {
        self.privilege_levels.get(name)
    }

    /// The configuration-mode level: the first level with "config" in its name.
    pub fn config_privilege(&self) -> Option<&str> {
        self.privilege_levels
            .keys()
            .find(|name| name.to_lowercase().contains("config"))
            .map(String::as_str)
    }

    /// First failure pattern found in `output`.
    pub fn detect_failure(&self, output: &str) -> Option<&str> {
        self.failed_when_contains
            .iter()
            .find(|pattern| output.contains(pattern.as_str()))
            .map(String::as_str)
    }
}
