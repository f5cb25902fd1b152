//! CLI tasks: show commands, configuration pushes and saves.

use log::info;

use super::{CLI_CONNECTION, HostContext, Payload, Task, TaskOutput};
use crate::driver::Driver;
use crate::error::Result;

/// Run one command and return its output.
#[derive(Debug, Clone)]
pub struct SendCommand {
    command: String,
}

impl SendCommand {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl Task for SendCommand {
    fn name(&self) -> &str {
        &self.command
    }

    fn connection(&self) -> Option<&str> {
        Some(CLI_CONNECTION)
    }

    async fn run(&self, ctx: &mut HostContext<'_>) -> Result<TaskOutput> {
        let driver = ctx.connection(CLI_CONNECTION).await?;
        let response = driver.send_command(&self.command).await?.into_success()?;
        Ok(TaskOutput::new(Payload::Text(response.result)))
    }
}

/// Push configuration lines from configuration mode.
///
/// The payload is the session transcript: each line as entered, followed
/// by whatever the device printed for it.
#[derive(Debug, Clone)]
pub struct SendConfig {
    name: String,
    commands: Vec<String>,
}

impl SendConfig {
    pub fn new<I, S>(commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: "send config".to_string(),
            commands: commands.into_iter().map(Into::into).collect(),
        }
    }

    /// Lines of a rendered configuration snippet. Blank lines and `!`
    /// comments are skipped.
    pub fn from_text(text: &str) -> Self {
        Self::new(
            text.lines()
                .map(str::trim_end)
                .filter(|line| !line.trim().is_empty() && !line.trim_start().starts_with('!')),
        )
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn commands(&self) -> &[String] {
        &self.commands
    }
}

impl Task for SendConfig {
    fn name(&self) -> &str {
        &self.name
    }

    fn connection(&self) -> Option<&str> {
        Some(CLI_CONNECTION)
    }

    async fn run(&self, ctx: &mut HostContext<'_>) -> Result<TaskOutput> {
        let host = ctx.host().to_string();
        let driver = ctx.connection(CLI_CONNECTION).await?;
        let commands: Vec<&str> = self.commands.iter().map(String::as_str).collect();
        let responses = driver.send_config(&commands).await?;

        let mut transcript = String::new();
        for response in responses {
            let response = response.into_success()?;
            transcript.push_str(&response.command);
            transcript.push('\n');
            if !response.result.is_empty() {
                transcript.push_str(&response.result);
                transcript.push('\n');
            }
        }
        info!("{}: applied {} configuration line(s)", host, commands.len());

        Ok(TaskOutput::new(Payload::Text(transcript)).with_changed(!commands.is_empty()))
    }
}

/// Persist the running configuration.
#[derive(Debug, Clone, Default)]
pub struct SaveConfig {
    name: Option<String>,
    command: Option<String>,
    confirm: Option<String>,
}

impl SaveConfig {
    /// Save with the platform's save command.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Use a different save command, e.g. "copy running-config startup-config".
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    /// Answer sent when the device asks for confirmation.
    pub fn with_confirm(mut self, answer: impl Into<String>) -> Self {
        self.confirm = Some(answer.into());
        self
    }
}

impl Task for SaveConfig {
    fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("save config")
    }

    fn connection(&self) -> Option<&str> {
        Some(CLI_CONNECTION)
    }

    async fn run(&self, ctx: &mut HostContext<'_>) -> Result<TaskOutput> {
        let driver = ctx.connection(CLI_CONNECTION).await?;
        let response = driver
            .save_config(self.command.as_deref(), self.confirm.as_deref())
            .await?
            .into_success()?;
        Ok(TaskOutput::new(Payload::Text(response.result)).with_changed(true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_config_from_rendered_text() {
        let rendered = "interface GigabitEthernet0/1\n ip address 192.168.2.1 255.255.255.252\n!\n\n no shutdown  \n";
        let task = SendConfig::from_text(rendered);
        assert_eq!(
            task.commands(),
            &[
                "interface GigabitEthernet0/1",
                " ip address 192.168.2.1 255.255.255.252",
                " no shutdown",
            ]
        );
        assert_eq!(task.name(), "send config");
        assert_eq!(task.with_name("configure router").name(), "configure router");
    }

    #[test]
    fn test_task_names() {
        assert_eq!(SendCommand::new("show version").name(), "show version");
        assert_eq!(SendCommand::new("show clock").connection(), Some(CLI_CONNECTION));
        assert_eq!(SaveConfig::new().name(), "save config");
        assert_eq!(
            SaveConfig::new().with_name("saving configuration").name(),
            "saving configuration"
        );
    }
}
