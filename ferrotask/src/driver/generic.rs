//! Generic driver implementation that works with any platform.

use std::time::{Duration, Instant};

use log::{debug, trace, warn};
use regex::bytes::Regex;
use secrecy::{ExposeSecret, SecretString};

use super::Driver;
use super::interactive::{InteractiveEvent, InteractiveResult, InteractiveStep};
use super::privilege::PrivilegeManager;
use super::response::{Response, normalize_output};
use crate::channel::PtyChannel;
use crate::error::{ChannelError, DriverError, Result};
use crate::platform::PlatformDefinition;
use crate::transport::{AuthMethod, SshConfig, SshTransport};

/// Bytes from the end of the buffer searched for a prompt.
const SEARCH_DEPTH: usize = 1000;

/// Answers that commonly precede a save confirmation.
const CONFIRM_PATTERN: &str = r"(?i)(\[confirm\]|\[y/n\]|\?)\s*$";

/// Driver for any device described by a [`PlatformDefinition`].
///
/// Owns the SSH session and the shell channel, tracks the current privilege
/// level from each prompt it reads, and moves between levels on demand.
pub struct GenericDriver {
    ssh_config: SshConfig,
    platform: PlatformDefinition,
    enable_secret: Option<SecretString>,
    transport: Option<SshTransport>,
    channel: Option<PtyChannel>,
    privilege_manager: PrivilegeManager,
    timeout: Duration,
    /// Matches the prompt of any privilege level.
    prompt_pattern: Regex,
}

impl GenericDriver {
    /// Create a disconnected driver.
    pub fn new(
        ssh_config: SshConfig,
        platform: PlatformDefinition,
        enable_secret: Option<SecretString>,
    ) -> Result<Self> {
        let prompt_pattern = Self::build_combined_pattern(&platform)?;
        let privilege_manager = PrivilegeManager::new(platform.privilege_levels.clone());

        Ok(Self {
            timeout: ssh_config.timeout,
            ssh_config,
            platform,
            enable_secret,
            transport: None,
            channel: None,
            privilege_manager,
            prompt_pattern,
        })
    }

    fn build_combined_pattern(platform: &PlatformDefinition) -> Result<Regex> {
        if platform.privilege_levels.is_empty() {
            return Err(DriverError::InvalidConfig {
                message: format!("platform '{}' defines no privilege levels", platform.name),
            }
            .into());
        }

        let combined = platform
            .privilege_levels
            .values()
            .map(|level| format!("(?:{})", level.pattern.as_str()))
            .collect::<Vec<_>>()
            .join("|");

        Ok(Regex::new(&combined).map_err(ChannelError::InvalidPattern)?)
    }

    pub fn prompt_pattern(&self) -> &Regex {
        &self.prompt_pattern
    }

    pub fn platform(&self) -> &PlatformDefinition {
        &self.platform
    }

    pub fn privilege_manager(&self) -> &PrivilegeManager {
        &self.privilege_manager
    }

    pub fn host(&self) -> &str {
        &self.ssh_config.host
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Read up to the next prompt; returns the raw text and the prompt text.
    async fn read_until_prompt(&mut self) -> Result<(String, String)> {
        let channel = self.channel.as_mut().ok_or(DriverError::NotConnected)?;
        let data = channel.read_until(&self.prompt_pattern, self.timeout).await?;

        let prompt = self
            .prompt_pattern
            .find_iter(&data)
            .last()
            .map(|m| String::from_utf8_lossy(m.as_bytes()).into_owned())
            .unwrap_or_default();

        Ok((String::from_utf8_lossy(&data).into_owned(), prompt))
    }

    /// Update the tracked privilege level from a prompt, tolerating unknown prompts.
    fn track_prompt(&mut self, prompt: &str) {
        match self.privilege_manager.update_from_prompt(prompt.trim()) {
            Ok(level) => trace!("{}: privilege now '{}'", self.ssh_config.host, level),
            Err(e) => debug!("{}: {}", self.ssh_config.host, e),
        }
    }

    async fn send_line(&mut self, input: &str) -> Result<()> {
        self.channel
            .as_mut()
            .ok_or(DriverError::NotConnected)?
            .send(input)
            .await
    }

    /// Secret used to answer an escalation password prompt.
    fn escalation_secret(&self) -> Option<&str> {
        if let Some(secret) = &self.enable_secret {
            return Some(secret.expose_secret());
        }
        match &self.ssh_config.auth {
            AuthMethod::Password(password) => Some(password.expose_secret()),
            _ => None,
        }
    }

    /// Persist the running configuration.
    ///
    /// `command` defaults to the platform's save command. When `confirm` is
    /// given, it is sent as the answer to the device's confirmation question.
    pub async fn save_config(
        &mut self,
        command: Option<&str>,
        confirm: Option<&str>,
    ) -> Result<Response> {
        let command = match command.or(self.platform.save_command.as_deref()) {
            Some(command) => command.to_string(),
            None => {
                return Err(DriverError::InvalidConfig {
                    message: format!("platform '{}' has no save command", self.platform.name),
                }
                .into());
            }
        };

        let default_privilege = self.platform.default_privilege.clone();
        if !default_privilege.is_empty() {
            self.acquire_privilege(&default_privilege).await?;
        }

        let Some(answer) = confirm else {
            return self.send_command(&command).await;
        };

        let events = [
            InteractiveEvent::new(command.as_str(), CONFIRM_PATTERN)?,
            InteractiveEvent::until_prompt(answer),
        ];
        let result = self.send_interactive(&events).await?;
        let prompt = self
            .privilege_manager
            .current_name()
            .unwrap_or_default()
            .to_string();

        Ok(Response {
            command,
            result: result.full_output(),
            raw_result: result.full_output(),
            prompt,
            elapsed: result.elapsed,
            failure_message: result
                .steps
                .iter()
                .find_map(|step| step.failure_message.clone()),
        })
    }
}

impl Driver for GenericDriver {
    async fn open(&mut self) -> Result<()> {
        if self.transport.is_some() {
            return Err(DriverError::AlreadyConnected.into());
        }

        let transport = SshTransport::connect(&self.ssh_config).await?;
        let shell = transport.open_shell().await?;
        self.transport = Some(transport);
        self.channel = Some(PtyChannel::new(shell, SEARCH_DEPTH));

        let (_, prompt) = self.read_until_prompt().await?;
        self.track_prompt(&prompt);
        debug!(
            "{}: session open at '{}'",
            self.ssh_config.host,
            self.current_privilege().unwrap_or("unknown")
        );

        for command in self.platform.on_open_commands.clone() {
            self.send_command(&command).await?;
        }

        let default_privilege = self.platform.default_privilege.clone();
        if !default_privilege.is_empty() {
            self.acquire_privilege(&default_privilege).await?;
        }

        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if self.transport.is_none() {
            return Ok(());
        }

        for command in self.platform.on_close_commands.clone() {
            if let Err(e) = self.send_command(&command).await {
                warn!("{}: on-close command '{}' failed: {}", self.ssh_config.host, command, e);
            }
        }

        if let Some(channel) = self.channel.take() {
            if let Err(e) = channel.close().await {
                debug!("{}: closing channel: {}", self.ssh_config.host, e);
            }
        }
        if let Some(transport) = self.transport.take() {
            transport.close().await?;
        }
        Ok(())
    }

    async fn send_command(&mut self, command: &str) -> Result<Response> {
        let start = Instant::now();
        debug!("{} >> {}", self.ssh_config.host, command);

        self.send_line(command).await?;
        let (raw, prompt) = self.read_until_prompt().await?;
        self.track_prompt(&prompt);

        let failure = self
            .platform
            .detect_failure(&raw)
            .map(|pattern| pattern.to_string());
        if let Some(pattern) = &failure {
            warn!("{}: '{}' failed: {}", self.ssh_config.host, command, pattern);
        }

        Ok(Response::from_raw(command, raw, &prompt, start.elapsed(), failure))
    }

    async fn send_interactive(&mut self, events: &[InteractiveEvent]) -> Result<InteractiveResult> {
        let start = Instant::now();
        let mut steps = Vec::with_capacity(events.len());

        for event in events {
            let step_start = Instant::now();
            debug!("{} >> {} (interactive)", self.ssh_config.host, event.display_input());
            self.send_line(&event.input).await?;

            let timeout = event.timeout.unwrap_or(self.timeout);
            let pattern = event.pattern.as_ref().unwrap_or(&self.prompt_pattern);
            let channel = self.channel.as_mut().ok_or(DriverError::NotConnected)?;
            let data = channel.read_until(pattern, timeout).await?;
            let raw = String::from_utf8_lossy(&data).into_owned();

            let output = if event.pattern.is_none() {
                let prompt = self
                    .prompt_pattern
                    .find_iter(&data)
                    .last()
                    .map(|m| String::from_utf8_lossy(m.as_bytes()).into_owned())
                    .unwrap_or_default();
                self.track_prompt(&prompt);
                normalize_output(&raw, &event.input, &prompt)
            } else {
                normalize_output(&raw, &event.input, "")
            };

            steps.push(InteractiveStep {
                input: event.display_input().to_string(),
                failure_message: self.platform.detect_failure(&output).map(String::from),
                output,
                elapsed: step_start.elapsed(),
            });
        }

        Ok(InteractiveResult::new(steps, start.elapsed()))
    }

    async fn send_config(&mut self, commands: &[&str]) -> Result<Vec<Response>> {
        let config_privilege = self
            .platform
            .config_privilege()
            .ok_or_else(|| DriverError::InvalidConfig {
                message: format!("platform '{}' has no configuration level", self.platform.name),
            })?
            .to_string();

        let original = self
            .current_privilege()
            .map(String::from)
            .unwrap_or_else(|| self.platform.default_privilege.clone());

        self.acquire_privilege(&config_privilege).await?;

        let mut responses = Vec::with_capacity(commands.len());
        for command in commands {
            responses.push(self.send_command(command).await?);
        }

        // Sub-mode commands ("interface ...") keep us inside the config level,
        // so returning is a single de-escalation.
        if original != config_privilege {
            self.acquire_privilege(&original).await?;
        }

        Ok(responses)
    }

    async fn acquire_privilege(&mut self, target: &str) -> Result<()> {
        let current = match self.privilege_manager.current_name() {
            Some(name) => name.to_string(),
            None => {
                self.send_line("").await?;
                let (_, prompt) = self.read_until_prompt().await?;
                self.privilege_manager.update_from_prompt(prompt.trim())?
            }
        };

        if current == target {
            return Ok(());
        }

        let path = self.privilege_manager.find_path(&current, target)?;
        debug!("{}: privilege path {}", self.ssh_config.host, path.join(" -> "));

        for hop in path.windows(2) {
            let (from, to) = (&hop[0], &hop[1]);
            let transition = self
                .privilege_manager
                .transition(from, to)
                .ok_or_else(|| DriverError::NoPrivilegePath {
                    from: from.clone(),
                    to: to.clone(),
                })?;

            self.send_line(&transition.command).await?;

            let prompt = match &transition.auth_prompt {
                Some(auth) => {
                    let either = Regex::new(&format!(
                        "(?:{})|(?:{})",
                        auth.as_str(),
                        self.prompt_pattern.as_str()
                    ))
                    .map_err(ChannelError::InvalidPattern)?;

                    let channel = self.channel.as_mut().ok_or(DriverError::NotConnected)?;
                    let data = channel.read_until(&either, self.timeout).await?;

                    if auth.is_match(&data) {
                        let secret = self
                            .escalation_secret()
                            .ok_or_else(|| DriverError::PrivilegeAcquisitionFailed {
                                target: to.clone(),
                            })?
                            .to_string();
                        debug!("{} >> ******** (enable secret)", self.ssh_config.host);
                        self.send_line(&secret).await?;
                        self.read_until_prompt().await?.1
                    } else {
                        self.prompt_pattern
                            .find_iter(&data)
                            .last()
                            .map(|m| String::from_utf8_lossy(m.as_bytes()).into_owned())
                            .unwrap_or_default()
                    }
                }
                None => self.read_until_prompt().await?.1,
            };

            let reached = self.privilege_manager.update_from_prompt(prompt.trim())?;
            if reached != *to {
                return Err(DriverError::PrivilegeAcquisitionFailed { target: to.clone() }.into());
            }
        }

        Ok(())
    }

    fn is_open(&self) -> bool {
        self.transport.is_some()
    }

    fn is_alive(&self) -> bool {
        self.transport.as_ref().is_some_and(SshTransport::is_alive)
    }

    fn current_privilege(&self) -> Option<&str> {
        self.privilege_manager.current_name()
    }
}
