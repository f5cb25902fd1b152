//! Response type for command execution results.

use std::time::Duration;

use crate::error::{Result, TaskError};

/// Response from a command execution.
#[derive(Debug, Clone)]
pub struct Response {
    /// The command that was executed.
    pub command: String,

    /// Command output with the echo and trailing prompt removed.
    pub result: String,

    /// Output as read from the channel.
    pub raw_result: String,

    /// The prompt that ended the output.
    pub prompt: String,

    /// Time taken to execute the command.
    pub elapsed: Duration,

    /// Matched platform failure pattern, if any.
    pub failure_message: Option<String>,
}

impl Response {
    /// Build a response from raw channel output.
    ///
    /// `prompt_match` is the exact prompt text that terminated the read.
    pub(crate) fn from_raw(
        command: &str,
        raw: String,
        prompt_match: &str,
        elapsed: Duration,
        failure_message: Option<String>,
    ) -> Self {
        Self {
            command: command.to_string(),
            result: normalize_output(&raw, command, prompt_match),
            prompt: prompt_match.trim().to_string(),
            raw_result: raw,
            elapsed,
            failure_message,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failure_message.is_none()
    }

    /// Turn a failed response into a [`TaskError::CommandFailed`].
    pub fn into_success(self) -> Result<Self> {
        match self.failure_message {
            Some(message) => Err(TaskError::CommandFailed {
                command: self.command,
                message,
            }
            .into()),
            None => Ok(self),
        }
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.result.lines()
    }

    pub fn contains(&self, pattern: &str) -> bool {
        self.result.contains(pattern)
    }
}

impl std::fmt::Display for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.result)
    }
}

/// Strip the echoed command line and the trailing prompt.
pub(crate) fn normalize_output(raw: &str, command: &str, prompt_match: &str) -> String {
    let body = raw.strip_suffix(prompt_match).unwrap_or(raw);
    let command = command.trim();

    let body = match body.split_once('\n') {
        Some((first, rest)) if first.trim_end().ends_with(command) => rest,
        None if body.trim_end().ends_with(command) => "",
        _ => body,
    };

    body.trim_end().to_string()
}
