//! Tasks and the context they run in.
//!
//! A [`Task`] runs once per selected host. It reaches the device through
//! [`HostContext::connection`], which opens connections lazily and keeps
//! them for the following tasks of the same [`Runner`].

mod context;
mod files;
mod getters;
mod networking;
mod runner;

pub use context::HostContext;
pub use files::{TemplateFile, TemplateString, WriteFile};
pub use getters::{ConfigRetrieve, DeviceConfig, Facts, Get, Getter, parse_facts};
pub use networking::{SaveConfig, SendCommand, SendConfig};
pub use runner::{Runner, RunnerBuilder};

use std::fmt;
use std::future::Future;

use serde_json::Value;

use crate::error::Result;

/// Connection kind used by the CLI tasks (commands, config push, save).
pub const CLI_CONNECTION: &str = "netmiko";

/// Connection kind used by the getter tasks (facts, config retrieval).
pub const GETTER_CONNECTION: &str = "napalm";

/// Data returned by a task.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Payload {
    #[default]
    None,
    Text(String),
    Json(Value),
}

impl Payload {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Payload::Json(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::None => Ok(()),
            Payload::Text(text) => f.write_str(text),
            Payload::Json(value) => match serde_json::to_string_pretty(value) {
                Ok(text) => f.write_str(&text),
                Err(_) => write!(f, "{}", value),
            },
        }
    }
}

/// What a successful task reports.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskOutput {
    pub payload: Payload,
    /// The task modified the device or a file.
    pub changed: bool,
    pub diff: String,
}

impl TaskOutput {
    pub fn new(payload: Payload) -> Self {
        Self {
            payload,
            ..Self::default()
        }
    }

    pub fn with_changed(mut self, changed: bool) -> Self {
        self.changed = changed;
        self
    }

    pub fn with_diff(mut self, diff: impl Into<String>) -> Self {
        self.diff = diff.into();
        self
    }
}

/// A unit of work run against each selected host.
///
/// # Example
///
/// ```rust,no_run
/// use ferrotask::task::{HostContext, Payload, Task, TaskOutput, CLI_CONNECTION};
/// use ferrotask::driver::Driver;
///
/// struct ShowClock;
///
/// impl Task for ShowClock {
///     fn name(&self) -> &str {
///         "show clock"
///     }
///
///     async fn run(&self, ctx: &mut HostContext<'_>) -> ferrotask::Result<TaskOutput> {
///         let driver = ctx.connection(CLI_CONNECTION).await?;
///         let response = driver.send_command("show clock").await?;
///         Ok(TaskOutput::new(Payload::Text(response.result)))
///     }
/// }
/// ```
pub trait Task: Send + Sync {
    /// Name shown in results.
    fn name(&self) -> &str;

    /// Connection kind the task opens, if any.
    fn connection(&self) -> Option<&str> {
        None
    }

    fn run(&self, ctx: &mut HostContext<'_>) -> impl Future<Output = Result<TaskOutput>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_display() {
        assert_eq!(Payload::None.to_string(), "");
        assert_eq!(Payload::Text("ok".into()).to_string(), "ok");
        let rendered = Payload::Json(json!({"a": 1})).to_string();
        assert_eq!(rendered, "{\n  \"a\": 1\n}");
    }

    #[test]
    fn test_payload_accessors() {
        let text = Payload::Text("x".into());
        assert_eq!(text.as_text(), Some("x"));
        assert!(text.as_json().is_none());
        assert_eq!(Payload::Json(json!(1)).as_json(), Some(&json!(1)));
    }
}
