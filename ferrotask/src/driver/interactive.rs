//! Interactive command sequences.
//!
//! Some commands stop to ask a question before returning to the prompt:
//! `copy running-config startup-config` asks for a destination filename,
//! `reload` asks for confirmation. An interactive sequence sends one input
//! per step and waits for that step's pattern (or the device prompt) before
//! moving on.

use std::time::Duration;

use regex::bytes::Regex;

use crate::error::{ChannelError, Result};

/// One step of an interactive sequence.
#[derive(Debug, Clone)]
pub struct InteractiveEvent {
    /// Text to send.
    pub input: String,

    /// Pattern that ends this step. `None` waits for the device prompt.
    pub pattern: Option<Regex>,

    /// Keep the input out of logs and results (passwords).
    pub hidden: bool,

    /// Per-step timeout override.
    pub timeout: Option<Duration>,
}

impl InteractiveEvent {
    /// Send `input`, then wait for `pattern`.
    pub fn new(input: impl Into<String>, pattern: &str) -> Result<Self> {
        Ok(Self {
            input: input.into(),
            pattern: Some(Regex::new(pattern).map_err(ChannelError::InvalidPattern)?),
            hidden: false,
            timeout: None,
        })
    }

    /// Send `input`, then wait for the device prompt.
    pub fn until_prompt(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            pattern: None,
            hidden: false,
            timeout: None,
        }
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Input as it may appear in logs.
    pub fn display_input(&self) -> &str {
        if self.hidden { "********" } else { &self.input }
    }
}

/// Result of one step.
#[derive(Debug, Clone)]
pub struct InteractiveStep {
    /// Input sent (masked if hidden).
    pub input: String,

    /// Output received before the step's pattern matched.
    pub output: String,

    pub elapsed: Duration,

    /// Matched platform failure pattern, if any.
    pub failure_message: Option<String>,
}

/// Result of a whole interactive sequence.
#[derive(Debug, Clone)]
pub struct InteractiveResult {
    pub steps: Vec<InteractiveStep>,
    pub elapsed: Duration,
}

impl InteractiveResult {
    pub fn new(steps: Vec<InteractiveStep>, elapsed: Duration) -> Self {
        Self { steps, elapsed }
    }

    /// Whether any step hit a failure pattern.
    pub fn failed(&self) -> bool {
        self.steps.iter().any(|s| s.failure_message.is_some())
    }

    /// All step outputs joined by newlines.
    pub fn full_output(&self) -> String {
        self.steps
            .iter()
            .map(|s| s.output.as_str())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_patterns() {
        let event = InteractiveEvent::new("copy run start", r"Destination filename").unwrap();
        assert!(event.pattern.is_some());
        assert!(!event.hidden);

        let event = InteractiveEvent::until_prompt("");
        assert!(event.pattern.is_none());

        assert!(InteractiveEvent::new("x", r"[").is_err());
    }

    #[test]
    fn test_hidden_input_is_masked() {
        let event = InteractiveEvent::until_prompt("s3cret").hidden();
        assert_eq!(event.display_input(), "********");
        assert_eq!(event.input, "s3cret");
    }

    #[test]
    fn test_result_aggregation() {
        let step = |output: &str, failure: Option<&str>| InteractiveStep {
            input: "x".into(),
            output: output.into(),
            elapsed: Duration::from_millis(5),
            failure_message: failure.map(String::from),
        };

        let result = InteractiveResult::new(
            vec![step("Destination filename [startup-config]?", None), step("[OK]", None)],
            Duration::from_millis(10),
        );
        assert!(!result.failed());
        assert_eq!(
            result.full_output(),
            "Destination filename [startup-config]?\n[OK]"
        );

        let result = InteractiveResult::new(vec![step("", Some("% Error"))], Duration::ZERO);
        assert!(result.failed());
    }
}
