//! Privilege level definition.

use regex::bytes::Regex;

/// One node in a platform's privilege graph.
///
/// Each level names its parent (`previous_priv`) together with the commands
/// that move between the two. Escalation may require a secret, in which case
/// `escalate_prompt` matches the device's password prompt.
#[derive(Debug, Clone)]
pub struct PrivilegeLevel {
    /// Name of this privilege level (e.g. "exec", "privilege_exec").
    pub name: String,

    /// Prompt pattern for this level.
    pub pattern: Regex,

    /// Parent level (None for the root).
    pub previous_priv: Option<String>,

    /// Command that moves from the parent to this level.
    pub escalate_command: Option<String>,

    /// Command that moves from this level back to the parent.
    pub deescalate_command: Option<String>,

    /// Password prompt shown while escalating, if escalation is authenticated.
    pub escalate_prompt: Option<Regex>,

    /// Substrings that disqualify a prompt from this level
    /// (`#` matches both privileged and config prompts on IOS).
    pub not_contains: Vec<String>,
}

impl PrivilegeLevel {
    pub fn new(name: impl Into<String>, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            name: name.into(),
            pattern: Regex::new(pattern)?,
            previous_priv: None,
            escalate_command: None,
            deescalate_command: None,
            escalate_prompt: None,
            not_contains: vec![],
        })
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.previous_priv = Some(parent.into());
        self
    }

    pub fn with_escalate(mut self, command: impl Into<String>) -> Self {
        self.escalate_command = Some(command.into());
        self
    }

    pub fn with_deescalate(mut self, command: impl Into<String>) -> Self {
        self.deescalate_command = Some(command.into());
        self
    }

    /// Require a secret when escalating into this level.
    pub fn with_auth(mut self, prompt_pattern: &str) -> Result<Self, regex::Error> {
        self.escalate_prompt = Some(Regex::new(prompt_pattern)?);
        Ok(self)
    }

    pub fn with_not_contains(mut self, pattern: impl Into<String>) -> Self {
        self.not_contains.push(pattern.into());
        self
    }

    /// Whether escalating into this level asks for a secret.
    pub fn requires_auth(&self) -> bool {
        self.escalate_prompt.is_some()
    }

    /// Check if a prompt belongs to this level.
    pub fn matches(&self, prompt: &str) -> bool {
        if self.not_contains.iter().any(|nc| prompt.contains(nc.as_str())) {
            return false;
        }
        self.pattern.is_match(prompt.as_bytes())
    }
}
