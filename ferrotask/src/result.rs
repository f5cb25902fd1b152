//! Per-host task results and their aggregation across a run.

use std::fmt;
use std::io::{self, Write};
use std::ops::Deref;

use indexmap::IndexMap;

use crate::error::{Error, Result, TaskError};
use crate::task::{Payload, TaskOutput};

const BANNER_WIDTH: usize = 80;

/// Outcome of one task on one host.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskResult {
    pub host: String,
    pub name: String,
    pub payload: Payload,
    pub changed: bool,
    pub diff: String,
    pub failed: bool,
    /// Rendered error when the task failed.
    pub exception: Option<String>,
}

impl TaskResult {
    pub(crate) fn from_outcome(host: &str, name: &str, outcome: &Result<TaskOutput>) -> Self {
        match outcome {
            Ok(output) => Self {
                host: host.to_string(),
                name: name.to_string(),
                payload: output.payload.clone(),
                changed: output.changed,
                diff: output.diff.clone(),
                failed: false,
                exception: None,
            },
            Err(e) => Self::failure(host, name, e),
        }
    }

    pub(crate) fn failure(host: &str, name: &str, error: &Error) -> Self {
        Self {
            host: host.to_string(),
            name: name.to_string(),
            payload: Payload::None,
            changed: false,
            diff: String::new(),
            failed: true,
            exception: Some(error.to_string()),
        }
    }

    /// Text shown for this result: the exception for failures, the payload otherwise.
    pub fn output(&self) -> String {
        match &self.exception {
            Some(exception) => exception.clone(),
            None => self.payload.to_string(),
        }
    }
}

impl fmt::Display for TaskResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.output())
    }
}

/// Results of a task on one host: the task itself first, then its subtasks
/// in the order they ran.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultiResult {
    results: Vec<TaskResult>,
}

impl MultiResult {
    pub fn new(results: Vec<TaskResult>) -> Self {
        Self { results }
    }

    /// True if the task or any subtask failed.
    pub fn failed(&self) -> bool {
        self.results.iter().any(|r| r.failed)
    }

    /// True if the task or any subtask changed the device.
    pub fn changed(&self) -> bool {
        self.results.iter().any(|r| r.changed)
    }

    /// The top-level result.
    pub fn result(&self) -> Option<&TaskResult> {
        self.results.first()
    }
}

impl Deref for MultiResult {
    type Target = [TaskResult];

    fn deref(&self) -> &[TaskResult] {
        &self.results
    }
}

/// Results of one run, keyed by host in inventory order.
#[derive(Debug, Clone, Default)]
pub struct AggregatedResult {
    name: String,
    hosts: IndexMap<String, MultiResult>,
}

impl AggregatedResult {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hosts: IndexMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn insert(&mut self, host: String, result: MultiResult) {
        self.hosts.insert(host, result);
    }

    pub fn get(&self, host: &str) -> Option<&MultiResult> {
        self.hosts.get(host)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MultiResult)> {
        self.hosts.iter().map(|(host, result)| (host.as_str(), result))
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    /// True if any host failed.
    pub fn failed(&self) -> bool {
        self.hosts.values().any(MultiResult::failed)
    }

    pub fn failed_hosts(&self) -> Vec<&str> {
        self.iter()
            .filter(|(_, result)| result.failed())
            .map(|(host, _)| host)
            .collect()
    }

    /// Fail with [`TaskError::HostsFailed`] if any host failed.
    pub fn raise_on_error(&self) -> Result<()> {
        let failed = self.failed_hosts();
        if failed.is_empty() {
            return Ok(());
        }
        Err(TaskError::HostsFailed(failed.into_iter().map(String::from).collect()).into())
    }
}

fn banner(out: &mut impl Write, text: &str, fill: char, level: Option<&str>) -> io::Result<()> {
    let head = format!("{} ", text);
    let pad = BANNER_WIDTH.saturating_sub(head.chars().count());
    let line = format!("{}{}", head, fill.to_string().repeat(pad));
    match level {
        Some(level) => writeln!(out, "{} {}", line, level),
        None => writeln!(out, "{}", line),
    }
}

fn write_task(out: &mut impl Write, result: &TaskResult) -> io::Result<()> {
    let level = if result.failed { "ERROR" } else { "INFO" };
    banner(
        out,
        &format!("vvvv {} ** changed : {}", result.name, result.changed),
        'v',
        Some(level),
    )?;
    if !result.diff.is_empty() {
        writeln!(out, "{}", result.diff.trim_end())?;
    }
    let output = result.output();
    if !output.is_empty() {
        writeln!(out, "{}", output.trim_end())?;
    }
    banner(out, &format!("^^^^ END {}", result.name), '^', None)
}

/// Write a run's results in a banner layout: one header for the run, one
/// per host, and one block per task and subtask.
pub fn write_result(out: &mut impl Write, result: &AggregatedResult) -> io::Result<()> {
    banner(out, &result.name, '*', None)?;
    for (host, multi) in result.iter() {
        banner(
            out,
            &format!("* {} ** changed : {}", host, multi.changed()),
            '*',
            None,
        )?;
        for task in multi.iter() {
            write_task(out, task)?;
        }
    }
    Ok(())
}

/// [`write_result`] to stdout.
pub fn print_result(result: &AggregatedResult) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_result(&mut out, result)?;
    out.flush()
}
