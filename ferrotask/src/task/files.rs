//! Local tasks: template rendering and file writes.

use std::io;
use std::path::PathBuf;

use log::debug;
use minijinja::{Environment, UndefinedBehavior, path_loader};
use serde_json::{Map, Value, json};
use similar::TextDiff;

use super::{HostContext, Payload, Task, TaskOutput};
use crate::error::{Result, TaskError};
use crate::inventory::Device;

/// Variables visible to a template: the caller's `vars` plus `host`.
fn template_context(device: &Device, vars: &Value) -> Value {
    let mut context = match vars {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };
    context.insert(
        "host".to_string(),
        json!({
            "name": device.name(),
            "hostname": device.hostname,
            "platform": device.platform,
            "port": device.port,
            "data": device.data,
        }),
    );
    Value::Object(context)
}

fn environment() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env
}

/// Render a Jinja template file found under `path`.
///
/// Undefined variables are errors. The template sees `vars` at the top
/// level and the host as `host` (`host.name`, `host.data.site`, ...).
#[derive(Debug, Clone)]
pub struct TemplateFile {
    path: PathBuf,
    template: String,
    vars: Value,
}

impl TemplateFile {
    pub fn new(path: impl Into<PathBuf>, template: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            template: template.into(),
            vars: Value::Object(Map::new()),
        }
    }

    pub fn with_vars(mut self, vars: Value) -> Self {
        self.vars = vars;
        self
    }

    /// Render for one device without running a task.
    pub fn render(&self, device: &Device) -> Result<String> {
        let mut env = environment();
        env.set_loader(path_loader(&self.path));
        let template = env
            .get_template(&self.template)
            .map_err(TaskError::Template)?;
        let rendered = template
            .render(template_context(device, &self.vars))
            .map_err(TaskError::Template)?;
        Ok(rendered)
    }
}

impl Task for TemplateFile {
    fn name(&self) -> &str {
        &self.template
    }

    async fn run(&self, ctx: &mut HostContext<'_>) -> Result<TaskOutput> {
        debug!(
            "{}: rendering {}",
            ctx.host(),
            self.path.join(&self.template).display()
        );
        let rendered = self.render(ctx.device())?;
        Ok(TaskOutput::new(Payload::Text(rendered)))
    }
}

/// Render an inline Jinja template.
#[derive(Debug, Clone)]
pub struct TemplateString {
    template: String,
    vars: Value,
}

impl TemplateString {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            vars: Value::Object(Map::new()),
        }
    }

    pub fn with_vars(mut self, vars: Value) -> Self {
        self.vars = vars;
        self
    }

    pub fn render(&self, device: &Device) -> Result<String> {
        let rendered = environment()
            .render_str(&self.template, template_context(device, &self.vars))
            .map_err(TaskError::Template)?;
        Ok(rendered)
    }
}

impl Task for TemplateString {
    fn name(&self) -> &str {
        "template string"
    }

    async fn run(&self, ctx: &mut HostContext<'_>) -> Result<TaskOutput> {
        Ok(TaskOutput::new(Payload::Text(self.render(ctx.device())?)))
    }
}

/// Write `content` to a local file, reporting a unified diff against what
/// was there before.
#[derive(Debug, Clone)]
pub struct WriteFile {
    filename: PathBuf,
    content: String,
    append: bool,
    dry_run: bool,
}

impl WriteFile {
    pub fn new(filename: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
            append: false,
            dry_run: false,
        }
    }

    /// Add to the end of the file instead of replacing it.
    pub fn append(mut self) -> Self {
        self.append = true;
        self
    }

    /// Compute the diff without touching the file.
    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }
}

impl Task for WriteFile {
    fn name(&self) -> &str {
        "write file"
    }

    async fn run(&self, ctx: &mut HostContext<'_>) -> Result<TaskOutput> {
        let existing = match tokio::fs::read_to_string(&self.filename).await {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };

        let updated = if self.append {
            format!("{}{}", existing, self.content)
        } else {
            self.content.clone()
        };

        let changed = existing != updated;
        let label = self.filename.display().to_string();
        let diff = if changed {
            TextDiff::from_lines(&existing, &updated)
                .unified_diff()
                .header(&label, &label)
                .to_string()
        } else {
            String::new()
        };

        if changed && !self.dry_run {
            tokio::fs::write(&self.filename, &updated).await?;
            debug!("{}: wrote {}", ctx.host(), label);
        }

        Ok(TaskOutput::new(Payload::None)
            .with_changed(changed)
            .with_diff(diff))
    }
}
