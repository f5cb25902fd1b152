use std::collections::HashMap;

use log::{debug, info};

use super::{Task, TaskOutput};
use crate::driver::{Driver, DriverBuilder, GenericDriver};
use crate::error::{DriverError, Result};
use crate::inventory::{Defaults, Device};
use crate::result::TaskResult;

/// Open drivers of one host, keyed by connection kind.
pub(crate) type Connections = HashMap<String, GenericDriver>;

/// What a task sees while running against one host.
pub struct HostContext<'a> {
    device: &'a Device,
    defaults: &'a Defaults,
    connections: &'a mut Connections,
    subresults: Vec<TaskResult>,
}

impl<'a> HostContext<'a> {
    pub(crate) fn new(
        device: &'a Device,
        defaults: &'a Defaults,
        connections: &'a mut Connections,
    ) -> Self {
        Self {
            device,
            defaults,
            connections,
            subresults: Vec::new(),
        }
    }

    pub fn device(&self) -> &Device {
        self.device
    }

    /// Inventory name of the host.
    pub fn host(&self) -> &str {
        self.device.name()
    }

    /// Driver for a connection kind, opened on first use.
    ///
    /// A cached driver whose session has dropped is closed and reopened.
    pub async fn connection(&mut self, kind: &str) -> Result<&mut GenericDriver> {
        let alive = self.connections.get(kind).is_some_and(|d| d.is_alive());
        if !alive {
            if let Some(mut stale) = self.connections.remove(kind) {
                debug!("{}: dropping stale {} connection", self.host(), kind);
                if let Err(e) = stale.close().await {
                    debug!("{}: closing stale {} connection: {}", self.host(), kind, e);
                }
            }

            let mut driver = DriverBuilder::from_device(self.device, kind, self.defaults)?.build()?;
            info!("{}: opening {} connection to {}", self.host(), kind, driver.host());
            driver.open().await?;
            self.connections.insert(kind.to_string(), driver);
        }

        self.connections
            .get_mut(kind)
            .ok_or_else(|| DriverError::NotConnected.into())
    }

    /// Run another task against this host, recording its result next to the
    /// parent's.
    pub async fn run_subtask<T: Task>(&mut self, task: &T) -> Result<TaskOutput> {
        debug!("{}: subtask '{}'", self.host(), task.name());
        let slot = self.subresults.len();
        let outcome = task.run(self).await;
        let result = TaskResult::from_outcome(self.device.name(), task.name(), &outcome);
        self.subresults.insert(slot, result);
        outcome
    }

    pub(crate) fn into_subresults(self) -> Vec<TaskResult> {
        self.subresults
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, InventoryError, TaskError};
    use crate::task::Payload;

    struct Echo(&'static str);

    impl Task for Echo {
        fn name(&self) -> &str {
            self.0
        }

        async fn run(&self, ctx: &mut HostContext<'_>) -> Result<TaskOutput> {
            Ok(TaskOutput::new(Payload::Text(format!("{} on {}", self.0, ctx.host()))))
        }
    }

    struct Fails;

    impl Task for Fails {
        fn name(&self) -> &str {
            "fails"
        }

        async fn run(&self, _ctx: &mut HostContext<'_>) -> Result<TaskOutput> {
            Err(TaskError::UnsupportedGetter("bogus".into()).into())
        }
    }

    struct Nested;

    impl Task for Nested {
        fn name(&self) -> &str {
            "nested"
        }

        async fn run(&self, ctx: &mut HostContext<'_>) -> Result<TaskOutput> {
            ctx.run_subtask(&Echo("inner")).await?;
            Ok(TaskOutput::default())
        }
    }

    #[tokio::test]
    async fn test_subtasks_recorded_in_start_order() {
        let device = Device::new("R1");
        let defaults = Defaults::default();
        let mut connections = Connections::new();
        let mut ctx = HostContext::new(&device, &defaults, &mut connections);

        ctx.run_subtask(&Nested).await.unwrap();
        assert!(ctx.run_subtask(&Fails).await.is_err());

        let results = ctx.into_subresults();
        let names: Vec<_> = results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["nested", "inner", "fails"]);
        assert_eq!(results[1].output(), "inner on R1");
        assert!(results[2].failed);
    }

    #[tokio::test]
    async fn test_stale_connection_is_replaced() {
        // nothing listens on port 1, so the reopen fails fast
        let device = Device::new("R1")
            .with_hostname("127.0.0.1")
            .with_port(1)
            .with_username("admin")
            .with_password("pw")
            .with_platform("ios")
            .with_connection_options(
                "netmiko",
                crate::inventory::ConnectionOptions::new()
                    .with_extras(serde_json::json!({"timeout": 2})),
            );
        let defaults = Defaults::default();
        let mut connections = Connections::new();
        let never_opened = DriverBuilder::from_device(&device, "netmiko", &defaults)
            .unwrap()
            .build()
            .unwrap();
        connections.insert("netmiko".to_string(), never_opened);

        let mut ctx = HostContext::new(&device, &defaults, &mut connections);
        assert!(ctx.connection("netmiko").await.is_err());
        drop(ctx);
        assert!(!connections.contains_key("netmiko"));
    }

    #[tokio::test]
    async fn test_connection_requires_username() {
        let device = Device::new("R1").with_platform("ios");
        let defaults = Defaults::default();
        let mut connections = Connections::new();
        let mut ctx = HostContext::new(&device, &defaults, &mut connections);

        let err = ctx.connection("netmiko").await.err().unwrap();
        assert!(matches!(
            err,
            Error::Inventory(InventoryError::MissingField { field: "username", .. })
        ));
    }
}
