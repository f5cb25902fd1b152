//! Runs tasks across the inventory with bounded concurrency.

use std::collections::{HashMap, HashSet};

use futures_util::stream::{self, StreamExt};
use indexmap::{IndexMap, IndexSet};
use log::{debug, info, warn};
use tokio::sync::Mutex;

use super::Task;
use super::context::{Connections, HostContext};
use crate::driver::Driver;
use crate::inventory::{Defaults, Device, Inventory};
use crate::result::{AggregatedResult, MultiResult, TaskResult};

const DEFAULT_NUM_WORKERS: usize = 20;

struct HostSlot {
    device: Device,
    connections: Mutex<Connections>,
}

/// Builder for [`Runner`].
pub struct RunnerBuilder {
    inventory: Inventory,
    num_workers: usize,
}

impl RunnerBuilder {
    pub fn new(inventory: Inventory) -> Self {
        Self {
            inventory,
            num_workers: DEFAULT_NUM_WORKERS,
        }
    }

    /// Hosts worked on at the same time (default: 20, minimum: 1).
    pub fn num_workers(mut self, num_workers: usize) -> Self {
        self.num_workers = num_workers.max(1);
        self
    }

    pub fn build(self) -> Runner {
        let (hosts, defaults) = self.inventory.into_parts();
        let hosts = hosts
            .into_iter()
            .map(|(name, device)| {
                let slot = HostSlot {
                    device,
                    connections: Mutex::new(Connections::new()),
                };
                (name, slot)
            })
            .collect();

        Runner {
            hosts,
            defaults,
            num_workers: self.num_workers,
            failed_hosts: IndexSet::new(),
            selection: None,
        }
    }
}

/// Runs [`Task`]s against the hosts of an inventory.
///
/// Each host keeps its open connections between runs. A host whose task
/// fails is recorded as failed and skipped by later runs until it is
/// recovered.
///
/// # Example
///
/// ```rust,no_run
/// use ferrotask::inventory::Inventory;
/// use ferrotask::result::print_result;
/// use ferrotask::task::{Runner, SendCommand};
///
/// # async fn example() -> Result<(), ferrotask::Error> {
/// let inventory = Inventory::from_path("hosts.json")?;
/// let mut runner = Runner::builder(inventory).num_workers(10).build();
///
/// let result = runner.run(&SendCommand::new("show clock")).await;
/// print_result(&result)?;
/// runner.close().await;
/// result.raise_on_error()?;
/// # Ok(())
/// # }
/// ```
pub struct Runner {
    hosts: IndexMap<String, HostSlot>,
    defaults: Defaults,
    num_workers: usize,
    failed_hosts: IndexSet<String>,
    selection: Option<HashSet<String>>,
}

impl Runner {
    pub fn new(inventory: Inventory) -> Self {
        RunnerBuilder::new(inventory).build()
    }

    pub fn builder(inventory: Inventory) -> RunnerBuilder {
        RunnerBuilder::new(inventory)
    }

    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    pub fn defaults(&self) -> &Defaults {
        &self.defaults
    }

    pub fn hosts(&self) -> impl Iterator<Item = &Device> {
        self.hosts.values().map(|slot| &slot.device)
    }

    /// Restrict later runs to hosts matching `predicate`.
    pub fn filter<F>(&mut self, predicate: F) -> &mut Self
    where
        F: Fn(&Device) -> bool,
    {
        let selection = self
            .hosts
            .values()
            .filter(|slot| predicate(&slot.device))
            .map(|slot| slot.device.name().to_string())
            .collect();
        self.selection = Some(selection);
        self
    }

    /// Target every host again.
    pub fn clear_filter(&mut self) -> &mut Self {
        self.selection = None;
        self
    }

    /// Hosts that failed a previous run, in the order they failed.
    pub fn failed_hosts(&self) -> impl Iterator<Item = &str> {
        self.failed_hosts.iter().map(String::as_str)
    }

    /// Let a failed host take part in runs again. Returns false if the host
    /// was not marked failed.
    pub fn recover_host(&mut self, name: &str) -> bool {
        self.failed_hosts.shift_remove(name)
    }

    pub fn reset_failed_hosts(&mut self) {
        self.failed_hosts.clear();
    }

    fn is_target(&self, name: &str) -> bool {
        let selected = self
            .selection
            .as_ref()
            .is_none_or(|selection| selection.contains(name));
        selected && !self.failed_hosts.contains(name)
    }

    /// Run `task` on every targeted host, at most `num_workers` at a time.
    ///
    /// Results come back in inventory order regardless of completion order.
    pub async fn run<T: Task>(&mut self, task: &T) -> AggregatedResult {
        let targets: Vec<&HostSlot> = self
            .hosts
            .values()
            .filter(|slot| self.is_target(slot.device.name()))
            .collect();
        info!(
            "Running '{}' on {} host(s) with {} worker(s)",
            task.name(),
            targets.len(),
            self.num_workers
        );

        let defaults = &self.defaults;
        let mut outcomes: HashMap<String, MultiResult> = stream::iter(targets)
            .map(|slot| run_on_host(slot, defaults, task))
            .buffer_unordered(self.num_workers)
            .collect()
            .await;

        let mut aggregated = AggregatedResult::new(task.name());
        for name in self.hosts.keys() {
            let Some(result) = outcomes.remove(name) else {
                continue;
            };
            if result.failed() {
                self.failed_hosts.insert(name.clone());
            }
            aggregated.insert(name.clone(), result);
        }
        aggregated
    }

    /// Close every open connection.
    pub async fn close(&mut self) {
        for (name, slot) in &self.hosts {
            let mut connections = slot.connections.lock().await;
            for (kind, mut driver) in connections.drain() {
                debug!("{}: closing {} connection", name, kind);
                if let Err(e) = driver.close().await {
                    warn!("{}: closing {} connection: {}", name, kind, e);
                }
            }
        }
    }
}

async fn run_on_host<T: Task>(
    slot: &HostSlot,
    defaults: &Defaults,
    task: &T,
) -> (String, MultiResult) {
    let host = slot.device.name();
    match task.connection() {
        Some(kind) => debug!("{}: '{}' over {}", host, task.name(), kind),
        None => debug!("{}: '{}'", host, task.name()),
    }
    let mut connections = slot.connections.lock().await;
    let mut ctx = HostContext::new(&slot.device, defaults, &mut *connections);

    let outcome = task.run(&mut ctx).await;
    if let Err(e) = &outcome {
        warn!("{}: task '{}' failed: {}", host, task.name(), e);
    }

    let mut results = vec![TaskResult::from_outcome(host, task.name(), &outcome)];
    results.extend(ctx.into_subresults());
    (host.to_string(), MultiResult::new(results))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use crate::error::{Result, TaskError};
    use crate::task::{Payload, TaskOutput};

    fn inventory(names: &[&str]) -> Inventory {
        names
            .iter()
            .map(|name| Device::new(*name).with_platform("ios"))
            .collect()
    }

    /// Fails on the listed hosts, echoes the host name elsewhere.
    struct FailOn(&'static [&'static str]);

    impl Task for FailOn {
        fn name(&self) -> &str {
            "fail on"
        }

        async fn run(&self, ctx: &mut HostContext<'_>) -> Result<TaskOutput> {
            if self.0.iter().any(|host| *host == ctx.host()) {
                return Err(TaskError::CommandFailed {
                    command: "test".into(),
                    message: "boom".into(),
                }
                .into());
            }
            Ok(TaskOutput::new(Payload::Text(ctx.host().to_string())))
        }
    }

    struct Slow {
        running: AtomicUsize,
        peak: AtomicUsize,
    }

    impl Task for Slow {
        fn name(&self) -> &str {
            "slow"
        }

        async fn run(&self, _ctx: &mut HostContext<'_>) -> Result<TaskOutput> {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.running.fetch_sub(1, Ordering::SeqCst);
            Ok(TaskOutput::default())
        }
    }

    #[tokio::test]
    async fn test_results_in_inventory_order() {
        let mut runner = Runner::new(inventory(&["R3", "R1", "R2"]));
        let result = runner.run(&FailOn(&[])).await;

        let hosts: Vec<_> = result.iter().map(|(host, _)| host).collect();
        assert_eq!(hosts, vec!["R3", "R1", "R2"]);
        assert_eq!(result.get("R1").unwrap()[0].output(), "R1");
        assert!(!result.failed());
    }

    #[tokio::test]
    async fn test_failed_hosts_skipped_until_recovered() {
        let mut runner = Runner::new(inventory(&["R1", "R2", "R3"]));

        let first = runner.run(&FailOn(&["R2"])).await;
        assert_eq!(first.failed_hosts(), vec!["R2"]);
        assert_eq!(runner.failed_hosts().collect::<Vec<_>>(), vec!["R2"]);

        let second = runner.run(&FailOn(&[])).await;
        assert_eq!(second.len(), 2);
        assert!(second.get("R2").is_none());

        assert!(runner.recover_host("R2"));
        assert!(!runner.recover_host("R2"));
        let third = runner.run(&FailOn(&[])).await;
        assert_eq!(third.len(), 3);
    }

    #[tokio::test]
    async fn test_filter_limits_targets() {
        let mut inventory = inventory(&["R1", "R2"]);
        inventory.add(Device::new("SW1").with_platform("nxos"));
        let mut runner = Runner::new(inventory);

        runner.filter(|d| d.platform.as_deref() == Some("ios"));
        let result = runner.run(&FailOn(&[])).await;
        assert_eq!(result.len(), 2);
        assert!(result.get("SW1").is_none());

        runner.clear_filter();
        assert_eq!(runner.run(&FailOn(&[])).await.len(), 3);
    }

    #[tokio::test]
    async fn test_num_workers_bounds_concurrency() {
        let names: Vec<String> = (0..8).map(|i| format!("R{}", i)).collect();
        let inventory: Inventory = names.iter().map(Device::new).collect();
        let mut runner = Runner::builder(inventory).num_workers(3).build();
        let task = Slow {
            running: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        };

        let result = runner.run(&task).await;
        assert_eq!(result.len(), 8);
        let peak = task.peak.load(Ordering::SeqCst);
        assert!(peak <= 3, "peak concurrency {}", peak);
        assert!(peak > 1);
    }

    #[test]
    fn test_reset_failed_hosts() {
        let mut runner = Runner::builder(inventory(&["R1"])).num_workers(0).build();
        assert_eq!(runner.num_workers(), 1);

        let result = tokio_test::block_on(runner.run(&FailOn(&["R1"])));
        assert!(result.raise_on_error().is_err());
        runner.reset_failed_hosts();
        assert_eq!(runner.failed_hosts().count(), 0);
        tokio_test::block_on(runner.close());
    }
}
