//! # Ferrotask
//!
//! Inventory-driven command and configuration runner for network devices.
//!
//! Devices come from an [`Inventory`] (a JSON or TOML hosts file, or built
//! in code). A [`Runner`] applies a [`Task`] to each selected device with a
//! bounded number of workers and collects an [`AggregatedResult`] holding
//! one [`MultiResult`] per host.
//!
//! Built-in tasks cover show commands, configuration pushes, saving the
//! running configuration, fact and configuration getters, Jinja template
//! rendering and local file writes. Devices are reached over SSH with an
//! async CLI driver that tracks privilege levels from the prompt.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ferrotask::inventory::Inventory;
//! use ferrotask::result::print_result;
//! use ferrotask::task::{Runner, SendCommand};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ferrotask::Error> {
//!     let inventory = Inventory::from_path("hosts.json")?;
//!     let mut runner = Runner::new(inventory);
//!
//!     let result = runner.run(&SendCommand::new("show ip interface brief")).await;
//!     print_result(&result)?;
//!
//!     runner.close().await;
//!     result.raise_on_error()
//! }
//! ```

pub mod channel;
pub mod driver;
pub mod error;
pub mod inventory;
pub mod platform;
pub mod prompt;
pub mod resolve;
pub mod result;
pub mod task;
pub mod transient;
pub mod transport;

pub use driver::{Driver, DriverBuilder, GenericDriver, Response};
pub use error::{Error, Result};
pub use inventory::{Device, Inventory};
pub use result::{AggregatedResult, MultiResult, TaskResult};
pub use task::{HostContext, Runner, Task, TaskOutput};
