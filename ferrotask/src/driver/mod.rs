//! High-level driver for device interaction.
//!
//! The driver layer sends commands, pushes configuration and moves between
//! privilege levels on a connected device.

mod builder;
mod generic;
mod interactive;
mod privilege;
pub(crate) mod response;

pub use builder::DriverBuilder;
pub use generic::GenericDriver;
pub use interactive::{InteractiveEvent, InteractiveResult, InteractiveStep};
pub use privilege::{PrivilegeManager, Transition};
pub use response::Response;

use std::future::Future;

use crate::error::Result;

/// A CLI session to one device.
pub trait Driver: Send + Sync {
    /// Connect, wait for the first prompt and run the platform's setup commands.
    fn open(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Close the connection. Closing a closed driver is a no-op.
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Send a command and wait for the prompt.
    fn send_command(&mut self, command: &str) -> impl Future<Output = Result<Response>> + Send;

    /// Send commands one after another, stopping at the first error.
    fn send_commands(
        &mut self,
        commands: &[&str],
    ) -> impl Future<Output = Result<Vec<Response>>> + Send {
        async move {
            let mut responses = Vec::with_capacity(commands.len());
            for command in commands {
                responses.push(self.send_command(command).await?);
            }
            Ok(responses)
        }
    }

    /// Send a sequence of inputs, each waiting for its own pattern.
    ///
    /// ```rust,no_run
    /// use ferrotask::driver::{Driver, InteractiveEvent};
    ///
    /// # async fn example(driver: &mut impl Driver) -> Result<(), ferrotask::Error> {
    /// let events = [
    ///     InteractiveEvent::new("copy running-config startup-config", r"\?\s*$")?,
    ///     InteractiveEvent::until_prompt(""),
    /// ];
    /// let result = driver.send_interactive(&events).await?;
    /// # Ok(())
    /// # }
    /// ```
    fn send_interactive(
        &mut self,
        events: &[InteractiveEvent],
    ) -> impl Future<Output = Result<InteractiveResult>> + Send;

    /// Send commands in configuration mode.
    ///
    /// Enters the configuration level, sends every command, then returns to
    /// the level the driver started at.
    ///
    /// ```rust,no_run
    /// use ferrotask::driver::Driver;
    ///
    /// # async fn example(driver: &mut impl Driver) -> Result<(), ferrotask::Error> {
    /// let responses = driver.send_config(&[
    ///     "interface GigabitEthernet0/1",
    ///     "ip address 192.168.2.1 255.255.255.252",
    ///     "no shutdown",
    /// ]).await?;
    /// # Ok(())
    /// # }
    /// ```
    fn send_config(
        &mut self,
        commands: &[&str],
    ) -> impl Future<Output = Result<Vec<Response>>> + Send;

    /// Move to a named privilege level.
    fn acquire_privilege(&mut self, privilege: &str) -> impl Future<Output = Result<()>> + Send;

    /// Check if the driver is connected.
    fn is_open(&self) -> bool;

    /// Whether the SSH session is still up (not timed out or disconnected).
    fn is_alive(&self) -> bool;

    /// Get the current privilege level name.
    fn current_privilege(&self) -> Option<&str>;
}
