//! Platform definitions for multi-vendor support.
//!
//! A platform describes prompt patterns, the privilege graph, failure
//! markers and session setup commands for one kind of device.

mod definition;
mod privilege_level;
mod registry;
pub mod vendors;

pub use definition::PlatformDefinition;
pub use privilege_level::PrivilegeLevel;
pub use registry::PlatformRegistry;
