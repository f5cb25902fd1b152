//! Error types for ferrotask.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Main error type for ferrotask operations.
#[derive(Error, Debug)]
pub enum Error {
    /// SSH transport-level errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Channel operation errors
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Driver-level errors
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    /// Platform/vendor errors
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    /// Inventory loading and lookup errors
    #[error("Inventory error: {0}")]
    Inventory(#[from] InventoryError),

    /// Task execution errors
    #[error("Task error: {0}")]
    Task(#[from] TaskError),

    /// Terminal prompt errors
    #[error("Prompt error: {0}")]
    Prompt(#[from] dialoguer::Error),

    /// Local file I/O
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Transport layer errors (SSH connection, authentication).
#[derive(Error, Debug)]
pub enum TransportError {
    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// SSH key error
    #[error("SSH key error: {0}")]
    Key(String),

    /// Connect or handshake did not finish in time
    #[error("Connection to {host}:{port} timed out after {timeout:?}")]
    Timeout {
        host: String,
        port: u16,
        timeout: Duration,
    },

    /// Host key differs from the one recorded in known_hosts
    #[error("Host key for {host}:{port} changed (known_hosts line {line})")]
    HostKeyChanged { host: String, port: u16, line: usize },

    /// Host is not in known_hosts and strict checking is on
    #[error("Host key for {host}:{port} is unknown")]
    HostKeyUnknown { host: String, port: u16 },

    /// known_hosts could not be read or written
    #[error("known_hosts error: {0}")]
    KnownHosts(String),
}

/// Channel layer errors (pattern matching, PTY operations).
#[derive(Error, Debug)]
pub enum ChannelError {
    /// Pattern matching timed out
    #[error("Pattern not found within {0:?}")]
    PatternTimeout(Duration),

    /// Channel closed unexpectedly
    #[error("Channel closed")]
    Closed,

    /// SSH protocol error on the channel
    #[error("Channel SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Invalid regex pattern
    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Driver layer errors (command execution, privilege escalation).
#[derive(Error, Debug)]
pub enum DriverError {
    /// Driver not connected
    #[error("Driver not connected - call open() first")]
    NotConnected,

    /// Driver already connected
    #[error("Driver already connected")]
    AlreadyConnected,

    /// Failed to acquire target privilege level
    #[error("Failed to acquire privilege level '{target}'")]
    PrivilegeAcquisitionFailed { target: String },

    /// Invalid configuration in the driver builder
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Unknown privilege level detected
    #[error("Unknown privilege level from prompt: '{prompt}'")]
    UnknownPrivilege { prompt: String },

    /// No path found between privilege levels
    #[error("No path from privilege '{from}' to '{to}'")]
    NoPrivilegePath { from: String, to: String },
}

/// Platform/vendor definition errors.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// Invalid platform definition
    #[error("Invalid platform definition: {message}")]
    InvalidDefinition { message: String },

    /// No platform registered under this name or alias
    #[error("Unknown platform '{name}'")]
    UnknownPlatform { name: String },

    /// A platform with this name is already registered
    #[error("Platform '{name}' is already registered")]
    AlreadyRegistered { name: String },
}

/// Inventory errors (hosts file loading, host lookup).
#[derive(Error, Debug)]
pub enum InventoryError {
    /// Hosts file could not be read
    #[error("Failed to read inventory {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Hosts file is not valid JSON
    #[error("Invalid JSON inventory: {0}")]
    Json(#[from] serde_json::Error),

    /// Hosts file is not valid TOML
    #[error("Invalid TOML inventory: {0}")]
    Toml(#[from] toml::de::Error),

    /// A required connection field has no value at any level
    #[error("Host '{host}' has no {field} configured")]
    MissingField { host: String, field: &'static str },

    /// A connection option holds a value that is not understood
    #[error("Host '{host}' has invalid {option} '{value}'")]
    InvalidOption {
        host: String,
        option: &'static str,
        value: String,
    },

    /// Host name not present in the inventory
    #[error("Unknown host '{0}'")]
    UnknownHost(String),
}

/// Errors raised by tasks while running against a host.
#[derive(Error, Debug)]
pub enum TaskError {
    /// Template lookup or rendering failed
    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    /// Payload could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A command returned output matching a platform failure pattern
    #[error("Command '{command}' failed: {message}")]
    CommandFailed { command: String, message: String },

    /// Getter name not recognised
    #[error("Unsupported getter '{0}'")]
    UnsupportedGetter(String),

    /// One or more hosts failed during a run
    #[error("Run failed on host(s): {}", .0.join(", "))]
    HostsFailed(Vec<String>),
}

/// Result type alias using ferrotask's Error.
pub type Result<T> = std::result::Result<T, Error>;
