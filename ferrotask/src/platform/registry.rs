//! Global platform registry for looking up platform definitions.

use std::collections::HashMap;
use std::sync::{LazyLock, RwLock};

use log::debug;

use super::definition::PlatformDefinition;
use super::vendors;
use crate::error::{PlatformError, Result};

static REGISTRY: LazyLock<RwLock<PlatformRegistry>> = LazyLock::new(|| {
    let mut registry = PlatformRegistry::new();
    registry.register_builtin_platforms();
    RwLock::new(registry)
});

/// Platform definitions keyed by name, plus an alias table.
///
/// Inventories name platforms loosely (`ios`, `cisco_ios`), so lookups go
/// through the alias table first and are case-insensitive.
#[derive(Debug, Default)]
pub struct PlatformRegistry {
    platforms: HashMap<String, PlatformDefinition>,
    aliases: HashMap<String, String>,
}

impl PlatformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry with built-in platforms loaded.
    pub fn global() -> &'static RwLock<PlatformRegistry> {
        &REGISTRY
    }

    /// Clone a platform out of the global registry.
    pub fn lookup(name: &str) -> Result<PlatformDefinition> {
        let registry = Self::global()
            .read()
            .map_err(|_| PlatformError::InvalidDefinition {
                message: "platform registry lock poisoned".to_string(),
            })?;
        registry
            .get(name)
            .cloned()
            .ok_or_else(|| PlatformError::UnknownPlatform { name: name.to_string() }.into())
    }

    fn register_builtin_platforms(&mut self) {
        for platform in [vendors::cisco_ios::platform()] {
            self.insert(platform);
        }
    }

    fn insert(&mut self, platform: PlatformDefinition) {
        for alias in &platform.aliases {
            self.aliases.insert(alias.to_lowercase(), platform.name.clone());
        }
        self.platforms.insert(platform.name.clone(), platform);
    }

    /// Register a platform definition under its name and aliases.
    pub fn register(&mut self, platform: PlatformDefinition) -> Result<()> {
        let taken = std::iter::once(&platform.name)
            .chain(platform.aliases.iter())
            .find(|name| self.contains(name));
        if let Some(name) = taken {
            return Err(PlatformError::AlreadyRegistered { name: name.clone() }.into());
        }
        debug!("Registering platform '{}'", platform.name);
        self.insert(platform);
        Ok(())
    }

    /// Get a platform by name or alias.
    pub fn get(&self, name: &str) -> Option<&PlatformDefinition> {
        let key = name.to_lowercase();
        let canonical = self.aliases.get(&key).unwrap_or(&key);
        self.platforms.get(canonical)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Canonical names of all registered platforms.
    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.platforms.keys()
    }
}
