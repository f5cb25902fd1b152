//! Privilege level tracking and path finding.

use std::collections::{HashMap, VecDeque};

use indexmap::IndexMap;
use regex::bytes::Regex;

use crate::error::{DriverError, Result};
use crate::platform::PrivilegeLevel;

/// Tracks the session's current privilege level and plans moves between levels.
///
/// Levels form an undirected tree through their `previous_priv` links; moving
/// between two levels walks the unique path through their common ancestor.
#[derive(Debug, Clone)]
pub struct PrivilegeManager {
    levels: IndexMap<String, PrivilegeLevel>,
    neighbors: HashMap<String, Vec<String>>,
    current: Option<String>,
}

/// A single hop between adjacent levels.
#[derive(Debug, Clone)]
pub struct Transition {
    /// Command that performs the hop.
    pub command: String,

    /// Password prompt to answer, when escalating into an authenticated level.
    pub auth_prompt: Option<Regex>,
}

impl PrivilegeManager {
    pub fn new(levels: IndexMap<String, PrivilegeLevel>) -> Self {
        let mut neighbors: HashMap<String, Vec<String>> = HashMap::new();
        for (name, level) in &levels {
            neighbors.entry(name.clone()).or_default();
            if let Some(parent) = &level.previous_priv {
                neighbors.entry(name.clone()).or_default().push(parent.clone());
                neighbors.entry(parent.clone()).or_default().push(name.clone());
            }
        }

        Self {
            levels,
            neighbors,
            current: None,
        }
    }

    /// The level whose prompt pattern accepts `prompt`.
    pub fn determine_from_prompt(&self, prompt: &str) -> Result<&PrivilegeLevel> {
        self.levels
            .values()
            .find(|level| level.matches(prompt))
            .ok_or_else(|| {
                DriverError::UnknownPrivilege {
                    prompt: prompt.to_string(),
                }
                .into()
            })
    }

    /// Record the level implied by `prompt`, returning its name.
    pub fn update_from_prompt(&mut self, prompt: &str) -> Result<String> {
        let name = self.determine_from_prompt(prompt)?.name.clone();
        self.current = Some(name.clone());
        Ok(name)
    }

    pub fn current(&self) -> Option<&PrivilegeLevel> {
        self.current.as_ref().and_then(|name| self.levels.get(name))
    }

    pub fn current_name(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Shortest path of level names from `from` to `to`, both included.
    pub fn find_path(&self, from: &str, to: &str) -> Result<Vec<String>> {
        let no_path = || DriverError::NoPrivilegePath {
            from: from.to_string(),
            to: to.to_string(),
        };

        if !self.levels.contains_key(from) || !self.levels.contains_key(to) {
            return Err(no_path().into());
        }

        let mut came_from: HashMap<&str, &str> = HashMap::new();
        let mut queue = VecDeque::from([from]);
        came_from.insert(from, from);

        while let Some(node) = queue.pop_front() {
            if node == to {
                let mut path = vec![to.to_string()];
                let mut cursor = to;
                while cursor != from {
                    cursor = came_from[cursor];
                    path.push(cursor.to_string());
                }
                path.reverse();
                return Ok(path);
            }

            for next in self.neighbors.get(node).into_iter().flatten() {
                if !came_from.contains_key(next.as_str()) {
                    came_from.insert(next, node);
                    queue.push_back(next);
                }
            }
        }

        Err(no_path().into())
    }

    /// The hop between two adjacent levels.
    pub fn transition(&self, from: &str, to: &str) -> Option<Transition> {
        let from_level = self.levels.get(from)?;
        let to_level = self.levels.get(to)?;

        if to_level.previous_priv.as_deref() == Some(from) {
            return Some(Transition {
                command: to_level.escalate_command.clone()?,
                auth_prompt: to_level.escalate_prompt.clone(),
            });
        }

        if from_level.previous_priv.as_deref() == Some(to) {
            return Some(Transition {
                command: from_level.deescalate_command.clone()?,
                auth_prompt: None,
            });
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::vendors::cisco_ios;

    fn manager() -> PrivilegeManager {
        PrivilegeManager::new(cisco_ios::platform().privilege_levels)
    }

    #[test]
    fn test_determine_privilege() {
        let manager = manager();
        assert_eq!(manager.determine_from_prompt("R1>").unwrap().name, "exec");
        assert_eq!(manager.determine_from_prompt("R1#").unwrap().name, "privilege_exec");
        assert_eq!(
            manager.determine_from_prompt("R1(config-if)#").unwrap().name,
            "configuration"
        );
        assert!(manager.determine_from_prompt("login:").is_err());
    }

    #[test]
    fn test_update_tracks_current() {
        let mut manager = manager();
        assert!(manager.current().is_none());
        manager.update_from_prompt("R1>").unwrap();
        assert_eq!(manager.current_name(), Some("exec"));
        manager.update_from_prompt("R1(config)#").unwrap();
        assert_eq!(manager.current().unwrap().name, "configuration");
    }

    #[test]
    fn test_find_path() {
        let manager = manager();
        assert_eq!(
            manager.find_path("exec", "configuration").unwrap(),
            vec!["exec", "privilege_exec", "configuration"]
        );
        assert_eq!(
            manager.find_path("configuration", "exec").unwrap(),
            vec!["configuration", "privilege_exec", "exec"]
        );
        assert_eq!(manager.find_path("exec", "exec").unwrap(), vec!["exec"]);
        assert!(manager.find_path("exec", "shell").is_err());
    }

    #[test]
    fn test_transitions() {
        let manager = manager();

        let up = manager.transition("exec", "privilege_exec").unwrap();
        assert_eq!(up.command, "enable");
        assert!(up.auth_prompt.is_some());

        let down = manager.transition("configuration", "privilege_exec").unwrap();
        assert_eq!(down.command, "end");
        assert!(down.auth_prompt.is_none());

        assert!(manager.transition("exec", "configuration").is_none());
    }
}
