//! Cisco IOS / IOS-XE platform definition.
//!
//! Privilege levels:
//! - `exec` - User EXEC mode with `>` prompt
//! - `privilege_exec` - Privileged EXEC mode with `#` prompt, reached with
//!   `enable` and the enable password
//! - `configuration` - Global and sub-mode configuration, `(config*)#` prompt
//!
//! # Prompt Examples
//!
//! ```text
//! R1>                      # exec
//! R1#                      # privilege_exec
//! R1(config)#              # configuration
//! R1(config-if)#           # configuration (interface sub-mode)
//! ```
//!
//! # Privilege Graph
//!
//! ```text
//! ┌──────┐  enable     ┌────────────────┐  configure terminal  ┌───────────────┐
//! │ exec ├──────────────► privilege_exec ├──────────────────────► configuration │
//! │  >   │   disable   │       #        │        end           │  (config*)#   │
//! └──────┘◄────────────┴────────────────┘◄─────────────────────┴───────────────┘
//! ```

use crate::platform::{PlatformDefinition, PrivilegeLevel};

/// Create the Cisco IOS platform definition.
///
/// Registered as `cisco_ios` with aliases `ios` and `cisco_xe`.
pub fn platform() -> PlatformDefinition {
    // Hostname characters exclude parentheses so config prompts never match here.
    let exec = PrivilegeLevel::new("exec", r"(?mi)^[\w.\-@/:]{1,63}>\s?$")
        .expect("static exec pattern");

    let privilege_exec = PrivilegeLevel::new("privilege_exec", r"(?mi)^[\w.\-@/:]{1,63}#\s?$")
        .expect("static privilege_exec pattern")
        .with_parent("exec")
        .with_escalate("enable")
        .with_deescalate("disable")
        .with_auth(r"(?mi)^(?:enable\s)?password:\s?$")
        .expect("static enable password pattern")
        .with_not_contains("(conf");

    let configuration = PrivilegeLevel::new(
        "configuration",
        r"(?mi)^[\w.\-@/:]{1,63}\(conf[\w.\-@/:+]{0,32}\)#\s?$",
    )
    .expect("static configuration pattern")
    .with_parent("privilege_exec")
    .with_escalate("configure terminal")
    .with_deescalate("end");

    PlatformDefinition::new("cisco_ios")
        .with_alias("ios")
        .with_alias("cisco_xe")
        .with_privilege(exec)
        .with_privilege(privilege_exec)
        .with_privilege(configuration)
        .with_default_privilege("privilege_exec")
        .with_failure_pattern("% Ambiguous command")
        .with_failure_pattern("% Incomplete command")
        .with_failure_pattern("% Invalid input detected")
        .with_failure_pattern("% Unknown command")
        .with_on_open_command("terminal length 0")
        .with_on_open_command("terminal width 511")
        .with_save_command("write memory")
        .with_terminal_size(511, 24)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ios_platform() {
        let platform = platform();
        assert_eq!(platform.name, "cisco_ios");
        assert_eq!(platform.privilege_levels.len(), 3);
        assert_eq!(platform.default_privilege, "privilege_exec");
        assert_eq!(platform.config_privilege(), Some("configuration"));
        assert_eq!(platform.save_command.as_deref(), Some("write memory"));
    }

    #[test]
    fn test_exec_prompt_match() {
        let platform = platform();
        let exec = platform.get_privilege("exec").unwrap();
        assert!(exec.matches("R1>"));
        assert!(exec.matches("core-sw.lab>"));
        assert!(!exec.matches("R1#"));
        assert!(!exec.matches("R1(config)#"));
    }

    #[test]
    fn test_privilege_exec_prompt_match() {
        let platform = platform();
        let priv_exec = platform.get_privilege("privilege_exec").unwrap();
        assert!(priv_exec.matches("R1#"));
        assert!(priv_exec.matches("R1# "));
        assert!(!priv_exec.matches("R1(config)#"));
        assert!(!priv_exec.matches("R1(config-if)#"));
        assert!(!priv_exec.matches("R1>"));
    }

    #[test]
    fn test_configuration_prompt_match() {
        let platform = platform();
        let config = platform.get_privilege("configuration").unwrap();
        assert!(config.matches("R1(config)#"));
        assert!(config.matches("R1(config-if)#"));
        assert!(config.matches("R1(config-router)#"));
        assert!(!config.matches("R1#"));
    }

    #[test]
    fn test_enable_password_prompt() {
        let platform = platform();
        let priv_exec = platform.get_privilege("privilege_exec").unwrap();
        let auth = priv_exec.escalate_prompt.as_ref().unwrap();
        assert!(auth.is_match(b"R1>enable\nPassword: "));
        assert!(auth.is_match(b"Enable Password:"));
    }

    #[test]
    fn test_failure_detection() {
        let platform = platform();
        let output = "show versoin\n       ^\n% Invalid input detected at '^' marker.";
        assert_eq!(platform.detect_failure(output), Some("% Invalid input detected"));
        assert_eq!(platform.detect_failure("Cisco IOS Software"), None);
    }
}
