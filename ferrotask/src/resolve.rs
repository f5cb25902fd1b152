//! Address helpers for user-supplied device names.

use std::net::{IpAddr, Ipv4Addr};

use log::debug;

/// Outcome of resolving a device name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// The IPv4 address when resolved, otherwise the name as given.
    pub host: String,
    pub resolved: bool,
}

/// Resolve `name` to its first IPv4 address.
///
/// Never fails: when the lookup errors or yields no IPv4 address, the input
/// is echoed back with `resolved: false`.
pub async fn is_resolvable(name: &str) -> Resolution {
    let unresolved = || Resolution {
        host: name.to_string(),
        resolved: false,
    };

    let addrs = match tokio::net::lookup_host((name, 0)).await {
        Ok(addrs) => addrs,
        Err(e) => {
            debug!("Lookup of '{}' failed: {}", name, e);
            return unresolved();
        }
    };

    addrs
        .map(|addr| addr.ip())
        .find_map(|ip| match ip {
            IpAddr::V4(v4) => Some(v4),
            IpAddr::V6(_) => None,
        })
        .map(|v4| Resolution {
            host: v4.to_string(),
            resolved: true,
        })
        .unwrap_or_else(unresolved)
}

/// Whether `s` is a literal dotted-quad IPv4 address.
pub fn is_ipv4(s: &str) -> bool {
    s.parse::<Ipv4Addr>().is_ok()
}
