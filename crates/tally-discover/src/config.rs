//! Configuration for the tally-discover daemon.

use serde::Deserialize;

use crate::error::{DiscoverError, Result};

/// Top-level discover configuration.
///
/// Loaded from `tally.toml` `[discover]` section or
/// `TALLY_DISCOVER__` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoverConfig {
    /// Path to the nmap binary (default: "nmap").
    #[serde(default = "default_nmap_path")]
    pub nmap_path: String,

    /// Subnets to scan, CIDR notation.
    #[serde(default = "default_subnets")]
    pub subnets: Vec<String>,

    /// Minutes between discovery cycles.
    #[serde(default = "default_interval_minutes")]
    pub scan_interval_minutes: u64,

    /// Toggle for the nmap discovery method. Other methods (WMI, SSH,
    /// SNMP) need credentials and are not implemented.
    #[serde(default = "default_true")]
    pub enable_nmap_scan: bool,

    /// Wall-clock limit for a single subnet scan, in seconds.
    #[serde(default = "default_scan_timeout")]
    pub scan_timeout_secs: u64,
}

impl DiscoverConfig {
    /// Reject malformed subnet CIDRs before the first cycle runs.
    pub fn validate(&self) -> Result<()> {
        for subnet in &self.subnets {
            subnet.parse::<ipnet::IpNet>().map_err(|e| {
                DiscoverError::Config(format!("invalid subnet CIDR {subnet:?}: {e}"))
            })?;
        }
        Ok(())
    }
}

fn default_nmap_path() -> String {
    "nmap".to_string()
}

fn default_subnets() -> Vec<String> {
    vec!["192.168.1.0/24".to_string()]
}

fn default_interval_minutes() -> u64 {
    60
}

fn default_true() -> bool {
    true
}

fn default_scan_timeout() -> u64 {
    300
}

impl Default for DiscoverConfig {
    fn default() -> Self {
        Self {
            nmap_path: default_nmap_path(),
            subnets: default_subnets(),
            scan_interval_minutes: default_interval_minutes(),
            enable_nmap_scan: default_true(),
            scan_timeout_secs: default_scan_timeout(),
        }
    }
}
