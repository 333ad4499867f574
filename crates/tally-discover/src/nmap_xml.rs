//! Nmap XML output deserialization.
//!
//! Nmap's `-oX -` flag writes structured XML to stdout. This module holds
//! the typed view of that output — the per-host facts the classifier
//! consumes: host state, addresses, hostnames, port states, and OS
//! fingerprint candidates.

use serde::Deserialize;

use crate::error::{DiscoverError, Result};

/// Root element: `<nmaprun>`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename = "nmaprun")]
pub struct NmapRun {
    #[serde(rename = "host", default)]
    pub hosts: Vec<NmapHost>,
}

/// A single host from scan results.
#[derive(Debug, Clone, Deserialize)]
pub struct NmapHost {
    pub status: Option<HostStatus>,
    #[serde(rename = "address", default)]
    pub addresses: Vec<Address>,
    pub hostnames: Option<Hostnames>,
    pub ports: Option<Ports>,
    pub os: Option<OsMatches>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HostStatus {
    #[serde(rename = "@state")]
    pub state: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Address {
    #[serde(rename = "@addr")]
    pub addr: String,
    #[serde(rename = "@addrtype")]
    pub addr_type: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Hostnames {
    #[serde(rename = "hostname", default)]
    pub hostnames: Vec<Hostname>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Hostname {
    #[serde(rename = "@name")]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ports {
    #[serde(rename = "port", default)]
    pub ports: Vec<NmapPort>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NmapPort {
    #[serde(rename = "@protocol")]
    pub protocol: String,
    #[serde(rename = "@portid")]
    pub port_id: u16,
    pub state: PortState,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PortState {
    #[serde(rename = "@state")]
    pub state: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OsMatches {
    #[serde(rename = "osmatch", default)]
    pub matches: Vec<OsMatch>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OsMatch {
    #[serde(rename = "@name")]
    pub name: String,
}

impl NmapHost {
    /// Check if the host responded to the scan.
    pub fn is_up(&self) -> bool {
        self.status.as_ref().is_some_and(|s| s.state == "up")
    }

    /// Extract the IPv4 address, if present.
    pub fn ipv4(&self) -> Option<&str> {
        self.addresses
            .iter()
            .find(|a| a.addr_type == "ipv4")
            .map(|a| a.addr.as_str())
    }

    /// Extract the MAC address, if present.
    pub fn mac(&self) -> Option<&str> {
        self.addresses
            .iter()
            .find(|a| a.addr_type == "mac")
            .map(|a| a.addr.as_str())
    }

    /// Extract the first hostname, if present.
    pub fn hostname(&self) -> Option<&str> {
        self.hostnames
            .as_ref()
            .and_then(|hn| hn.hostnames.first())
            .map(|h| h.name.as_str())
    }

    /// OS fingerprint candidates, best match first.
    pub fn os_matches(&self) -> Vec<&str> {
        self.os
            .as_ref()
            .map(|os| os.matches.iter().map(|m| m.name.as_str()).collect())
            .unwrap_or_default()
    }

    /// TCP ports whose reported state is `open`, in scan order.
    pub fn open_tcp_ports(&self) -> Vec<u16> {
        self.ports
            .as_ref()
            .map(|ports| {
                ports
                    .ports
                    .iter()
                    .filter(|p| p.protocol == "tcp" && p.state.state == "open")
                    .map(|p| p.port_id)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Parse nmap XML bytes into a structured `NmapRun`.
pub fn parse_nmap_xml(xml: &[u8]) -> Result<NmapRun> {
    quick_xml::de::from_reader(xml).map_err(|e| DiscoverError::XmlParse(format!("{e}")))
}
