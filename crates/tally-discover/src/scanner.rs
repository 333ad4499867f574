//! Nmap process wrapper and subnet scanning.
//!
//! The engine runs as a child process writing XML to stdout. Each
//! invocation is driven on a spawned task joined under the configured
//! scan timeout, so the scheduling loop is never stalled by it.

use std::time::Instant;

use chrono::Utc;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use uuid::Uuid;

use tally_core::AssetObservation;

use crate::classify;
use crate::error::{DiscoverError, Result};
use crate::nmap_xml;

/// TCP ports probed during discovery scans: remote access, web, Windows
/// services, RDP, and WinRM.
pub const DISCOVERY_PORTS: &str = "22,23,80,443,135,139,445,3389,5985,5986";

fn discovery_args(subnet: &str) -> Vec<String> {
    [
        "-sS",
        "-O",
        "-sV",
        "--max-rtt-timeout",
        "2s",
        "--max-retries",
        "1",
        "-p",
        DISCOVERY_PORTS,
        "-oX",
        "-",
        "--noninteractive",
        subnet,
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn sweep_args(subnet: &str) -> Vec<String> {
    ["-sn", "-oX", "-", "--noninteractive", subnet]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Wrapper around the nmap binary.
pub struct NmapScanner {
    nmap_path: String,
    scan_timeout: Duration,
}

impl NmapScanner {
    pub fn new(nmap_path: &str, scan_timeout_secs: u64) -> Self {
        Self {
            nmap_path: nmap_path.to_string(),
            scan_timeout: Duration::from_secs(scan_timeout_secs),
        }
    }

    /// Verify nmap is installed and accessible.
    pub async fn verify_installation(&self) -> Result<String> {
        let output = Command::new(&self.nmap_path)
            .arg("--version")
            .output()
            .await
            .map_err(|_| DiscoverError::NmapNotFound {
                path: self.nmap_path.clone(),
            })?;

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Scan a subnet and convert responsive hosts into observations.
    ///
    /// Observations come back in adapter order. Hosts that are not up
    /// never appear; a responsive host without an IPv4 address is logged
    /// and skipped.
    pub async fn scan(&self, subnet: &str) -> Result<Vec<AssetObservation>> {
        let scan_id = Uuid::new_v4();
        let start = Instant::now();

        tracing::info!(scan_id = %scan_id, subnet = %subnet, "Starting nmap scan");

        let stdout = self.run_engine(subnet, discovery_args(subnet)).await?;
        let run = nmap_xml::parse_nmap_xml(&stdout)?;

        let hosts_up = run.hosts.iter().filter(|h| h.is_up()).count();
        let observations = classify::observations_from_run(&run, Utc::now());

        tracing::info!(
            scan_id = %scan_id,
            subnet = %subnet,
            hosts_up,
            assets = observations.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Nmap scan complete"
        );

        Ok(observations)
    }

    /// Ping-sweep a subnet, returning the addresses of responsive hosts.
    pub async fn ping_sweep(&self, subnet: &str) -> Result<Vec<String>> {
        let start = Instant::now();

        let stdout = self.run_engine(subnet, sweep_args(subnet)).await?;
        let run = nmap_xml::parse_nmap_xml(&stdout)?;

        let hosts: Vec<String> = run
            .hosts
            .iter()
            .filter(|h| h.is_up())
            .filter_map(|h| h.ipv4())
            .map(String::from)
            .collect();

        tracing::info!(
            subnet = %subnet,
            hosts_up = hosts.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Ping sweep complete"
        );

        Ok(hosts)
    }

    /// Execute the engine as an offloaded task under the scan timeout.
    ///
    /// On timeout the task is aborted; kill-on-drop reaps the child.
    async fn run_engine(&self, target: &str, args: Vec<String>) -> Result<Vec<u8>> {
        let mut command = Command::new(&self.nmap_path);
        command.args(&args).kill_on_drop(true);

        let mut handle = tokio::spawn(async move { command.output().await });

        let joined = match timeout(self.scan_timeout, &mut handle).await {
            Ok(joined) => joined,
            Err(_) => {
                handle.abort();
                return Err(DiscoverError::ScanTimeout {
                    target: target.to_string(),
                    timeout_secs: self.scan_timeout.as_secs(),
                });
            }
        };

        let output = joined
            .map_err(|e| DiscoverError::ScanTask(e.to_string()))?
            .map_err(|_| DiscoverError::NmapNotFound {
                path: self.nmap_path.clone(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(DiscoverError::NmapFailed {
                code: output.status.code().unwrap_or(-1),
                stderr,
            });
        }

        Ok(output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discovery_args_shape() {
        let args = discovery_args("10.0.1.0/24");

        assert!(args.contains(&"-O".to_string()));
        assert!(args.contains(&DISCOVERY_PORTS.to_string()));
        // XML goes to stdout, target comes last.
        let ox = args.iter().position(|a| a == "-oX").unwrap();
        assert_eq!(args[ox + 1], "-");
        assert_eq!(args.last().unwrap(), "10.0.1.0/24");
    }

    #[test]
    fn test_sweep_args_ping_only() {
        let args = sweep_args("10.0.1.0/24");
        assert_eq!(args[0], "-sn");
        assert!(!args.contains(&"-O".to_string()));
        assert_eq!(args.last().unwrap(), "10.0.1.0/24");
    }

    #[tokio::test]
    async fn test_missing_binary_is_not_found() {
        let scanner = NmapScanner::new("/nonexistent/nmap-binary", 5);
        let err = scanner.verify_installation().await.unwrap_err();
        assert!(matches!(err, DiscoverError::NmapNotFound { .. }));

        let err = scanner.scan("10.0.1.0/30").await.unwrap_err();
        assert!(matches!(err, DiscoverError::NmapNotFound { .. }));
    }
}
