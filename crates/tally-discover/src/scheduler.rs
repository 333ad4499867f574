//! Discovery cycle scheduling.
//!
//! Exactly one cycle runs at a time: subnets are scanned sequentially and
//! each subnet's results go straight to the reporter. Scan and report
//! failures are contained inside the cycle; a cycle-level error triggers
//! a fixed backoff instead of the interval sleep. The loop only exits on
//! the stop signal, observed between cycles and during sleeps.

use std::time::Instant;

use tokio::sync::watch;
use tokio::time::{sleep, Duration};

use crate::config::DiscoverConfig;
use crate::error::Result;
use crate::report::{AssetReporter, InventoryApi};
use crate::scanner::NmapScanner;

/// Fixed backoff after a cycle-level error, distinct from the regular
/// interval sleep.
const ERROR_BACKOFF: Duration = Duration::from_secs(60);

/// The long-running discovery service.
pub struct DiscoveryService<C: InventoryApi> {
    config: DiscoverConfig,
    scanner: NmapScanner,
    reporter: AssetReporter<C>,
}

impl<C: InventoryApi> DiscoveryService<C> {
    pub fn new(config: DiscoverConfig, scanner: NmapScanner, reporter: AssetReporter<C>) -> Self {
        Self {
            config,
            scanner,
            reporter,
        }
    }

    /// Run one discovery cycle: authenticate, then scan and report each
    /// configured subnet in order.
    ///
    /// A failed authentication disables reporting for this cycle; a
    /// failed subnet scan skips that subnet. Both are logged here and the
    /// cycle carries on. An `Err` from this function is a cycle-level
    /// fault the caller answers with its backoff.
    pub async fn run_cycle(&mut self) -> Result<usize> {
        tracing::info!("Starting discovery cycle");
        let start = Instant::now();

        if let Err(e) = self.reporter.authenticate().await {
            tracing::error!(
                error = %e,
                "Inventory authentication failed; reporting disabled for this cycle"
            );
        }

        let mut discovered = 0usize;

        if !self.config.enable_nmap_scan {
            tracing::info!("Nmap discovery disabled; nothing to scan");
        } else {
            for subnet in &self.config.subnets {
                tracing::info!(subnet = %subnet, "Scanning subnet");

                let observations = match self.scanner.scan(subnet).await {
                    Ok(observations) => observations,
                    Err(e) => {
                        tracing::error!(subnet = %subnet, error = %e, "Subnet scan failed");
                        continue;
                    }
                };

                discovered += observations.len();

                if observations.is_empty() {
                    tracing::info!(subnet = %subnet, "No responsive hosts");
                    continue;
                }

                if !self.reporter.is_authenticated() {
                    tracing::warn!(
                        subnet = %subnet,
                        assets = observations.len(),
                        "Skipping report: no inventory session"
                    );
                    continue;
                }

                let summary = self.reporter.report_assets(&observations).await?;
                if !summary.complete() {
                    tracing::warn!(
                        subnet = %subnet,
                        failed = summary.failed,
                        "Some assets failed to report"
                    );
                }
            }
        }

        tracing::info!(
            assets = discovered,
            duration_ms = start.elapsed().as_millis() as u64,
            "Discovery cycle completed"
        );

        Ok(discovered)
    }

    /// Drive cycles until the stop signal flips.
    ///
    /// The stop signal is honored before each cycle and during the
    /// sleeps, never mid-scan or mid-report.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            subnets = ?self.config.subnets,
            interval_minutes = self.config.scan_interval_minutes,
            "Discovery service started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            let pause = match self.run_cycle().await {
                Ok(_) => Duration::from_secs(self.config.scan_interval_minutes * 60),
                Err(e) => {
                    tracing::error!(error = %e, "Discovery cycle error");
                    ERROR_BACKOFF
                }
            };

            tokio::select! {
                _ = sleep(pause) => {}
                _ = wait_for_stop(&mut shutdown) => break,
            }
        }

        self.reporter.clear_session();
        tracing::info!("Discovery service stopped");
    }
}

/// Resolve once the stop flag turns true. A dropped sender counts as a
/// stop request.
async fn wait_for_stop(shutdown: &mut watch::Receiver<bool>) {
    while shutdown.changed().await.is_ok() {
        if *shutdown.borrow() {
            return;
        }
    }
}
