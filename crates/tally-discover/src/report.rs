//! Inventory session handling and asset reconciliation.
//!
//! The reporter owns the bearer-token session for the daemon's lifetime
//! and reconciles each observation against the remote inventory: match by
//! IP address, then update the existing record or create a new one.

use async_trait::async_trait;
use tokio::time::{sleep, Duration};

use tally_core::AssetObservation;
use tally_inventory::{AssetRecord, InventoryClient, InventoryError};

use crate::error::{DiscoverError, Result};

/// Delay between consecutive asset writes, to bound load on the API.
const PER_ASSET_DELAY: Duration = Duration::from_millis(100);

/// Outbound port to the inventory API.
#[async_trait]
pub trait InventoryApi: Send + Sync {
    async fn login(&self) -> std::result::Result<String, InventoryError>;

    async fn list_assets(&self, token: &str)
        -> std::result::Result<Vec<AssetRecord>, InventoryError>;

    async fn create_asset(
        &self,
        token: &str,
        observation: &AssetObservation,
    ) -> std::result::Result<AssetRecord, InventoryError>;

    async fn update_asset(
        &self,
        token: &str,
        id: i64,
        observation: &AssetObservation,
    ) -> std::result::Result<AssetRecord, InventoryError>;
}

#[async_trait]
impl InventoryApi for InventoryClient {
    async fn login(&self) -> std::result::Result<String, InventoryError> {
        InventoryClient::login(self).await
    }

    async fn list_assets(
        &self,
        token: &str,
    ) -> std::result::Result<Vec<AssetRecord>, InventoryError> {
        InventoryClient::list_assets(self, token).await
    }

    async fn create_asset(
        &self,
        token: &str,
        observation: &AssetObservation,
    ) -> std::result::Result<AssetRecord, InventoryError> {
        InventoryClient::create_asset(self, token, observation).await
    }

    async fn update_asset(
        &self,
        token: &str,
        id: i64,
        observation: &AssetObservation,
    ) -> std::result::Result<AssetRecord, InventoryError> {
        InventoryClient::update_asset(self, token, id, observation).await
    }
}

/// Aggregate result of one reporting batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReportSummary {
    pub succeeded: u32,
    pub failed: u32,
}

impl ReportSummary {
    /// True only when every observation in the batch was written.
    pub fn complete(&self) -> bool {
        self.failed == 0
    }
}

/// Owns the authenticated inventory session. Holds zero or one bearer
/// token; acquires it on [`AssetReporter::authenticate`] and drops it on
/// [`AssetReporter::clear_session`].
pub struct AssetReporter<C: InventoryApi> {
    api: C,
    token: Option<String>,
}

impl<C: InventoryApi> AssetReporter<C> {
    pub fn new(api: C) -> Self {
        Self { api, token: None }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Obtain and store a bearer token.
    ///
    /// On failure the reporter stays unauthenticated; reporting is then
    /// skipped for the cycle, never the process.
    pub async fn authenticate(&mut self) -> Result<()> {
        match self.api.login().await {
            Ok(token) => {
                self.token = Some(token);
                Ok(())
            }
            Err(e) => {
                self.token = None;
                Err(e.into())
            }
        }
    }

    /// Drop the stored session token. Safe to call repeatedly and from
    /// shutdown paths.
    pub fn clear_session(&mut self) {
        self.token = None;
    }

    /// Reconcile a batch of observations against the inventory.
    ///
    /// Requires a stored token; without one no HTTP call is issued.
    /// Observations are processed strictly in order. A failed write is
    /// counted and the batch continues; successful writes stay committed.
    pub async fn report_assets(&self, observations: &[AssetObservation]) -> Result<ReportSummary> {
        let token = self
            .token
            .as_deref()
            .ok_or(DiscoverError::NotAuthenticated)?;

        let mut summary = ReportSummary::default();

        for (index, observation) in observations.iter().enumerate() {
            match self.reconcile(token, observation).await {
                Ok(()) => summary.succeeded += 1,
                Err(e) => {
                    tracing::error!(
                        asset_tag = %observation.asset_tag,
                        ip = %observation.ip_address,
                        error = %e,
                        "Failed to report asset"
                    );
                    summary.failed += 1;
                }
            }

            if index + 1 < observations.len() {
                sleep(PER_ASSET_DELAY).await;
            }
        }

        tracing::info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Asset reporting completed"
        );

        Ok(summary)
    }

    /// Update the record matching the observation's IP, or create one.
    async fn reconcile(
        &self,
        token: &str,
        observation: &AssetObservation,
    ) -> std::result::Result<(), InventoryError> {
        match self.find_by_ip(token, &observation.ip_address).await? {
            Some(existing) => {
                self.api
                    .update_asset(token, existing.id, observation)
                    .await?;
                tracing::info!(
                    id = existing.id,
                    ip = %observation.ip_address,
                    asset_tag = %observation.asset_tag,
                    "Updated asset"
                );
            }
            None => {
                let created = self.api.create_asset(token, observation).await?;
                tracing::info!(
                    id = created.id,
                    ip = %observation.ip_address,
                    asset_tag = %observation.asset_tag,
                    "Created asset"
                );
            }
        }
        Ok(())
    }

    /// Match an IP against the full remote asset list.
    ///
    /// One list fetch and a linear scan per observation.
    async fn find_by_ip(
        &self,
        token: &str,
        ip: &str,
    ) -> std::result::Result<Option<AssetRecord>, InventoryError> {
        let assets = self.api.list_assets(token).await?;
        Ok(assets
            .into_iter()
            .find(|a| a.ip_address.as_deref() == Some(ip)))
    }
}
