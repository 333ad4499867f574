//! Inventory API connection management and typed endpoint wrappers.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use tally_core::AssetObservation;

/// Errors from inventory API operations.
#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("Login rejected with status {status}: {body}")]
    Auth { status: u16, body: String },

    #[error("{context} returned status {status}: {body}")]
    Status {
        context: String,
        status: u16,
        body: String,
    },

    #[error("Inventory request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Configuration for connecting to the inventory API.
#[derive(Debug, Clone, Deserialize)]
pub struct InventoryConfig {
    /// Base URL including the API version prefix.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Service account username (email).
    #[serde(default = "default_username")]
    pub username: String,

    /// Service account password.
    #[serde(default = "default_password")]
    pub password: String,

    /// TCP connect timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Per-request wall-clock timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://api:8000/api/v1".to_string()
}

fn default_username() -> String {
    "admin@example.com".to_string()
}

fn default_password() -> String {
    "admin123".to_string()
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            username: default_username(),
            password: default_password(),
            connect_timeout_secs: default_connect_timeout(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// A remote asset record as returned by the inventory API.
#[derive(Debug, Clone, Deserialize)]
pub struct AssetRecord {
    pub id: i64,
    pub name: String,
    pub asset_tag: String,
    pub category: String,
    pub ip_address: Option<String>,
    pub mac_address: Option<String>,
    pub operating_system: Option<String>,
    pub status: Option<String>,
}

/// Response body of `POST /auth/login`.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Typed client for the inventory REST API.
///
/// Holds the connection pool and credentials but no session state; the
/// bearer token obtained from [`InventoryClient::login`] is owned by the
/// caller and passed back in per request.
pub struct InventoryClient {
    http: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
}

impl InventoryClient {
    /// Build a client with the configured connect and request timeouts.
    pub fn new(config: &InventoryConfig) -> Result<Self, InventoryError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Authenticate with the service account credentials and return the
    /// bearer token.
    pub async fn login(&self) -> Result<String, InventoryError> {
        let form = [
            ("username", self.username.as_str()),
            ("password", self.password.as_str()),
        ];

        let response = self
            .http
            .post(self.endpoint("/auth/login"))
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InventoryError::Auth {
                status: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse = response.json().await?;
        tracing::info!("Authenticated with inventory API");
        Ok(token.access_token)
    }

    /// Fetch the full asset list.
    pub async fn list_assets(&self, token: &str) -> Result<Vec<AssetRecord>, InventoryError> {
        let response = self
            .http
            .get(self.endpoint("/assets/"))
            .bearer_auth(token)
            .send()
            .await?;

        decode(response, "GET /assets/").await
    }

    /// Create a new asset record from an observation.
    pub async fn create_asset(
        &self,
        token: &str,
        observation: &AssetObservation,
    ) -> Result<AssetRecord, InventoryError> {
        let response = self
            .http
            .post(self.endpoint("/assets/"))
            .bearer_auth(token)
            .json(observation)
            .send()
            .await?;

        decode(response, "POST /assets/").await
    }

    /// Update an existing asset record with an observation's fields.
    pub async fn update_asset(
        &self,
        token: &str,
        id: i64,
        observation: &AssetObservation,
    ) -> Result<AssetRecord, InventoryError> {
        let response = self
            .http
            .put(self.endpoint(&format!("/assets/{id}")))
            .bearer_auth(token)
            .json(observation)
            .send()
            .await?;

        decode(response, &format!("PUT /assets/{id}")).await
    }
}

/// Map a response to its decoded body, or to a status error with the
/// response text preserved for logging.
async fn decode<T: DeserializeOwned>(
    response: reqwest::Response,
    context: &str,
) -> Result<T, InventoryError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(InventoryError::Status {
            context: context.to_string(),
            status: status.as_u16(),
            body,
        });
    }
    Ok(response.json().await?)
}
