//! Error types for the tally-discover crate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiscoverError {
    #[error("Nmap not found at path: {path}")]
    NmapNotFound { path: String },

    #[error("Nmap exited with code {code}: {stderr}")]
    NmapFailed { code: i32, stderr: String },

    #[error("Scan of {target} exceeded the {timeout_secs}s timeout")]
    ScanTimeout { target: String, timeout_secs: u64 },

    #[error("Scan task failed: {0}")]
    ScanTask(String),

    #[error("Failed to parse nmap XML output: {0}")]
    XmlParse(String),

    #[error("No inventory session; authenticate first")]
    NotAuthenticated,

    #[error("Inventory error: {0}")]
    Inventory(#[from] tally_inventory::InventoryError),

    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, DiscoverError>;
