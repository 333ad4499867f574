//! Tally Inventory — REST client for the asset inventory API.
//!
//! This crate is the single point of access to the remote inventory.
//! All asset reads and writes issued by the discovery pipeline flow
//! through this client so request shaping, authentication, and timeouts
//! stay consistent.

pub mod client;

pub use client::{AssetRecord, InventoryClient, InventoryConfig, InventoryError};
