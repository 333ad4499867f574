//! Integration tests for tally-inventory against a live inventory API.
//!
//! These tests require the inventory backend to be running.
//! Run with: cargo test --package tally-inventory --test integration -- --ignored
//!
//! Skipped automatically if the API is not reachable.

use tally_core::{AssetCategory, AssetObservation};
use tally_inventory::{InventoryClient, InventoryConfig};

async fn login_or_skip() -> Option<(InventoryClient, String)> {
    let config = InventoryConfig {
        base_url: "http://localhost:8000/api/v1".to_string(),
        ..Default::default()
    };
    let client = InventoryClient::new(&config).expect("client build failed");

    match client.login().await {
        Ok(token) => Some((client, token)),
        Err(e) => {
            eprintln!("Skipping integration test (inventory not available): {e}");
            None
        }
    }
}

fn make_observation(ip: &str, tag: &str) -> AssetObservation {
    AssetObservation {
        name: format!("host-{}", ip.replace('.', "-")),
        asset_tag: tag.to_string(),
        category: AssetCategory::Server,
        brand: "Unknown".to_string(),
        model: "Unknown".to_string(),
        serial_number: None,
        ip_address: ip.to_string(),
        mac_address: None,
        operating_system: "Unknown OS".to_string(),
        status: "Active".to_string(),
        location: "Discovered via Network Scan".to_string(),
        description: format!("Automatically discovered device at {ip}. Open ports: 443"),
    }
}

#[tokio::test]
#[ignore = "requires live inventory API — run with: cargo test --package tally-inventory --test integration -- --ignored"]
async fn test_create_list_update_roundtrip() {
    let Some((client, token)) = login_or_skip().await else {
        return;
    };

    // Pick an IP unlikely to exist in the fixture data.
    let ip = "203.0.113.77";
    let obs = make_observation(ip, "TEST-203-0-113-77-1");

    let created = client.create_asset(&token, &obs).await.unwrap();
    assert_eq!(created.ip_address.as_deref(), Some(ip));

    let assets = client.list_assets(&token).await.unwrap();
    let found = assets
        .iter()
        .find(|a| a.ip_address.as_deref() == Some(ip))
        .expect("created asset should be listed");
    assert_eq!(found.id, created.id);

    let updated_obs = make_observation(ip, "TEST-203-0-113-77-2");
    let updated = client.update_asset(&token, created.id, &updated_obs).await.unwrap();
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.asset_tag, "TEST-203-0-113-77-2");
}

#[tokio::test]
#[ignore = "requires live inventory API — run with: cargo test --package tally-inventory --test integration -- --ignored"]
async fn test_login_rejects_bad_credentials() {
    let config = InventoryConfig {
        base_url: "http://localhost:8000/api/v1".to_string(),
        password: "wrong-password".to_string(),
        ..Default::default()
    };
    let client = InventoryClient::new(&config).expect("client build failed");

    match client.login().await {
        Err(tally_inventory::InventoryError::Auth { status, .. }) => {
            assert_ne!(status, 200);
        }
        Err(e) => {
            eprintln!("Skipping assertion (inventory not available): {e}");
        }
        Ok(_) => panic!("login with bad credentials should fail"),
    }
}
