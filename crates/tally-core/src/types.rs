//! Domain types for discovered network assets.
//!
//! Field names and category strings follow the inventory API schema, so
//! these types serialize directly into request bodies.

use serde::{Deserialize, Serialize};

/// Device classification assigned by the discovery scanner.
///
/// The inventory stores categories as display strings, so the serde
/// representation carries the spaces.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum AssetCategory {
    #[serde(rename = "Network Equipment")]
    NetworkEquipment,
    #[serde(rename = "Server")]
    Server,
    #[serde(rename = "Computer")]
    Computer,
    #[default]
    #[serde(rename = "Network Device")]
    NetworkDevice,
}

impl AssetCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NetworkEquipment => "Network Equipment",
            Self::Server => "Server",
            Self::Computer => "Computer",
            Self::NetworkDevice => "Network Device",
        }
    }
}

/// One discovered host, produced by a scan cycle and handed to the
/// reporter exactly once. Observations live only for the duration of a
/// cycle; the remote inventory record is the durable counterpart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetObservation {
    /// Resolved hostname, or a synthesized `host-<ip-with-dashes>` label.
    pub name: String,
    /// Generated `DISC-<ip-with-dashes>-<unix-seconds>` tag. Unique only
    /// within the generating cycle; reconciliation keys on `ip_address`.
    pub asset_tag: String,
    pub category: AssetCategory,
    pub brand: String,
    pub model: String,
    pub serial_number: Option<String>,
    /// The reconciliation key. Never empty.
    pub ip_address: String,
    pub mac_address: Option<String>,
    pub operating_system: String,
    pub status: String,
    pub location: String,
    /// Free text embedding the set of open ports found on the host.
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_wire_strings() {
        let json = serde_json::to_string(&AssetCategory::NetworkEquipment).unwrap();
        assert_eq!(json, "\"Network Equipment\"");
        let json = serde_json::to_string(&AssetCategory::NetworkDevice).unwrap();
        assert_eq!(json, "\"Network Device\"");

        let parsed: AssetCategory = serde_json::from_str("\"Server\"").unwrap();
        assert_eq!(parsed, AssetCategory::Server);
    }

    #[test]
    fn test_category_default() {
        assert_eq!(AssetCategory::default(), AssetCategory::NetworkDevice);
    }

    #[test]
    fn test_observation_serializes_inventory_fields() {
        let obs = AssetObservation {
            name: "host-10-0-0-1".to_string(),
            asset_tag: "DISC-10-0-0-1-1700000000".to_string(),
            category: AssetCategory::Server,
            brand: "Unknown".to_string(),
            model: "Unknown".to_string(),
            serial_number: None,
            ip_address: "10.0.0.1".to_string(),
            mac_address: Some("AA:BB:CC:DD:EE:01".to_string()),
            operating_system: "Linux 5.15".to_string(),
            status: "Active".to_string(),
            location: "Discovered via Network Scan".to_string(),
            description: "Automatically discovered device at 10.0.0.1. Open ports: 443".to_string(),
        };

        let value = serde_json::to_value(&obs).unwrap();
        assert_eq!(value["asset_tag"], "DISC-10-0-0-1-1700000000");
        assert_eq!(value["category"], "Server");
        assert_eq!(value["ip_address"], "10.0.0.1");
        assert_eq!(value["operating_system"], "Linux 5.15");
        assert_eq!(value["serial_number"], serde_json::Value::Null);
    }
}
