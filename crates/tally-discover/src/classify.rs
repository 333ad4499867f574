//! Host classification: map raw scan facts to asset observations.

use chrono::{DateTime, Utc};

use tally_core::{AssetCategory, AssetObservation};

use crate::nmap_xml::{NmapHost, NmapRun};

/// OS fingerprint substrings that mark a host as dedicated network gear.
const NETWORK_VENDORS: [&str; 3] = ["cisco", "juniper", "mikrotik"];

/// Decide the asset category from open TCP ports and OS fingerprint
/// candidates. First matching rule wins:
///
/// 1. SSH/Telnet open and a network-vendor fingerprint → NetworkEquipment
/// 2. SSH/Telnet open → Server
/// 3. HTTP/HTTPS open → Server
/// 4. RDP open → Computer
/// 5. Windows service ports (135/139/445) open → Computer
/// 6. otherwise → NetworkDevice
pub fn categorize(open_ports: &[u16], os_matches: &[&str]) -> AssetCategory {
    let open = |port: u16| open_ports.contains(&port);

    if open(22) || open(23) {
        let vendor_fingerprint = os_matches.iter().any(|m| {
            let name = m.to_lowercase();
            NETWORK_VENDORS.iter().any(|v| name.contains(v))
        });
        if vendor_fingerprint {
            return AssetCategory::NetworkEquipment;
        }
        return AssetCategory::Server;
    }

    if open(80) || open(443) {
        return AssetCategory::Server;
    }

    if open(3389) {
        return AssetCategory::Computer;
    }

    if open(135) || open(139) || open(445) {
        return AssetCategory::Computer;
    }

    AssetCategory::NetworkDevice
}

/// Convert one responsive host into an observation.
///
/// Returns `None` when the host carries no IPv4 address, the one field an
/// observation cannot exist without.
pub fn observe(host: &NmapHost, now: DateTime<Utc>) -> Option<AssetObservation> {
    let ip = host.ipv4()?;
    let dashed_ip = ip.replace('.', "-");

    let name = match host.hostname() {
        Some(hostname) if !hostname.is_empty() => hostname.to_string(),
        _ => format!("host-{dashed_ip}"),
    };

    let open_ports = host.open_tcp_ports();
    let os_matches = host.os_matches();
    let category = categorize(&open_ports, &os_matches);

    let operating_system = os_matches
        .first()
        .map(|m| m.to_string())
        .unwrap_or_else(|| "Unknown OS".to_string());

    let ports_text = if open_ports.is_empty() {
        "None".to_string()
    } else {
        open_ports
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    };

    Some(AssetObservation {
        name,
        asset_tag: format!("DISC-{dashed_ip}-{}", now.timestamp()),
        category,
        brand: "Unknown".to_string(),
        model: "Unknown".to_string(),
        serial_number: None,
        ip_address: ip.to_string(),
        mac_address: host.mac().map(String::from),
        operating_system,
        status: "Active".to_string(),
        location: "Discovered via Network Scan".to_string(),
        description: format!("Automatically discovered device at {ip}. Open ports: {ports_text}"),
    })
}

/// Convert a full scan run into observations, in adapter order.
///
/// Hosts that did not respond are dropped silently; a responsive host
/// that cannot be converted is logged and skipped, yielding a partial
/// list instead of an error.
pub fn observations_from_run(run: &NmapRun, now: DateTime<Utc>) -> Vec<AssetObservation> {
    run.hosts
        .iter()
        .filter(|h| h.is_up())
        .filter_map(|h| {
            let obs = observe(h, now);
            if obs.is_none() {
                tracing::warn!(addresses = ?h.addresses, "Skipping host without IPv4 address");
            }
            obs
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nmap_xml::parse_nmap_xml;

    #[test]
    fn test_network_vendor_fingerprint_wins() {
        assert_eq!(
            categorize(&[22], &["Cisco IOS 15.2"]),
            AssetCategory::NetworkEquipment
        );
        assert_eq!(
            categorize(&[23, 80], &["MikroTik RouterOS 7"]),
            AssetCategory::NetworkEquipment
        );
    }

    #[test]
    fn test_ssh_without_vendor_is_server() {
        assert_eq!(
            categorize(&[22], &["Linux 5.15"]),
            AssetCategory::Server
        );
        assert_eq!(categorize(&[22], &[]), AssetCategory::Server);
    }

    #[test]
    fn test_web_ports_are_server() {
        assert_eq!(categorize(&[443], &[]), AssetCategory::Server);
        assert_eq!(categorize(&[80], &["Windows 10"]), AssetCategory::Server);
    }

    #[test]
    fn test_rdp_and_windows_ports_are_computer() {
        assert_eq!(categorize(&[3389], &[]), AssetCategory::Computer);
        assert_eq!(categorize(&[135], &[]), AssetCategory::Computer);
        assert_eq!(categorize(&[139, 445], &[]), AssetCategory::Computer);
    }

    #[test]
    fn test_no_match_defaults_to_network_device() {
        assert_eq!(categorize(&[], &[]), AssetCategory::NetworkDevice);
        assert_eq!(categorize(&[5985], &["Linux 6.1"]), AssetCategory::NetworkDevice);
    }

    #[test]
    fn test_precedence_is_port_order_not_fingerprint() {
        // 3389 alongside 80: the web rule fires first.
        assert_eq!(categorize(&[80, 3389], &[]), AssetCategory::Server);
        // A cisco fingerprint without SSH/Telnet never makes NetworkEquipment.
        assert_eq!(
            categorize(&[443], &["Cisco ASA"]),
            AssetCategory::Server
        );
    }

    const TWO_HOST_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE nmaprun>
<nmaprun scanner="nmap" args="nmap -sS -O -sV 10.0.0.0/30">
  <host>
    <status state="up" reason="syn-ack"/>
    <address addr="10.0.0.1" addrtype="ipv4"/>
    <ports>
      <port protocol="tcp" portid="443">
        <state state="open" reason="syn-ack"/>
      </port>
    </ports>
  </host>
  <host>
    <status state="up" reason="syn-ack"/>
    <address addr="10.0.0.2" addrtype="ipv4"/>
    <ports>
      <port protocol="tcp" portid="3389">
        <state state="open" reason="syn-ack"/>
      </port>
    </ports>
  </host>
  <host>
    <status state="down" reason="no-response"/>
    <address addr="10.0.0.3" addrtype="ipv4"/>
  </host>
</nmaprun>"#;

    #[test]
    fn test_observations_from_run_end_to_end() {
        let run = parse_nmap_xml(TWO_HOST_XML.as_bytes()).unwrap();
        let now = Utc::now();
        let observations = observations_from_run(&run, now);

        assert_eq!(observations.len(), 2);

        let web = &observations[0];
        assert_eq!(web.ip_address, "10.0.0.1");
        assert_eq!(web.category, AssetCategory::Server);
        assert_eq!(web.asset_tag, format!("DISC-10-0-0-1-{}", now.timestamp()));

        let desktop = &observations[1];
        assert_eq!(desktop.ip_address, "10.0.0.2");
        assert_eq!(desktop.category, AssetCategory::Computer);
        assert_eq!(
            desktop.asset_tag,
            format!("DISC-10-0-0-2-{}", now.timestamp())
        );
    }

    #[test]
    fn test_down_hosts_never_observed() {
        let run = parse_nmap_xml(TWO_HOST_XML.as_bytes()).unwrap();
        let observations = observations_from_run(&run, Utc::now());
        assert!(observations.iter().all(|o| o.ip_address != "10.0.0.3"));
    }

    #[test]
    fn test_observe_fills_placeholders() {
        let run = parse_nmap_xml(TWO_HOST_XML.as_bytes()).unwrap();
        let obs = observe(&run.hosts[0], Utc::now()).unwrap();

        // No resolvable hostname: synthesized label.
        assert_eq!(obs.name, "host-10-0-0-1");
        assert_eq!(obs.brand, "Unknown");
        assert_eq!(obs.model, "Unknown");
        assert!(obs.serial_number.is_none());
        assert_eq!(obs.operating_system, "Unknown OS");
        assert_eq!(obs.status, "Active");
        assert_eq!(obs.location, "Discovered via Network Scan");
        assert_eq!(
            obs.description,
            "Automatically discovered device at 10.0.0.1. Open ports: 443"
        );
        assert!(obs.mac_address.is_none());
    }

    #[test]
    fn test_observe_no_open_ports_description() {
        let xml = r#"<?xml version="1.0"?>
<nmaprun scanner="nmap">
  <host>
    <status state="up"/>
    <address addr="10.0.0.9" addrtype="ipv4"/>
  </host>
</nmaprun>"#;
        let run = parse_nmap_xml(xml.as_bytes()).unwrap();
        let obs = observe(&run.hosts[0], Utc::now()).unwrap();

        assert_eq!(obs.category, AssetCategory::NetworkDevice);
        assert_eq!(
            obs.description,
            "Automatically discovered device at 10.0.0.9. Open ports: None"
        );
    }
}
