//! Network facts from the host's own interfaces

use cep_core::{NetworkFactsProvider, NetworkInterface};
use network_interface::{NetworkInterface as NI, NetworkInterfaceConfig};
use tracing::{debug, warn};

/// Reports the host's non-loopback interfaces that carry a hardware address
#[derive(Debug, Clone, Copy, Default)]
pub struct HostNetwork;

impl NetworkFactsProvider for HostNetwork {
    fn interfaces(&self) -> Vec<NetworkInterface> {
        let found = match NI::show() {
            Ok(found) => found,
            Err(e) => {
                warn!(error = %e, "Failed to list host network interfaces");
                return Vec::new();
            }
        };

        let mut interfaces: Vec<NetworkInterface> = found
            .into_iter()
            .filter(|iface| is_physical(&iface.name) && !iface.addr.is_empty())
            .filter_map(|iface| {
                let mac = iface
                    .mac_addr
                    .filter(|mac| mac != "00:00:00:00:00:00")?
                    .to_lowercase();

                let ip = iface.addr.iter().find_map(|addr| match addr {
                    network_interface::Addr::V4(v4) => Some(v4.ip.to_string()),
                    _ => None,
                });

                debug!(name = %iface.name, mac = %mac, "Host interface");
                Some(NetworkInterface {
                    kind: interface_kind(&iface.name).to_string(),
                    mac: Some(mac),
                    ip,
                    ssid: None,
                    rssi_db: None,
                })
            })
            .collect();

        // show() reports one entry per address family
        interfaces.dedup_by(|a, b| a.mac == b.mac);
        interfaces
    }
}

/// Name prefixes of loopback, bridge, tunnel and other virtual links
const VIRTUAL_PREFIXES: &[&str] = &["lo", "docker", "br-", "veth", "virbr", "ifb", "tun", "tap"];

fn is_physical(name: &str) -> bool {
    !VIRTUAL_PREFIXES.iter().any(|prefix| name.starts_with(prefix))
}

fn interface_kind(name: &str) -> &'static str {
    if name.starts_with("wl") {
        "wifi"
    } else {
        "ethernet"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interface_filtering() {
        assert!(is_physical("eth0"));
        assert!(is_physical("wlan0"));
        assert!(!is_physical("lo"));
        assert!(!is_physical("docker0"));
        assert!(!is_physical("veth12ab"));
        assert!(!is_physical("ifb0"));
        assert!(!is_physical("tun0"));
        assert!(!is_physical("tap1"));
        assert!(!is_physical("virbr0"));
    }

    #[test]
    fn test_interface_kind() {
        assert_eq!(interface_kind("wlp3s0"), "wifi");
        assert_eq!(interface_kind("enp0s31f6"), "ethernet");
    }
}
