//! Platform fact providers
//!
//! Facts the engine cannot discover by probing (identity, clock, memory, pin
//! layout, network interfaces) come from optional providers supplied by the
//! caller. A missing provider or a missing fact simply leaves the matching
//! document field out.

use chrono::{DateTime, Utc};

use crate::capability::{
    AdcCapability, ComputeCapability, GpioCapability, NeopixelCapability, NetworkInterface,
    StorageCapability,
};

/// Placeholder used when an identity fact is unavailable
pub const UNKNOWN: &str = "unknown";

/// Who the device is
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub id: String,
    pub model: String,
    pub firmware: String,
    /// Explicit transport; derived from network presence when `None`
    pub transport: Option<String>,
    /// Time of the report, supplied by the caller so document assembly stays pure
    pub reported_at: Option<DateTime<Utc>>,
}

impl DeviceIdentity {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Identity keyed by a chip unique ID, hex-encoded
    pub fn from_unique_id(bytes: &[u8]) -> Self {
        Self::new(hex::encode(bytes))
    }

    /// Identity keyed by a MAC address, formatted `aa:bb:cc:dd:ee:ff`
    pub fn from_mac(mac: &[u8; 6]) -> Self {
        Self::new(format_mac(mac))
    }
}

impl Default for DeviceIdentity {
    fn default() -> Self {
        Self {
            id: UNKNOWN.to_string(),
            model: UNKNOWN.to_string(),
            firmware: UNKNOWN.to_string(),
            transport: None,
            reported_at: None,
        }
    }
}

/// Format six bytes as a lowercase colon-separated MAC address
pub fn format_mac(mac: &[u8; 6]) -> String {
    mac.iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(":")
}

/// Supplies board-level facts. Every fact defaults to "not available".
pub trait PlatformFactsProvider {
    fn identity(&self) -> DeviceIdentity {
        DeviceIdentity::default()
    }

    fn cpu_mhz(&self) -> Option<u32> {
        None
    }

    fn ram_kb(&self) -> Option<u32> {
        None
    }

    fn flash_kb(&self) -> Option<u32> {
        None
    }

    fn gpio(&self) -> GpioCapability {
        GpioCapability::default()
    }

    fn adc(&self) -> Option<AdcCapability> {
        None
    }

    /// Data pin of an attached addressable LED strip
    fn neopixel(&self) -> Option<NeopixelCapability> {
        None
    }

    fn storage(&self) -> Vec<StorageCapability> {
        Vec::new()
    }
}

/// Supplies network interfaces
pub trait NetworkFactsProvider {
    fn interfaces(&self) -> Vec<NetworkInterface>;
}

/// Snapshot of everything the providers reported
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlatformFacts {
    pub identity: DeviceIdentity,
    pub compute: ComputeCapability,
    pub gpio: GpioCapability,
    pub adc: Option<AdcCapability>,
    pub network: Vec<NetworkInterface>,
    pub neopixel: Option<NeopixelCapability>,
    pub storage: Vec<StorageCapability>,
}

impl PlatformFacts {
    /// Query the providers once
    pub fn gather(
        platform: Option<&dyn PlatformFactsProvider>,
        network: Option<&dyn NetworkFactsProvider>,
    ) -> Self {
        let mut facts = match platform {
            Some(p) => Self {
                identity: p.identity(),
                compute: ComputeCapability {
                    mhz: p.cpu_mhz(),
                    ram_kb: p.ram_kb(),
                    flash_kb: p.flash_kb(),
                },
                gpio: p.gpio(),
                adc: p.adc(),
                network: Vec::new(),
                neopixel: p.neopixel(),
                storage: p.storage(),
            },
            None => Self::default(),
        };

        if let Some(n) = network {
            facts.network = n.interfaces();
        }

        facts
    }

    /// Transport reported in the device record
    pub fn transport(&self) -> &str {
        match &self.identity.transport {
            Some(transport) => transport,
            None if !self.network.is_empty() => "network",
            None => "serial",
        }
    }
}

/// Facts fixed at construction time, e.g. from a board profile
#[derive(Debug, Clone, Default)]
pub struct StaticPlatform {
    pub identity: DeviceIdentity,
    pub compute: ComputeCapability,
    pub gpio: GpioCapability,
    pub adc: Option<AdcCapability>,
    pub neopixel: Option<NeopixelCapability>,
    pub storage: Vec<StorageCapability>,
}

impl PlatformFactsProvider for StaticPlatform {
    fn identity(&self) -> DeviceIdentity {
        self.identity.clone()
    }

    fn cpu_mhz(&self) -> Option<u32> {
        self.compute.mhz
    }

    fn ram_kb(&self) -> Option<u32> {
        self.compute.ram_kb
    }

    fn flash_kb(&self) -> Option<u32> {
        self.compute.flash_kb
    }

    fn gpio(&self) -> GpioCapability {
        self.gpio.clone()
    }

    fn adc(&self) -> Option<AdcCapability> {
        self.adc.clone()
    }

    fn neopixel(&self) -> Option<NeopixelCapability> {
        self.neopixel.clone()
    }

    fn storage(&self) -> Vec<StorageCapability> {
        self.storage.clone()
    }
}

/// A fixed list of network interfaces
#[derive(Debug, Clone, Default)]
pub struct StaticNetwork(pub Vec<NetworkInterface>);

impl NetworkFactsProvider for StaticNetwork {
    fn interfaces(&self) -> Vec<NetworkInterface> {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_from_unique_id() {
        let identity = DeviceIdentity::from_unique_id(&[0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]);
        assert_eq!(identity.id, "aabbccddeeff");
        assert_eq!(identity.model, UNKNOWN);
    }

    #[test]
    fn test_identity_from_mac() {
        let identity = DeviceIdentity::from_mac(&[0x24, 0x6f, 0x28, 0x01, 0x02, 0x0a]);
        assert_eq!(identity.id, "24:6f:28:01:02:0a");
    }

    #[test]
    fn test_gather_without_providers() {
        let facts = PlatformFacts::gather(None, None);
        assert_eq!(facts.compute, ComputeCapability::default());
        assert!(facts.adc.is_none());
        assert!(facts.neopixel.is_none());
        assert!(facts.network.is_empty());
        assert_eq!(facts.transport(), "serial");
    }

    #[test]
    fn test_gather_static_providers() {
        let platform = StaticPlatform {
            identity: DeviceIdentity::new("dev-1"),
            compute: ComputeCapability {
                mhz: Some(240),
                ram_kb: None,
                flash_kb: Some(4096),
            },
            neopixel: Some(NeopixelCapability::new(5)),
            ..Default::default()
        };
        let network = StaticNetwork(vec![NetworkInterface::new("wifi", "aa:bb:cc:dd:ee:ff")]);

        let facts = PlatformFacts::gather(Some(&platform), Some(&network));
        assert_eq!(facts.identity.id, "dev-1");
        assert_eq!(facts.compute.mhz, Some(240));
        assert_eq!(facts.compute.ram_kb, None);
        assert_eq!(facts.neopixel, Some(NeopixelCapability::new(5)));
        assert_eq!(facts.network.len(), 1);
        assert_eq!(facts.transport(), "network");
    }

    #[test]
    fn test_explicit_transport_wins() {
        let mut facts = PlatformFacts::default();
        facts.identity.transport = Some("usb".to_string());
        facts.network.push(NetworkInterface::new("wifi", "aa:bb:cc:dd:ee:ff"));
        assert_eq!(facts.transport(), "usb");
    }
}
