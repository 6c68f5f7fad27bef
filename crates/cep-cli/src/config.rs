//! Device profile loading
//!
//! A profile describes the board being emulated: identity, compute facts,
//! buses and the devices attached to them, pin layout and network interfaces.

use anyhow::{Context, Result};
use cep_core::{
    AdcCapability, AddressRange, BusAddress, ComputeCapability, DescriptorCatalog,
    DescriptorRegistry, DeviceIdentity, GpioCapability, NeopixelCapability, NetworkInterface,
    StaticPlatform, StorageCapability,
};
use cep_discovery::{BusSpec, SimulatedBus};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Board preset applied underneath the explicit settings
    #[serde(default)]
    pub profile: Option<Profile>,
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub compute: ComputeConfig,
    #[serde(default, rename = "bus")]
    pub buses: Vec<BusConfig>,
    #[serde(default)]
    pub gpio: Option<GpioConfig>,
    #[serde(default)]
    pub adc: Option<AdcConfig>,
    #[serde(default)]
    pub neopixel: Option<NeopixelConfig>,
    #[serde(default, rename = "network")]
    pub networks: Vec<NetworkConfig>,
    #[serde(default)]
    pub storage: Vec<StorageConfig>,
    #[serde(default)]
    pub chipsets: ChipsetsConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    Esp32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Explicit device ID
    pub id: Option<String>,
    /// Chip unique ID as hex, used when `id` is not set
    pub unique_id: Option<String>,
    /// Board/model string
    pub model: Option<String>,
    /// Firmware version
    pub firmware: Option<String>,
    /// Transport override ("serial", "usb", "network")
    pub transport: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComputeConfig {
    pub mhz: Option<u32>,
    pub ram_kb: Option<u32>,
    pub flash_kb: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusConfig {
    #[serde(default)]
    pub id: u8,
    pub sda: Option<u8>,
    pub scl: Option<u8>,
    #[serde(default = "default_freq_hz")]
    pub freq_hz: u32,
    /// First probed address
    #[serde(default = "default_first")]
    pub first: BusAddress,
    /// Last probed address
    #[serde(default = "default_last")]
    pub last: BusAddress,
    /// Pause between probes in microseconds
    #[serde(default = "default_probe_delay_us")]
    pub probe_delay_us: u64,
    /// Emulated devices acknowledging on this bus
    #[serde(default)]
    pub devices: Vec<BusAddress>,
    /// Emulated addresses whose probe faults
    #[serde(default)]
    pub inconclusive: Vec<BusAddress>,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            id: 0,
            sda: None,
            scl: None,
            freq_hz: default_freq_hz(),
            first: default_first(),
            last: default_last(),
            probe_delay_us: default_probe_delay_us(),
            devices: Vec::new(),
            inconclusive: Vec::new(),
        }
    }
}

fn default_freq_hz() -> u32 {
    cep_discovery::DEFAULT_BUS_FREQ_HZ
}

fn default_first() -> BusAddress {
    AddressRange::default().first()
}

fn default_last() -> BusAddress {
    AddressRange::default().last()
}

fn default_probe_delay_us() -> u64 {
    100
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GpioConfig {
    #[serde(default)]
    pub digital_out: Vec<u8>,
    #[serde(default)]
    pub digital_in: Vec<u8>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdcConfig {
    #[serde(default)]
    pub pins: Vec<u8>,
    pub resolution: Option<u8>,
    pub channels: Option<u8>,
}

/// Addressable LED strip wired to a data pin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeopixelConfig {
    pub pin: u8,
    #[serde(default = "default_max_leds")]
    pub max_leds: u16,
}

fn default_max_leds() -> u16 {
    cep_core::capability::DEFAULT_NEOPIXEL_LEDS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_network_kind")]
    pub kind: String,
    pub mac: Option<String>,
    pub ip: Option<String>,
    pub ssid: Option<String>,
    pub rssi_db: Option<i32>,
}

fn default_network_kind() -> String {
    "wifi".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_kind")]
    pub kind: String,
    pub label: Option<String>,
    pub total_kb: Option<u64>,
    pub free_kb: Option<u64>,
}

fn default_storage_kind() -> String {
    "flash".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChipsetsConfig {
    /// Register the built-in chipset plugins
    #[serde(default = "default_true")]
    pub builtin: bool,
    /// Extra TOML chipset catalogs, registered after the built-ins
    #[serde(default)]
    pub catalogs: Vec<PathBuf>,
    /// Registry capacity
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

impl Default for ChipsetsConfig {
    fn default() -> Self {
        Self {
            builtin: true,
            catalogs: Vec::new(),
            capacity: default_capacity(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_capacity() -> usize {
    cep_core::registry::DEFAULT_CAPACITY
}

/// ESP32 DevKit reference values
mod esp32 {
    pub const MODEL: &str = "esp32";
    pub const CPU_MHZ: u32 = 240;
    pub const SDA: u8 = 21;
    pub const SCL: u8 = 22;
    pub const DIGITAL_OUT: &[u8] = &[
        2, 4, 5, 12, 13, 14, 15, 16, 17, 18, 19, 21, 22, 23, 25, 26, 27, 32, 33,
    ];
    pub const DIGITAL_IN: &[u8] = &[32, 33, 34, 35, 36, 39];
    pub const ADC_PINS: &[u8] = &[32, 33, 34, 35, 36, 39];
    pub const ADC_RESOLUTION: u8 = 12;
}

impl Config {
    /// Fill settings left unset from the selected board profile
    pub fn apply_profile(mut self) -> Self {
        match self.profile {
            Some(Profile::Esp32) => {
                self.device.model.get_or_insert_with(|| esp32::MODEL.to_string());
                self.compute.mhz.get_or_insert(esp32::CPU_MHZ);

                if self.buses.is_empty() {
                    self.buses.push(BusConfig::default());
                }
                for bus in self.buses.iter_mut().filter(|b| b.id == 0) {
                    bus.sda.get_or_insert(esp32::SDA);
                    bus.scl.get_or_insert(esp32::SCL);
                }

                self.gpio.get_or_insert_with(|| GpioConfig {
                    digital_out: esp32::DIGITAL_OUT.to_vec(),
                    digital_in: esp32::DIGITAL_IN.to_vec(),
                });
                self.adc.get_or_insert_with(|| AdcConfig {
                    pins: esp32::ADC_PINS.to_vec(),
                    resolution: Some(esp32::ADC_RESOLUTION),
                    channels: Some(esp32::ADC_PINS.len() as u8),
                });
            }
            None => {}
        }
        self
    }

    /// Device identity; the ID falls back to the unique ID, then `fallback_id`
    pub fn identity(&self, fallback_id: Option<&str>) -> Result<DeviceIdentity> {
        let mut identity = match (&self.device.id, &self.device.unique_id) {
            (Some(id), _) => DeviceIdentity::new(id.clone()),
            (None, Some(uid)) => {
                let bytes = hex::decode(uid.trim_start_matches("0x"))
                    .with_context(|| format!("Invalid device unique_id {:?}", uid))?;
                DeviceIdentity::from_unique_id(&bytes)
            }
            (None, None) => match fallback_id {
                Some(id) => DeviceIdentity::new(id),
                None => DeviceIdentity::default(),
            },
        };

        if let Some(model) = &self.device.model {
            identity.model = model.clone();
        }
        if let Some(firmware) = &self.device.firmware {
            identity.firmware = firmware.clone();
        }
        identity.transport = self.device.transport.clone();
        Ok(identity)
    }

    /// Static platform facts
    pub fn to_platform(&self, identity: DeviceIdentity) -> StaticPlatform {
        StaticPlatform {
            identity,
            compute: ComputeCapability {
                mhz: self.compute.mhz,
                ram_kb: self.compute.ram_kb,
                flash_kb: self.compute.flash_kb,
            },
            gpio: self
                .gpio
                .as_ref()
                .map(|g| GpioCapability {
                    digital_out: g.digital_out.clone(),
                    digital_in: g.digital_in.clone(),
                })
                .unwrap_or_default(),
            adc: self.adc.as_ref().map(|a| AdcCapability {
                pins: a.pins.clone(),
                resolution: a.resolution,
                channels: a.channels,
            }),
            neopixel: self.neopixel.as_ref().map(|n| NeopixelCapability {
                pin: n.pin,
                max_leds: n.max_leds,
            }),
            storage: self
                .storage
                .iter()
                .map(|s| StorageCapability {
                    kind: s.kind.clone(),
                    label: s.label.clone(),
                    total_kb: s.total_kb,
                    free_kb: s.free_kb,
                })
                .collect(),
        }
    }

    /// Network interfaces declared in the profile
    pub fn network_interfaces(&self) -> Vec<NetworkInterface> {
        self.networks
            .iter()
            .map(|n| NetworkInterface {
                kind: n.kind.clone(),
                mac: n.mac.clone(),
                ip: n.ip.clone(),
                ssid: n.ssid.clone(),
                rssi_db: n.rssi_db,
            })
            .collect()
    }

    /// Bus specs paired with emulated buses, in declaration order
    pub fn buses(&self) -> Result<Vec<(BusSpec, SimulatedBus)>> {
        self.buses
            .iter()
            .map(|b| {
                let range = AddressRange::new(b.first.value(), b.last.value())
                    .with_context(|| format!("Invalid address range on bus {}", b.id))?;

                let spec = BusSpec {
                    id: b.id,
                    sda: b.sda,
                    scl: b.scl,
                    freq_hz: b.freq_hz,
                    range,
                    probe_delay: Duration::from_micros(b.probe_delay_us),
                };

                let mut bus = SimulatedBus::new();
                for &address in &b.devices {
                    bus.attach(address);
                }
                for &address in &b.inconclusive {
                    bus.fault(address);
                }
                Ok((spec, bus))
            })
            .collect()
    }

    /// Registry populated with built-ins and catalogs.
    ///
    /// Catalog paths are resolved relative to `base_dir`.
    pub fn registry(&self, base_dir: &Path) -> Result<DescriptorRegistry> {
        let mut registry = DescriptorRegistry::with_capacity(self.chipsets.capacity);

        if self.chipsets.builtin {
            cep_chipsets::register_builtin(&mut registry)
                .context("Failed to register built-in chipsets")?;
        }

        for catalog_path in &self.chipsets.catalogs {
            let path = base_dir.join(catalog_path);
            let catalog = DescriptorCatalog::from_file(&path)
                .with_context(|| format!("Failed to load chipset catalog {}", path.display()))?;
            catalog
                .register_into(&mut registry)
                .with_context(|| format!("Failed to register chipset catalog {}", path.display()))?;
        }

        info!(
            chipsets = registry.len(),
            capacity = registry.capacity(),
            "Chipset registry ready"
        );
        Ok(registry)
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<Config> {
    let config = if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        info!(path = %path.display(), "Loaded device profile");
        config
    } else {
        info!(
            path = %path.display(),
            "Device profile not found, using defaults"
        );
        Config::default()
    };

    Ok(config.apply_profile())
}
