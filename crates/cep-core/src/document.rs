//! Capability document and its assembly
//!
//! The document is a snapshot: it is fully determined by the platform facts,
//! the bus summaries and the resolved peripheral fragments passed to
//! [`CapabilityTreeBuilder::build`].

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::capability::{
    BusSummary, Capability, Fragment, I2cCapability, NetworkCapability,
};
use crate::platform::PlatformFacts;

/// Device class reported by every CEP client
pub const DEVICE_CLASS: &str = "microcontroller";

/// The `device` object
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceRecord {
    pub id: String,
    pub class: String,
    pub transport: String,
    pub model: String,
    pub firmware: String,
    #[serde(
        rename = "reportedAt",
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_timestamp"
    )]
    pub reported_at: Option<DateTime<Utc>>,
}

fn serialize_timestamp<S: Serializer>(
    timestamp: &Option<DateTime<Utc>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match timestamp {
        Some(ts) => serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Secs, true)),
        None => serializer.serialize_none(),
    }
}

/// A device's identity plus its ordered capabilities
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapabilityDocument {
    pub device: DeviceRecord,
    pub capabilities: Vec<Capability>,
}

impl CapabilityDocument {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Capability `type` tags in document order
    pub fn kinds(&self) -> Vec<&str> {
        self.capabilities.iter().map(Capability::kind).collect()
    }

    /// Resolved peripheral fragments in document order
    pub fn peripherals(&self) -> impl Iterator<Item = &Fragment> + '_ {
        self.capabilities.iter().filter_map(|capability| match capability {
            Capability::Peripheral(fragment) => Some(fragment),
            _ => None,
        })
    }

    /// Bus summaries from the `i2c` entry
    pub fn buses(&self) -> &[BusSummary] {
        self.capabilities
            .iter()
            .find_map(|capability| match capability {
                Capability::I2c(i2c) => Some(i2c.buses.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }
}

/// Assembles capability documents; performs no I/O.
///
/// Entries always appear in this order:
/// 1. `compute`
/// 2. `i2c` bus summary (when at least one bus was scanned)
/// 3. peripheral fragments (when any matched)
/// 4. `gpio`
/// 5. `adc` (when the platform reports one)
/// 6. `network` (when at least one interface is reported)
/// 7. `neopixel` (when the platform reports an LED strip)
/// 8. `storage`, one per reported volume
#[derive(Debug, Clone, Copy, Default)]
pub struct CapabilityTreeBuilder;

impl CapabilityTreeBuilder {
    pub fn build(
        facts: &PlatformFacts,
        buses: &[BusSummary],
        fragments: Vec<Fragment>,
    ) -> CapabilityDocument {
        let mut capabilities = Vec::with_capacity(7 + fragments.len() + facts.storage.len());

        capabilities.push(Capability::Compute(facts.compute.clone()));

        if !buses.is_empty() {
            capabilities.push(Capability::I2c(I2cCapability {
                buses: buses.to_vec(),
            }));
        }

        capabilities.extend(fragments.into_iter().map(Capability::Peripheral));

        capabilities.push(Capability::Gpio(facts.gpio.clone()));

        if let Some(adc) = &facts.adc {
            capabilities.push(Capability::Adc(adc.clone()));
        }

        if !facts.network.is_empty() {
            capabilities.push(Capability::Network(NetworkCapability {
                interfaces: facts.network.clone(),
            }));
        }

        if let Some(neopixel) = &facts.neopixel {
            capabilities.push(Capability::Neopixel(neopixel.clone()));
        }

        capabilities.extend(facts.storage.iter().cloned().map(Capability::Storage));

        let identity = &facts.identity;
        CapabilityDocument {
            device: DeviceRecord {
                id: identity.id.clone(),
                class: DEVICE_CLASS.to_string(),
                transport: facts.transport().to_string(),
                model: identity.model.clone(),
                firmware: identity.firmware.clone(),
                reported_at: identity.reported_at,
            },
            capabilities,
        }
    }
}
