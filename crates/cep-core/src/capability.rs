//! Capability entries that make up a capability document
//!
//! Every entry serializes as a flat object whose first key is `type`. Optional
//! facts are skipped rather than written as `null`, so a constrained platform
//! produces a sparse document.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::address::BusAddress;
use crate::descriptor::{BusKind, RenderError};

/// Type tag of a generically rendered peripheral
pub const SENSOR_TYPE: &str = "sensor";

/// Generic rendering of a matched peripheral
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SensorFragment {
    #[serde(rename = "type")]
    pub kind: String,
    pub chipset: String,
    pub bus: BusKind,
    pub bus_id: u8,
    pub address: BusAddress,
    pub provides: Vec<String>,
}

impl SensorFragment {
    pub fn new(
        chipset: impl Into<String>,
        bus: BusKind,
        bus_id: u8,
        address: BusAddress,
        provides: Vec<String>,
    ) -> Self {
        Self {
            kind: SENSOR_TYPE.to_string(),
            chipset: chipset.into(),
            bus,
            bus_id,
            address,
            provides,
        }
    }
}

/// One peripheral entry produced by the resolver
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Fragment {
    /// Synthesized from a descriptor's name, bus and `provides` list
    Sensor(SensorFragment),
    /// Emitted verbatim by a chipset's render hook
    Custom(Map<String, Value>),
}

impl Fragment {
    /// Wrap a JSON object produced by a render hook
    pub fn from_json(value: Value) -> Result<Self, RenderError> {
        match value {
            Value::Object(map) => Ok(Self::Custom(map)),
            other => Err(RenderError::NotAnObject(json_kind(&other))),
        }
    }

    /// A custom fragment without any keys carries no information
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Custom(map) if map.is_empty())
    }

    /// The `type` tag, e.g. "sensor" or "display"
    pub fn kind(&self) -> Option<&str> {
        match self {
            Self::Sensor(sensor) => Some(&sensor.kind),
            Self::Custom(map) => map.get("type").and_then(Value::as_str),
        }
    }

    /// The chipset name, when the fragment reports one
    pub fn chipset(&self) -> Option<&str> {
        match self {
            Self::Sensor(sensor) => Some(&sensor.chipset),
            Self::Custom(map) => map.get("chipset").and_then(Value::as_str),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Self::Sensor(sensor) => serde_json::to_value(sensor).unwrap_or(Value::Null),
            Self::Custom(map) => Value::Object(map.clone()),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Processor and memory facts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ComputeCapability {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mhz: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ram_kb: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flash_kb: Option<u32>,
}

/// Summary of one scanned bus
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BusSummary {
    pub id: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sda: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scl: Option<u8>,
    pub freq_hz: u32,
    /// Every acknowledging address, whether or not a chipset claimed it
    pub devices_found: Vec<BusAddress>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct I2cCapability {
    pub buses: Vec<BusSummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GpioCapability {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub digital_out: Vec<u8>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub digital_in: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AdcCapability {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pins: Vec<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channels: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkInterface {
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mac: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rssi_db: Option<i32>,
}

impl NetworkInterface {
    pub fn new(kind: impl Into<String>, mac: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            mac: Some(mac.into()),
            ip: None,
            ssid: None,
            rssi_db: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NetworkCapability {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<NetworkInterface>,
}

/// Default LED count reported for an addressable LED strip
pub const DEFAULT_NEOPIXEL_LEDS: u16 = 64;

/// An addressable (WS2812 / NeoPixel) LED strip on a data pin
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NeopixelCapability {
    pub pin: u8,
    pub max_leds: u16,
}

impl NeopixelCapability {
    pub fn new(pin: u8) -> Self {
        Self {
            pin,
            max_leds: DEFAULT_NEOPIXEL_LEDS,
        }
    }
}

/// A flash or removable storage volume
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageCapability {
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_kb: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub free_kb: Option<u64>,
}

/// A top-level entry of the `capabilities` array
#[derive(Debug, Clone, PartialEq)]
pub enum Capability {
    Compute(ComputeCapability),
    I2c(I2cCapability),
    Peripheral(Fragment),
    Gpio(GpioCapability),
    Adc(AdcCapability),
    Network(NetworkCapability),
    Neopixel(NeopixelCapability),
    Storage(StorageCapability),
}

impl Capability {
    /// The serialized `type` tag
    pub fn kind(&self) -> &str {
        match self {
            Self::Compute(_) => "compute",
            Self::I2c(_) => "i2c",
            Self::Peripheral(fragment) => fragment.kind().unwrap_or(SENSOR_TYPE),
            Self::Gpio(_) => "gpio",
            Self::Adc(_) => "adc",
            Self::Network(_) => "network",
            Self::Neopixel(_) => "neopixel",
            Self::Storage(_) => "storage",
        }
    }
}

#[derive(Serialize)]
struct Tagged<'a, T> {
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(flatten)]
    body: &'a T,
}

impl Serialize for Capability {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Compute(body) => Tagged { kind: "compute", body }.serialize(serializer),
            Self::I2c(body) => Tagged { kind: "i2c", body }.serialize(serializer),
            Self::Peripheral(fragment) => fragment.serialize(serializer),
            Self::Gpio(body) => Tagged { kind: "gpio", body }.serialize(serializer),
            Self::Adc(body) => Tagged { kind: "adc", body }.serialize(serializer),
            Self::Network(body) => Tagged { kind: "network", body }.serialize(serializer),
            Self::Neopixel(body) => Tagged { kind: "neopixel", body }.serialize(serializer),
            Self::Storage(body) => Tagged { kind: "storage", body }.serialize(serializer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sensor_fragment_serialization() {
        let fragment = Fragment::Sensor(SensorFragment::new(
            "bme280",
            BusKind::I2c,
            0,
            BusAddress(0x76),
            vec!["temperature".into(), "humidity".into()],
        ));

        let json = serde_json::to_string(&fragment).unwrap();
        assert_eq!(
            json,
            r#"{"type":"sensor","chipset":"bme280","bus":"i2c","bus_id":0,"address":"0x76","provides":["temperature","humidity"]}"#
        );
    }

    #[test]
    fn test_custom_fragment_keeps_key_order() {
        let fragment = Fragment::from_json(json!({
            "type": "display",
            "width_px": 128,
            "chipset": "ssd1306",
        }))
        .unwrap();

        assert_eq!(fragment.kind(), Some("display"));
        assert_eq!(fragment.chipset(), Some("ssd1306"));
        assert_eq!(
            serde_json::to_string(&fragment).unwrap(),
            r#"{"type":"display","width_px":128,"chipset":"ssd1306"}"#
        );
    }

    #[test]
    fn test_fragment_rejects_non_objects() {
        assert!(matches!(
            Fragment::from_json(json!([1, 2])),
            Err(RenderError::NotAnObject("array"))
        ));
        assert!(Fragment::from_json(json!({})).unwrap().is_empty());
    }

    #[test]
    fn test_capability_omits_missing_facts() {
        let compute = Capability::Compute(ComputeCapability {
            mhz: Some(240),
            ..Default::default()
        });
        assert_eq!(
            serde_json::to_string(&compute).unwrap(),
            r#"{"type":"compute","mhz":240}"#
        );

        let gpio = Capability::Gpio(GpioCapability::default());
        assert_eq!(serde_json::to_string(&gpio).unwrap(), r#"{"type":"gpio"}"#);
    }

    #[test]
    fn test_bus_summary_serialization() {
        let i2c = Capability::I2c(I2cCapability {
            buses: vec![BusSummary {
                id: 0,
                sda: Some(21),
                scl: Some(22),
                freq_hz: 100_000,
                devices_found: vec![BusAddress(0x10), BusAddress(0x76)],
            }],
        });

        assert_eq!(
            serde_json::to_value(&i2c).unwrap(),
            json!({
                "type": "i2c",
                "buses": [{
                    "id": 0,
                    "sda": 21,
                    "scl": 22,
                    "freq_hz": 100000,
                    "devices_found": ["0x10", "0x76"],
                }]
            })
        );
    }

    #[test]
    fn test_neopixel_serialization() {
        let neopixel = Capability::Neopixel(NeopixelCapability::new(5));
        assert_eq!(neopixel.kind(), "neopixel");
        assert_eq!(
            serde_json::to_string(&neopixel).unwrap(),
            r#"{"type":"neopixel","pin":5,"max_leds":64}"#
        );
    }
}
