//! Peripheral descriptors (chipset plugins)
//!
//! A descriptor is plain data plus an optional render hook. It names the bus
//! addresses a peripheral kind answers on and the capabilities it provides;
//! the hook, when present, replaces the generic sensor rendering.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::address::BusAddress;
use crate::capability::Fragment;

/// Failure raised by a chipset render hook
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("render hook failed: {0}")]
    Failed(String),
    #[error("render hook returned a {0}, expected an object")]
    NotAnObject(&'static str),
    #[error("render hook panicked: {0}")]
    Panicked(String),
}

/// Which bus transport a descriptor applies to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BusKind {
    #[default]
    I2c,
    Spi,
}

impl BusKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::I2c => "i2c",
            Self::Spi => "spi",
        }
    }
}

impl fmt::Display for BusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Custom rendering hook: `(bus_id, address) -> fragment`.
///
/// Must be a pure function of its inputs. `Ok(None)` or an empty fragment
/// selects the generic rendering.
pub type RenderFn = dyn Fn(u8, BusAddress) -> Result<Option<Fragment>, RenderError> + Send + Sync;

/// Describes one recognizable peripheral kind
#[derive(Clone)]
pub struct PeripheralDescriptor {
    name: String,
    addresses: Vec<BusAddress>,
    provides: Vec<String>,
    bus: BusKind,
    render: Option<Arc<RenderFn>>,
}

impl PeripheralDescriptor {
    /// Create an I2C descriptor with no addresses and no capabilities
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            addresses: Vec::new(),
            provides: Vec::new(),
            bus: BusKind::I2c,
            render: None,
        }
    }

    pub fn with_bus(mut self, bus: BusKind) -> Self {
        self.bus = bus;
        self
    }

    pub fn with_addresses(mut self, addresses: impl IntoIterator<Item = u8>) -> Self {
        self.addresses = addresses.into_iter().map(BusAddress).collect();
        self
    }

    pub fn with_provides<I>(mut self, provides: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.provides = provides.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_render<F>(mut self, render: F) -> Self
    where
        F: Fn(u8, BusAddress) -> Result<Option<Fragment>, RenderError> + Send + Sync + 'static,
    {
        self.render = Some(Arc::new(render));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Addresses in declaration order
    pub fn addresses(&self) -> &[BusAddress] {
        &self.addresses
    }

    /// Capability tags in declaration order
    pub fn provides(&self) -> &[String] {
        &self.provides
    }

    pub fn bus(&self) -> BusKind {
        self.bus
    }

    pub fn render_hook(&self) -> Option<&RenderFn> {
        self.render.as_deref()
    }

    pub fn has_render_hook(&self) -> bool {
        self.render.is_some()
    }

    /// Number of times this descriptor claims `address`
    pub fn claims(&self, address: BusAddress) -> usize {
        self.addresses.iter().filter(|&&a| a == address).count()
    }
}

impl fmt::Debug for PeripheralDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeripheralDescriptor")
            .field("name", &self.name)
            .field("addresses", &self.addresses)
            .field("provides", &self.provides)
            .field("bus", &self.bus)
            .field("render", &self.render.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_descriptor_builder() {
        let bme280 = PeripheralDescriptor::new("bme280")
            .with_addresses([0x76, 0x77])
            .with_provides(["temperature", "humidity", "pressure"]);

        assert_eq!(bme280.name(), "bme280");
        assert_eq!(bme280.bus(), BusKind::I2c);
        assert_eq!(bme280.addresses(), &[BusAddress(0x76), BusAddress(0x77)]);
        assert_eq!(bme280.provides(), &["temperature", "humidity", "pressure"]);
        assert!(!bme280.has_render_hook());
        assert_eq!(bme280.claims(BusAddress(0x76)), 1);
        assert_eq!(bme280.claims(BusAddress(0x68)), 0);
    }

    #[test]
    fn test_render_hook_invocation() {
        let display = PeripheralDescriptor::new("ssd1306")
            .with_addresses([0x3c])
            .with_render(|bus_id, address| {
                Fragment::from_json(json!({
                    "type": "display",
                    "bus_id": bus_id,
                    "address": address.to_string(),
                }))
                .map(Some)
            });

        let hook = display.render_hook().unwrap();
        let fragment = hook(1, BusAddress(0x3c)).unwrap().unwrap();
        assert_eq!(fragment.kind(), Some("display"));
        assert_eq!(
            fragment.to_value(),
            json!({"type": "display", "bus_id": 1, "address": "0x3c"})
        );
    }

    #[test]
    fn test_bus_kind_names() {
        assert_eq!(BusKind::I2c.to_string(), "i2c");
        assert_eq!(serde_json::to_string(&BusKind::Spi).unwrap(), "\"spi\"");
    }
}
