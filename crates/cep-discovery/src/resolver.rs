//! Chipset matching: turns scanned addresses into peripheral fragments

use cep_core::{
    BusAddress, BusKind, DescriptorRegistry, Fragment, PeripheralDescriptor, RenderError,
    SensorFragment,
};
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, warn};

use crate::scanner::ScanResult;

/// Matches scan results against a registry.
///
/// Output order is by address (scan order), then by registry match order.
/// Every matching descriptor yields a fragment, so two chipsets sharing a
/// default address both appear.
#[derive(Debug, Clone, Copy)]
pub struct CapabilityResolver<'r> {
    registry: &'r DescriptorRegistry,
    bus: BusKind,
}

impl<'r> CapabilityResolver<'r> {
    pub fn new(registry: &'r DescriptorRegistry) -> Self {
        Self {
            registry,
            bus: BusKind::I2c,
        }
    }

    /// Resolve one bus scan
    pub fn resolve(&self, scan: &ScanResult) -> Vec<Fragment> {
        let mut fragments = Vec::new();

        for &address in &scan.addresses {
            let before = fragments.len();

            for descriptor in self.registry.find_on_bus(self.bus, address) {
                debug!(
                    bus_id = scan.bus_id,
                    address = %address,
                    chipset = descriptor.name(),
                    "Chipset matched"
                );
                fragments.push(render(descriptor, scan.bus_id, address));
            }

            if fragments.len() == before {
                debug!(bus_id = scan.bus_id, address = %address, "No chipset claims address");
            }
        }

        fragments
    }

    /// Resolve several bus scans, keeping their order
    pub fn resolve_all<'s>(&self, scans: impl IntoIterator<Item = &'s ScanResult>) -> Vec<Fragment> {
        scans
            .into_iter()
            .flat_map(|scan| self.resolve(scan))
            .collect()
    }
}

/// Render one match, falling back to the generic form when the hook is
/// absent, declines, returns nothing useful, fails, or panics
pub fn render(descriptor: &PeripheralDescriptor, bus_id: u8, address: BusAddress) -> Fragment {
    if let Some(hook) = descriptor.render_hook() {
        match invoke_hook(hook, bus_id, address) {
            Ok(Some(fragment)) if !fragment.is_empty() => return fragment,
            Ok(_) => {}
            Err(e) => {
                warn!(
                    chipset = descriptor.name(),
                    bus_id,
                    address = %address,
                    error = %e,
                    "Chipset render failed, using generic description"
                );
            }
        }
    }

    generic_fragment(descriptor, bus_id, address)
}

fn invoke_hook(
    hook: &cep_core::RenderFn,
    bus_id: u8,
    address: BusAddress,
) -> Result<Option<Fragment>, RenderError> {
    match panic::catch_unwind(AssertUnwindSafe(|| hook(bus_id, address))) {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(RenderError::Panicked(message))
        }
    }
}

/// The generic sensor rendering of a descriptor
pub fn generic_fragment(
    descriptor: &PeripheralDescriptor,
    bus_id: u8,
    address: BusAddress,
) -> Fragment {
    Fragment::Sensor(SensorFragment::new(
        descriptor.name(),
        descriptor.bus(),
        bus_id,
        address,
        descriptor.provides().to_vec(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bme280() -> PeripheralDescriptor {
        PeripheralDescriptor::new("bme280")
            .with_addresses([0x76, 0x77])
            .with_provides(["temperature", "humidity", "pressure"])
    }

    fn scan(addresses: &[u8]) -> ScanResult {
        ScanResult {
            bus_id: 0,
            addresses: addresses.iter().copied().map(BusAddress).collect(),
        }
    }

    #[test]
    fn test_generic_rendering() {
        let mut registry = DescriptorRegistry::new();
        registry.register(bme280()).unwrap();

        let fragments = CapabilityResolver::new(&registry).resolve(&scan(&[0x76]));
        assert_eq!(fragments.len(), 1);
        assert_eq!(
            fragments[0].to_value(),
            json!({
                "type": "sensor",
                "chipset": "bme280",
                "bus": "i2c",
                "bus_id": 0,
                "address": "0x76",
                "provides": ["temperature", "humidity", "pressure"],
            })
        );
    }

    #[test]
    fn test_unclaimed_address_skipped() {
        let mut registry = DescriptorRegistry::new();
        registry.register(bme280()).unwrap();

        let fragments = CapabilityResolver::new(&registry).resolve(&scan(&[0x10, 0x76]));
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].chipset(), Some("bme280"));
    }

    #[test]
    fn test_shared_address_yields_every_match() {
        let mut registry = DescriptorRegistry::new();
        registry.register(bme280()).unwrap();
        registry
            .register(PeripheralDescriptor::new("bmp280").with_addresses([0x76]))
            .unwrap();

        let fragments = CapabilityResolver::new(&registry).resolve(&scan(&[0x76]));
        let chipsets: Vec<_> = fragments.iter().filter_map(Fragment::chipset).collect();
        assert_eq!(chipsets, vec!["bme280", "bmp280"]);
    }

    #[test]
    fn test_order_is_address_then_registration() {
        let mut registry = DescriptorRegistry::new();
        registry
            .register(PeripheralDescriptor::new("late").with_addresses([0x20, 0x68]))
            .unwrap();
        registry
            .register(PeripheralDescriptor::new("early").with_addresses([0x10, 0x68]))
            .unwrap();

        let fragments = CapabilityResolver::new(&registry).resolve(&scan(&[0x10, 0x20, 0x68]));
        let rendered: Vec<_> = fragments
            .iter()
            .map(|f| (f.chipset().unwrap(), f.to_value()["address"].clone()))
            .collect();
        assert_eq!(
            rendered,
            vec![
                ("early", json!("0x10")),
                ("late", json!("0x20")),
                ("late", json!("0x68")),
                ("early", json!("0x68")),
            ]
        );
    }

    #[test]
    fn test_custom_render_used_verbatim() {
        let display = PeripheralDescriptor::new("ssd1306")
            .with_addresses([0x3c])
            .with_provides(["display"])
            .with_render(|bus_id, address| {
                Fragment::from_json(json!({
                    "type": "display",
                    "chipset": "ssd1306",
                    "bus_id": bus_id,
                    "address": address.to_string(),
                    "width_px": 128,
                    "height_px": 64,
                }))
                .map(Some)
            });
        let expected = display.render_hook().unwrap()(0, BusAddress(0x3c)).unwrap().unwrap();

        let mut registry = DescriptorRegistry::new();
        registry.register(display).unwrap();

        let fragments = CapabilityResolver::new(&registry).resolve(&scan(&[0x3c]));
        assert_eq!(fragments, vec![expected.clone()]);
        assert_eq!(
            serde_json::to_string(&fragments[0]).unwrap(),
            serde_json::to_string(&expected).unwrap()
        );
    }

    #[test]
    fn test_empty_render_falls_back() {
        let mut registry = DescriptorRegistry::new();
        registry
            .register(
                PeripheralDescriptor::new("declines")
                    .with_addresses([0x40])
                    .with_provides(["voltage"])
                    .with_render(|_, _| Ok(None)),
            )
            .unwrap();
        registry
            .register(
                PeripheralDescriptor::new("blank")
                    .with_addresses([0x40])
                    .with_render(|_, _| Fragment::from_json(json!({})).map(Some)),
            )
            .unwrap();

        let fragments = CapabilityResolver::new(&registry).resolve(&scan(&[0x40]));
        assert_eq!(fragments.len(), 2);
        assert!(fragments.iter().all(|f| f.kind() == Some("sensor")));
        assert_eq!(fragments[0].to_value()["provides"], json!(["voltage"]));
    }

    #[test]
    fn test_failing_render_is_contained() {
        let mut registry = DescriptorRegistry::new();
        registry
            .register(
                PeripheralDescriptor::new("erroring")
                    .with_addresses([0x48])
                    .with_render(|_, _| Err(RenderError::Failed("bad register".into()))),
            )
            .unwrap();
        registry
            .register(
                PeripheralDescriptor::new("panicking")
                    .with_addresses([0x48])
                    .with_render(|_, _| panic!("plugin bug")),
            )
            .unwrap();
        registry
            .register(PeripheralDescriptor::new("healthy").with_addresses([0x48]))
            .unwrap();

        let fragments = CapabilityResolver::new(&registry).resolve(&scan(&[0x48]));
        let chipsets: Vec<_> = fragments.iter().filter_map(Fragment::chipset).collect();
        assert_eq!(chipsets, vec!["erroring", "panicking", "healthy"]);
        assert!(fragments.iter().all(|f| matches!(f, Fragment::Sensor(_))));
    }

    #[test]
    fn test_panic_message_captured() {
        let descriptor = PeripheralDescriptor::new("panicking")
            .with_addresses([0x48])
            .with_render(|_, _| panic!("plugin bug"));

        let err = invoke_hook(descriptor.render_hook().unwrap(), 0, BusAddress(0x48)).unwrap_err();
        assert_eq!(err, RenderError::Panicked("plugin bug".to_string()));
    }

    #[test]
    fn test_other_bus_kinds_ignored() {
        let mut registry = DescriptorRegistry::new();
        registry
            .register(
                PeripheralDescriptor::new("spi-only")
                    .with_bus(BusKind::Spi)
                    .with_addresses([0x50]),
            )
            .unwrap();

        assert!(CapabilityResolver::new(&registry)
            .resolve(&scan(&[0x50]))
            .is_empty());
    }

    #[test]
    fn test_resolve_all_keeps_bus_order() {
        let mut registry = DescriptorRegistry::new();
        registry.register(bme280()).unwrap();

        let scans = [
            ScanResult {
                bus_id: 1,
                addresses: vec![BusAddress(0x77)],
            },
            scan(&[0x76]),
        ];
        let fragments = CapabilityResolver::new(&registry).resolve_all(&scans);
        let bus_ids: Vec<_> = fragments.iter().map(|f| f.to_value()["bus_id"].clone()).collect();
        assert_eq!(bus_ids, vec![json!(1), json!(0)]);
    }
}
