//! One-shot capability enumeration: scan every bus, resolve, build

use cep_core::{
    AddressRange, BusSummary, CapabilityDocument, CapabilityTreeBuilder, DescriptorRegistry,
    NetworkFactsProvider, PlatformFacts, PlatformFactsProvider,
};
use std::sync::atomic::AtomicBool;
use std::time::Duration;
use tracing::info;

use crate::probe::BusProbe;
use crate::resolver::CapabilityResolver;
use crate::scanner::{BusScanner, ScanError, ScanResult, DEFAULT_PROBE_DELAY};

/// Standard-mode bus clock
pub const DEFAULT_BUS_FREQ_HZ: u32 = 100_000;

/// Static description of one bus: identity, wiring and scan policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusSpec {
    pub id: u8,
    pub sda: Option<u8>,
    pub scl: Option<u8>,
    pub freq_hz: u32,
    pub range: AddressRange,
    pub probe_delay: Duration,
}

impl BusSpec {
    pub fn new(id: u8) -> Self {
        Self {
            id,
            sda: None,
            scl: None,
            freq_hz: DEFAULT_BUS_FREQ_HZ,
            range: AddressRange::default(),
            probe_delay: DEFAULT_PROBE_DELAY,
        }
    }

    pub fn with_pins(mut self, sda: u8, scl: u8) -> Self {
        self.sda = Some(sda);
        self.scl = Some(scl);
        self
    }

    pub fn with_range(mut self, range: AddressRange) -> Self {
        self.range = range;
        self
    }

    pub fn with_probe_delay(mut self, delay: Duration) -> Self {
        self.probe_delay = delay;
        self
    }

    fn summarize(&self, scan: &ScanResult) -> BusSummary {
        BusSummary {
            id: self.id,
            sda: self.sda,
            scl: self.scl,
            freq_hz: self.freq_hz,
            devices_found: scan.addresses.clone(),
        }
    }
}

struct AttachedBus {
    spec: BusSpec,
    probe: Box<dyn BusProbe>,
}

/// Outcome of an enumeration run
#[derive(Debug, Clone)]
pub struct Enumeration {
    pub document: CapabilityDocument,
    /// Raw scan results, one per bus, in attachment order
    pub scans: Vec<ScanResult>,
}

/// Drives scanner, resolver and builder for one device.
///
/// The registry is borrowed immutably for the whole run, so it cannot change
/// between scanning and resolving.
pub struct Enumerator<'r> {
    registry: &'r DescriptorRegistry,
    buses: Vec<AttachedBus>,
    platform: Option<Box<dyn PlatformFactsProvider>>,
    network: Option<Box<dyn NetworkFactsProvider>>,
}

impl<'r> Enumerator<'r> {
    pub fn new(registry: &'r DescriptorRegistry) -> Self {
        Self {
            registry,
            buses: Vec::new(),
            platform: None,
            network: None,
        }
    }

    /// Add a bus; buses are scanned in the order they are attached
    pub fn attach_bus(mut self, spec: BusSpec, probe: impl BusProbe + 'static) -> Self {
        self.buses.push(AttachedBus {
            spec,
            probe: Box::new(probe),
        });
        self
    }

    pub fn with_platform(mut self, platform: impl PlatformFactsProvider + 'static) -> Self {
        self.platform = Some(Box::new(platform));
        self
    }

    pub fn with_network(mut self, network: impl NetworkFactsProvider + 'static) -> Self {
        self.network = Some(Box::new(network));
        self
    }

    /// Run to completion
    pub fn run(&mut self) -> Enumeration {
        let never = AtomicBool::new(false);
        match self.run_until(&never) {
            Ok(enumeration) => enumeration,
            Err(_) => unreachable!("enumeration without a cancellation request"),
        }
    }

    /// Run, checking `cancel` between probes.
    ///
    /// A cancelled run produces no document.
    pub fn run_until(&mut self, cancel: &AtomicBool) -> Result<Enumeration, ScanError> {
        let mut scans = Vec::with_capacity(self.buses.len());
        let mut summaries = Vec::with_capacity(self.buses.len());

        for bus in &mut self.buses {
            let mut scanner =
                BusScanner::new(bus.spec.id, &mut bus.probe).with_delay(bus.spec.probe_delay);
            let scan = scanner.scan_until(bus.spec.range, cancel)?;
            summaries.push(bus.spec.summarize(&scan));
            scans.push(scan);
        }

        let fragments = CapabilityResolver::new(self.registry).resolve_all(&scans);
        let facts = PlatformFacts::gather(self.platform.as_deref(), self.network.as_deref());

        info!(
            buses = scans.len(),
            devices = scans.iter().map(ScanResult::len).sum::<usize>(),
            peripherals = fragments.len(),
            "Capability enumeration complete"
        );

        Ok(Enumeration {
            document: CapabilityTreeBuilder::build(&facts, &summaries, fragments),
            scans,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::SimulatedBus;
    use cep_core::{BusAddress, PeripheralDescriptor};
    use std::sync::atomic::Ordering;

    fn quiet(id: u8) -> BusSpec {
        BusSpec::new(id)
            .with_pins(21, 22)
            .with_probe_delay(Duration::ZERO)
    }

    #[test]
    fn test_bus_spec_defaults() {
        let spec = BusSpec::new(0);
        assert_eq!(spec.freq_hz, DEFAULT_BUS_FREQ_HZ);
        assert_eq!(spec.range, AddressRange::default());
        assert_eq!(spec.probe_delay, DEFAULT_PROBE_DELAY);
        assert!(spec.sda.is_none());
    }

    #[test]
    fn test_multi_bus_enumeration() {
        let mut registry = DescriptorRegistry::new();
        registry
            .register(
                PeripheralDescriptor::new("bme280")
                    .with_addresses([0x76, 0x77])
                    .with_provides(["temperature"]),
            )
            .unwrap();

        let enumeration = Enumerator::new(&registry)
            .attach_bus(quiet(0), SimulatedBus::with_devices([0x76]))
            .attach_bus(quiet(1), SimulatedBus::with_devices([0x10, 0x77]))
            .run();

        assert_eq!(enumeration.scans.len(), 2);
        let buses = enumeration.document.buses();
        assert_eq!(buses[0].devices_found, vec![BusAddress(0x76)]);
        assert_eq!(buses[1].devices_found, vec![BusAddress(0x10), BusAddress(0x77)]);

        let placed: Vec<_> = enumeration
            .document
            .peripherals()
            .map(|f| {
                let v = f.to_value();
                (v["bus_id"].as_u64().unwrap(), v["address"].as_str().unwrap().to_string())
            })
            .collect();
        assert_eq!(placed, vec![(0, "0x76".to_string()), (1, "0x77".to_string())]);
    }

    #[test]
    fn test_no_buses_omits_bus_summary() {
        let registry = DescriptorRegistry::new();
        let enumeration = Enumerator::new(&registry).run();
        assert_eq!(enumeration.document.kinds(), vec!["compute", "gpio"]);
    }

    #[test]
    fn test_cancelled_enumeration() {
        let registry = DescriptorRegistry::new();
        let cancel = AtomicBool::new(false);
        cancel.store(true, Ordering::Relaxed);

        let result = Enumerator::new(&registry)
            .attach_bus(quiet(0), SimulatedBus::with_devices([0x10]))
            .run_until(&cancel);
        assert!(matches!(result, Err(ScanError::Cancelled { bus_id: 0, .. })));
    }
}
