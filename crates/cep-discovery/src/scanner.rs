//! Exhaustive address scan of one addressable bus

use cep_core::{AddressRange, BusAddress};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, trace, warn};

use crate::probe::BusProbe;

/// Pause between probes, respecting bus and device timing
pub const DEFAULT_PROBE_DELAY: Duration = Duration::from_micros(100);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    #[error("Scan of bus {bus_id} cancelled before probing {address}")]
    Cancelled { bus_id: u8, address: BusAddress },
}

/// Addresses that acknowledged, ascending, without duplicates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanResult {
    pub bus_id: u8,
    pub addresses: Vec<BusAddress>,
}

impl ScanResult {
    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }
}

/// Probes every address of a range, once each, in ascending order.
///
/// The scanner only records who answered; recognizing what answered is the
/// resolver's job.
pub struct BusScanner<P> {
    probe: P,
    bus_id: u8,
    delay: Duration,
}

impl<P: BusProbe> BusScanner<P> {
    pub fn new(bus_id: u8, probe: P) -> Self {
        Self {
            probe,
            bus_id,
            delay: DEFAULT_PROBE_DELAY,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn bus_id(&self) -> u8 {
        self.bus_id
    }

    /// Give back the probe, e.g. to inspect an emulated bus
    pub fn into_inner(self) -> P {
        self.probe
    }

    /// Probe every address in `range`
    pub fn scan(&mut self, range: AddressRange) -> ScanResult {
        let never = AtomicBool::new(false);
        match self.scan_until(range, &never) {
            Ok(result) => result,
            Err(_) => unreachable!("scan without a cancellation request"),
        }
    }

    /// Probe every address in `range`, checking `cancel` before each probe.
    ///
    /// A scan that runs to completion returns exactly what [`scan`] would.
    ///
    /// [`scan`]: BusScanner::scan
    pub fn scan_until(
        &mut self,
        range: AddressRange,
        cancel: &AtomicBool,
    ) -> Result<ScanResult, ScanError> {
        debug!(bus_id = self.bus_id, range = %range, "Starting bus scan");

        let mut addresses = Vec::new();
        let mut inconclusive = 0usize;

        for (index, address) in range.iter().enumerate() {
            if cancel.load(Ordering::Relaxed) {
                info!(bus_id = self.bus_id, address = %address, "Bus scan cancelled");
                return Err(ScanError::Cancelled {
                    bus_id: self.bus_id,
                    address,
                });
            }

            if index > 0 && !self.delay.is_zero() {
                thread::sleep(self.delay);
            }

            match self.probe.probe(address) {
                Ok(true) => {
                    trace!(bus_id = self.bus_id, address = %address, "ACK");
                    addresses.push(address);
                }
                Ok(false) => {}
                Err(e) => {
                    // Counts as "nothing answered" for the document
                    inconclusive += 1;
                    warn!(bus_id = self.bus_id, error = %e, "Probe inconclusive");
                }
            }
        }

        info!(
            bus_id = self.bus_id,
            probed = range.len(),
            found = addresses.len(),
            inconclusive,
            "Bus scan complete"
        );

        Ok(ScanResult {
            bus_id: self.bus_id,
            addresses,
        })
    }
}
