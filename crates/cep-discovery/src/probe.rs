//! Bus probe capability and an in-memory bus for emulation

use cep_core::BusAddress;
use std::collections::BTreeSet;
use thiserror::Error;

/// Transport anomaly during a single probe, distinct from "no device"
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("Probe at {address} inconclusive: {reason}")]
    Inconclusive { address: BusAddress, reason: String },
}

/// Minimal bus transaction: address a device and report whether it acknowledged
pub trait BusProbe {
    /// `Ok(true)` on acknowledgement, `Ok(false)` when nothing answered
    fn probe(&mut self, address: BusAddress) -> Result<bool, ProbeError>;
}

impl<P: BusProbe + ?Sized> BusProbe for &mut P {
    fn probe(&mut self, address: BusAddress) -> Result<bool, ProbeError> {
        (**self).probe(address)
    }
}

impl<P: BusProbe + ?Sized> BusProbe for Box<P> {
    fn probe(&mut self, address: BusAddress) -> Result<bool, ProbeError> {
        (**self).probe(address)
    }
}

/// A bus whose population is declared up front.
///
/// Used to emulate a board from a profile and to exercise the engine without
/// hardware. Records every probed address.
#[derive(Debug, Clone, Default)]
pub struct SimulatedBus {
    present: BTreeSet<BusAddress>,
    faulty: BTreeSet<BusAddress>,
    probed: Vec<BusAddress>,
}

impl SimulatedBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bus with devices acknowledging at `addresses`
    pub fn with_devices(addresses: impl IntoIterator<Item = u8>) -> Self {
        let mut bus = Self::new();
        for address in addresses {
            bus.attach(BusAddress(address));
        }
        bus
    }

    pub fn attach(&mut self, address: BusAddress) -> &mut Self {
        self.present.insert(address);
        self
    }

    /// Make probes at `address` fail with [`ProbeError::Inconclusive`]
    pub fn fault(&mut self, address: BusAddress) -> &mut Self {
        self.faulty.insert(address);
        self
    }

    /// Addresses probed so far, in probe order
    pub fn probed(&self) -> &[BusAddress] {
        &self.probed
    }
}

impl BusProbe for SimulatedBus {
    fn probe(&mut self, address: BusAddress) -> Result<bool, ProbeError> {
        self.probed.push(address);
        if self.faulty.contains(&address) {
            return Err(ProbeError::Inconclusive {
                address,
                reason: "arbitration lost".to_string(),
            });
        }
        Ok(self.present.contains(&address))
    }
}
