//! CEP Discovery - Bus scanning and chipset matching
//!
//! This crate turns a device's buses into a capability document:
//! - Exhaustive address probing over a pluggable bus transport
//! - Matching of acknowledging addresses against registered chipset plugins
//! - One-shot orchestration of scan, resolve and document assembly

pub mod enumerator;
pub mod probe;
pub mod resolver;
pub mod scanner;

pub use enumerator::{BusSpec, Enumeration, Enumerator, DEFAULT_BUS_FREQ_HZ};
pub use probe::{BusProbe, ProbeError, SimulatedBus};
pub use resolver::CapabilityResolver;
pub use scanner::{BusScanner, ScanError, ScanResult, DEFAULT_PROBE_DELAY};
