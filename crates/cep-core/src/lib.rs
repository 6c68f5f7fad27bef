//! CEP Core - Core types for the Capability Enumeration Protocol
//!
//! This crate provides the data contracts of the enumeration engine:
//! - Bus addresses and probe ranges
//! - Peripheral descriptors (chipset plugins) and their fixed-capacity registry
//! - TOML catalogs of data-only descriptors
//! - Platform fact providers
//! - The capability document and its ordered assembly

pub mod address;
pub mod capability;
pub mod catalog;
pub mod descriptor;
pub mod document;
pub mod platform;
pub mod registry;

pub use address::{AddressError, AddressRange, BusAddress};
pub use capability::{
    AdcCapability, BusSummary, Capability, ComputeCapability, Fragment, GpioCapability,
    I2cCapability, NeopixelCapability, NetworkCapability, NetworkInterface, SensorFragment,
    StorageCapability,
};
pub use catalog::{CatalogEntry, CatalogError, DescriptorCatalog};
pub use descriptor::{BusKind, PeripheralDescriptor, RenderError, RenderFn};
pub use document::{CapabilityDocument, CapabilityTreeBuilder, DeviceRecord};
pub use platform::{
    DeviceIdentity, NetworkFactsProvider, PlatformFacts, PlatformFactsProvider, StaticNetwork,
    StaticPlatform,
};
pub use registry::{DescriptorRegistry, RegistryError};
