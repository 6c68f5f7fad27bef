//! Fixed-capacity registry of peripheral descriptors
//!
//! Registration order is significant: when several descriptors claim the same
//! address, lookups yield them in the order they were registered.

use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::address::BusAddress;
use crate::descriptor::{BusKind, PeripheralDescriptor};

/// Default number of descriptors a registry accepts
pub const DEFAULT_CAPACITY: usize = 16;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Descriptor registry is full ({capacity} entries), cannot register {name}")]
    Full { capacity: usize, name: String },
}

/// Append-only, bounded collection of descriptors
#[derive(Debug, Clone)]
pub struct DescriptorRegistry {
    descriptors: Vec<Arc<PeripheralDescriptor>>,
    capacity: usize,
}

impl DescriptorRegistry {
    /// Create an empty registry with the default capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create an empty registry that holds at most `capacity` descriptors
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            descriptors: Vec::new(),
            capacity,
        }
    }

    /// Append a descriptor.
    ///
    /// Fails once the registry holds `capacity` descriptors; earlier
    /// registrations are left untouched.
    pub fn register(
        &mut self,
        descriptor: impl Into<Arc<PeripheralDescriptor>>,
    ) -> Result<(), RegistryError> {
        let descriptor = descriptor.into();

        if self.descriptors.len() >= self.capacity {
            warn!(
                chipset = descriptor.name(),
                capacity = self.capacity,
                "Descriptor registry full"
            );
            return Err(RegistryError::Full {
                capacity: self.capacity,
                name: descriptor.name().to_string(),
            });
        }

        debug!(
            chipset = descriptor.name(),
            bus = %descriptor.bus(),
            addresses = descriptor.addresses().len(),
            "Registered chipset descriptor"
        );
        self.descriptors.push(descriptor);
        Ok(())
    }

    /// Descriptors claiming `address` on any bus.
    ///
    /// Iterates descriptors in registration order and, within a descriptor,
    /// its addresses in declaration order; a descriptor listing an address
    /// twice is yielded twice.
    pub fn find_by_address(
        &self,
        address: BusAddress,
    ) -> impl Iterator<Item = &PeripheralDescriptor> + '_ {
        self.descriptors.iter().flat_map(move |descriptor| {
            descriptor
                .addresses()
                .iter()
                .filter(move |&&candidate| candidate == address)
                .map(move |_| &**descriptor)
        })
    }

    /// Descriptors claiming `address` on a bus of the given kind
    pub fn find_on_bus(
        &self,
        bus: BusKind,
        address: BusAddress,
    ) -> impl Iterator<Item = &PeripheralDescriptor> + '_ {
        self.find_by_address(address)
            .filter(move |descriptor| descriptor.bus() == bus)
    }

    /// All descriptors in registration order
    pub fn iter(&self) -> impl Iterator<Item = &PeripheralDescriptor> + '_ {
        self.descriptors.iter().map(Arc::as_ref)
    }

    pub fn get(&self, name: &str) -> Option<&PeripheralDescriptor> {
        self.iter().find(|descriptor| descriptor.name() == name)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn remaining(&self) -> usize {
        self.capacity - self.descriptors.len()
    }
}

impl Default for DescriptorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
