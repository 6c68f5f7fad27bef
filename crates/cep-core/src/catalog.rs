//! TOML catalogs of data-only chipset descriptors
//!
//! Lets new peripherals be recognized without code: each `[[chipset]]` entry
//! becomes a descriptor with generic rendering.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::info;

use crate::address::BusAddress;
use crate::descriptor::{BusKind, PeripheralDescriptor};
use crate::registry::{DescriptorRegistry, RegistryError};

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read chipset catalog: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse chipset catalog: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to serialize chipset catalog: {0}")]
    SerializeError(#[from] toml::ser::Error),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// A single chipset entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Chipset name (e.g., "sht31")
    pub name: String,
    /// Addresses the chipset answers on, as `0x44` or `"0x44"`
    pub addresses: Vec<BusAddress>,
    /// Capability tags
    #[serde(default)]
    pub provides: Vec<String>,
    #[serde(default)]
    pub bus: BusKind,
}

impl CatalogEntry {
    pub fn to_descriptor(&self) -> PeripheralDescriptor {
        PeripheralDescriptor::new(&self.name)
            .with_bus(self.bus)
            .with_addresses(self.addresses.iter().map(|a| a.value()))
            .with_provides(self.provides.iter().cloned())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptorCatalog {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub chipset: Vec<CatalogEntry>,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl Default for DescriptorCatalog {
    fn default() -> Self {
        Self {
            version: default_version(),
            chipset: Vec::new(),
        }
    }
}

impl DescriptorCatalog {
    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        let catalog = Self::from_toml(&content)?;
        info!(
            path = %path.display(),
            chipsets = catalog.chipset.len(),
            "Loaded chipset catalog"
        );
        Ok(catalog)
    }

    pub fn from_toml(content: &str) -> Result<Self, CatalogError> {
        let catalog: DescriptorCatalog = toml::from_str(content)?;
        Ok(catalog)
    }

    pub fn to_toml(&self) -> Result<String, CatalogError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Register every entry in file order, stopping at the first rejection.
    ///
    /// Returns the number of descriptors registered.
    pub fn register_into(&self, registry: &mut DescriptorRegistry) -> Result<usize, CatalogError> {
        for entry in &self.chipset {
            registry.register(entry.to_descriptor())?;
        }
        Ok(self.chipset.len())
    }
}
