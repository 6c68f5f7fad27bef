//! CEP Chipsets - Built-in chipset plugins
//!
//! Each module exposes a `descriptor()` constructor. Callers decide what to
//! register; [`register_builtin`] registers the whole set in a fixed order.

pub mod ads1115;
pub mod bme280;
pub mod ds3231;
pub mod ina219;
pub mod mpu6050;
pub mod ssd1306;

use cep_core::{DescriptorRegistry, PeripheralDescriptor, RegistryError};

/// Built-in descriptors in registration order.
///
/// mpu6050 precedes ds3231, so a part at their shared 0x68 default is
/// reported as the IMU first.
pub fn builtin() -> Vec<PeripheralDescriptor> {
    vec![
        bme280::descriptor(),
        ssd1306::descriptor(),
        ina219::descriptor(),
        ads1115::descriptor(),
        mpu6050::descriptor(),
        ds3231::descriptor(),
    ]
}

/// Register every built-in descriptor
pub fn register_builtin(registry: &mut DescriptorRegistry) -> Result<(), RegistryError> {
    for descriptor in builtin() {
        registry.register(descriptor)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cep_core::BusAddress;

    #[test]
    fn test_builtin_names_unique() {
        let mut names: Vec<_> = builtin().iter().map(|d| d.name().to_string()).collect();
        let total = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), total);
    }

    #[test]
    fn test_register_builtin() {
        let mut registry = DescriptorRegistry::new();
        register_builtin(&mut registry).unwrap();
        assert_eq!(registry.len(), 6);

        let at_0x68: Vec<_> = registry
            .find_by_address(BusAddress(0x68))
            .map(|d| d.name())
            .collect();
        assert_eq!(at_0x68, vec!["mpu6050", "ds3231"]);
    }

    #[test]
    fn test_register_builtin_into_small_registry() {
        let mut registry = DescriptorRegistry::with_capacity(4);
        let err = register_builtin(&mut registry).unwrap_err();
        assert!(matches!(err, RegistryError::Full { capacity: 4, .. }));
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn test_only_display_and_adc_render_custom() {
        let custom: Vec<_> = builtin()
            .into_iter()
            .filter(|d| d.has_render_hook())
            .map(|d| d.name().to_string())
            .collect();
        assert_eq!(custom, vec!["ssd1306", "ads1115"]);
    }
}
