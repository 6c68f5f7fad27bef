//! TI INA219 current and power monitor

use cep_core::PeripheralDescriptor;

pub const NAME: &str = "ina219";

pub fn descriptor() -> PeripheralDescriptor {
    PeripheralDescriptor::new(NAME)
        .with_addresses([0x40, 0x41, 0x44, 0x45])
        .with_provides(["voltage", "current", "power"])
}
