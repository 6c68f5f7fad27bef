//! Bosch BME280 environmental sensor. SDO low answers on 0x76, high on 0x77.

use cep_core::PeripheralDescriptor;

pub const NAME: &str = "bme280";

pub fn descriptor() -> PeripheralDescriptor {
    PeripheralDescriptor::new(NAME)
        .with_addresses([0x76, 0x77])
        .with_provides(["temperature", "humidity", "pressure"])
}
