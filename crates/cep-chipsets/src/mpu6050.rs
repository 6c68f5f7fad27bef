//! InvenSense MPU-6050 IMU. AD0 selects 0x68 or 0x69.

use cep_core::PeripheralDescriptor;

pub const NAME: &str = "mpu6050";

pub fn descriptor() -> PeripheralDescriptor {
    PeripheralDescriptor::new(NAME)
        .with_addresses([0x68, 0x69])
        .with_provides(["acceleration", "gyroscope", "temperature"])
}
