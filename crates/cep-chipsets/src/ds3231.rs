//! Maxim DS3231 real-time clock. Fixed at 0x68, shared with the MPU-6050 default.

use cep_core::PeripheralDescriptor;

pub const NAME: &str = "ds3231";

pub fn descriptor() -> PeripheralDescriptor {
    PeripheralDescriptor::new(NAME)
        .with_addresses([0x68])
        .with_provides(["rtc", "temperature"])
}
