//! TI ADS1115 4-channel 16-bit ADC. The ADDR pin selects 0x48..=0x4b.

use cep_core::{BusAddress, Fragment, PeripheralDescriptor, RenderError};
use serde_json::json;

pub const NAME: &str = "ads1115";

pub const RESOLUTION_BITS: u8 = 16;
pub const CHANNELS: u8 = 4;

pub fn descriptor() -> PeripheralDescriptor {
    PeripheralDescriptor::new(NAME)
        .with_addresses([0x48, 0x49, 0x4a, 0x4b])
        .with_provides(["adc"])
        .with_render(render)
}

fn render(bus_id: u8, address: BusAddress) -> Result<Option<Fragment>, RenderError> {
    Fragment::from_json(json!({
        "type": "adc",
        "chipset": NAME,
        "bus": "i2c",
        "bus_id": bus_id,
        "address": address.to_string(),
        "resolution": RESOLUTION_BITS,
        "channels": CHANNELS,
        "provides": ["adc"],
    }))
    .map(Some)
}
