//! SSD1306 OLED display controller
//!
//! Rendered as a `display` entry with the panel geometry instead of a sensor.

use cep_core::{BusAddress, Fragment, PeripheralDescriptor, RenderError};
use serde_json::json;

pub const NAME: &str = "ssd1306";

pub const WIDTH_PX: u32 = 128;
pub const HEIGHT_PX: u32 = 64;

pub fn descriptor() -> PeripheralDescriptor {
    PeripheralDescriptor::new(NAME)
        .with_addresses([0x3c, 0x3d])
        .with_provides(["display"])
        .with_render(render)
}

fn render(bus_id: u8, address: BusAddress) -> Result<Option<Fragment>, RenderError> {
    Fragment::from_json(json!({
        "type": "display",
        "chipset": NAME,
        "bus": "i2c",
        "bus_id": bus_id,
        "address": address.to_string(),
        "width_px": WIDTH_PX,
        "height_px": HEIGHT_PX,
        "color": false,
    }))
    .map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_fragment() {
        let fragment = render(0, BusAddress(0x3c)).unwrap().unwrap();
        assert_eq!(
            serde_json::to_string(&fragment).unwrap(),
            r#"{"type":"display","chipset":"ssd1306","bus":"i2c","bus_id":0,"address":"0x3c","width_px":128,"height_px":64,"color":false}"#
        );
    }
}
