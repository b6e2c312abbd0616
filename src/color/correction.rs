//! Colour correction and colour temperature presets.
//!
//! Both are per-channel multipliers (255 = unchanged) that combine with the
//! brightness scale before a pixel is emitted.

use super::Rgb;

#[allow(clippy::cast_possible_truncation)]
const fn rgb(value: u32) -> Rgb {
    Rgb {
        r: (value >> 16) as u8,
        g: (value >> 8) as u8,
        b: value as u8,
    }
}

pub const UNCORRECTED: Rgb = rgb(0xFF_FF_FF);
pub const TYPICAL_SMD5050: Rgb = rgb(0xFF_B0_F0);
pub const TYPICAL_LED_STRIP: Rgb = rgb(0xFF_B0_F0);
pub const TYPICAL_PIXEL_STRING: Rgb = rgb(0xFF_E0_8C);

pub const UNCORRECTED_TEMPERATURE: Rgb = rgb(0xFF_FF_FF);
pub const CANDLE: Rgb = rgb(0xFF_93_29);
pub const TUNGSTEN_40W: Rgb = rgb(0xFF_C5_8F);
pub const TUNGSTEN_100W: Rgb = rgb(0xFF_D6_AA);
pub const HALOGEN: Rgb = rgb(0xFF_F1_E0);
pub const CARBON_ARC: Rgb = rgb(0xFF_FA_F4);
pub const HIGH_NOON_SUN: Rgb = rgb(0xFF_FF_FB);
pub const DIRECT_SUNLIGHT: Rgb = rgb(0xFF_FF_FF);
pub const OVERCAST_SKY: Rgb = rgb(0xC9_E2_FF);
pub const CLEAR_BLUE_SKY: Rgb = rgb(0x40_9C_FF);
