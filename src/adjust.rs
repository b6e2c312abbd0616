//! Per-channel output adjustment.
//!
//! The engine does not own any colour science. It asks an adjuster, once per
//! channel per pixel, to turn a raw byte into the byte that goes on the wire.

use crate::color::Rgb;
use crate::math8::{qadd8, scale8};

/// Converts a raw channel byte into its emitted value.
///
/// Must be a pure function of the raw value, the channel scale and the
/// position-dependent dither offset.
pub type ChannelAdjuster = fn(value: u8, scale: u8, dither: u8) -> u8;

/// Default adjuster: add the dither offset, then scale.
#[inline]
pub const fn scale_dithered(value: u8, scale: u8, dither: u8) -> u8 {
    scale8(qadd8(value, dither), scale)
}

/// Per-channel scale for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Adjustment {
    pub scale: [u8; 3],
}

impl Adjustment {
    /// Combine brightness with colour correction and colour temperature.
    pub const fn compute(brightness: u8, correction: Rgb, temperature: Rgb) -> Self {
        if brightness == 0 {
            return Self { scale: [0; 3] };
        }
        Self {
            scale: [
                scale8(scale8(correction.r, temperature.r), brightness),
                scale8(scale8(correction.g, temperature.g), brightness),
                scale8(scale8(correction.b, temperature.b), brightness),
            ],
        }
    }
}
