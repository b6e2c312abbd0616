mod correction;
mod order;

pub use correction::{
    CANDLE, CARBON_ARC, CLEAR_BLUE_SKY, DIRECT_SUNLIGHT, HALOGEN, HIGH_NOON_SUN, OVERCAST_SKY,
    TUNGSTEN_100W, TUNGSTEN_40W, TYPICAL_LED_STRIP, TYPICAL_PIXEL_STRING, TYPICAL_SMD5050,
    UNCORRECTED, UNCORRECTED_TEMPERATURE,
};
pub use order::ColorOrder;
use smart_leds::RGB8;

pub type Rgb = RGB8;

/// Black, used when clearing strips.
pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };

/// How a fourth (white) channel is derived for RGBW chipsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WhiteMode {
    /// Three channel output.
    #[default]
    None,
    /// The common part of R, G and B moves into the white channel.
    Exact,
}

impl WhiteMode {
    /// Number of bytes emitted per pixel.
    pub const fn channels(self) -> usize {
        match self {
            Self::None => 3,
            Self::Exact => 4,
        }
    }
}

/// A colour sample with an optional white channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgbw {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub w: u8,
}

impl Rgbw {
    /// Split an already scaled colour into RGB + W.
    pub fn from_rgb(color: Rgb, mode: WhiteMode) -> Self {
        match mode {
            WhiteMode::None => Self {
                r: color.r,
                g: color.g,
                b: color.b,
                w: 0,
            },
            WhiteMode::Exact => {
                let w = color.r.min(color.g).min(color.b);
                Self {
                    r: color.r - w,
                    g: color.g - w,
                    b: color.b - w,
                    w,
                }
            }
        }
    }
}
