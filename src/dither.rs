//! Temporal binary dithering.
//!
//! Each frame gets a different dither offset so that, averaged over several
//! frames, scaled values land between two 8-bit output levels. The offset is
//! flipped on every pixel to spread the error spatially as well.

use crate::math8::{reverse8, scale8};

/// Number of frames in one dither cycle, as a power of two.
const VIRTUAL_BITS: u8 = 3;

/// Dithering mode of a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DitherMode {
    Disabled,
    #[default]
    Binary,
}

/// Per-frame dither phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Dither {
    /// Current offset added before scaling.
    offset: [u8; 3],
    /// Error bound the offset alternates against.
    error: [u8; 3],
}

impl Dither {
    /// Dither phase that leaves values untouched.
    pub const NONE: Self = Self {
        offset: [0; 3],
        error: [0; 3],
    };

    /// Build the dither phase for one frame.
    ///
    /// `frame` is the controller's running frame counter and `scale` the
    /// per-channel scale the frame is emitted with.
    pub fn new(mode: DitherMode, frame: u8, scale: [u8; 3]) -> Self {
        if mode == DitherMode::Disabled {
            return Self::NONE;
        }

        let step = frame & ((1 << VIRTUAL_BITS) - 1);
        let q = reverse8(step) + (1 << (7 - VIRTUAL_BITS));

        let mut dither = Self::NONE;
        for (channel, &s) in scale.iter().enumerate() {
            let error = if s == 0 {
                0
            } else {
                u8::try_from(256 / u16::from(s) + 1).unwrap_or(u8::MAX)
            };
            dither.offset[channel] = scale8(q, error);
            dither.error[channel] = error.saturating_sub(1);
        }
        dither
    }

    /// Offset to apply to each RGB channel of the current pixel.
    pub const fn offset(&self) -> [u8; 3] {
        self.offset
    }

    /// Advance to the next pixel.
    pub fn step(&mut self) {
        for (offset, error) in self.offset.iter_mut().zip(self.error) {
            *offset = error.saturating_sub(*offset);
        }
    }
}
