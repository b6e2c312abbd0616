//! Pixel stream.
//!
//! Lazily turns a pixel buffer into the exact byte sequence a chipset
//! expects: adjusted, dithered, reordered and optionally split into RGBW.
//! Pixels are read from the buffer only when their first byte is requested.

use core::cell::Cell;

use crate::adjust::{Adjustment, ChannelAdjuster, scale_dithered};
use crate::color::{ColorOrder, Rgb, Rgbw, WhiteMode};
use crate::dither::Dither;
use crate::error::{Error, Result};

/// Application owned pixels, shared with the controllers that emit them.
///
/// The application may write pixels between frames. It must not write them
/// while a frame that references the buffer is being transmitted.
pub type PixelBuffer<'a> = &'a [Cell<Rgb>];

/// Where a stream takes its pixels from.
#[derive(Debug, Clone, Copy)]
pub enum PixelSource<'a> {
    /// Pixels from an application buffer.
    Buffer(PixelBuffer<'a>),
    /// The same colour repeated `count` times.
    Solid { color: Rgb, count: usize },
}

impl PixelSource<'_> {
    /// Number of pixels in the source.
    pub const fn len(&self) -> usize {
        match self {
            Self::Buffer(buffer) => buffer.len(),
            Self::Solid { count, .. } => *count,
        }
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn pixel(&self, index: usize) -> Option<Rgb> {
        match self {
            Self::Buffer(buffer) => buffer.get(index).map(Cell::get),
            Self::Solid { color, count } => (index < *count).then_some(*color),
        }
    }
}

/// Restartable, finite sequence of wire bytes for one frame.
#[derive(Debug, Clone)]
pub struct PixelStream<'a> {
    source: PixelSource<'a>,
    order: ColorOrder,
    white: WhiteMode,
    adjuster: ChannelAdjuster,
    adjustment: Adjustment,
    dither_start: Dither,
    dither: Dither,
    cursor: usize,
    pixel: [u8; 4],
}

impl<'a> PixelStream<'a> {
    /// Create a stream that emits the source at full scale without dithering.
    pub fn new(source: PixelSource<'a>, order: ColorOrder, white: WhiteMode) -> Self {
        Self {
            source,
            order,
            white,
            adjuster: scale_dithered,
            adjustment: Adjustment { scale: [u8::MAX; 3] },
            dither_start: Dither::NONE,
            dither: Dither::NONE,
            cursor: 0,
            pixel: [0; 4],
        }
    }

    /// Replace the channel adjuster.
    #[must_use]
    pub fn with_adjuster(mut self, adjuster: ChannelAdjuster) -> Self {
        self.adjuster = adjuster;
        self
    }

    /// Set the scale and dither phase for the next frame and rewind.
    pub fn prepare(&mut self, adjustment: Adjustment, dither: Dither) {
        self.adjustment = adjustment;
        self.dither_start = dither;
        self.restart();
    }

    /// Rewind to the first byte of the frame.
    pub fn restart(&mut self) {
        self.cursor = 0;
        self.dither = self.dither_start;
    }

    /// Total number of bytes in the frame.
    pub const fn len(&self) -> usize {
        self.source.len() * self.white.channels()
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of bytes already consumed.
    pub const fn position(&self) -> usize {
        self.cursor
    }

    /// Bytes left in the frame.
    pub const fn remaining(&self) -> usize {
        self.len() - self.cursor
    }

    pub const fn is_exhausted(&self) -> bool {
        self.cursor >= self.len()
    }

    /// Jump to the end of the frame without reading further pixels.
    pub fn skip_to_end(&mut self) {
        self.cursor = self.len();
    }

    /// Number of pixels in the source.
    pub const fn pixel_count(&self) -> usize {
        self.source.len()
    }

    pub const fn channels_per_pixel(&self) -> usize {
        self.white.channels()
    }

    /// Next byte of the frame.
    ///
    /// Fails with [`Error::OutOfRange`] once every byte has been consumed.
    pub fn advance(&mut self) -> Result<u8> {
        if self.is_exhausted() {
            return Err(Error::OutOfRange);
        }
        let channels = self.white.channels();
        let slot = self.cursor % channels;
        if slot == 0 {
            self.load_pixel(self.cursor / channels)?;
        }
        self.cursor += 1;
        Ok(self.pixel[slot])
    }

    fn load_pixel(&mut self, index: usize) -> Result<()> {
        let raw = self.source.pixel(index).ok_or(Error::OutOfRange)?;
        let scale = self.adjustment.scale;
        let offset = self.dither.offset();
        let adjust = self.adjuster;
        let scaled = Rgb {
            r: adjust(raw.r, scale[0], offset[0]),
            g: adjust(raw.g, scale[1], offset[1]),
            b: adjust(raw.b, scale[2], offset[2]),
        };
        self.dither.step();

        let Rgbw { r, g, b, w } = Rgbw::from_rgb(scaled, self.white);
        let [first, second, third] = self.order.apply(Rgb { r, g, b });
        self.pixel = [first, second, third, w];
        Ok(())
    }
}

impl Iterator for PixelStream<'_> {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        self.advance().ok()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for PixelStream<'_> {}
