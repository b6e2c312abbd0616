//! Two wire (clocked) chipsets driven by bit-banged SPI.
//!
//! The clock line makes these chipsets insensitive to timing, so frames are
//! emitted without disabling interrupts.

use core::convert::Infallible;

use embassy_time::Instant;
use embedded_hal::digital::OutputPin;

use crate::platform::Clock;
use crate::stream::PixelStream;
use crate::timing::SpiChipset;

/// APA102 per-pixel header: three marker bits plus full global brightness.
const APA102_HEADER: u8 = 0xE0 | 0x1F;

/// Controller for chipsets with separate data and clock lines.
#[derive(Debug)]
pub struct SpiController<P> {
    data: P,
    clock: P,
    chipset: SpiChipset,
    last_frame: Option<Instant>,
}

impl<P: OutputPin<Error = Infallible>> SpiController<P> {
    pub const fn new(data: P, clock: P, chipset: SpiChipset) -> Self {
        Self {
            data,
            clock,
            chipset,
            last_frame: None,
        }
    }

    /// Park both lines low.
    pub fn init(&mut self) {
        let Ok(()) = self.data.set_low();
        let Ok(()) = self.clock.set_low();
    }

    pub const fn chipset(&self) -> SpiChipset {
        self.chipset
    }

    /// Emit one frame with the chipset's framing.
    pub fn show<C: Clock>(&mut self, stream: &mut PixelStream<'_>, clock: &C) {
        if let Some(last) = self.last_frame {
            clock.wait_until(last + self.chipset.latch());
        }

        match self.chipset {
            SpiChipset::Ws2801 => {
                for byte in stream {
                    self.write_byte(byte);
                }
            }
            SpiChipset::Apa102 => {
                let pixels = stream.pixel_count();
                let channels = stream.channels_per_pixel();
                self.write_repeated(0x00, 4);
                for _ in 0..pixels {
                    self.write_byte(APA102_HEADER);
                    for _ in 0..channels {
                        let byte = stream.advance().unwrap_or(0);
                        self.write_byte(byte);
                    }
                }
                // One extra clock edge per two pixels pushes the data through.
                self.write_repeated(0xFF, (pixels / 2).div_ceil(8).max(4));
            }
        }

        let Ok(()) = self.data.set_low();
        self.last_frame = Some(clock.now());
    }

    fn write_repeated(&mut self, byte: u8, count: usize) {
        for _ in 0..count {
            self.write_byte(byte);
        }
    }

    fn write_byte(&mut self, byte: u8) {
        for bit in (0..8).rev() {
            let Ok(()) = if byte & (1 << bit) == 0 {
                self.data.set_low()
            } else {
                self.data.set_high()
            };
            let Ok(()) = self.clock.set_high();
            let Ok(()) = self.clock.set_low();
        }
    }
}
