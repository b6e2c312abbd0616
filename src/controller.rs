//! LED strip controllers.
//!
//! A [`Controller`] pairs the settings every strip shares (pixel buffer,
//! colour order, correction, dithering) with one of a fixed set of output
//! drivers. The driver set is closed, so dispatch is a `match` rather than a
//! trait object.

use core::convert::Infallible;

use embassy_time::Duration;
use embedded_hal::digital::OutputPin;

use crate::adjust::{Adjustment, ChannelAdjuster, scale_dithered};
use crate::clockless::ClocklessController;
use crate::color::{BLACK, ColorOrder, Rgb, UNCORRECTED, UNCORRECTED_TEMPERATURE, WhiteMode};
use crate::dither::{Dither, DitherMode};
use crate::error::Result;
use crate::platform::Clock;
use crate::rmt::HardwareController;
use crate::spi::SpiController;
use crate::stream::{PixelBuffer, PixelSource, PixelStream};
use crate::timing::{ChipsetTiming, SpiChipset};

/// Output stage of a controller.
#[derive(Debug)]
pub enum Driver<'a, P> {
    /// CPU bit-banged single wire output.
    Clockless(ClocklessController<P>),
    /// Single wire output played by a shared hardware channel.
    Hardware(HardwareController<'a>),
    /// Bit-banged data + clock output.
    Spi(SpiController<P>),
}

/// Result of asking a controller to transmit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transmission {
    /// The frame is already on the wire.
    Complete,
    /// The frame waits for a hardware channel.
    Queued,
}

/// Settings shared by every kind of strip.
#[derive(Debug, Clone, Copy)]
pub struct StripSettings {
    pub order: ColorOrder,
    pub white: WhiteMode,
    pub correction: Rgb,
    pub temperature: Rgb,
    pub dither: DitherMode,
}

impl Default for StripSettings {
    fn default() -> Self {
        Self {
            order: ColorOrder::Rgb,
            white: WhiteMode::None,
            correction: UNCORRECTED,
            temperature: UNCORRECTED_TEMPERATURE,
            dither: DitherMode::Binary,
        }
    }
}

/// One LED strip as seen by the frame dispatcher.
#[derive(Debug)]
pub struct Controller<'a, P> {
    leds: PixelBuffer<'a>,
    settings: StripSettings,
    adjuster: ChannelAdjuster,
    dither_frame: u8,
    driver: Driver<'a, P>,
}

impl<'a, P: OutputPin<Error = Infallible>> Controller<'a, P> {
    pub fn new(leds: PixelBuffer<'a>, order: ColorOrder, driver: Driver<'a, P>) -> Self {
        Self {
            leds,
            settings: StripSettings {
                order,
                ..StripSettings::default()
            },
            adjuster: scale_dithered,
            dither_frame: 0,
            driver,
        }
    }

    /// Clockless strip bit-banged by the CPU.
    pub fn clockless(
        pin: P,
        timing: impl Into<ChipsetTiming>,
        order: ColorOrder,
        leds: PixelBuffer<'a>,
    ) -> Self {
        let driver = Driver::Clockless(ClocklessController::new(pin, timing.into()));
        Self::new(leds, order, driver)
    }

    /// Clockless strip played by a hardware channel.
    pub fn hardware(
        pin: u8,
        timing: impl Into<ChipsetTiming>,
        order: ColorOrder,
        leds: PixelBuffer<'a>,
    ) -> Self {
        let driver = Driver::Hardware(HardwareController::new(pin, timing.into()));
        Self::new(leds, order, driver)
    }

    /// Two wire strip.
    pub fn spi(
        data: P,
        clock: P,
        chipset: SpiChipset,
        order: ColorOrder,
        leds: PixelBuffer<'a>,
    ) -> Self {
        let driver = Driver::Spi(SpiController::new(data, clock, chipset));
        Self::new(leds, order, driver)
    }

    /// Emit a fourth, white channel.
    #[must_use]
    pub fn with_white(mut self, white: WhiteMode) -> Self {
        self.settings.white = white;
        self
    }

    /// Replace the per-channel adjuster.
    #[must_use]
    pub fn with_adjuster(mut self, adjuster: ChannelAdjuster) -> Self {
        self.adjuster = adjuster;
        self
    }

    /// Prepare the output stage.
    ///
    /// `half_len` sizes the double buffer of hardware-assisted strips.
    pub fn init(&mut self, half_len: usize) -> Result<()> {
        match &mut self.driver {
            Driver::Clockless(driver) => driver.init(),
            Driver::Hardware(driver) => driver.init(half_len)?,
            Driver::Spi(driver) => driver.init(),
        }
        Ok(())
    }

    /// Number of pixels.
    pub const fn size(&self) -> usize {
        self.leds.len()
    }

    pub const fn leds(&self) -> PixelBuffer<'a> {
        self.leds
    }

    /// Point the controller at another buffer.
    pub fn set_leds(&mut self, leds: PixelBuffer<'a>) {
        self.leds = leds;
    }

    pub const fn settings(&self) -> &StripSettings {
        &self.settings
    }

    pub const fn dither(&self) -> DitherMode {
        self.settings.dither
    }

    pub fn set_dither(&mut self, dither: DitherMode) {
        self.settings.dither = dither;
    }

    pub fn set_correction(&mut self, correction: Rgb) {
        self.settings.correction = correction;
    }

    pub fn set_temperature(&mut self, temperature: Rgb) {
        self.settings.temperature = temperature;
    }

    /// Latch gap the strip needs after a frame.
    pub const fn latch(&self) -> Duration {
        match &self.driver {
            Driver::Clockless(driver) => driver.timing().latch,
            Driver::Hardware(driver) => driver.timing().latch,
            Driver::Spi(driver) => driver.chipset().latch(),
        }
    }

    pub const fn driver(&self) -> &Driver<'a, P> {
        &self.driver
    }

    pub const fn is_hardware(&self) -> bool {
        matches!(self.driver, Driver::Hardware(_))
    }

    pub fn as_hardware(&self) -> Option<&HardwareController<'a>> {
        match &self.driver {
            Driver::Hardware(driver) => Some(driver),
            _ => None,
        }
    }

    pub fn as_hardware_mut(&mut self) -> Option<&mut HardwareController<'a>> {
        match &mut self.driver {
            Driver::Hardware(driver) => Some(driver),
            _ => None,
        }
    }

    /// Zero the pixel buffer.
    pub fn clear_leds(&self) {
        for led in self.leds {
            led.set(BLACK);
        }
    }

    /// Transmit the pixel buffer at `scale`.
    pub fn transmit<C: Clock>(&mut self, scale: u8, clock: &C) -> Transmission {
        self.transmit_source(PixelSource::Buffer(self.leds), scale, clock)
    }

    /// Transmit `color` on every pixel at `scale`.
    pub fn transmit_color<C: Clock>(&mut self, color: Rgb, scale: u8, clock: &C) -> Transmission {
        let count = self.leds.len();
        self.transmit_source(PixelSource::Solid { color, count }, scale, clock)
    }

    /// Transmit black on every pixel.
    pub fn clear<C: Clock>(&mut self, clock: &C) -> Transmission {
        self.transmit_color(BLACK, 0, clock)
    }

    fn transmit_source<C: Clock>(
        &mut self,
        source: PixelSource<'a>,
        scale: u8,
        clock: &C,
    ) -> Transmission {
        let mut stream = self.frame_stream(source, scale);
        match &mut self.driver {
            Driver::Clockless(driver) => {
                driver.show(&mut stream, clock);
                Transmission::Complete
            }
            Driver::Spi(driver) => {
                driver.show(&mut stream, clock);
                Transmission::Complete
            }
            Driver::Hardware(driver) => {
                driver.queue(stream);
                Transmission::Queued
            }
        }
    }

    /// Build the byte stream for one frame with the current settings.
    pub fn frame_stream(&mut self, source: PixelSource<'a>, scale: u8) -> PixelStream<'a> {
        let settings = self.settings;
        let adjustment = Adjustment::compute(scale, settings.correction, settings.temperature);
        let dither = Dither::new(settings.dither, self.dither_frame, adjustment.scale);
        if settings.dither != DitherMode::Disabled {
            self.dither_frame = self.dither_frame.wrapping_add(1);
        }

        let mut stream =
            PixelStream::new(source, settings.order, settings.white).with_adjuster(self.adjuster);
        stream.prepare(adjustment, dither);
        stream
    }
}
