//! Frame dispatcher.
//!
//! Owns every controller and pushes one frame to all of them per call.
//! CPU-driven controllers transmit immediately while the walk is in
//! progress; hardware-assisted controllers are queued and played together in
//! one session at the end of the walk.

use embassy_time::{Duration, Instant};

use crate::color::{BLACK, ColorOrder, Rgb};
use crate::config::DispatcherConfig;
use crate::controller::{Controller, Transmission};
use crate::dither::DitherMode;
use crate::engine::HardwareEngine;
use crate::error::Result;
use crate::event::EventReceiver;
use crate::fps::FpsCounter;
use crate::gate::CompletionGate;
use crate::log::log;
use crate::platform::{Clock, Platform};
use crate::registry::ControllerRegistry;
use crate::stream::PixelBuffer;
use crate::timing::{ChipsetTiming, SpiChipset};

/// What every controller transmits in a frame.
#[derive(Debug, Clone, Copy)]
enum Frame {
    /// Each controller's own pixel buffer.
    Buffers,
    /// The same colour on every pixel.
    Solid(Rgb),
}

/// Frame API over a fixed set of controllers.
///
/// N is the maximum number of controllers.
pub struct FrameDispatcher<'a, P: Platform, const N: usize> {
    registry: ControllerRegistry<'a, P::Pin, N>,
    engine: HardwareEngine<'a, P::Channels, N>,
    clock: &'a P::Clock,
    config: DispatcherConfig,
    brightness: u8,
    fps: FpsCounter,
    last_show: Option<Instant>,
}

impl<'a, P: Platform, const N: usize> FrameDispatcher<'a, P, N> {
    /// Create a dispatcher over the platform's channel peripheral.
    ///
    /// `events` must be the receiving side of the queue the peripheral's
    /// interrupt handler posts to.
    pub fn new(
        channels: P::Channels,
        events: EventReceiver<'a>,
        gate: &'a CompletionGate,
        clock: &'a P::Clock,
        config: DispatcherConfig,
    ) -> Result<Self> {
        let engine = HardwareEngine::new(
            channels,
            events,
            gate,
            config.max_channels,
            config.underrun_ratio,
        )?;
        Ok(Self {
            registry: ControllerRegistry::new(),
            engine,
            clock,
            fps: FpsCounter::new(config.fps_batch, clock.now()),
            config,
            brightness: u8::MAX,
            last_show: None,
        })
    }

    /// Initialise and register a controller, returning its index.
    pub fn add(&mut self, mut controller: Controller<'a, P::Pin>) -> Result<usize> {
        controller.init(self.config.half_words)?;
        let index = self.registry.register(controller)?;
        log!("[FrameDispatcher.add] controller {} registered", index);
        Ok(index)
    }

    /// Add a strip bit-banged by the CPU.
    pub fn add_clockless(
        &mut self,
        pin: P::Pin,
        timing: impl Into<ChipsetTiming>,
        order: ColorOrder,
        leds: PixelBuffer<'a>,
    ) -> Result<usize> {
        self.add(Controller::clockless(pin, timing, order, leds))
    }

    /// Add a strip played by a hardware channel on GPIO `pin`.
    pub fn add_hardware(
        &mut self,
        pin: u8,
        timing: impl Into<ChipsetTiming>,
        order: ColorOrder,
        leds: PixelBuffer<'a>,
    ) -> Result<usize> {
        self.add(Controller::hardware(pin, timing, order, leds))
    }

    /// Add a two wire strip.
    pub fn add_spi(
        &mut self,
        data: P::Pin,
        clock: P::Pin,
        chipset: SpiChipset,
        order: ColorOrder,
        leds: PixelBuffer<'a>,
    ) -> Result<usize> {
        self.add(Controller::spi(data, clock, chipset, order, leds))
    }

    /// Show every pixel buffer at the global brightness.
    pub fn show(&mut self) {
        self.show_all(self.brightness);
    }

    /// Show every pixel buffer at `scale`.
    ///
    /// Returns once every controller has finished its frame.
    pub fn show_all(&mut self, scale: u8) {
        self.dispatch(Frame::Buffers, scale);
    }

    /// Show `color` on every pixel of every strip without touching buffers.
    pub fn show_color_all(&mut self, color: Rgb, scale: u8) {
        self.dispatch(Frame::Solid(color), scale);
    }

    /// Zero every pixel buffer, then optionally push black to the strips.
    pub fn clear_all(&mut self, write_data: bool) {
        self.registry.for_each(Controller::clear_leds);
        if write_data {
            self.show_color_all(BLACK, 0);
        }
    }

    /// Keep showing frames until `duration` has passed.
    ///
    /// Shows at least one frame so dithering keeps advancing.
    pub fn delay(&mut self, duration: Duration) {
        let deadline = self.clock.now() + duration;
        loop {
            self.show();
            if self.clock.now() >= deadline {
                break;
            }
        }
    }

    fn dispatch(&mut self, frame: Frame, scale: u8) {
        let clock = self.clock;
        self.pace(clock);

        let dither_allowed = self.fps.fps() >= self.config.dither_fps_threshold;
        for (index, controller) in self.registry.iter_mut().enumerate() {
            let saved = controller.dither();
            if !dither_allowed {
                controller.set_dither(DitherMode::Disabled);
            }

            let transmission = match frame {
                Frame::Buffers => controller.transmit(scale, clock),
                Frame::Solid(color) => controller.transmit_color(color, scale, clock),
            };
            if transmission == Transmission::Queued
                && let Err(err) = self.engine.enqueue(index)
            {
                log!("[FrameDispatcher.dispatch] controller {}: {}", index, err);
            }

            controller.set_dither(saved);
        }

        self.engine.run_session(self.registry.as_mut_slice(), clock);

        if let Some(fps) = self.fps.tick(clock.now()) {
            log!("[FrameDispatcher.dispatch] {} fps", fps);
        }
    }

    /// Wait until the configured minimum frame interval has passed.
    fn pace(&mut self, clock: &P::Clock) {
        if let (Some(rate), Some(last)) = (self.config.max_refresh_rate, self.last_show)
            && rate > 0
        {
            clock.wait_until(last + Duration::from_micros(1_000_000 / u64::from(rate)));
        }
        self.last_show = Some(clock.now());
    }

    /// Global brightness used by [`Self::show`].
    pub const fn brightness(&self) -> u8 {
        self.brightness
    }

    pub fn set_brightness(&mut self, brightness: u8) {
        self.brightness = brightness;
    }

    /// Set the colour correction of every strip.
    pub fn set_correction(&mut self, correction: Rgb) {
        self.registry
            .for_each_mut(|controller| controller.set_correction(correction));
    }

    /// Set the colour temperature of every strip.
    pub fn set_temperature(&mut self, temperature: Rgb) {
        self.registry
            .for_each_mut(|controller| controller.set_temperature(temperature));
    }

    /// Set the dither mode of every strip.
    pub fn set_dither(&mut self, dither: DitherMode) {
        self.registry
            .for_each_mut(|controller| controller.set_dither(dither));
    }

    /// Limit `show` to `fps` frames per second, zero for unbounded.
    pub fn set_max_refresh_rate(&mut self, fps: u16) {
        self.config.max_refresh_rate = (fps > 0).then_some(fps);
    }

    /// Last measured frame rate.
    pub const fn fps(&self) -> u16 {
        self.fps.fps()
    }

    /// Number of registered controllers.
    pub fn count(&self) -> usize {
        self.registry.count()
    }

    /// Controller at `index`, or the first one when out of range.
    pub fn nth(&self, index: usize) -> Option<&Controller<'a, P::Pin>> {
        self.registry.nth(index)
    }

    pub fn nth_mut(&mut self, index: usize) -> Option<&mut Controller<'a, P::Pin>> {
        self.registry.nth_mut(index)
    }

    pub const fn registry(&self) -> &ControllerRegistry<'a, P::Pin, N> {
        &self.registry
    }

    pub const fn engine(&self) -> &HardwareEngine<'a, P::Channels, N> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut HardwareEngine<'a, P::Channels, N> {
        &mut self.engine
    }

    pub const fn config(&self) -> &DispatcherConfig {
        &self.config
    }
}
