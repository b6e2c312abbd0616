//! Software clockless engine.
//!
//! Bit-bangs a single data pin with cycle-accurate timing. The whole frame
//! is emitted with interrupts disabled: the chipsets tolerate only tens of
//! nanoseconds of jitter, so nothing may run between two bits. A scheduling
//! hiccup inside the frame cannot be detected and shows up as a glitch.

use core::convert::Infallible;

use embassy_time::Instant;
use embedded_hal::digital::OutputPin;

use crate::guard::InterruptGuard;
use crate::platform::Clock;
use crate::timing::{ChipsetTiming, CycleTiming};

/// Single pin controller driven entirely by the CPU.
#[derive(Debug)]
pub struct ClocklessController<P> {
    pin: P,
    timing: ChipsetTiming,
    last_frame: Option<Instant>,
}

impl<P: OutputPin<Error = Infallible>> ClocklessController<P> {
    pub const fn new(pin: P, timing: ChipsetTiming) -> Self {
        Self {
            pin,
            timing,
            last_frame: None,
        }
    }

    /// Park the line low.
    pub fn init(&mut self) {
        let Ok(()) = self.pin.set_low();
    }

    pub const fn timing(&self) -> ChipsetTiming {
        self.timing
    }

    /// End of the most recent frame.
    pub const fn last_frame(&self) -> Option<Instant> {
        self.last_frame
    }

    /// Emit one frame and return once its last bit has completed.
    ///
    /// Waits out the latch gap of the previous frame first, outside the
    /// critical section.
    pub fn show<C: Clock>(&mut self, bytes: impl Iterator<Item = u8>, clock: &C) {
        if let Some(last) = self.last_frame {
            clock.wait_until(last + self.timing.latch);
        }
        let cycles = self.timing.to_cycles(clock.cpu_hz());
        {
            let _guard = InterruptGuard::acquire();
            emit_frame(&mut self.pin, bytes, cycles, clock);
        }
        self.last_frame = Some(clock.now());
    }
}

/// Emit bytes most significant bit first.
///
/// Edges within a byte are scheduled against a running mark, so loop
/// overhead never stretches a period. The next byte is fetched in the low
/// tail of the current byte's last bit, before that tail is waited out, so
/// the fetch never eats into a high pulse. When the fetch outlasts the tail
/// the low time grows and the next byte is scheduled from the moment it ends.
pub fn emit_frame<P, C>(
    pin: &mut P,
    mut bytes: impl Iterator<Item = u8>,
    timing: CycleTiming,
    clock: &C,
) where
    P: OutputPin<Error = Infallible>,
    C: Clock,
{
    let period = timing.period();
    let one_high = timing.high(true);
    let Some(mut byte) = bytes.next() else {
        return;
    };
    let mut mark = clock.cycles();

    loop {
        let mut next = None;
        for bit in (0..8).rev() {
            let Ok(()) = pin.set_high();
            clock.wait_cycles(mark, timing.t1);
            if byte & (1 << bit) == 0 {
                let Ok(()) = pin.set_low();
            } else {
                clock.wait_cycles(mark, one_high);
                let Ok(()) = pin.set_low();
            }
            if bit == 0 {
                next = bytes.next();
            }
            let now = clock.wait_cycles(mark, period);
            mark = if bit == 0 && now.wrapping_sub(mark) > period {
                now
            } else {
                mark.wrapping_add(period)
            };
        }
        match next {
            Some(value) => byte = value,
            None => break,
        }
    }
}
