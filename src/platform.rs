//! Hardware seams.
//!
//! Implement these traits to run the engine on a specific microcontroller.
//! Everything above them is platform agnostic and runs unchanged in host
//! tests against simulated hardware.

use core::convert::Infallible;

use embassy_time::Instant;
use embedded_hal::digital::OutputPin;

use crate::rmt::{Half, WaveWord};

/// Wall time plus a free-running CPU cycle counter.
pub trait Clock {
    /// Current time.
    fn now(&self) -> Instant;

    /// Current value of the cycle counter, wrapping at `u32::MAX`.
    fn cycles(&self) -> u32;

    /// Frequency of the cycle counter.
    fn cpu_hz(&self) -> u32;

    /// Block until `deadline` has passed.
    fn wait_until(&self, deadline: Instant) {
        while self.now() < deadline {}
    }

    /// Spin until `offset` cycles have passed since `mark`.
    ///
    /// Returns the counter value that ended the wait.
    #[inline(always)]
    fn wait_cycles(&self, mark: u32, offset: u32) -> u32 {
        loop {
            let now = self.cycles();
            if now.wrapping_sub(mark) >= offset {
                return now;
            }
        }
    }
}

/// Hardware transmitter that plays precomputed waveform words.
///
/// The peripheral exposes a fixed number of slots. Each slot owns a window
/// of waveform memory split into two halves and raises a notification when
/// a half has been played and when an idle word ends the transmission.
/// Notifications are posted to an [`EventQueue`](crate::event::EventQueue)
/// by the platform's interrupt handler.
pub trait ChannelPeripheral {
    /// Number of slots that can transmit at the same time.
    fn slot_count(&self) -> usize;

    /// Frequency of the waveform tick.
    fn tick_hz(&self) -> u32;

    /// Route a slot's output to a GPIO.
    fn attach(&mut self, slot: usize, pin: u8);

    /// Copy waveform words into one half of a slot's window.
    fn load(&mut self, slot: usize, half: Half, words: &[WaveWord]);

    /// Enable output plus the half-consumed and done notifications.
    fn start(&mut self, slot: usize);

    /// Disable output and notifications.
    fn stop(&mut self, slot: usize);

    /// Called while the dispatcher waits for notifications.
    fn wait_for_event(&mut self) {}
}

/// Type bundle describing one target.
pub trait Platform {
    /// GPIO driven directly by the CPU.
    type Pin: OutputPin<Error = Infallible>;
    type Clock: Clock;
    type Channels: ChannelPeripheral;
}
