//! Hardware-assisted channel.
//!
//! A [`HardwareController`] turns its pixel stream into waveform words, one
//! word per bit, and keeps a two-half window of them ahead of the peripheral.
//! When the peripheral reports a half consumed, that half is refilled while
//! the other one plays.

use embassy_time::{Duration, Instant};
use heapless::Vec;

use crate::error::{Error, Result};
use crate::log::log;
use crate::platform::ChannelPeripheral;
use crate::stream::PixelStream;
use crate::timing::ChipsetTiming;

/// Largest double buffer, in words.
pub const MAX_BUFFER_WORDS: usize = 128;

const DURATION_MASK: u32 = 0x7FFF;
const LEVEL_HIGH: u32 = 1 << 15;

/// One bit of waveform: a high pulse followed by a low pulse.
///
/// Layout: duration of the high part in bits 0-14, its level in bit 15,
/// duration of the low part in bits 16-30, its level in bit 31. A word with
/// zero duration ends the transmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WaveWord(pub u32);

impl WaveWord {
    /// End-of-transmission marker.
    pub const IDLE: Self = Self(0);

    pub const fn pulse(high_ticks: u32, low_ticks: u32) -> Self {
        Self(LEVEL_HIGH | (high_ticks & DURATION_MASK) | ((low_ticks & DURATION_MASK) << 16))
    }

    pub const fn high_ticks(self) -> u32 {
        self.0 & DURATION_MASK
    }

    pub const fn low_ticks(self) -> u32 {
        (self.0 >> 16) & DURATION_MASK
    }

    pub const fn is_idle(self) -> bool {
        self.high_ticks() == 0
    }
}

/// One of the two halves of a double buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Half {
    First,
    Second,
}

impl Half {
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::First => Self::Second,
            Self::Second => Self::First,
        }
    }
}

/// Fixed capacity waveform buffer split into two halves.
#[derive(Debug, Clone)]
pub struct DoubleBuffer {
    words: Vec<WaveWord, MAX_BUFFER_WORDS>,
    half_len: usize,
}

impl DoubleBuffer {
    /// Size the buffer for `half_len` words per half.
    ///
    /// A half must hold a whole number of bytes.
    pub fn allocate(half_len: usize) -> Result<Self> {
        let requested = half_len * 2;
        if half_len == 0 || !half_len.is_multiple_of(8) || requested > MAX_BUFFER_WORDS {
            return Err(Error::BufferAllocation {
                requested,
                capacity: MAX_BUFFER_WORDS,
            });
        }
        let mut words = Vec::new();
        words
            .resize(requested, WaveWord::IDLE)
            .map_err(|()| Error::BufferAllocation {
                requested,
                capacity: MAX_BUFFER_WORDS,
            })?;
        Ok(Self { words, half_len })
    }

    /// Words per half.
    pub const fn half_len(&self) -> usize {
        self.half_len
    }

    pub fn half(&self, half: Half) -> &[WaveWord] {
        let (first, second) = self.words.split_at(self.half_len);
        match half {
            Half::First => first,
            Half::Second => second,
        }
    }

    pub fn half_mut(&mut self, half: Half) -> &mut [WaveWord] {
        let (first, second) = self.words.split_at_mut(self.half_len);
        match half {
            Half::First => first,
            Half::Second => second,
        }
    }
}

/// Where a channel is in its transmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelState {
    #[default]
    Idle,
    Filling,
    Transmitting,
    RefillRequested,
    Done,
}

/// Outcome of a refill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refill {
    /// The vacated half was filled in time.
    Filled,
    /// The refill came too late; the rest of the frame was dropped.
    Underrun,
}

/// Per-controller state of a hardware-assisted transmission.
#[derive(Debug, Clone)]
pub struct HardwareController<'a> {
    pin: u8,
    timing: ChipsetTiming,
    buffer: Option<DoubleBuffer>,
    stream: Option<PixelStream<'a>>,
    words: [WaveWord; 2],
    next_half: Half,
    slot: Option<usize>,
    state: ChannelState,
    last_refill: Instant,
    refill_budget: Duration,
}

impl<'a> HardwareController<'a> {
    pub const fn new(pin: u8, timing: ChipsetTiming) -> Self {
        Self {
            pin,
            timing,
            buffer: None,
            stream: None,
            words: [WaveWord::IDLE; 2],
            next_half: Half::First,
            slot: None,
            state: ChannelState::Idle,
            last_refill: Instant::from_ticks(0),
            refill_budget: Duration::from_ticks(0),
        }
    }

    /// Allocate the double buffer.
    pub fn init(&mut self, half_len: usize) -> Result<()> {
        let buffer = DoubleBuffer::allocate(half_len).inspect_err(|err| {
            log!("[HardwareController.init] pin {}: {}", self.pin, err);
        })?;
        self.buffer = Some(buffer);
        Ok(())
    }

    pub const fn pin(&self) -> u8 {
        self.pin
    }

    pub const fn timing(&self) -> ChipsetTiming {
        self.timing
    }

    pub const fn state(&self) -> ChannelState {
        self.state
    }

    /// Slot the controller is bound to while it transmits.
    pub const fn slot(&self) -> Option<usize> {
        self.slot
    }

    /// Stream of the current or last frame.
    pub const fn stream(&self) -> Option<&PixelStream<'a>> {
        self.stream.as_ref()
    }

    /// Hand over the frame to transmit in the next session.
    pub fn queue(&mut self, stream: PixelStream<'a>) {
        self.stream = Some(stream);
        self.state = ChannelState::Idle;
    }

    /// Expected time between two refills, stretched by `ratio`.
    ///
    /// `ratio` is a `(numerator, denominator)` pair.
    pub fn refill_budget(&self, ratio: (u32, u32)) -> Duration {
        let half_len = self.buffer.as_ref().map_or(0, DoubleBuffer::half_len) as u64;
        let expected_ns = half_len * u64::from(self.timing.period_ns());
        let (num, den) = ratio;
        Duration::from_nanos(expected_ns * u64::from(num) / u64::from(den.max(1)))
    }

    /// Bind to `slot`, fill both halves and start the transmitter.
    pub fn begin<H: ChannelPeripheral>(
        &mut self,
        slot: usize,
        peripheral: &mut H,
        now: Instant,
        budget: Duration,
    ) {
        let ticks = self.timing.to_cycles(peripheral.tick_hz());
        self.words = [
            WaveWord::pulse(ticks.high(false), ticks.low(false)),
            WaveWord::pulse(ticks.high(true), ticks.low(true)),
        ];
        if let Some(stream) = self.stream.as_mut() {
            stream.restart();
        }

        self.slot = Some(slot);
        self.state = ChannelState::Filling;
        peripheral.attach(slot, self.pin);
        self.fill(peripheral, Half::First);
        self.fill(peripheral, Half::Second);
        self.next_half = Half::First;

        self.refill_budget = budget;
        self.last_refill = now;
        self.state = ChannelState::Transmitting;
        peripheral.start(slot);
    }

    /// Refill the half the peripheral just vacated.
    ///
    /// Runs on the notification path, so it never blocks or allocates. A
    /// refill that arrives later than the budget drops the rest of the frame
    /// so the channel completes on its next notification.
    pub fn refill<H: ChannelPeripheral>(&mut self, peripheral: &mut H, now: Instant) -> Refill {
        self.state = ChannelState::RefillRequested;
        let elapsed = now
            .checked_duration_since(self.last_refill)
            .unwrap_or(Duration::from_ticks(0));

        let outcome = if elapsed > self.refill_budget {
            if let Some(stream) = self.stream.as_mut() {
                stream.skip_to_end();
            }
            Refill::Underrun
        } else {
            Refill::Filled
        };

        self.state = ChannelState::Filling;
        self.fill(peripheral, self.next_half);
        self.next_half = self.next_half.other();
        self.last_refill = now;
        self.state = ChannelState::Transmitting;
        outcome
    }

    /// Stop the transmitter and release the slot.
    pub fn finish<H: ChannelPeripheral>(&mut self, peripheral: &mut H) -> Option<usize> {
        let slot = self.slot.take()?;
        peripheral.stop(slot);
        self.state = ChannelState::Done;
        Some(slot)
    }

    /// Convert up to one half worth of bytes into waveform words.
    fn fill<H: ChannelPeripheral>(&mut self, peripheral: &mut H, half: Half) {
        let (Some(buffer), Some(slot)) = (self.buffer.as_mut(), self.slot) else {
            return;
        };
        let [zero, one] = self.words;
        let words = buffer.half_mut(half);

        for chunk in words.chunks_exact_mut(8) {
            let next = self.stream.as_mut().and_then(|stream| stream.advance().ok());
            match next {
                Some(byte) => {
                    for (bit, word) in chunk.iter_mut().enumerate() {
                        *word = if byte & (0x80 >> bit) == 0 { zero } else { one };
                    }
                }
                None => chunk.fill(WaveWord::IDLE),
            }
        }
        peripheral.load(slot, half, buffer.half(half));
    }
}
