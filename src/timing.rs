//! Chipset bit timing.
//!
//! A clockless bit is a high pulse followed by a low pulse inside a fixed
//! period. `T1` is the high time every bit shares, `T2` the extra high time
//! of a one-bit and `T3` the low tail that completes the period:
//!
//! ```text
//!  zero  ‾‾T1‾‾|____T2____|__T3__
//!  one   ‾‾T1‾‾|‾‾‾‾T2‾‾‾‾|__T3__
//! ```

use embassy_time::Duration;

const NANOS_PER_SECOND: u64 = 1_000_000_000;

/// Default latch gap between two frames.
pub const DEFAULT_LATCH: Duration = Duration::from_micros(280);

/// Bit timing of a clockless chipset, in nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChipsetTiming {
    pub t1: u32,
    pub t2: u32,
    pub t3: u32,
    /// Minimum low time before the chipset latches a new frame.
    pub latch: Duration,
}

impl ChipsetTiming {
    pub const fn from_nanos(t1: u32, t2: u32, t3: u32) -> Self {
        Self {
            t1,
            t2,
            t3,
            latch: DEFAULT_LATCH,
        }
    }

    #[must_use]
    pub const fn with_latch(mut self, latch: Duration) -> Self {
        self.latch = latch;
        self
    }

    /// Length of one bit.
    pub const fn period_ns(self) -> u32 {
        self.t1 + self.t2 + self.t3
    }

    /// Convert to counts of a clock running at `hz`.
    ///
    /// Every interval is rounded up so pulses are never shorter than the
    /// chipset asks for.
    pub const fn to_cycles(self, hz: u32) -> CycleTiming {
        CycleTiming {
            t1: ns_to_cycles(self.t1, hz),
            t2: ns_to_cycles(self.t2, hz),
            t3: ns_to_cycles(self.t3, hz),
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
const fn ns_to_cycles(ns: u32, hz: u32) -> u32 {
    (ns as u64 * hz as u64).div_ceil(NANOS_PER_SECOND) as u32
}

/// Bit timing converted to clock cycles or peripheral ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleTiming {
    pub t1: u32,
    pub t2: u32,
    pub t3: u32,
}

impl CycleTiming {
    pub const fn period(self) -> u32 {
        self.t1 + self.t2 + self.t3
    }

    /// High time of a bit.
    pub const fn high(self, bit: bool) -> u32 {
        if bit { self.t1 + self.t2 } else { self.t1 }
    }

    /// Low time of a bit.
    pub const fn low(self, bit: bool) -> u32 {
        self.period() - self.high(bit)
    }
}

/// Clockless chipsets with known timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Chipset {
    Ws2811,
    Ws2812,
    Ws2813,
    Sk6812,
    Tm1809,
    Ucs1903,
    Apa106,
    Gs1903,
}

impl Chipset {
    pub const fn timing(self) -> ChipsetTiming {
        match self {
            Self::Ws2811 => {
                ChipsetTiming::from_nanos(320, 320, 640).with_latch(Duration::from_micros(50))
            }
            Self::Ws2812 => ChipsetTiming::from_nanos(250, 625, 375),
            Self::Ws2813 => {
                ChipsetTiming::from_nanos(320, 320, 640).with_latch(Duration::from_micros(300))
            }
            Self::Sk6812 => {
                ChipsetTiming::from_nanos(300, 600, 300).with_latch(Duration::from_micros(80))
            }
            Self::Tm1809 => {
                ChipsetTiming::from_nanos(350, 350, 450).with_latch(Duration::from_micros(50))
            }
            Self::Ucs1903 => {
                ChipsetTiming::from_nanos(500, 1500, 500).with_latch(Duration::from_micros(50))
            }
            Self::Apa106 => {
                ChipsetTiming::from_nanos(350, 1300, 350).with_latch(Duration::from_micros(50))
            }
            Self::Gs1903 => {
                ChipsetTiming::from_nanos(250, 750, 250).with_latch(Duration::from_micros(50))
            }
        }
    }
}

impl From<Chipset> for ChipsetTiming {
    fn from(chipset: Chipset) -> Self {
        chipset.timing()
    }
}

/// Clocked (two wire) chipsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpiChipset {
    /// Raw bytes, latched by holding the clock low.
    Ws2801,
    /// Start frame, brightness header per pixel, end frame.
    Apa102,
}

impl SpiChipset {
    /// Idle time required after a frame.
    pub const fn latch(self) -> Duration {
        match self {
            Self::Ws2801 => Duration::from_micros(500),
            Self::Apa102 => Duration::from_micros(0),
        }
    }
}
