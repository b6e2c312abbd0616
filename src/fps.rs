//! Batched frame rate counter.
//!
//! Reads the clock once per batch instead of once per frame.

use embassy_time::Instant;

/// Frames per batch unless configured otherwise.
pub const DEFAULT_FPS_BATCH: u16 = 25;

#[derive(Debug, Clone)]
pub struct FpsCounter {
    batch: u16,
    frames: u16,
    checkpoint: Instant,
    fps: u16,
}

impl FpsCounter {
    /// Start counting at `now`.
    pub const fn new(batch: u16, now: Instant) -> Self {
        Self {
            batch: if batch == 0 { 1 } else { batch },
            frames: 0,
            checkpoint: now,
            fps: 0,
        }
    }

    /// Last measured frame rate, zero until the first batch completes.
    pub const fn fps(&self) -> u16 {
        self.fps
    }

    /// Count one frame.
    ///
    /// Returns the new frame rate when this frame closes a batch.
    pub fn tick(&mut self, now: Instant) -> Option<u16> {
        self.frames += 1;
        if self.frames < self.batch {
            return None;
        }

        let elapsed_ms = now
            .checked_duration_since(self.checkpoint)
            .map_or(0, |elapsed| elapsed.as_millis())
            .max(1);
        let fps = u64::from(self.batch) * 1000 / elapsed_ms;
        self.fps = u16::try_from(fps).unwrap_or(u16::MAX);
        self.frames = 0;
        self.checkpoint = now;
        Some(self.fps)
    }
}
