use crate::fps::DEFAULT_FPS_BATCH;

/// Frame rate below which dithering is skipped for a frame.
pub const DEFAULT_DITHER_FPS_THRESHOLD: u16 = 100;

/// Waveform words per double buffer half (four bytes).
pub const DEFAULT_HALF_WORDS: usize = 32;

/// Configuration for the frame dispatcher.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Dithering is disabled for frames while the measured rate is below this.
    pub dither_fps_threshold: u16,
    /// Frames per frame rate measurement.
    pub fps_batch: u16,
    /// Upper bound on frames per second, `None` for unbounded.
    pub max_refresh_rate: Option<u16>,
    /// Words per half of each hardware double buffer.
    pub half_words: usize,
    /// A refill later than `expected interval * num / den` is an underrun.
    pub underrun_ratio: (u32, u32),
    /// Use at most this many hardware slots.
    pub max_channels: Option<usize>,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            dither_fps_threshold: DEFAULT_DITHER_FPS_THRESHOLD,
            fps_batch: DEFAULT_FPS_BATCH,
            max_refresh_rate: None,
            half_words: DEFAULT_HALF_WORDS,
            underrun_ratio: (3, 2),
            max_channels: None,
        }
    }
}
