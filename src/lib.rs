#![no_std]

//! Transmission engine for addressable LED strips.
//!
//! Controllers for clockless (single wire) and clocked (two wire) chipsets
//! are registered with a [`FrameDispatcher`], which pushes one frame to all
//! of them per [`FrameDispatcher::show`] call. Clockless strips are either
//! bit-banged by the CPU inside a critical section or played by a hardware
//! channel peripheral that is shared between strips.
//!
//! The hardware specifics live behind the [`Platform`] traits, so the engine
//! runs unchanged in host tests against simulated pins, clocks and channels.

pub mod adjust;
pub mod clockless;
pub mod color;
pub mod config;
pub mod controller;
pub mod dispatcher;
pub mod dither;
pub mod engine;
pub mod error;
pub mod event;
pub mod fps;
pub mod gate;
pub mod guard;
mod log;
pub mod math8;
pub mod platform;
pub mod registry;
pub mod rmt;
pub mod spi;
pub mod stream;
pub mod timing;

pub use adjust::{Adjustment, ChannelAdjuster, scale_dithered};
pub use color::{ColorOrder, Rgb, Rgbw, WhiteMode};
pub use config::DispatcherConfig;
pub use controller::{Controller, Driver, StripSettings, Transmission};
pub use dispatcher::FrameDispatcher;
pub use dither::DitherMode;
pub use engine::HardwareEngine;
pub use error::{Error, Result};
pub use event::{ChannelEvent, EventQueue, EventReceiver, EventSender, PostError};
pub use gate::CompletionGate;
pub use platform::{ChannelPeripheral, Clock, Platform};
pub use registry::ControllerRegistry;
pub use rmt::{Half, WaveWord};
pub use stream::{PixelBuffer, PixelSource, PixelStream};
pub use timing::{Chipset, ChipsetTiming, SpiChipset};

pub use embassy_time::{Duration, Instant};
