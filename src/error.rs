use derive_more::derive::{Display, Error};

/// A specialized `Result` where the error is this crate's `Error` type.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Errors surfaced by controller construction and pixel streaming.
///
/// Failures inside a running transmission are never reported here: a
/// refill underrun truncates that one channel's frame and the session
/// carries on.
#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    #[display("Pixel stream read past its end")]
    OutOfRange,

    #[display("Waveform buffer of {requested} words exceeds capacity {capacity}")]
    BufferAllocation { requested: usize, capacity: usize },

    #[display("Controller registry is full")]
    RegistryFull,

    #[display("Hardware transmission queue is full")]
    QueueFull,

    #[display("Channel peripheral reports {_0} slots")]
    UnsupportedSlotCount(#[error(not(source))] usize),
}
