//! Error type shared by every stage of the pipeline.

use derive_more::{Display, Error};

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Errors raised while starting up or driving the matrix.
///
/// Bus open/configure and configuration errors are fatal at startup.
/// Transfer errors are transient: the scheduler logs them and moves on.
#[derive(Debug, Display, Error)]
pub enum Error {
    /// The bus device could not be opened
    #[display("cannot open bus device {path}: {source}")]
    BusOpen {
        path: String,
        source: std::io::Error,
    },
    /// The bus device rejected the clock rate, word size or mode
    #[display("cannot configure bus device {path}: {source}")]
    BusConfigure {
        path: String,
        source: std::io::Error,
    },
    /// A single bus transfer failed
    #[display("bus transfer failed: {source}")]
    Transfer { source: std::io::Error },
    /// The driver accepted fewer bytes than requested
    #[display("short bus transfer: wrote {written} of {expected} bytes")]
    ShortTransfer { written: usize, expected: usize },
    /// Frame dimensions do not match the configured topology
    #[display("frame is {width}x{height}, expected {expected_width}x{expected_height}")]
    FrameSize {
        width: usize,
        height: usize,
        expected_width: usize,
        expected_height: usize,
    },
    /// Source buffer is too short for the declared geometry
    #[display("frame buffer holds {actual} bytes, needs at least {needed}")]
    FrameBuffer { needed: usize, actual: usize },
    /// Topology parameters are inconsistent
    #[display("invalid topology: {reason}")]
    Topology { reason: &'static str },
    /// Two logical coordinates map onto the same physical LED
    #[display("LED {index} is addressed by both ({x}, {y}) and another coordinate")]
    DuplicateLed { index: usize, x: usize, y: usize },
    /// Some physical LED is never addressed
    #[display("LED {index} is not addressed by any coordinate")]
    UnmappedLed { index: usize },
    /// Any other configuration error
    #[display("invalid configuration: {reason}")]
    Config { reason: &'static str },
}
