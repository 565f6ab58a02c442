pub mod color;
pub mod config;
pub mod context;
pub mod encoder;
pub mod error;
pub mod filter;
pub mod frame;
pub mod frame_scheduler;
pub mod math8;
pub mod renderer;
pub mod topology;
pub mod transport;

pub use config::{BusConfig, ColorConfig, MatrixConfig, SpiMode, TimingConfig};
pub use context::{Context, ShutdownFlag};
pub use encoder::{PulseTiming, SymbolEncoder};
pub use error::{Error, Result};
pub use filter::{BrightnessLut, ColorPipeline};
pub use frame::{Frame, SharedFrame, SourceOrder};
pub use frame_scheduler::{FrameScheduler, RunSummary};
pub use renderer::Renderer;
pub use topology::{PanelTransform, PixelMap, Topology};

pub use color::{ChannelOrder, Hsv, Rgb};
pub use embassy_time::{Duration, Instant};

/// Abstract bus transport trait
///
/// Implement this trait to support different serial buses.
/// The frame scheduler is generic over this trait.
pub trait BusTransport {
    /// Shift out `bytes` in one transfer, returning how many bytes were written
    fn transfer(&mut self, bytes: &[u8]) -> Result<usize>;
}
