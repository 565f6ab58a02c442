//! Startup configuration.
//!
//! Defaults describe the reference installation: two 13x9 SK6805 panels on
//! `/dev/spidev0.0`, refreshed at about 200 Hz.

use embassy_time::Duration;

use crate::color::{ChannelOrder, Rgb};
use crate::encoder::BYTES_PER_SYMBOL_GROUP;
use crate::error::{Error, Result};
use crate::filter::BrightnessLut;
use crate::topology::{PixelMap, Topology};

pub const DEFAULT_DEVICE: &str = "/dev/spidev0.0";
pub const DEFAULT_CLOCK_HZ: u32 = 3_200_000;
pub const DEFAULT_GAMMA: f32 = 1.2;
pub const DEFAULT_MAX_BRIGHTNESS: u8 = 32;

/// Default refresh period (~200 Hz)
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_micros(5_000);

/// Longest accepted refresh period
pub const MAX_FRAME_INTERVAL: Duration = Duration::from_secs(1);

/// Idle time the LEDs need to latch a frame before the next one may start
pub const DEFAULT_LATCH: Duration = Duration::from_micros(300);

/// Linux `spidev` rejects single transfers larger than its `bufsiz` parameter
pub const DEFAULT_MAX_TRANSFER_BYTES: usize = 4096;

/// Bytes per LED in the payload
pub const BYTES_PER_LED: usize = 3;

/// SPI clock polarity/phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpiMode {
    #[default]
    Mode0,
    Mode1,
    Mode2,
    Mode3,
}

/// Serial bus settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusConfig {
    pub device: String,
    pub clock_hz: u32,
    pub word_bits: u8,
    pub mode: SpiMode,
    pub max_transfer_bytes: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            device: DEFAULT_DEVICE.to_owned(),
            clock_hz: DEFAULT_CLOCK_HZ,
            word_bits: 8,
            mode: SpiMode::Mode0,
            max_transfer_bytes: DEFAULT_MAX_TRANSFER_BYTES,
        }
    }
}

/// Color pipeline settings
#[derive(Debug, Clone, PartialEq)]
pub struct ColorConfig {
    /// Gamma exponent applied to normalized channel values
    pub gamma: f32,
    /// Output level for a full-scale input (0-255)
    pub max_brightness: u8,
    /// White balance factors (255 = unchanged)
    pub correction: Rgb,
    /// Channel order expected by the LEDs
    pub order: ChannelOrder,
    /// Source origin is top-left, physical origin bottom-left
    pub flip_vertical: bool,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            gamma: DEFAULT_GAMMA,
            max_brightness: DEFAULT_MAX_BRIGHTNESS,
            correction: Rgb {
                r: 255,
                g: 255,
                b: 255,
            },
            order: ChannelOrder::Grb,
            flip_vertical: true,
        }
    }
}

/// Transmission cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingConfig {
    pub frame_interval: Duration,
    pub latch: Duration,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            frame_interval: DEFAULT_FRAME_INTERVAL,
            latch: DEFAULT_LATCH,
        }
    }
}

/// Complete driver configuration
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MatrixConfig {
    pub topology: Topology,
    pub color: ColorConfig,
    pub bus: BusConfig,
    pub timing: TimingConfig,
}

impl MatrixConfig {
    /// Payload bytes per frame
    pub fn payload_len(&self) -> usize {
        self.topology.led_count() * BYTES_PER_LED
    }

    /// Bus bytes per frame after symbol encoding
    pub fn encoded_len(&self) -> usize {
        self.payload_len() * BYTES_PER_SYMBOL_GROUP
    }

    /// Check every startup invariant, including the topology bijection.
    pub fn validate(&self) -> Result<()> {
        BrightnessLut::new(self.color.gamma, self.color.max_brightness)?;
        PixelMap::new(&self.topology, self.color.flip_vertical)?;

        if self.bus.clock_hz == 0 {
            return Err(Error::Config {
                reason: "bus clock must be non-zero",
            });
        }
        if self.bus.word_bits != 8 {
            return Err(Error::Config {
                reason: "the symbol stream is packed into 8-bit words",
            });
        }
        if self.timing.frame_interval.as_ticks() == 0 {
            return Err(Error::Config {
                reason: "frame interval must be non-zero",
            });
        }
        if self.timing.frame_interval > MAX_FRAME_INTERVAL {
            return Err(Error::Config {
                reason: "frame interval must not exceed one second",
            });
        }
        if self.timing.latch >= self.timing.frame_interval {
            return Err(Error::Config {
                reason: "latch gap must be shorter than the frame interval",
            });
        }
        if self.encoded_len() > self.bus.max_transfer_bytes {
            return Err(Error::Config {
                reason: "encoded frame exceeds the maximum single transfer size",
            });
        }
        Ok(())
    }
}
