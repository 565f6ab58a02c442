//! Color pipeline: per-channel correction and reordering into wire order.
//!
//! Processing is applied in a fixed order:
//! color correction, then the brightness/gamma table, then channel reordering.

mod brightness;
mod color_correction;

pub use brightness::{BrightnessLut, LUT_SIZE};
pub use color_correction::ColorCorrection;

use crate::color::{ChannelOrder, Rgb};
use crate::config::ColorConfig;
use crate::error::Result;

/// Turns source pixels into protocol-ordered, corrected channel bytes
///
/// Built once at startup from [`ColorConfig`] and immutable afterwards.
#[derive(Debug, Clone)]
pub struct ColorPipeline {
    correction: ColorCorrection,
    lut: BrightnessLut,
    order: ChannelOrder,
}

impl ColorPipeline {
    pub fn new(config: &ColorConfig) -> Result<Self> {
        Ok(Self {
            correction: ColorCorrection::new(config.correction),
            lut: BrightnessLut::new(config.gamma, config.max_brightness)?,
            order: config.order,
        })
    }

    /// Correct a single source pixel and reorder it for the wire
    #[inline]
    pub fn apply(&self, pixel: Rgb) -> [u8; 3] {
        let pixel = self.correction.apply(pixel);
        self.order.apply(Rgb {
            r: self.lut.get(pixel.r),
            g: self.lut.get(pixel.g),
            b: self.lut.get(pixel.b),
        })
    }

    pub const fn lut(&self) -> &BrightnessLut {
        &self.lut
    }

    pub const fn order(&self) -> ChannelOrder {
        self.order
    }
}
