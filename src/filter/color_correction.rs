//! Color correction filter
//!
//! Applies multiplicative color correction to each RGB channel.
//! Used for white balance between panels from different batches.

use crate::color::Rgb;
use crate::math8::scale8;

/// Per-channel multiplicative scaling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorCorrection {
    /// Correction factors for each channel (0-255 = 0%-100%)
    factors: Rgb,
}

impl ColorCorrection {
    /// Create a new color correction from color
    pub const fn new(factors: Rgb) -> Self {
        Self { factors }
    }

    /// Check if correction is active
    pub const fn is_active(self) -> bool {
        self.factors.r != 255 || self.factors.g != 255 || self.factors.b != 255
    }

    #[inline]
    pub const fn apply(self, pixel: Rgb) -> Rgb {
        if !self.is_active() {
            return pixel;
        }
        Rgb {
            r: scale8(pixel.r, self.factors.r),
            g: scale8(pixel.g, self.factors.g),
            b: scale8(pixel.b, self.factors.b),
        }
    }
}

impl Default for ColorCorrection {
    fn default() -> Self {
        Self::new(Rgb {
            r: 255,
            g: 255,
            b: 255,
        })
    }
}
