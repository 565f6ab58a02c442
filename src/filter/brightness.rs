//! Gamma-corrected brightness lookup table
//!
//! The table is built once at startup and never changes afterwards.
//! Index semantics: `lut[v]` is the output level for a source channel value `v`.

use crate::error::{Error, Result};

/// Number of entries in the table, one per 8-bit channel value
pub const LUT_SIZE: usize = 256;

/// Per-channel brightness and gamma correction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrightnessLut {
    table: [u8; LUT_SIZE],
}

impl BrightnessLut {
    /// Build the table for the given gamma exponent and maximum brightness.
    ///
    /// `lut[v] = clamp(round((v / 255) ^ gamma * max_brightness), 0, 255)`
    ///
    /// Gamma must be finite and positive, otherwise the table would not be
    /// monotonic or would not start at zero.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn new(gamma: f32, max_brightness: u8) -> Result<Self> {
        if !gamma.is_finite() || gamma <= 0.0 {
            return Err(Error::Config {
                reason: "gamma must be a finite positive number",
            });
        }

        let scale = f32::from(max_brightness);
        let mut table = [0u8; LUT_SIZE];
        for (value, slot) in table.iter_mut().enumerate() {
            let normalized = value as f32 / 255.0;
            let corrected = libm::roundf(libm::powf(normalized, gamma) * scale);
            *slot = corrected.clamp(0.0, 255.0) as u8;
        }

        Ok(Self { table })
    }

    /// Identity table (gamma 1.0, full brightness)
    pub fn linear() -> Self {
        let mut table = [0u8; LUT_SIZE];
        for (value, slot) in (0..=u8::MAX).zip(table.iter_mut()) {
            *slot = value;
        }
        Self { table }
    }

    /// Corrected level for a single channel value
    #[inline]
    pub const fn get(&self, value: u8) -> u8 {
        self.table[value as usize]
    }

    /// Full table, indexed by source channel value
    pub const fn as_array(&self) -> &[u8; LUT_SIZE] {
        &self.table
    }
}
