//! Latest-wins frame slot shared between the frame source and the scheduler.
//!
//! A single-slot buffer guarded by a mutex. The producer overwrites it, the
//! consumer copies it out once per tick. The lock is held only while copying,
//! so neither side can stall the other for longer than a memcpy.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::color::Rgb;
use crate::error::{Error, Result};

/// Channel layout of a raw source buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceOrder {
    #[default]
    Rgb,
    Bgr,
}

impl SourceOrder {
    #[inline]
    const fn decode(self, px: [u8; 3]) -> Rgb {
        match self {
            Self::Rgb => Rgb {
                r: px[0],
                g: px[1],
                b: px[2],
            },
            Self::Bgr => Rgb {
                r: px[2],
                g: px[1],
                b: px[0],
            },
        }
    }
}

/// A W×H grid of RGB pixels, origin top-left, row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: usize,
    height: usize,
    pixels: Vec<Rgb>,
}

impl Frame {
    /// All-black frame
    pub fn black(width: usize, height: usize) -> Self {
        Self::filled(width, height, Rgb::default())
    }

    pub fn filled(width: usize, height: usize, color: Rgb) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; width * height],
        }
    }

    pub const fn width(&self) -> usize {
        self.width
    }

    pub const fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [Rgb] {
        &mut self.pixels
    }

    pub fn get(&self, x: usize, y: usize) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(y * self.width + x).copied()
    }

    pub fn set(&mut self, x: usize, y: usize, color: Rgb) {
        if x >= self.width || y >= self.height {
            return;
        }
        if let Some(px) = self.pixels.get_mut(y * self.width + x) {
            *px = color;
        }
    }

    pub fn fill(&mut self, color: Rgb) {
        self.pixels.fill(color);
    }

    fn check_size(&self, width: usize, height: usize) -> Result<()> {
        if width == self.width && height == self.height {
            return Ok(());
        }
        Err(Error::FrameSize {
            width,
            height,
            expected_width: self.width,
            expected_height: self.height,
        })
    }

    /// Overwrite from a raw 3-bytes-per-pixel buffer with `row_stride` bytes per row
    fn copy_from_raw(&mut self, buffer: &[u8], order: SourceOrder, row_stride: usize) {
        let width = self.width;
        if width == 0 {
            return;
        }
        for (row, dest) in self.pixels.chunks_exact_mut(width).enumerate() {
            let start = row * row_stride;
            let src = &buffer[start..start + width * 3];
            for (px, chunk) in dest.iter_mut().zip(src.chunks_exact(3)) {
                *px = order.decode([chunk[0], chunk[1], chunk[2]]);
            }
        }
    }
}

/// Single-slot, latest-wins frame buffer
///
/// Holds the most recently completed frame. Writes never wait for the
/// consumer; intermediate frames written between two snapshots are dropped.
#[derive(Debug)]
pub struct SharedFrame {
    inner: Mutex<Slot>,
}

#[derive(Debug)]
struct Slot {
    frame: Frame,
    generation: u64,
}

impl SharedFrame {
    /// Create a slot holding an all-black frame
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            inner: Mutex::new(Slot {
                frame: Frame::black(width, height),
                generation: 0,
            }),
        }
    }

    // A writer that panicked mid-copy cannot leave a half-sized frame behind,
    // so the data behind a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the stored frame.
    ///
    /// Fails without touching the slot if the dimensions differ.
    pub fn write(&self, frame: &Frame) -> Result<()> {
        let mut slot = self.lock();
        slot.frame.check_size(frame.width, frame.height)?;
        slot.frame.pixels.copy_from_slice(&frame.pixels);
        slot.generation = slot.generation.wrapping_add(1);
        Ok(())
    }

    /// Copy a raw source buffer into the slot.
    ///
    /// `buffer` holds `height` rows of `row_stride` bytes, each row starting
    /// with `width` pixels of three bytes in `order`. The data is copied before
    /// returning, so the caller may reuse the buffer immediately.
    pub fn push_frame(
        &self,
        buffer: &[u8],
        width: usize,
        height: usize,
        order: SourceOrder,
        row_stride: usize,
    ) -> Result<()> {
        let mut slot = self.lock();
        slot.frame.check_size(width, height)?;

        let row_bytes = width * 3;
        if row_stride < row_bytes {
            return Err(Error::FrameBuffer {
                needed: row_bytes,
                actual: row_stride,
            });
        }
        let needed = raw_len(row_bytes, height, row_stride).ok_or(Error::FrameBuffer {
            needed: usize::MAX,
            actual: buffer.len(),
        })?;
        if buffer.len() < needed {
            return Err(Error::FrameBuffer {
                needed,
                actual: buffer.len(),
            });
        }

        slot.frame.copy_from_raw(buffer, order, row_stride);
        slot.generation = slot.generation.wrapping_add(1);
        Ok(())
    }

    /// Copy the latest frame into `out`, returning its generation.
    ///
    /// `out` is resized to the slot's dimensions if needed.
    pub fn snapshot(&self, out: &mut Frame) -> u64 {
        let slot = self.lock();
        if out.width == slot.frame.width && out.height == slot.frame.height {
            out.pixels.copy_from_slice(&slot.frame.pixels);
        } else {
            out.clone_from(&slot.frame);
        }
        slot.generation
    }

    /// Number of completed writes so far
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    pub fn width(&self) -> usize {
        self.lock().frame.width
    }

    pub fn height(&self) -> usize {
        self.lock().frame.height
    }
}

/// Bytes spanned by `height` rows of `row_stride`, the last one cut to `row_bytes`
fn raw_len(row_bytes: usize, height: usize, row_stride: usize) -> Option<usize> {
    match height {
        0 => Some(0),
        _ => row_stride.checked_mul(height - 1)?.checked_add(row_bytes),
    }
}
