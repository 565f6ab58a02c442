use crate::config::{BYTES_PER_LED, MatrixConfig};
use crate::encoder::{BYTES_PER_SYMBOL_GROUP, SymbolEncoder};
use crate::error::Result;
use crate::filter::ColorPipeline;
use crate::frame::{Frame, SharedFrame};
use crate::topology::PixelMap;

/// Frame-to-symbol pipeline - everything between the shared frame and the bus
///
/// All tables are built once in [`Renderer::new`]; the buffers are reused
/// across ticks and never reallocated.
#[derive(Debug)]
pub struct Renderer {
    // Immutable after startup
    colors: ColorPipeline,
    map: PixelMap,
    encoder: SymbolEncoder,

    // Per-tick scratch
    working: Frame,
    payload: Vec<u8>,
    encoded: Vec<u8>,
    generation: u64,
}

impl Renderer {
    /// Build the color tables and the validated pixel map
    pub fn new(config: &MatrixConfig) -> Result<Self> {
        let map = PixelMap::new(&config.topology, config.color.flip_vertical)?;
        let payload_len = map.len() * BYTES_PER_LED;

        Ok(Self {
            colors: ColorPipeline::new(&config.color)?,
            working: Frame::black(map.width(), map.height()),
            encoder: SymbolEncoder::new(),
            payload: vec![0; payload_len],
            encoded: Vec::with_capacity(payload_len * BYTES_PER_SYMBOL_GROUP),
            generation: 0,
            map,
        })
    }

    /// Snapshot, correct, map and encode the latest frame.
    ///
    /// The shared frame is locked only for the snapshot copy.
    pub fn render(&mut self, shared: &SharedFrame) -> &[u8] {
        self.generation = shared.snapshot(&mut self.working);
        self.build_payload();
        self.encoder.encode_into(&self.payload, &mut self.encoded);
        &self.encoded
    }

    /// Encode an all-black payload
    pub fn render_blank(&mut self) -> &[u8] {
        self.payload.fill(0);
        self.encoder.encode_into(&self.payload, &mut self.encoded);
        &self.encoded
    }

    /// Place every corrected source pixel at its physical offset
    fn build_payload(&mut self) {
        for (&led, &pixel) in self.map.as_slice().iter().zip(self.working.pixels()) {
            let offset = usize::from(led) * BYTES_PER_LED;
            if let Some(slot) = self.payload.get_mut(offset..offset + BYTES_PER_LED) {
                slot.copy_from_slice(&self.colors.apply(pixel));
            }
        }
    }

    /// Payload of the last render, in physical order
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Generation of the frame used by the last render
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    pub const fn colors(&self) -> &ColorPipeline {
        &self.colors
    }

    pub const fn map(&self) -> &PixelMap {
        &self.map
    }

    pub fn encoded_len(&self) -> usize {
        self.payload.len() * BYTES_PER_SYMBOL_GROUP
    }
}
