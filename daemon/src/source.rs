//! Frame producers feeding the shared frame slot.

use std::fs::File;
use std::io::{self, BufReader, ErrorKind, Read};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context as _, Result};
use log::{debug, info, warn};
use myrtio_matrix_spi::{
    Context, Frame, Hsv, SourceOrder,
    color::hsv2rgb,
};

/// Target rate of the built-in test pattern
const PATTERN_INTERVAL: Duration = Duration::from_millis(33);
/// Hue advance per pattern frame
const PATTERN_HUE_STEP: u8 = 2;
/// Hue offset between neighbouring columns
const PATTERN_COLUMN_SPREAD: u8 = 8;

pub enum FrameSource {
    /// Scrolling rainbow, regenerated at a fixed rate
    Pattern,
    /// Tightly packed rgb24 frames, one after another
    Raw {
        name: String,
        reader: Box<dyn Read + Send>,
    },
}

impl FrameSource {
    /// `test`, `-`/`stdin`, or a file path
    pub fn open(spec: &str) -> Result<Self> {
        match spec {
            "test" => Ok(Self::Pattern),
            "-" | "stdin" => Ok(Self::Raw {
                name: "stdin".to_owned(),
                reader: Box::new(io::stdin()),
            }),
            path => {
                let file = File::open(path).with_context(|| format!("cannot open {path}"))?;
                Ok(Self::Raw {
                    name: path.to_owned(),
                    reader: Box::new(BufReader::new(file)),
                })
            }
        }
    }

    /// Produce frames until shutdown is requested or the source ends
    pub fn run(self, context: &Context) {
        match self {
            Self::Pattern => run_pattern(context),
            Self::Raw { name, reader } => run_raw(&name, reader, context),
        }
    }
}

fn run_pattern(context: &Context) {
    let shared = context.frame();
    let mut frame = Frame::black(shared.width(), shared.height());
    let mut hue: u8 = 0;

    info!("playing test pattern");
    while !context.shutdown().is_requested() {
        let started = Instant::now();
        draw_rainbow(&mut frame, hue);
        if let Err(err) = shared.write(&frame) {
            warn!("test pattern rejected: {err}");
            return;
        }
        hue = hue.wrapping_add(PATTERN_HUE_STEP);
        if let Some(remaining) = PATTERN_INTERVAL.checked_sub(started.elapsed()) {
            thread::sleep(remaining);
        }
    }
}

/// Columns cycle through the hue wheel; rows fade towards the bottom
fn draw_rainbow(frame: &mut Frame, hue: u8) {
    let height = frame.height();
    for y in 0..height {
        let val = 255 - u8::try_from(y * 128 / height.max(1)).unwrap_or(u8::MAX);
        for x in 0..frame.width() {
            let column = u8::try_from(x % 256).unwrap_or(0);
            let color = hsv2rgb(Hsv {
                hue: hue.wrapping_add(column.wrapping_mul(PATTERN_COLUMN_SPREAD)),
                sat: 255,
                val,
            });
            frame.set(x, y, color);
        }
    }
}

fn run_raw(name: &str, mut reader: Box<dyn Read + Send>, context: &Context) {
    let shared = context.frame();
    let (width, height) = (shared.width(), shared.height());
    let row_stride = width * 3;
    let mut buffer = vec![0u8; row_stride * height];
    let mut frames: u64 = 0;

    info!("reading {width}x{height} rgb24 frames from {name}");
    while !context.shutdown().is_requested() {
        match reader.read_exact(&mut buffer) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::UnexpectedEof => {
                info!("{name} ended after {frames} frames");
                return;
            }
            Err(err) => {
                warn!("reading {name} failed: {err}");
                return;
            }
        }
        if let Err(err) = shared.push_frame(&buffer, width, height, SourceOrder::Rgb, row_stride) {
            warn!("frame {frames} dropped: {err}");
            continue;
        }
        frames += 1;
        debug!("frame {frames} pushed");
    }
}
