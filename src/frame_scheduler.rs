//! Fixed-cadence transmission loop.
//!
//! Each tick runs snapshot → transform and map → encode → transmit, then the
//! caller waits out the latch gap and sleeps until the next absolute deadline.
//! Deadlines advance by a fixed interval from the previous deadline rather
//! than from "now", so per-tick processing time does not accumulate as drift.

use embassy_time::{Duration, Instant};
use log::{debug, info, trace, warn};

use crate::BusTransport;
use crate::config::TimingConfig;
use crate::context::Context;
use crate::error::Error;
use crate::frame::SharedFrame;
use crate::renderer::Renderer;

/// Maximum lag, in frame intervals, before the deadline is re-anchored to now.
///
/// If we fall behind by more than this, we skip the backlog instead of catching up.
pub const MAX_DRIFT_FRAMES: u32 = 2;

/// Log every Nth failure of an uninterrupted failure streak
const FAILURE_LOG_EVERY: u64 = 100;

/// Result of a frame tick operation.
#[derive(Debug, Clone, Copy)]
pub struct FrameResult {
    /// The deadline for the next frame.
    pub next_deadline: Instant,
    /// How long to wait until the next frame (may be zero if behind schedule).
    pub sleep_duration: Duration,
    /// Whether the bus accepted the frame.
    pub transmitted: bool,
}

/// Counters collected over the lifetime of the loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Ticks executed, not counting the final blanking transfer
    pub ticks: u64,
    /// Ticks whose transfer failed
    pub failed_transfers: u64,
    /// Ticks that re-sent a frame already sent on the previous tick
    pub repeated_frames: u64,
    /// Whether the final blanking transfer succeeded
    pub blanked: bool,
}

/// Drives the renderer and the bus transport at a fixed cadence.
///
/// This scheduler:
/// - Tracks frame deadlines with drift correction
/// - Renders the latest shared frame and writes it to the bus
/// - Treats failed transfers as transient: they are logged, never propagated
/// - Blanks the display once on shutdown before releasing the bus
///
/// # Usage
///
/// ```ignore
/// let renderer = Renderer::new(&config)?;
/// let transport = SpidevTransport::open(&config.bus)?;
/// let scheduler = FrameScheduler::new(renderer, transport, config.timing);
///
/// std::thread::scope(|s| {
///     s.spawn(|| scheduler.run(&context));
///     // push frames into context.frame() here
/// });
/// ```
pub struct FrameScheduler<T: BusTransport> {
    transport: T,
    renderer: Renderer,
    next_frame: Instant,
    frame_duration: Duration,
    latch: Duration,
    summary: RunSummary,
    last_generation: Option<u64>,
    failure_streak: u64,
}

impl<T: BusTransport> FrameScheduler<T> {
    pub fn new(renderer: Renderer, transport: T, timing: TimingConfig) -> Self {
        Self {
            transport,
            renderer,
            next_frame: Instant::from_millis(0),
            frame_duration: timing.frame_interval,
            latch: timing.latch,
            summary: RunSummary::default(),
            last_generation: None,
            failure_streak: 0,
        }
    }

    /// Process one frame and return timing information.
    ///
    /// This method:
    /// 1. Applies drift correction if we've fallen too far behind
    /// 2. Renders the latest shared frame
    /// 3. Writes it to the bus
    /// 4. Returns the deadline for the next frame
    ///
    /// The caller is responsible for the latch gap and for waiting until
    /// `next_deadline` before calling `tick` again.
    pub fn tick(&mut self, frame: &SharedFrame, now: Instant) -> FrameResult {
        let drift_limit = self
            .frame_duration
            .checked_mul(MAX_DRIFT_FRAMES)
            .and_then(|max_drift| self.next_frame.checked_add(max_drift))
            .unwrap_or(Instant::MAX);
        if now > drift_limit {
            if self.summary.ticks > 0 {
                debug!(
                    "fell behind by {} us, re-anchoring frame deadline",
                    (now - self.next_frame).as_micros()
                );
            }
            self.next_frame = now;
        }

        let stream = self.renderer.render(frame);
        let transmitted = Self::transmit(
            &mut self.transport,
            stream,
            &mut self.failure_streak,
            &mut self.summary,
        );

        let generation = self.renderer.generation();
        if self.last_generation == Some(generation) {
            self.summary.repeated_frames += 1;
        }
        self.last_generation = Some(generation);
        self.summary.ticks += 1;
        trace!("tick {} sent frame {generation}", self.summary.ticks);

        self.next_frame = self
            .next_frame
            .checked_add(self.frame_duration)
            .unwrap_or(Instant::MAX);

        let sleep_duration = self
            .next_frame
            .checked_duration_since(now)
            .unwrap_or(Duration::from_ticks(0));

        FrameResult {
            next_deadline: self.next_frame,
            sleep_duration,
            transmitted,
        }
    }

    /// Run until the shutdown flag is raised, then blank the display.
    ///
    /// The flag is polled once per tick boundary, so the tick in progress
    /// always completes. The bus is released when this returns.
    pub fn run(mut self, context: &Context) -> RunSummary {
        info!(
            "transmitting {} bytes every {} us (latch {} us)",
            self.renderer.encoded_len(),
            self.frame_duration.as_micros(),
            self.latch.as_micros()
        );

        self.next_frame = Instant::now();
        while !context.shutdown().is_requested() {
            let result = self.tick(context.frame(), Instant::now());
            sleep(self.latch);
            sleep_until(result.next_deadline);
        }

        self.blank();
        let summary = self.summary;
        info!(
            "stopped after {} ticks ({} failed transfers, {} repeated frames)",
            summary.ticks, summary.failed_transfers, summary.repeated_frames
        );
        summary
    }

    /// Send one all-black frame and wait out the latch gap
    pub fn blank(&mut self) -> bool {
        let stream = self.renderer.render_blank();
        let sent = match self.transport.transfer(stream) {
            Ok(written) if written == stream.len() => true,
            Ok(written) => {
                warn!("short blanking transfer: {written} of {} bytes", stream.len());
                false
            }
            Err(err) => {
                warn!("failed to blank display: {err}");
                false
            }
        };
        sleep(self.latch);
        self.summary.blanked = sent;
        sent
    }

    fn transmit(
        transport: &mut T,
        stream: &[u8],
        failure_streak: &mut u64,
        summary: &mut RunSummary,
    ) -> bool {
        let result = match transport.transfer(stream) {
            Ok(written) if written == stream.len() => Ok(()),
            Ok(written) => Err(Error::ShortTransfer {
                written,
                expected: stream.len(),
            }),
            Err(err) => Err(err),
        };

        match result {
            Ok(()) => {
                if *failure_streak > 0 {
                    info!("bus recovered after {failure_streak} failed transfers");
                    *failure_streak = 0;
                }
                true
            }
            Err(err) => {
                *failure_streak += 1;
                summary.failed_transfers += 1;
                if *failure_streak == 1 || *failure_streak % FAILURE_LOG_EVERY == 0 {
                    warn!("transfer failed ({failure_streak} in a row): {err}");
                }
                false
            }
        }
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn summary(&self) -> RunSummary {
        self.summary
    }
}

fn sleep(duration: Duration) {
    if duration.as_ticks() > 0 {
        std::thread::sleep(std::time::Duration::from_micros(duration.as_micros()));
    }
}

fn sleep_until(deadline: Instant) {
    if let Some(remaining) = deadline.checked_duration_since(Instant::now()) {
        sleep(remaining);
    }
}
