//! LED matrix daemon
//!
//! Pushes frames from a frame source into the shared frame slot and drives
//! the panels over spidev until SIGINT/SIGTERM or the end of the source.

mod source;

use std::sync::Arc;
use std::thread;

use anyhow::{Context as _, Result, anyhow};
use clap::Parser;
use log::{info, warn};
use myrtio_matrix_spi::{
    BusTransport, ChannelOrder, Context, Duration, FrameScheduler, MatrixConfig, PanelTransform,
    PulseTiming, Renderer, RunSummary, ShutdownFlag, TimingConfig,
    config::{
        BusConfig, ColorConfig, DEFAULT_CLOCK_HZ, DEFAULT_DEVICE, DEFAULT_GAMMA,
        DEFAULT_MAX_BRIGHTNESS,
    },
    topology::Topology,
    transport::NullTransport,
};
use signal_hook::consts::{SIGINT, SIGTERM};
use tracing_subscriber::EnvFilter;

use crate::source::FrameSource;

#[derive(Parser, Debug)]
#[command(name = "myrtio-matrix-daemon")]
#[command(about = "Drive SK6805 LED panels over SPI from a frame source", long_about = None)]
#[command(version)]
struct Cli {
    /// Frame source: `test`, `-`/`stdin`, or a path to raw rgb24 frames
    #[arg(short, long, default_value = "test")]
    source: String,
    /// SPI device node
    #[arg(long, default_value = DEFAULT_DEVICE)]
    device: String,
    /// SPI clock in Hz
    #[arg(long, default_value_t = DEFAULT_CLOCK_HZ)]
    spi_hz: u32,
    /// Gamma exponent for the brightness table
    #[arg(long, default_value_t = DEFAULT_GAMMA)]
    gamma: f32,
    /// Output level for a full-scale channel (0-255)
    #[arg(long, default_value_t = DEFAULT_MAX_BRIGHTNESS)]
    brightness: u8,
    /// Refresh interval in microseconds
    #[arg(long, default_value_t = 5_000)]
    interval_us: u64,
    /// Latch gap after each frame in microseconds
    #[arg(long, default_value_t = 300)]
    latch_us: u64,
    /// Transform of every panel after the first: identity, mirror-x, rotate-180
    #[arg(long, default_value = "identity", value_parser = parse_transform)]
    panel_transform: PanelTransform,
    /// Channel order expected by the LEDs
    #[arg(long, default_value = "grb", value_parser = parse_channel_order)]
    channel_order: ChannelOrder,
    /// Keep the source's top row on the panels' first physical row
    #[arg(long)]
    no_flip_vertical: bool,
    /// Run the whole pipeline without opening the SPI device
    #[arg(long)]
    dry_run: bool,
}

impl Cli {
    fn config(&self) -> MatrixConfig {
        MatrixConfig {
            topology: Topology::default().with_trailing_transform(self.panel_transform),
            color: ColorConfig {
                gamma: self.gamma,
                max_brightness: self.brightness,
                order: self.channel_order,
                flip_vertical: !self.no_flip_vertical,
                ..ColorConfig::default()
            },
            bus: BusConfig {
                device: self.device.clone(),
                clock_hz: self.spi_hz,
                ..BusConfig::default()
            },
            timing: TimingConfig {
                frame_interval: Duration::from_micros(self.interval_us),
                latch: Duration::from_micros(self.latch_us),
            },
        }
    }
}

fn parse_transform(s: &str) -> Result<PanelTransform, String> {
    PanelTransform::parse_from_str(s).ok_or_else(|| format!("unknown panel transform `{s}`"))
}

fn parse_channel_order(s: &str) -> Result<ChannelOrder, String> {
    ChannelOrder::parse_from_str(s).ok_or_else(|| format!("unknown channel order `{s}`"))
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let config = cli.config();
    config.validate().context("invalid configuration")?;
    let renderer = Renderer::new(&config).context("cannot build the frame pipeline")?;

    let timing = PulseTiming::at_clock(config.bus.clock_hz);
    info!(
        "{}x{} matrix, {} panels, bit period {} ns (T0H {} ns, T1H {} ns)",
        config.topology.width(),
        config.topology.height(),
        config.topology.panel_count(),
        timing.bit_ns,
        timing.t0h_ns,
        timing.t1h_ns
    );

    let shutdown = ShutdownFlag::new();
    for signal in [SIGINT, SIGTERM] {
        signal_hook::flag::register(signal, Arc::clone(shutdown.as_atomic()))
            .context("cannot install signal handler")?;
    }

    let source = FrameSource::open(&cli.source)?;
    let transport = open_transport(&cli, &config)?;
    let scheduler = FrameScheduler::new(renderer, transport, config.timing);

    let context = Arc::new(Context::with_shutdown(
        config.topology.width(),
        config.topology.height(),
        shutdown,
    ));
    let summary = drive(scheduler, source, &context)?;

    if summary.failed_transfers > 0 {
        warn!("{} of {} transfers failed", summary.failed_transfers, summary.ticks);
    }
    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Open the bus. Failures here end the process before any thread starts.
fn open_transport(cli: &Cli, config: &MatrixConfig) -> Result<Box<dyn BusTransport + Send>> {
    if cli.dry_run {
        info!("dry run: frames are encoded but not sent");
        return Ok(Box::new(NullTransport::new()));
    }
    open_bus(config)
}

#[cfg(feature = "spidev")]
fn open_bus(config: &MatrixConfig) -> Result<Box<dyn BusTransport + Send>> {
    let transport = myrtio_matrix_spi::transport::SpidevTransport::open(&config.bus)?;
    Ok(Box::new(transport))
}

#[cfg(not(feature = "spidev"))]
fn open_bus(_config: &MatrixConfig) -> Result<Box<dyn BusTransport + Send>> {
    Err(anyhow!("built without spidev support, use --dry-run"))
}

/// Run the frame source on its own thread and the scheduler on this one.
///
/// The source thread is not joined: it may be blocked on a read that never
/// completes, and must not keep the display from being blanked.
fn drive(
    scheduler: FrameScheduler<Box<dyn BusTransport + Send>>,
    source: FrameSource,
    context: &Arc<Context>,
) -> Result<RunSummary> {
    let producer_context = Arc::clone(context);
    thread::Builder::new()
        .name("frame-source".to_owned())
        .spawn(move || {
            source.run(&producer_context);
            producer_context.shutdown().request();
        })
        .map_err(|err| anyhow!("cannot start frame source thread: {err}"))?;

    Ok(scheduler.run(context))
}
