mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};
    use std::time::Duration as StdDuration;

    use embassy_time::{Duration, Instant};
    use myrtio_matrix_spi::color::Rgb;
    use myrtio_matrix_spi::transport::NullTransport;
    use myrtio_matrix_spi::{
        BusTransport, Context, Error, Frame, FrameScheduler, MatrixConfig, Renderer, Result,
        SharedFrame, TimingConfig,
    };

    const RED: Rgb = Rgb { r: 255, g: 0, b: 0 };

    /// Shared log of every transfer
    type Log = Arc<Mutex<Vec<Vec<u8>>>>;

    #[derive(Clone, Copy)]
    enum Behavior {
        Accept,
        Fail,
        Short,
    }

    struct RecordingTransport {
        log: Log,
        behavior: Behavior,
    }

    impl RecordingTransport {
        fn new(behavior: Behavior) -> (Self, Log) {
            let log = Log::default();
            (
                Self {
                    log: Arc::clone(&log),
                    behavior,
                },
                log,
            )
        }
    }

    impl BusTransport for RecordingTransport {
        fn transfer(&mut self, bytes: &[u8]) -> Result<usize> {
            self.log.lock().unwrap().push(bytes.to_vec());
            match self.behavior {
                Behavior::Accept => Ok(bytes.len()),
                Behavior::Fail => Err(Error::Transfer {
                    source: io::Error::other("bus unplugged"),
                }),
                Behavior::Short => Ok(bytes.len() / 2),
            }
        }
    }

    fn fast_timing() -> TimingConfig {
        TimingConfig {
            frame_interval: Duration::from_millis(5),
            latch: Duration::from_micros(300),
        }
    }

    fn scheduler<T: BusTransport>(transport: T) -> FrameScheduler<T> {
        let renderer = Renderer::new(&MatrixConfig::default()).unwrap();
        FrameScheduler::new(renderer, transport, fast_timing())
    }

    #[test]
    fn test_all_red_frame_end_to_end() {
        let (transport, log) = RecordingTransport::new(Behavior::Accept);
        let mut scheduler = scheduler(transport);
        let shared = SharedFrame::new(26, 9);
        shared.write(&Frame::filled(26, 9, RED)).unwrap();

        let result = scheduler.tick(&shared, Instant::from_millis(0));
        assert!(result.transmitted);

        let full = scheduler.renderer().colors().lut().get(255);
        let payload = scheduler.renderer().payload();
        assert_eq!(payload.len(), 234 * 3);
        assert!(payload.chunks_exact(3).all(|led| led == [0, full, 0]));

        let log = log.lock().unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].len(), 2808);
        assert_eq!(myrtio_matrix_spi::encoder::decode(&log[0]), payload);
    }

    #[test]
    fn test_single_pixel_lands_on_flipped_row() {
        let (transport, _log) = RecordingTransport::new(Behavior::Accept);
        let mut scheduler = scheduler(transport);
        let shared = SharedFrame::new(26, 9);
        let mut frame = Frame::black(26, 9);
        frame.set(0, 0, RED);
        shared.write(&frame).unwrap();

        scheduler.tick(&shared, Instant::from_millis(0));

        let full = scheduler.renderer().colors().lut().get(255);
        let payload = scheduler.renderer().payload();
        // Source top-left is the first LED of the top physical row
        let led = 104 * 3;
        assert_eq!(&payload[led..led + 3], &[0, full, 0]);
        assert_eq!(payload.iter().filter(|&&b| b != 0).count(), 1);
    }

    #[test]
    fn test_deadlines_advance_from_previous_deadline() {
        let mut scheduler = scheduler(NullTransport::new());
        let shared = SharedFrame::new(26, 9);

        let first = scheduler.tick(&shared, Instant::from_millis(0));
        assert_eq!(first.next_deadline.as_micros(), 5_000);
        assert_eq!(first.sleep_duration.as_micros(), 5_000);

        // Late by one millisecond, the next deadline still lands on the grid
        let second = scheduler.tick(&shared, Instant::from_micros(6_000));
        assert_eq!(second.next_deadline.as_micros(), 10_000);
        assert_eq!(second.sleep_duration.as_micros(), 4_000);

        // Hopelessly behind: the backlog is dropped
        let third = scheduler.tick(&shared, Instant::from_millis(100));
        assert_eq!(third.next_deadline.as_micros(), 105_000);
        assert_eq!(third.sleep_duration.as_micros(), 5_000);

        assert_eq!(scheduler.transport().transfers(), 3);
        assert_eq!(scheduler.transport().bytes(), 3 * 2808);
    }

    #[test]
    fn test_stalled_producer_repeats_last_frame() {
        let (transport, log) = RecordingTransport::new(Behavior::Accept);
        let mut scheduler = scheduler(transport);
        let shared = SharedFrame::new(26, 9);
        shared.write(&Frame::filled(26, 9, RED)).unwrap();

        for i in 0..3 {
            scheduler.tick(&shared, Instant::from_millis(i * 5));
        }

        let summary = scheduler.summary();
        assert_eq!(summary.ticks, 3);
        assert_eq!(summary.repeated_frames, 2);
        let log = log.lock().unwrap();
        assert!(log.iter().all(|transfer| transfer == &log[0]));
    }

    #[test]
    fn test_failed_transfers_do_not_stop_the_loop() {
        let (transport, log) = RecordingTransport::new(Behavior::Fail);
        let mut scheduler = scheduler(transport);
        let shared = SharedFrame::new(26, 9);

        for i in 0..4 {
            let result = scheduler.tick(&shared, Instant::from_millis(i * 5));
            assert!(!result.transmitted);
            assert_eq!(result.next_deadline.as_micros(), (i + 1) * 5_000);
        }

        assert_eq!(scheduler.summary().failed_transfers, 4);
        assert_eq!(log.lock().unwrap().len(), 4);
    }

    #[test]
    fn test_short_transfer_counts_as_failure() {
        let (transport, _log) = RecordingTransport::new(Behavior::Short);
        let mut scheduler = scheduler(transport);
        let shared = SharedFrame::new(26, 9);

        assert!(!scheduler.tick(&shared, Instant::from_millis(0)).transmitted);
        assert_eq!(scheduler.summary().failed_transfers, 1);
        assert!(!scheduler.blank());
    }

    #[test]
    fn test_shutdown_before_start_only_blanks() {
        let (transport, log) = RecordingTransport::new(Behavior::Accept);
        let scheduler = scheduler(transport);
        let context = Context::new(26, 9);
        context.frame().write(&Frame::filled(26, 9, RED)).unwrap();
        context.shutdown().request();

        let summary = scheduler.run(&context);

        assert_eq!(summary.ticks, 0);
        assert!(summary.blanked);
        let log = log.lock().unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].len(), 2808);
        assert!(log[0].iter().all(|&b| b == 0x88));
    }

    #[test]
    fn test_run_blanks_after_shutdown() {
        let (transport, log) = RecordingTransport::new(Behavior::Accept);
        let scheduler = scheduler(transport);
        let context = Context::new(26, 9);
        context.frame().write(&Frame::filled(26, 9, RED)).unwrap();

        let summary = std::thread::scope(|s| {
            let handle = s.spawn(|| scheduler.run(&context));
            std::thread::sleep(StdDuration::from_millis(50));
            context.shutdown().request();
            handle.join().unwrap()
        });

        assert!(summary.ticks > 0);
        assert!(summary.blanked);
        assert_eq!(summary.failed_transfers, 0);

        let log = log.lock().unwrap();
        assert_eq!(log.len() as u64, summary.ticks + 1);
        let (last, frames) = log.split_last().unwrap();
        assert!(last.iter().all(|&b| b == 0x88));
        assert!(frames.iter().all(|transfer| transfer.iter().any(|&b| b != 0x88)));
    }

    #[test]
    fn test_reference_config_is_valid() {
        let config = MatrixConfig::default();
        config.validate().unwrap();
        assert_eq!(config.payload_len(), 702);
        assert_eq!(config.encoded_len(), 2808);
    }

    #[test]
    fn test_config_rejects_oversized_transfer() {
        let mut config = MatrixConfig::default();
        config.bus.max_transfer_bytes = 2807;
        assert!(matches!(config.validate(), Err(Error::Config { .. })));
    }

    #[test]
    fn test_config_rejects_latch_longer_than_interval() {
        let mut config = MatrixConfig::default();
        config.timing.latch = config.timing.frame_interval;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_rejects_huge_interval() {
        let mut config = MatrixConfig::default();
        config.timing.frame_interval = Duration::from_secs(2);
        assert!(matches!(config.validate(), Err(Error::Config { .. })));

        config.timing.frame_interval = Duration::from_micros(u64::MAX / 2 + 1);
        assert!(matches!(config.validate(), Err(Error::Config { .. })));

        config.timing.frame_interval = Duration::from_secs(1);
        config.validate().unwrap();
    }

    #[test]
    fn test_tick_saturates_unvalidated_interval() {
        let renderer = Renderer::new(&MatrixConfig::default()).unwrap();
        let timing = TimingConfig {
            frame_interval: Duration::from_micros(u64::MAX / 2 + 1),
            latch: Duration::from_micros(300),
        };
        let mut scheduler = FrameScheduler::new(renderer, NullTransport::new(), timing);
        let shared = SharedFrame::new(26, 9);

        assert!(scheduler.tick(&shared, Instant::from_millis(0)).transmitted);
        let second = scheduler.tick(&shared, Instant::from_millis(5));
        assert!(second.transmitted);
        assert_eq!(second.next_deadline, Instant::MAX);
        assert_eq!(scheduler.summary().ticks, 2);
    }
}
