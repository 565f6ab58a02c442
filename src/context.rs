//! Resources shared between the frame source and the scheduler.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::frame::SharedFrame;

/// Cooperative cancellation flag
///
/// Cheap to clone; all clones observe the same flag. The inner
/// `Arc<AtomicBool>` can be handed to a signal handler directly.
#[derive(Debug, Clone, Default)]
pub struct ShutdownFlag {
    inner: Arc<AtomicBool>,
}

impl ShutdownFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every loop polling this flag to stop
    pub fn request(&self) {
        self.inner.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.inner.load(Ordering::SeqCst)
    }

    /// Shared atomic, for registering with signal handlers
    pub fn as_atomic(&self) -> &Arc<AtomicBool> {
        &self.inner
    }
}

/// Everything the producer and the scheduler share
///
/// Constructed once at startup and borrowed by both threads.
#[derive(Debug)]
pub struct Context {
    frame: SharedFrame,
    shutdown: ShutdownFlag,
}

impl Context {
    pub fn new(width: usize, height: usize) -> Self {
        Self::with_shutdown(width, height, ShutdownFlag::new())
    }

    pub fn with_shutdown(width: usize, height: usize, shutdown: ShutdownFlag) -> Self {
        Self {
            frame: SharedFrame::new(width, height),
            shutdown,
        }
    }

    pub fn frame(&self) -> &SharedFrame {
        &self.frame
    }

    pub fn shutdown(&self) -> &ShutdownFlag {
        &self.shutdown
    }
}
