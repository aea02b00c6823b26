//! Time management utilities
//!
//! The render loop never reads the wall clock directly. It asks a
//! [`TimeSource`] for the current timestamp and feeds it to a [`FrameClock`],
//! which turns raw timestamps into monotonic elapsed/delta pairs.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Source of monotonic timestamps for the frame clock
///
/// Timestamps are measured from an arbitrary origin chosen by the source.
pub trait TimeSource {
    /// Current timestamp
    fn now(&self) -> Duration;
}

/// Time source backed by `std::time::Instant`
#[derive(Debug, Clone)]
pub struct SystemTimeSource {
    origin: Instant,
}

impl SystemTimeSource {
    /// Create a source whose origin is the moment of construction
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Manually driven time source
///
/// Clones share the same underlying timestamp, so a host (or a test) can
/// keep one handle and give the other to the render loop.
#[derive(Debug, Clone, Default)]
pub struct ManualTimeSource {
    now: Rc<Cell<Duration>>,
}

impl ManualTimeSource {
    /// Create a source starting at timestamp zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the timestamp forward
    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    /// Set the timestamp to an absolute value (may go backwards)
    pub fn set(&self, at: Duration) {
        self.now.set(at);
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// Timing of a single frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTime {
    /// Time since the clock was started
    pub elapsed: Duration,

    /// Time since the previous frame (zero on the first frame)
    pub delta: Duration,

    /// 1-based frame index
    pub frame: u64,
}

impl FrameTime {
    /// Elapsed time in seconds
    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }

    /// Delta time in seconds
    pub fn delta_secs(&self) -> f32 {
        self.delta.as_secs_f32()
    }
}

/// Frame clock deriving elapsed and delta time from host timestamps
///
/// Host timestamps that go backwards (or repeat because of limited timer
/// resolution) are clamped to the last frame, so `delta` is never negative
/// and `elapsed` never decreases.
#[derive(Debug, Clone)]
pub struct FrameClock {
    start: Duration,
    last_frame: Duration,
    frame_count: u64,
}

impl FrameClock {
    /// Start a clock at the given timestamp
    pub fn start(now: Duration) -> Self {
        Self {
            start: now,
            last_frame: now,
            frame_count: 0,
        }
    }

    /// Advance to a new frame timestamp
    pub fn advance(&mut self, now: Duration) -> FrameTime {
        let now = now.max(self.last_frame);
        let delta = now - self.last_frame;
        self.last_frame = now;
        self.frame_count += 1;

        FrameTime {
            elapsed: now - self.start,
            delta,
            frame: self.frame_count,
        }
    }

    /// Time from start to the most recent frame
    pub fn elapsed(&self) -> Duration {
        self.last_frame - self.start
    }

    /// Number of frames advanced so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Get the average FPS since the clock started
    pub fn average_fps(&self) -> f32 {
        let total = self.elapsed().as_secs_f32();
        if total > 0.0 {
            self.frame_count as f32 / total
        } else {
            0.0
        }
    }
}

/// Simple stopwatch for measuring elapsed time
pub struct Stopwatch {
    start_time: Option<Instant>,
    elapsed: Duration,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Stopwatch {
    /// Create a new stopped stopwatch
    pub fn new() -> Self {
        Self {
            start_time: None,
            elapsed: Duration::ZERO,
        }
    }

    /// Create a new stopwatch and start it immediately
    pub fn start_new() -> Self {
        let mut stopwatch = Self::new();
        stopwatch.start();
        stopwatch
    }

    /// Start the stopwatch
    pub fn start(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Stop the stopwatch and accumulate elapsed time
    pub fn stop(&mut self) {
        if let Some(start) = self.start_time {
            self.elapsed += start.elapsed();
            self.start_time = None;
        }
    }

    /// Get the elapsed time
    pub fn elapsed(&self) -> Duration {
        let current_elapsed = self.start_time.map_or(Duration::ZERO, |start| start.elapsed());
        self.elapsed + current_elapsed
    }

    /// Get the elapsed time in milliseconds
    pub fn elapsed_millis(&self) -> f32 {
        self.elapsed().as_secs_f32() * 1000.0
    }

    /// Check if the stopwatch is currently running
    pub fn is_running(&self) -> bool {
        self.start_time.is_some()
    }
}
