//! Frame timing.
//!
//! One [`Time`] per app is the single source of truth for elapsed time, delta
//! time and frame pacing. The frame loop does not spin: after each frame it
//! asks for [`Time::next_deadline`] and hands that to winit as
//! `ControlFlow::WaitUntil`.
//!
//! # Example
//!
//! ```ignore
//! use precip::time::Time;
//!
//! let mut time = Time::with_frame_interval(Duration::from_millis(20));
//!
//! // In the frame loop:
//! let (elapsed, dt) = time.update();
//! field.simulate(elapsed, dt);
//! event_loop.set_control_flow(ControlFlow::WaitUntil(time.next_deadline()));
//! ```

use std::time::{Duration, Instant};

/// Default pacing interval between frames.
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(20);

/// Longest delta ever reported. Window drags and breakpoints can stall the
/// loop for seconds; the field would otherwise jump a whole box.
pub const MAX_DELTA: f32 = 0.1;

/// Time tracking for the frame loop.
#[derive(Debug)]
pub struct Time {
    start: Instant,
    last_frame: Instant,
    /// Last call to `update`, paused or not. Frame deadlines count from here.
    last_tick: Instant,
    elapsed_secs: f32,
    delta_secs: f32,
    frame_count: u64,
    /// Updated every `fps_update_interval`.
    fps: f32,
    fps_frame_count: u64,
    fps_update_time: Instant,
    fps_update_interval: Duration,
    paused: bool,
    /// Total time spent paused, subtracted from elapsed.
    pause_elapsed: Duration,
    fixed_delta: Option<f32>,
    frame_interval: Duration,
}

impl Time {
    /// Start a timer paced at [`DEFAULT_FRAME_INTERVAL`].
    pub fn new() -> Self {
        Self::with_frame_interval(DEFAULT_FRAME_INTERVAL)
    }

    pub fn with_frame_interval(frame_interval: Duration) -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_frame: now,
            last_tick: now,
            elapsed_secs: 0.0,
            delta_secs: 0.0,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: now,
            fps_update_interval: Duration::from_millis(500),
            paused: false,
            pause_elapsed: Duration::ZERO,
            fixed_delta: None,
            frame_interval,
        }
    }

    /// Update timing values. Call once per frame.
    ///
    /// Returns `(elapsed_time, delta_time)` for convenience.
    pub fn update(&mut self) -> (f32, f32) {
        self.update_at(Instant::now())
    }

    fn update_at(&mut self, now: Instant) -> (f32, f32) {
        self.last_tick = now;
        if self.paused {
            self.delta_secs = 0.0;
            return (self.elapsed_secs, self.delta_secs);
        }

        let raw_delta = now.saturating_duration_since(self.last_frame).as_secs_f32();
        self.delta_secs = self.fixed_delta.unwrap_or(raw_delta).min(MAX_DELTA);
        self.last_frame = now;

        let raw_elapsed = now
            .saturating_duration_since(self.start)
            .saturating_sub(self.pause_elapsed);
        self.elapsed_secs = raw_elapsed.as_secs_f32();

        self.frame_count += 1;

        let fps_elapsed = now.saturating_duration_since(self.fps_update_time);
        if fps_elapsed >= self.fps_update_interval {
            let frames_since = self.frame_count - self.fps_frame_count;
            self.fps = frames_since as f32 / fps_elapsed.as_secs_f32();
            self.fps_frame_count = self.frame_count;
            self.fps_update_time = now;
        }

        (self.elapsed_secs, self.delta_secs)
    }

    /// Total elapsed time in seconds, excluding pauses.
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed_secs
    }

    /// Seconds since the previous frame, at most [`MAX_DELTA`].
    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta_secs
    }

    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    #[inline]
    pub fn frame_interval(&self) -> Duration {
        self.frame_interval
    }

    /// Pause time progression.
    ///
    /// While paused, `delta()` returns 0 and `elapsed()` stops increasing.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume time progression after pausing.
    pub fn resume(&mut self) {
        if self.paused {
            let now = Instant::now();
            self.pause_elapsed += now.saturating_duration_since(self.last_frame);
            self.last_frame = now;
            self.paused = false;
        }
    }

    /// Toggle pause state. Returns the new state.
    pub fn toggle_pause(&mut self) -> bool {
        if self.paused {
            self.resume();
        } else {
            self.pause();
        }
        self.paused
    }

    /// Use a fixed delta instead of wall-clock deltas. `None` restores real
    /// frame timing.
    pub fn set_fixed_delta(&mut self, delta: Option<f32>) {
        self.fixed_delta = delta;
    }

    pub fn set_frame_interval(&mut self, interval: Duration) {
        self.frame_interval = interval;
    }

    /// Instant at which the next frame is due.
    ///
    /// If the last frame overran the interval the deadline is already in the
    /// past and the loop wakes immediately.
    #[inline]
    pub fn next_deadline(&self) -> Instant {
        self.last_tick + self.frame_interval
    }

    /// Whether the next frame is due at `now`.
    #[inline]
    pub fn frame_due(&self, now: Instant) -> bool {
        now >= self.next_deadline()
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}
