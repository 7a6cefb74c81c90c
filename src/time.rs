//! Frame timing and the virtual day clock.
//!
//! Two clocks drive the engine:
//!
//! - [`FrameTimer`] measures real frame durations for the host loop.
//! - [`VirtualClock`] is the simulated time of day in `[0, 24)` that sets the
//!   planet's rotation. The engine only reads it, except through the
//!   [`ClockControl`] callbacks it issues while the user drags or gestures.
//!
//! ```ignore
//! let mut timer = FrameTimer::new();
//! let mut clock = VirtualClock::new(240.0, 12.0);
//!
//! // In the render loop:
//! let dt = timer.update();
//! clock.tick(dt);
//! engine.update(dt, clock.hours());
//! ```

use std::f32::consts::TAU;
use std::time::{Duration, Instant};

/// Hours in one virtual day.
pub const HOURS_PER_DAY: f32 = 24.0;

/// Planet rotation angle in radians for a clock value.
///
/// `6.0` hours maps to a quarter turn.
#[inline]
pub fn rotation_angle(hours: f32) -> f32 {
    (hours / HOURS_PER_DAY) * TAU
}

/// Wrap an hour value into `[0, 24)`.
#[inline]
pub fn wrap_hours(hours: f32) -> f32 {
    let wrapped = hours.rem_euclid(HOURS_PER_DAY);
    // rem_euclid can round up to exactly 24.0 for tiny negative inputs
    if wrapped >= HOURS_PER_DAY {
        0.0
    } else {
        wrapped
    }
}

/// Requests the engine issues to whoever owns the virtual clock.
pub trait ClockControl {
    /// Stop automatic advancement.
    fn pause(&mut self);
    /// Resume automatic advancement.
    fn resume(&mut self);
    /// Jump to an hour value in `[0, 24)`.
    fn set_hours(&mut self, hours: f32);
}

/// Real-time frame timer.
#[derive(Debug)]
pub struct FrameTimer {
    last_frame: Instant,
    delta_secs: f32,
    elapsed_secs: f32,
    frame_count: u64,
    fps: f32,
    fps_frame_count: u64,
    fps_update_time: Instant,
    fps_update_interval: Duration,
    /// Upper bound on one delta, so a stalled window does not fling particles.
    max_delta: f32,
    fixed_delta: Option<f32>,
}

impl FrameTimer {
    /// Create a timer starting now.
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            last_frame: now,
            delta_secs: 0.0,
            elapsed_secs: 0.0,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: now,
            fps_update_interval: Duration::from_millis(500),
            max_delta: 0.25,
            fixed_delta: None,
        }
    }

    /// Measure the time since the previous call. Call once per frame.
    pub fn update(&mut self) -> f32 {
        let now = Instant::now();
        let raw = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.delta_secs = self.fixed_delta.unwrap_or(raw).min(self.max_delta);
        self.elapsed_secs += self.delta_secs;
        self.frame_count += 1;

        let fps_elapsed = now.duration_since(self.fps_update_time);
        if fps_elapsed >= self.fps_update_interval {
            let frames = self.frame_count - self.fps_frame_count;
            self.fps = frames as f32 / fps_elapsed.as_secs_f32();
            self.fps_frame_count = self.frame_count;
            self.fps_update_time = now;
        }

        self.delta_secs
    }

    /// Use a fixed delta instead of measured frame time.
    pub fn set_fixed_delta(&mut self, delta: Option<f32>) {
        self.fixed_delta = delta;
    }

    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta_secs
    }

    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed_secs
    }

    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}

/// Simulated time of day.
///
/// Advances `24 / day_seconds` hours per real second while playing.
#[derive(Debug, Clone, PartialEq)]
pub struct VirtualClock {
    hours: f32,
    playing: bool,
    day_seconds: f32,
}

impl VirtualClock {
    /// Create a playing clock.
    pub fn new(day_seconds: f32, start_hours: f32) -> Self {
        Self {
            hours: wrap_hours(start_hours),
            playing: true,
            day_seconds: day_seconds.max(f32::EPSILON),
        }
    }

    /// Advance by `dt` real seconds if playing.
    pub fn tick(&mut self, dt: f32) {
        if self.playing {
            self.hours = wrap_hours(self.hours + HOURS_PER_DAY / self.day_seconds * dt);
        }
    }

    #[inline]
    pub fn hours(&self) -> f32 {
        self.hours
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.playing
    }
}

impl ClockControl for VirtualClock {
    fn pause(&mut self) {
        self.playing = false;
    }

    fn resume(&mut self) {
        self.playing = true;
    }

    fn set_hours(&mut self, hours: f32) {
        self.hours = wrap_hours(hours);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_rotation_angle_quarter_day() {
        assert!((rotation_angle(6.0) - FRAC_PI_2).abs() < 1e-6);
        assert_eq!(rotation_angle(0.0), 0.0);
    }

    #[test]
    fn test_wrap_hours() {
        assert_eq!(wrap_hours(25.0), 1.0);
        assert_eq!(wrap_hours(-1.0), 23.0);
        assert_eq!(wrap_hours(24.0), 0.0);
        assert!(wrap_hours(-1e-9) < 24.0);
    }

    #[test]
    fn test_clock_advances_and_wraps() {
        let mut clock = VirtualClock::new(240.0, 23.5);
        // 10 s = 1 hour
        clock.tick(10.0);
        assert!((clock.hours() - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_clock_pause_holds_value() {
        let mut clock = VirtualClock::new(240.0, 12.0);
        clock.pause();
        clock.tick(30.0);
        assert_eq!(clock.hours(), 12.0);
        clock.resume();
        clock.tick(10.0);
        assert!((clock.hours() - 13.0).abs() < 1e-4);
    }

    #[test]
    fn test_fixed_delta() {
        let mut timer = FrameTimer::new();
        timer.set_fixed_delta(Some(1.0 / 60.0));
        std::thread::sleep(Duration::from_millis(5));
        let dt = timer.update();
        assert!((dt - 1.0 / 60.0).abs() < 1e-6);
        assert_eq!(timer.frame(), 1);
    }
}
