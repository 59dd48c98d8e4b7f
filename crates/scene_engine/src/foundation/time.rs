//! Time management utilities

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch, used for scene timestamps
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

/// Frame timer driven by display-tick timestamps
///
/// The host hands over the timestamp of every display tick; the timer turns
/// those into clamped deltas. The first tick always has a zero delta.
#[derive(Debug, Clone)]
pub struct Timer {
    last_frame: Option<Duration>,
    delta_time: f32,
    total_time: f32,
    frame_count: u64,
    max_delta: f32,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new(0.1)
    }
}

impl Timer {
    /// Create a new timer that never reports a delta above `max_delta` seconds
    pub fn new(max_delta: f32) -> Self {
        Self {
            last_frame: None,
            delta_time: 0.0,
            total_time: 0.0,
            frame_count: 0,
            max_delta,
        }
    }

    /// Advance to the display tick at `now` and return the measured delta
    pub fn update(&mut self, now: Duration) -> f32 {
        let raw = self
            .last_frame
            .map_or(0.0, |last| now.saturating_sub(last).as_secs_f32());
        self.delta_time = raw.min(self.max_delta);
        self.total_time += self.delta_time;
        self.last_frame = Some(now);
        self.frame_count += 1;
        self.delta_time
    }

    /// Get the time since the last frame in seconds
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Get the total simulated time
    pub fn total_time(&self) -> f32 {
        self.total_time
    }

    /// Get the current frame count
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

/// Rate limiter allowing one event per interval
#[derive(Debug, Clone)]
pub struct Throttle {
    interval: Duration,
    last_fire: Option<Duration>,
}

impl Throttle {
    /// Create a throttle that fires at most once per `interval`
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_fire: None,
        }
    }

    /// Check whether an event may fire at `now`, recording it if so
    pub fn try_fire(&mut self, now: Duration) -> bool {
        let due = self
            .last_fire
            .map_or(true, |last| now.saturating_sub(last) >= self.interval);
        if due {
            self.last_fire = Some(now);
        }
        due
    }

    /// The configured interval
    pub fn interval(&self) -> Duration {
        self.interval
    }
}
