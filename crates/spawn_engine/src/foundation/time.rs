//! Time management utilities
//!
//! Everything in the spawn pipeline is tick driven. There are no suspended
//! coroutines: a "wait N seconds then do X" is a [`Deadline`] armed at some
//! time and compared against the clock on every tick. Cancelling is clearing
//! the deadline.

/// Monotonic time source, advanced externally once per tick
pub trait Clock {
    /// Current time in seconds since the session started
    fn now(&self) -> f64;
}

/// Clock driven by explicit delta-time updates
///
/// Used by the headless session and by tests. Negative or non-finite deltas
/// are ignored so the clock can never run backwards.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: f64,
    frame_count: u64,
}

impl ManualClock {
    /// Create a clock starting at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the clock by `delta_time` seconds
    pub fn advance(&mut self, delta_time: f64) {
        if delta_time.is_finite() && delta_time > 0.0 {
            self.now += delta_time;
        }
        self.frame_count += 1;
    }

    /// Number of `advance` calls so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Rewind to zero (full game restart)
    pub fn reset(&mut self) {
        self.now = 0.0;
        self.frame_count = 0;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        self.now
    }
}

/// A timed effect armed at some point and due at a later time
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Deadline {
    armed: Option<(f64, f64)>,
}

impl Deadline {
    /// An unarmed deadline
    pub const fn unarmed() -> Self {
        Self { armed: None }
    }

    /// Arm the deadline so it becomes due `duration` seconds after `now`
    ///
    /// Re-arming replaces any previously armed time.
    pub fn arm(&mut self, now: f64, duration: f64) {
        self.armed = Some((now, now + duration.max(0.0)));
    }

    /// Clear the deadline
    pub fn cancel(&mut self) {
        self.armed = None;
    }

    /// Whether the deadline is currently armed
    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// Whether the deadline is armed and has been reached
    pub fn is_due(&self, now: f64) -> bool {
        matches!(self.armed, Some((_, due)) if now >= due)
    }

    /// Disarm and report `true` if the deadline was due
    pub fn fire(&mut self, now: f64) -> bool {
        if self.is_due(now) {
            self.armed = None;
            true
        } else {
            false
        }
    }

    /// Seconds left until due, `None` when unarmed
    pub fn remaining(&self, now: f64) -> Option<f64> {
        self.armed.map(|(_, due)| (due - now).max(0.0))
    }

    /// Time the deadline was armed at, `None` when unarmed
    pub fn armed_at(&self) -> Option<f64> {
        self.armed.map(|(at, _)| at)
    }
}
