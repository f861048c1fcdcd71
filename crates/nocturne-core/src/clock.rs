//! Position tracking for variable-rate playback
//!
//! Audio backends expose a global monotonic clock, not a per-source
//! playback cursor. [`PositionClock`] reconstructs the cursor by
//! integrating elapsed wall time times the current rate since the last
//! sample point. The position is recomputed on every query, never cached
//! against a stale reference; the hardware clock is the only stable
//! anchor across pause/resume/seek and live rate changes.

use std::time::Instant;

/// Monotonic time source in seconds
///
/// The production implementation wraps [`std::time::Instant`]; tests
/// substitute a manually advanced clock.
pub trait WallClock {
    /// Current reading in seconds. Must be monotonic between calls from
    /// the same caller.
    fn now(&self) -> f64;
}

/// [`WallClock`] backed by `Instant`, anchored at construction time
#[derive(Debug)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl WallClock for MonotonicClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// One reading from the clock
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionSample {
    /// Position in buffer-time seconds, always within `[0, duration]`
    pub position: f64,
    /// True exactly once, on the reading that crossed the end of the track
    pub ended: bool,
}

/// Tracks the playback position in buffer-time seconds
///
/// While active, each [`sample`](PositionClock::sample) advances the
/// position by `elapsed_wall_time * rate` and re-anchors the wall
/// reference. Stopping freezes the position at its last computed value
/// (the pause point); crossing the track end clamps to the duration,
/// reports it, and deactivates.
#[derive(Debug)]
pub struct PositionClock<C: WallClock> {
    clock: C,
    position: f64,
    wall_at_sync: f64,
    active: bool,
}

impl PositionClock<MonotonicClock> {
    /// Clock for production use, driven by `Instant`
    pub fn monotonic() -> Self {
        Self::new(MonotonicClock::new())
    }
}

impl<C: WallClock> PositionClock<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            position: 0.0,
            wall_at_sync: 0.0,
            active: false,
        }
    }

    /// Begin tracking from `offset` (clamped to `[0, duration]`)
    pub fn start(&mut self, offset: f64, duration: f64) {
        self.position = offset.clamp(0.0, duration.max(0.0));
        self.wall_at_sync = self.clock.now();
        self.active = true;
    }

    /// Stop tracking; the position stays at the last computed value
    pub fn stop(&mut self) {
        self.active = false;
    }

    /// Whether the clock is currently integrating elapsed time
    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Last computed position without advancing the clock
    #[inline]
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Jump to `new_position` (clamped to `[0, duration]`)
    ///
    /// If active, the wall reference re-anchors so the elapsed time since
    /// the previous sample is discarded rather than applied on top of the
    /// seek target.
    pub fn seek(&mut self, new_position: f64, duration: f64) {
        self.position = new_position.clamp(0.0, duration.max(0.0));
        if self.active {
            self.wall_at_sync = self.clock.now();
        }
    }

    /// Advance by elapsed wall time at `rate` and return the new position
    ///
    /// Inactive clocks return the stored position unchanged. The result is
    /// clamped to `[0, duration]` no matter what the wall clock reports;
    /// crossing `duration` sets `ended` and deactivates the clock, so the
    /// end is reported exactly once.
    pub fn sample(&mut self, rate: f64, duration: f64) -> PositionSample {
        if !self.active {
            return PositionSample {
                position: self.position,
                ended: false,
            };
        }

        let now = self.clock.now();
        let elapsed = now - self.wall_at_sync;
        self.position += elapsed * rate;
        self.wall_at_sync = now;

        let mut ended = false;
        if self.position > duration {
            self.position = duration;
            self.active = false;
            ended = true;
        } else if self.position < 0.0 {
            self.position = 0.0;
        }

        PositionSample {
            position: self.position,
            ended,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Test clock advanced by hand, shared with the clock under test
    #[derive(Clone)]
    struct ManualClock(Rc<Cell<f64>>);

    impl ManualClock {
        fn new() -> Self {
            Self(Rc::new(Cell::new(0.0)))
        }

        fn advance(&self, secs: f64) {
            self.0.set(self.0.get() + secs);
        }
    }

    impl WallClock for ManualClock {
        fn now(&self) -> f64 {
            self.0.get()
        }
    }

    fn clock_pair() -> (ManualClock, PositionClock<ManualClock>) {
        let manual = ManualClock::new();
        let clock = PositionClock::new(manual.clone());
        (manual, clock)
    }

    #[test]
    fn test_position_advances_by_elapsed_times_rate() {
        let (manual, mut clock) = clock_pair();
        clock.start(0.0, 180.0);

        manual.advance(0.5);
        let s = clock.sample(1.25, 180.0);
        assert!((s.position - 0.625).abs() < 1e-9);
        assert!(!s.ended);
    }

    #[test]
    fn test_pause_preserves_position() {
        let (manual, mut clock) = clock_pair();
        clock.start(10.0, 180.0);

        manual.advance(2.0);
        clock.sample(1.25, 180.0);
        clock.stop();

        // Wall time keeps moving while paused; the position must not.
        manual.advance(60.0);
        let s = clock.sample(1.25, 180.0);
        assert!((s.position - 12.5).abs() < 1e-9);
        assert!(!s.ended);
    }

    #[test]
    fn test_start_from_offset() {
        let (manual, mut clock) = clock_pair();
        clock.start(30.0, 180.0);

        manual.advance(1.0);
        let s = clock.sample(1.5, 180.0);
        assert!((s.position - 31.5).abs() < 1e-9);
    }

    #[test]
    fn test_start_clamps_offset() {
        let (_, mut clock) = clock_pair();
        clock.start(500.0, 180.0);
        assert_eq!(clock.position(), 180.0);

        clock.start(-5.0, 180.0);
        assert_eq!(clock.position(), 0.0);
    }

    #[test]
    fn test_end_of_track_clamps_and_reports_once() {
        let (manual, mut clock) = clock_pair();
        clock.start(179.0, 180.0);

        manual.advance(10.0);
        let s = clock.sample(1.25, 180.0);
        assert_eq!(s.position, 180.0);
        assert!(s.ended);
        assert!(!clock.is_active());

        // Deactivated: further samples hold the end position quietly.
        manual.advance(10.0);
        let s = clock.sample(1.25, 180.0);
        assert_eq!(s.position, 180.0);
        assert!(!s.ended);
    }

    #[test]
    fn test_negative_elapsed_clamps_at_zero() {
        let (manual, mut clock) = clock_pair();
        manual.advance(100.0);
        clock.start(0.5, 180.0);

        // A wall clock that jumps backwards must not produce a negative
        // position.
        manual.advance(-50.0);
        let s = clock.sample(1.25, 180.0);
        assert_eq!(s.position, 0.0);
        assert!(!s.ended);
    }

    #[test]
    fn test_seek_discards_pending_elapsed() {
        let (manual, mut clock) = clock_pair();
        clock.start(0.0, 180.0);

        manual.advance(5.0);
        clock.seek(60.0, 180.0);

        manual.advance(1.0);
        let s = clock.sample(1.0, 180.0);
        // Only the second advance counts; the five seconds before the seek
        // were consumed by the re-anchor.
        assert!((s.position - 61.0).abs() < 1e-9);
    }

    #[test]
    fn test_seek_clamps_to_track() {
        let (_, mut clock) = clock_pair();
        clock.start(0.0, 180.0);
        clock.seek(999.0, 180.0);
        assert_eq!(clock.position(), 180.0);
        clock.seek(-3.0, 180.0);
        assert_eq!(clock.position(), 0.0);
    }

    #[test]
    fn test_inactive_sample_is_inert() {
        let (manual, mut clock) = clock_pair();
        manual.advance(42.0);
        let s = clock.sample(2.0, 180.0);
        assert_eq!(s.position, 0.0);
        assert!(!s.ended);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let (_, mut clock) = clock_pair();
        clock.start(1.0, 180.0);
        clock.stop();
        clock.stop();
        assert!(!clock.is_active());
        assert_eq!(clock.position(), 1.0);
    }
}
