//! Retention timer.
//!
//! Like the rest of the controller, the timer owns no thread. It is a
//! wall-clock accumulator: the caller invokes `tick()` periodically and the
//! timer flushes the time elapsed since the previous tick. Only whole
//! seconds are exposed.
//!
//! ```text
//! stopped --start--> running --stop--> stopped
//!    ^                                    |
//!    +---------------reset----------------+
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::Phase;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetentionTimer {
    elapsed_ms: u64,
    running: bool,
    /// Instant of the last flush while running.
    #[serde(default)]
    last_tick: Option<DateTime<Utc>>,
}

impl RetentionTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seconds(&self) -> u64 {
        self.elapsed_ms / 1000
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Set the running flag. A running timer is left untouched.
    pub fn start(&mut self, now: DateTime<Utc>) {
        if self.running {
            return;
        }
        self.running = true;
        self.last_tick = Some(now);
    }

    /// Clear the running flag, keeping what was counted so far.
    pub fn stop(&mut self, now: DateTime<Utc>) {
        if !self.running {
            return;
        }
        self.flush(now);
        self.running = false;
        self.last_tick = None;
    }

    pub fn reset(&mut self) {
        self.elapsed_ms = 0;
        self.running = false;
        self.last_tick = None;
    }

    /// Count elapsed time, but only in RETENTION with the flag set.
    ///
    /// Returns the new whole-second value when it changed.
    pub fn tick(&mut self, phase: Phase, now: DateTime<Utc>) -> Option<u64> {
        if phase != Phase::Retention || !self.running {
            return None;
        }
        let before = self.seconds();
        self.flush(now);
        let after = self.seconds();
        (after != before).then_some(after)
    }

    fn flush(&mut self, now: DateTime<Utc>) {
        if let Some(last) = self.last_tick {
            let elapsed = (now - last).num_milliseconds().max(0) as u64;
            self.elapsed_ms = self.elapsed_ms.saturating_add(elapsed);
            self.last_tick = Some(now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 7, 0, 0).unwrap()
    }

    #[test]
    fn counts_whole_seconds_while_running_in_retention() {
        let mut timer = RetentionTimer::new();
        timer.start(t0());
        assert_eq!(timer.tick(Phase::Retention, t0() + Duration::milliseconds(900)), None);
        assert_eq!(timer.tick(Phase::Retention, t0() + Duration::seconds(1)), Some(1));
        assert_eq!(timer.tick(Phase::Retention, t0() + Duration::seconds(12)), Some(12));
        assert_eq!(timer.seconds(), 12);
    }

    #[test]
    fn ignores_ticks_outside_retention() {
        let mut timer = RetentionTimer::new();
        timer.start(t0());
        assert_eq!(timer.tick(Phase::Meditation, t0() + Duration::seconds(5)), None);
        assert_eq!(timer.tick(Phase::Breathing, t0() + Duration::seconds(6)), None);
        assert_eq!(timer.seconds(), 0);
    }

    #[test]
    fn ignores_ticks_when_not_running() {
        let mut timer = RetentionTimer::new();
        assert_eq!(timer.tick(Phase::Retention, t0() + Duration::seconds(5)), None);
        assert_eq!(timer.seconds(), 0);
    }

    #[test]
    fn stop_then_start_resumes_without_double_counting() {
        let mut timer = RetentionTimer::new();
        timer.start(t0());
        timer.stop(t0() + Duration::seconds(4));
        // Paused for ten seconds.
        timer.start(t0() + Duration::seconds(14));
        timer.tick(Phase::Retention, t0() + Duration::seconds(17));
        assert_eq!(timer.seconds(), 7);
    }

    #[test]
    fn stop_counts_up_to_the_stop_instant() {
        let mut timer = RetentionTimer::new();
        timer.start(t0());
        timer.tick(Phase::Retention, t0() + Duration::seconds(3));
        timer.stop(t0() + Duration::milliseconds(12_500));
        assert!(!timer.is_running());
        assert_eq!(timer.tick(Phase::Retention, t0() + Duration::seconds(20)), None);
        assert_eq!(timer.seconds(), 12);
    }

    #[test]
    fn reset_clears_count() {
        let mut timer = RetentionTimer::new();
        timer.start(t0());
        timer.stop(t0() + Duration::seconds(8));
        timer.reset();
        assert_eq!(timer.seconds(), 0);
        assert!(!timer.is_running());
    }

    proptest! {
        #[test]
        fn total_matches_running_time(spans in proptest::collection::vec((0i64..5_000, 0i64..5_000), 1..20)) {
            // Alternating running/paused spans in milliseconds.
            let mut timer = RetentionTimer::new();
            let mut now = t0();
            let mut running_ms = 0i64;
            for (run, pause) in spans {
                timer.start(now);
                now += Duration::milliseconds(run);
                timer.tick(Phase::Retention, now);
                timer.stop(now);
                running_ms += run;
                now += Duration::milliseconds(pause);
                timer.tick(Phase::Retention, now);
            }
            prop_assert_eq!(timer.seconds(), (running_ms / 1000) as u64);
        }
    }
}
