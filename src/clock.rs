//! Countdown clock with bonus and malus applied to the deadline.
//!
//! Time is never read from the system here: every call takes the host's
//! `now`, which keeps the clock deterministic under test.

use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::debug;

/// State of the clock after a tick.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockStatus {
    /// Not started yet: the first move arms it.
    Idle,
    Running,
    Expired,
}

/// A recently applied bonus, shown until `expires_at`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BonusDisplay {
    pub seconds: i64,
    pub expires_at: Instant,
}

#[derive(Clone, Debug)]
pub struct SessionClock {
    duration: Duration,
    display_window: Duration,
    started_at: Option<Instant>,
    /// Signed total of all bonuses and maluses.
    bonus_seconds: i64,
    remaining: f64,
    display: Option<BonusDisplay>,
}

impl SessionClock {
    pub fn new(duration: Duration, display_window: Duration) -> Self {
        Self {
            duration,
            display_window,
            started_at: None,
            bonus_seconds: 0,
            remaining: duration.as_secs_f64(),
            display: None,
        }
    }

    /// Arm the clock. Later calls keep the first start.
    pub fn start(&mut self, now: Instant) {
        if self.started_at.is_none() {
            debug!("clock started");
            self.started_at = Some(now);
        }
    }

    pub fn is_started(&self) -> bool {
        self.started_at.is_some()
    }

    /// Seconds since the clock was armed, 0 before that.
    pub fn elapsed(&self, now: Instant) -> f64 {
        self.started_at
            .map(|t| now.saturating_duration_since(t).as_secs_f64())
            .unwrap_or(0.0)
    }

    /// Recompute the remaining time and drop an expired bonus display.
    pub fn tick(&mut self, now: Instant) -> ClockStatus {
        if self.display.is_some_and(|d| now >= d.expires_at) {
            self.display = None;
        }

        if self.started_at.is_none() {
            self.remaining = self.total_seconds().max(0.0);
            return ClockStatus::Idle;
        }

        self.remaining = (self.total_seconds() - self.elapsed(now)).max(0.0);
        if self.remaining <= 0.0 {
            ClockStatus::Expired
        } else {
            ClockStatus::Running
        }
    }

    /// Add `seconds` (negative for a malus) to the deadline and show it.
    ///
    /// A newer bonus replaces the display of an older one, along with its expiry.
    pub fn apply_bonus(&mut self, seconds: i64, now: Instant) {
        self.bonus_seconds += seconds;
        self.display = Some(BonusDisplay {
            seconds,
            expires_at: now + self.display_window,
        });
        debug!(seconds, total = self.bonus_seconds, "bonus applied");
    }

    pub fn bonus_seconds(&self) -> i64 {
        self.bonus_seconds
    }

    /// Remaining seconds as of the last tick.
    pub fn remaining_seconds(&self) -> f64 {
        self.remaining
    }

    /// Bonus still on display as of the last tick or apply.
    pub fn displayed_bonus(&self) -> Option<i64> {
        self.display.map(|d| d.seconds)
    }

    fn total_seconds(&self) -> f64 {
        self.duration.as_secs_f64() + self.bonus_seconds as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock() -> SessionClock {
        SessionClock::new(Duration::from_secs(180), Duration::from_secs(1))
    }

    #[test]
    fn test_idle_until_started() {
        let mut c = clock();
        let t0 = Instant::now();
        assert_eq!(c.tick(t0 + Duration::from_secs(500)), ClockStatus::Idle);
        assert_eq!(c.remaining_seconds(), 180.0);
        assert_eq!(c.elapsed(t0), 0.0);
    }

    #[test]
    fn test_start_is_idempotent() {
        let mut c = clock();
        let t0 = Instant::now();
        c.start(t0);
        c.start(t0 + Duration::from_secs(50));
        c.tick(t0 + Duration::from_secs(60));
        assert_eq!(c.remaining_seconds(), 120.0);
    }

    #[test]
    fn test_bonus_moves_deadline() {
        let mut c = clock();
        let t0 = Instant::now();
        c.start(t0);
        c.apply_bonus(5, t0);
        c.apply_bonus(-10, t0);
        assert_eq!(c.bonus_seconds(), -5);
        assert_eq!(c.tick(t0 + Duration::from_secs(100)), ClockStatus::Running);
        assert_eq!(c.remaining_seconds(), 75.0);
        assert_eq!(c.tick(t0 + Duration::from_secs(175)), ClockStatus::Expired);
        assert_eq!(c.remaining_seconds(), 0.0);
    }

    #[test]
    fn test_display_clears_but_total_stays() {
        let mut c = clock();
        let t0 = Instant::now();
        c.start(t0);
        c.apply_bonus(3, t0);
        c.tick(t0 + Duration::from_millis(500));
        assert_eq!(c.displayed_bonus(), Some(3));
        c.tick(t0 + Duration::from_millis(1000));
        assert_eq!(c.displayed_bonus(), None);
        assert_eq!(c.bonus_seconds(), 3);
    }

    #[test]
    fn test_newer_bonus_display_wins() {
        let mut c = clock();
        let t0 = Instant::now();
        c.start(t0);
        c.apply_bonus(3, t0);
        c.apply_bonus(-10, t0 + Duration::from_millis(800));
        // The first bonus would have cleared at 1000ms; the malus must survive it
        c.tick(t0 + Duration::from_millis(1200));
        assert_eq!(c.displayed_bonus(), Some(-10));
        c.tick(t0 + Duration::from_millis(1800));
        assert_eq!(c.displayed_bonus(), None);
    }
}
