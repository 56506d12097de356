// Clock implementations - system time and a manually driven clock for replay
use crate::application::clock::Clock;
use chrono::{DateTime, Local};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }

    fn monotonic(&self) -> Duration {
        self.origin.elapsed()
    }
}

#[derive(Debug)]
struct ManualTime {
    wall: DateTime<Local>,
    monotonic: Duration,
}

/// Clock that only moves when told to. Used for replaying recorded readings and
/// in tests.
#[derive(Debug)]
pub struct ManualClock {
    time: Mutex<ManualTime>,
}

impl ManualClock {
    pub fn new(start: DateTime<Local>) -> Self {
        Self {
            time: Mutex::new(ManualTime {
                wall: start,
                monotonic: Duration::ZERO,
            }),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut time = self.time.lock().unwrap_or_else(PoisonError::into_inner);
        time.monotonic += by;
        if let Ok(delta) = chrono::TimeDelta::from_std(by) {
            time.wall += delta;
        }
    }

    /// Jump the wall clock to `at`. The monotonic clock follows forward jumps
    /// and holds still on backward ones.
    pub fn set(&self, at: DateTime<Local>) {
        let mut time = self.time.lock().unwrap_or_else(PoisonError::into_inner);
        if let Ok(forward) = (at - time.wall).to_std() {
            time.monotonic += forward;
        }
        time.wall = at;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        self.time.lock().unwrap_or_else(PoisonError::into_inner).wall
    }

    fn monotonic(&self) -> Duration {
        self.time
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .monotonic
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};

    #[test]
    fn test_manual_clock_advance_moves_both() {
        let start = Local.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        let clock = ManualClock::new(start);

        clock.advance(Duration::from_secs(90));

        assert_eq!(clock.now(), start + TimeDelta::seconds(90));
        assert_eq!(clock.monotonic(), Duration::from_secs(90));
    }

    #[test]
    fn test_manual_clock_backward_set_keeps_monotonic() {
        let start = Local.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        let clock = ManualClock::new(start);

        clock.set(start + TimeDelta::minutes(2));
        clock.set(start + TimeDelta::minutes(1));

        assert_eq!(clock.now(), start + TimeDelta::minutes(1));
        assert_eq!(clock.monotonic(), Duration::from_secs(120));
    }

    #[test]
    fn test_system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let first = clock.monotonic();
        assert!(clock.monotonic() >= first);
    }
}
