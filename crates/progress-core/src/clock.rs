//! Time source for the progress engine.
//!
//! Elapsed time is tracked in whole seconds. `sleep` is the only place the
//! engine suspends, so tests drive both through `ManualClock`.

use std::cell::Cell;
use std::time::{Duration, Instant};

pub trait Clock {
    /// Whole seconds since an arbitrary, fixed origin.
    fn now_secs(&self) -> u64;

    /// Block the calling thread for `duration`.
    fn sleep(&self, duration: Duration);
}

/// Wall clock backed by `Instant`.
#[derive(Debug, Clone, Copy)]
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
    fn now_secs(&self) -> u64 {
        self.origin.elapsed().as_secs()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Deterministic clock: time only moves via `set`, `advance` or `sleep`.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<u64>,
    slept: Cell<u64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, secs: u64) {
        self.now.set(secs);
    }

    pub fn advance(&self, secs: u64) {
        self.now.set(self.now.get() + secs);
    }

    /// Total seconds spent in `sleep`.
    pub fn slept_secs(&self) -> u64 {
        self.slept.get()
    }
}

impl Clock for ManualClock {
    fn now_secs(&self) -> u64 {
        self.now.get()
    }

    fn sleep(&self, duration: Duration) {
        let secs = duration.as_secs();
        self.slept.set(self.slept.get() + secs);
        self.advance(secs);
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_secs(&self) -> u64 {
        (**self).now_secs()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_sleep_advances_time() {
        let clock = ManualClock::new();
        clock.set(10);
        clock.sleep(Duration::from_secs(5));
        assert_eq!(clock.now_secs(), 15);
        assert_eq!(clock.slept_secs(), 5);
    }

    #[test]
    fn system_clock_starts_near_zero() {
        let clock = SystemClock::new();
        assert!(clock.now_secs() <= 1);
    }
}
