//! Load-based pacing: pause the transfer while system load is above a ceiling.
//!
//! Checked only when a progress line is displayed, so a fast copy does not
//! query the load on every chunk.

mod source;

pub use source::{LoadSource, SystemLoad};

use std::io;
use std::time::Duration;

use crate::clock::Clock;

pub const DEFAULT_PAUSE: Duration = Duration::from_secs(5);
/// Throttling starts at this fraction of the ceiling.
pub const DEFAULT_HEADROOM: f64 = 0.95;

/// What the governor did during one check, reported to the caller for display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ThrottleEvent {
    /// Load was at or above the threshold; about to sleep for `pause`.
    Pausing { load: f64, pause: Duration },
    /// The load query failed; throttling is now off for the rest of the run.
    Unavailable,
}

pub struct LoadGovernor {
    ceiling: f64,
    headroom: f64,
    pause: Duration,
    source: Box<dyn LoadSource>,
    enabled: bool,
}

impl LoadGovernor {
    pub fn new(ceiling: f64, source: Box<dyn LoadSource>) -> Self {
        Self {
            ceiling,
            headroom: DEFAULT_HEADROOM,
            pause: DEFAULT_PAUSE,
            source,
            enabled: ceiling > 0.0,
        }
    }

    /// Governor over the operating system's load average.
    pub fn system(ceiling: f64) -> Self {
        Self::new(ceiling, Box::new(SystemLoad))
    }

    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    pub fn with_headroom(mut self, headroom: f64) -> Self {
        self.headroom = headroom;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn threshold(&self) -> f64 {
        self.ceiling * self.headroom
    }

    /// Poll the load and sleep in fixed steps until it drops below the threshold
    /// or the query stops working. `on_event` is told about every pause and
    /// about the query becoming unavailable (once).
    pub fn maybe_throttle<C, F>(&mut self, clock: &C, mut on_event: F) -> io::Result<()>
    where
        C: Clock + ?Sized,
        F: FnMut(ThrottleEvent) -> io::Result<()>,
    {
        while self.enabled {
            let Some(load) = self.source.current_load() else {
                tracing::warn!("system load unavailable, disabling max-load throttling");
                self.enabled = false;
                on_event(ThrottleEvent::Unavailable)?;
                break;
            };
            if load < self.threshold() {
                break;
            }
            tracing::debug!(load, ceiling = self.ceiling, "load above ceiling, pausing");
            on_event(ThrottleEvent::Pausing {
                load,
                pause: self.pause,
            })?;
            clock.sleep(self.pause);
        }
        Ok(())
    }
}

impl std::fmt::Debug for LoadGovernor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadGovernor")
            .field("ceiling", &self.ceiling)
            .field("headroom", &self.headroom)
            .field("pause", &self.pause)
            .field("enabled", &self.enabled)
            .finish()
    }
}
