//! Progress tracker: owns the byte counters of one transfer and decides when
//! a progress line is due.
//!
//! Lifecycle is `Idle -> Running -> Finished`, or `Running -> Failed` on a
//! collaborator error. A line is emitted when the truncated percent changes
//! or `refresh_secs` have passed since the last one, and never when the total
//! size is unknown.

mod render;

use std::fmt;
use std::io::Write;

use crate::accountant::{StreamMode, GZIP_TRAILER_LEN};
use crate::clock::Clock;
use crate::error::ProgressError;
use crate::load::{LoadGovernor, ThrottleEvent};
use crate::rate::{RateEstimator, DEFAULT_RATE_INTERVAL_SECS};

/// Default maximum gap between two progress lines.
pub const DEFAULT_REFRESH_SECS: u64 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    Idle,
    Running,
    Finished,
    Failed,
}

#[derive(Debug, Clone)]
pub struct TrackerSettings {
    /// Re-display at least this often even if the percent did not change.
    pub refresh_secs: u64,
    /// Minimum gap between rate recalculations; also the earliest ETA.
    pub rate_interval_secs: u64,
    /// Print the "starting" line on `start`.
    pub announce_start: bool,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            refresh_secs: DEFAULT_REFRESH_SECS,
            rate_interval_secs: DEFAULT_RATE_INTERVAL_SECS,
            announce_start: true,
        }
    }
}

/// Cumulative counters of the running transfer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferState {
    pub bytes_consumed: u64,
    /// 0 when the size is unknown.
    pub bytes_total: u64,
    pub start_secs: u64,
    pub elapsed_secs: u64,
}

/// What was last put on screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisplayState {
    pub last_shown_percent: u32,
    pub last_shown_at: u64,
}

pub struct ProgressTracker<C, W> {
    label: String,
    mode: StreamMode,
    settings: TrackerSettings,
    clock: C,
    sink: W,
    governor: Option<LoadGovernor>,
    state: TrackerState,
    transfer: TransferState,
    display: DisplayState,
    rate: RateEstimator,
    lines: u64,
}

impl<C: Clock, W: Write> ProgressTracker<C, W> {
    /// `label` names the input in every line; `sink` is the diagnostic stream.
    pub fn new(label: impl Into<String>, mode: StreamMode, clock: C, sink: W) -> Self {
        let settings = TrackerSettings::default();
        Self {
            label: label.into(),
            mode,
            rate: RateEstimator::new(settings.rate_interval_secs),
            settings,
            clock,
            sink,
            governor: None,
            state: TrackerState::Idle,
            transfer: TransferState::default(),
            display: DisplayState::default(),
            lines: 0,
        }
    }

    pub fn with_settings(mut self, settings: TrackerSettings) -> Self {
        self.rate = RateEstimator::new(settings.rate_interval_secs);
        self.settings = settings;
        self
    }

    /// Consult `governor` every time a progress line is displayed.
    pub fn with_governor(mut self, governor: LoadGovernor) -> Self {
        self.governor = Some(governor);
        self
    }

    pub fn state(&self) -> TrackerState {
        self.state
    }

    pub fn transfer(&self) -> &TransferState {
        &self.transfer
    }

    pub fn display(&self) -> &DisplayState {
        &self.display
    }

    /// Progress lines (percent or `n/a`) written so far.
    pub fn lines_emitted(&self) -> u64 {
        self.lines
    }

    pub fn sink(&self) -> &W {
        &self.sink
    }

    /// Begin timing. `total_bytes` is 0 when the size is unknown.
    pub fn start(&mut self, total_bytes: u64) -> Result<(), ProgressError> {
        self.expect_state(TrackerState::Idle)?;
        if self.settings.announce_start {
            let line = render::startup_line(&self.label, total_bytes);
            self.write_line(&line);
        }
        let now = self.clock.now_secs();
        self.transfer = TransferState {
            bytes_consumed: 0,
            bytes_total: total_bytes,
            start_secs: now,
            elapsed_secs: 0,
        };
        self.display = DisplayState::default();
        self.state = TrackerState::Running;
        tracing::info!(label = %self.label, total_bytes, mode = ?self.mode, "transfer started");
        Ok(())
    }

    /// Account for `delta_bytes` more input. Returns whether a line was emitted.
    pub fn report(&mut self, delta_bytes: u64) -> Result<bool, ProgressError> {
        self.expect_state(TrackerState::Running)?;
        self.transfer.bytes_consumed = self.transfer.bytes_consumed.saturating_add(delta_bytes);
        Ok(self.refresh(false))
    }

    /// Forced final report followed by the "finished." line.
    ///
    /// Returns the final percent, `None` when the total was unknown.
    pub fn finish(&mut self) -> Result<Option<f64>, ProgressError> {
        self.expect_state(TrackerState::Running)?;
        self.refresh(true);
        let percent = self.percent(true);
        let elapsed = self.elapsed_now();
        self.transfer.elapsed_secs = elapsed;
        let line = render::finished_line(elapsed, &self.label);
        self.write_line(&line);
        self.state = TrackerState::Finished;
        tracing::info!(
            label = %self.label,
            bytes = self.transfer.bytes_consumed,
            elapsed_secs = elapsed,
            "transfer finished"
        );
        Ok(percent)
    }

    /// Abort the transfer; later reports are rejected.
    pub fn fail(&mut self, reason: &dyn fmt::Display) -> Result<(), ProgressError> {
        self.expect_state(TrackerState::Running)?;
        self.state = TrackerState::Failed;
        tracing::error!(
            label = %self.label,
            bytes = self.transfer.bytes_consumed,
            "transfer failed: {}",
            reason
        );
        Ok(())
    }

    /// Percent complete, `None` if unknown or overshooting.
    ///
    /// The forced (final) variant reports exactly 100 once all input is in,
    /// counting a gzip stream that is short only by its trailer as complete.
    fn percent(&self, forced: bool) -> Option<f64> {
        let TransferState {
            bytes_consumed: consumed,
            bytes_total: total,
            ..
        } = self.transfer;
        if total == 0 {
            return None;
        }
        if forced {
            let complete = consumed >= total
                || (self.mode == StreamMode::Gzip
                    && consumed.saturating_add(GZIP_TRAILER_LEN) >= total);
            if complete {
                return Some(100.0);
            }
        }
        if consumed > total {
            return None;
        }
        Some(consumed as f64 / total as f64 * 100.0)
    }

    fn refresh(&mut self, forced: bool) -> bool {
        let total = self.transfer.bytes_total;
        if total == 0 {
            return false;
        }
        let consumed = self.transfer.bytes_consumed;
        let percent = self.percent(forced);
        let elapsed = self.elapsed_now();
        self.transfer.elapsed_secs = elapsed;

        let mut rate = None;
        if elapsed >= self.settings.rate_interval_secs || forced {
            let r = self.rate.update(elapsed, consumed);
            if r > 0.0 {
                let eta_secs = (total.saturating_sub(consumed) as f64 / r) as u64;
                rate = Some((r, eta_secs));
            }
        }

        let shown_percent = percent.map_or(0, |p| p as u32);
        let due = shown_percent != self.display.last_shown_percent
            || elapsed.saturating_sub(self.display.last_shown_at) >= self.settings.refresh_secs;
        if !due {
            return false;
        }

        let line = match percent {
            Some(p) => render::progress_line(elapsed, &self.label, p, rate),
            None => render::overshoot_line(elapsed, &self.label),
        };
        self.write_line(&line);
        self.lines += 1;

        self.throttle();

        self.display = DisplayState {
            last_shown_percent: shown_percent,
            last_shown_at: self.elapsed_now(),
        };
        true
    }

    fn throttle(&mut self) {
        let Some(governor) = self.governor.as_mut() else {
            return;
        };
        let clock = &self.clock;
        let sink = &mut self.sink;
        let label = self.label.as_str();
        let start = self.transfer.start_secs;
        let result = governor.maybe_throttle(clock, |event| {
            let line = match event {
                ThrottleEvent::Pausing { load, pause } => render::load_pause_line(
                    clock.now_secs().saturating_sub(start),
                    label,
                    load,
                    pause.as_secs(),
                ),
                ThrottleEvent::Unavailable => render::LOAD_UNAVAILABLE.to_string(),
            };
            writeln!(sink, "{}", line)
        });
        if let Err(e) = result {
            tracing::warn!(error = %e, "failed to report load throttling");
        }
    }

    fn elapsed_now(&self) -> u64 {
        self.clock.now_secs().saturating_sub(self.transfer.start_secs)
    }

    fn write_line(&mut self, line: &str) {
        if let Err(e) = writeln!(self.sink, "{}", line).and_then(|()| self.sink.flush()) {
            tracing::warn!(error = %e, "failed to write progress line");
        }
    }

    fn expect_state(&self, expected: TrackerState) -> Result<(), ProgressError> {
        if self.state != expected {
            return Err(ProgressError::NotRunning(self.state));
        }
        Ok(())
    }
}
