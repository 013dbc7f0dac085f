//! Smoothed throughput estimate and its rendering.

const KIB: f64 = 1024.0;
const MIB: f64 = 1024.0 * 1024.0;

/// Default minimum gap between two rate calculations.
pub const DEFAULT_RATE_INTERVAL_SECS: u64 = 2;

/// Throughput sampled at bounded intervals.
///
/// A new rate is only computed once `interval_secs` have passed since the
/// previous calculation; in between, the cached value is returned unchanged.
#[derive(Debug, Clone)]
pub struct RateEstimator {
    interval_secs: u64,
    last_calculated_at: u64,
    current_rate: f64,
}

impl RateEstimator {
    pub fn new(interval_secs: u64) -> Self {
        Self {
            interval_secs,
            last_calculated_at: 0,
            current_rate: 0.0,
        }
    }

    /// Feed the cumulative byte count at `elapsed_secs`; returns bytes/second.
    pub fn update(&mut self, elapsed_secs: u64, bytes_consumed: u64) -> f64 {
        if elapsed_secs > 0
            && elapsed_secs.saturating_sub(self.last_calculated_at) >= self.interval_secs
        {
            self.current_rate = bytes_consumed as f64 / elapsed_secs as f64;
            self.last_calculated_at = elapsed_secs;
        }
        self.current_rate
    }
}

impl Default for RateEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_RATE_INTERVAL_SECS)
    }
}

/// Render a rate as `X.Y MB/s`, `X.Y kB/s` or `X.Y B/s` (1024-based thresholds).
pub fn format_rate(rate: f64) -> String {
    if rate >= MIB {
        format!("{:.1} MB/s", rate / MIB)
    } else if rate >= KIB {
        format!("{:.1} kB/s", rate / KIB)
    } else {
        format!("{:.1} B/s", rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_rate_before_interval() {
        let mut est = RateEstimator::default();
        assert_eq!(est.update(0, 100), 0.0);
        assert_eq!(est.update(1, 200), 0.0);
    }

    #[test]
    fn recalculates_at_most_once_per_window() {
        let mut est = RateEstimator::default();
        est.update(0, 0);
        est.update(1, 1_000);
        let at_two = est.update(2, 4_000);
        assert_eq!(at_two, 2_000.0);
        // elapsed=3 is within the window opened at 2: cached value
        let at_three = est.update(3, 9_000);
        assert_eq!(at_three, at_two);
        let at_four = est.update(4, 12_000);
        assert_eq!(at_four, 3_000.0);
    }

    #[test]
    fn custom_interval() {
        let mut est = RateEstimator::new(5);
        assert_eq!(est.update(4, 400), 0.0);
        assert_eq!(est.update(5, 500), 100.0);
        assert_eq!(est.update(6, 6_000), 100.0);
    }

    #[test]
    fn rate_units() {
        assert_eq!(format_rate(0.0), "0.0 B/s");
        assert_eq!(format_rate(512.0), "512.0 B/s");
        assert_eq!(format_rate(1023.9), "1023.9 B/s");
        assert_eq!(format_rate(1024.0), "1.0 kB/s");
        assert_eq!(format_rate(1536.0), "1.5 kB/s");
        assert_eq!(format_rate(1024.0 * 1024.0), "1.0 MB/s");
        assert_eq!(format_rate(10.0 * 1024.0 * 1024.0), "10.0 MB/s");
    }
}
