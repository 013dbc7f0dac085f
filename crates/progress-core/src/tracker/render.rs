//! Text of every line written to the diagnostic stream.

use crate::rate::format_rate;
use crate::time_format::format_time;

const PREFIX: &str = "progress:";

pub(crate) const LOAD_UNAVAILABLE: &str =
    "progress: Could not get cpu load information; max-load option skipped";

pub(crate) fn startup_line(label: &str, total: u64) -> String {
    format!(
        "{PREFIX} {} -- {} -- starting ({} bytes)...",
        format_time(0, true),
        label,
        total
    )
}

/// `rate` and `eta_secs` are only rendered together, once a rate exists.
pub(crate) fn progress_line(
    elapsed: u64,
    label: &str,
    percent: f64,
    rate: Option<(f64, u64)>,
) -> String {
    let mut line = format!(
        "{PREFIX} {} -- {} -- {:5.1}%",
        format_time(elapsed, true),
        label,
        percent
    );
    if let Some((rate, eta_secs)) = rate {
        line.push_str(&format!(
            " ({}) -- ETA {}",
            format_rate(rate),
            format_time(eta_secs, false)
        ));
    }
    line
}

pub(crate) fn overshoot_line(elapsed: u64, label: &str) -> String {
    format!("{PREFIX} {} -- {} -- n/a", format_time(elapsed, true), label)
}

pub(crate) fn finished_line(elapsed: u64, label: &str) -> String {
    format!(
        "{PREFIX} {} -- {} -- finished.",
        format_time(elapsed, true),
        label
    )
}

pub(crate) fn load_pause_line(elapsed: u64, label: &str, load: f64, pause_secs: u64) -> String {
    format!(
        "{PREFIX} {} -- {} -- cpu load exceeded ({:.2}), sleeping for {} seconds",
        format_time(elapsed, true),
        label,
        load,
        pause_secs
    )
}
