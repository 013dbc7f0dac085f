//! Compact human-readable durations (`MM:SS`, `HH:MM:SS`, `~Nh`).

const SECS_PER_HOUR: u64 = 3600;
const SECS_PER_DAY: u64 = 86_400;

/// Format `seconds` as `MM:SS`, or `HH:MM:SS` once at least an hour has passed.
///
/// With `accurate == false`, anything longer than a day collapses to `~{hours}h`;
/// that form is used for ETAs where precision is meaningless anyway.
pub fn format_time(seconds: u64, accurate: bool) -> String {
    if !accurate && seconds > SECS_PER_DAY {
        return format!("~{}h", seconds / SECS_PER_HOUR);
    }

    let hours = seconds / SECS_PER_HOUR;
    let min = (seconds % SECS_PER_HOUR) / 60;
    let sec = seconds % 60;

    if hours == 0 {
        format!("{:02}:{:02}", min, sec)
    } else {
        format!("{:02}:{:02}:{:02}", hours, min, sec)
    }
}
