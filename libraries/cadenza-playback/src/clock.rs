//! Clock labels and end-of-track detection
//!
//! Progress labels use whole seconds, truncated. The end-of-track stop uses
//! the same granularity: a track counts as finished once the remaining time
//! truncates to `00:00`.

/// Format seconds as `MM:SS` (minutes are not wrapped at the hour)
pub fn format_clock(seconds: f64) -> String {
    let total = whole_seconds(seconds).max(0) as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// Remaining time of a track, in whole seconds (truncated toward negative
/// infinity so a position past the end never reads as zero)
pub fn remaining_whole_seconds(position: f64, duration: f64) -> i64 {
    whole_seconds(duration - position)
}

/// Whether a progress tick marks the end of the track
///
/// Requires a known duration. Ticks past the end (negative remaining) do not
/// count.
pub fn is_end_of_track(position: f64, duration: f64) -> bool {
    duration > 0.0 && remaining_whole_seconds(position, duration) == 0
}

fn whole_seconds(seconds: f64) -> i64 {
    if seconds.is_finite() {
        seconds.floor() as i64
    } else {
        0
    }
}
