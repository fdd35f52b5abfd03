//! Human-readable durations for progress lines.

use std::time::Duration;

/// `MM:SS`, or `H:MM:SS` from one hour on.
pub fn format_duration(d: Duration) -> String {
    let total = d.as_secs();
    let (hours, rest) = (total / 3600, total % 3600);
    let (minutes, secs) = (rest / 60, rest % 60);
    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes:02}:{secs:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_and_long_durations() {
        assert_eq!(format_duration(Duration::from_secs(0)), "00:00");
        assert_eq!(format_duration(Duration::from_millis(83_900)), "01:23");
        assert_eq!(format_duration(Duration::from_secs(3 * 3600 + 5)), "3:00:05");
    }
}
