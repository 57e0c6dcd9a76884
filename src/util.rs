use std::time::Duration;

/// Formats `duration` as `m:ss.mmm`, or `h:mm:ss.mmm` past the hour.
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    let (hours, rest) = (millis / 3_600_000, millis % 3_600_000);
    let (minutes, rest) = (rest / 60_000, rest % 60_000);
    let (seconds, millis) = (rest / 1000, rest % 1000);

    if hours > 0 {
        format!("{}:{:02}:{:02}.{:03}", hours, minutes, seconds, millis)
    } else {
        format!("{}:{:02}.{:03}", minutes, seconds, millis)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn formats_durations() {
        assert_eq!(format_duration(Duration::ZERO), "0:00.000");
        assert_eq!(format_duration(Duration::from_secs(1)), "0:01.000");
        assert_eq!(format_duration(Duration::from_millis(83_456)), "1:23.456");
        assert_eq!(format_duration(Duration::from_secs(3_725)), "1:02:05.000");
    }
}
