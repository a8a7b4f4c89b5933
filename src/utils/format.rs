use chrono::{Duration, NaiveTime};

pub const TIME_PLACEHOLDER: &str = "--:--";
pub const COUNTDOWN_PLACEHOLDER: &str = "--";

/// Format a remaining duration as "{h}h {m}m", flooring to whole minutes.
pub fn format_countdown(remaining: Duration) -> String {
    let secs = remaining.num_seconds().max(0);
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    format!("{}h {}m", hours, minutes)
}

/// Format a NaiveTime to "HH:MM"
pub fn format_time(t: NaiveTime) -> String {
    t.format("%H:%M").to_string()
}

pub fn format_time_or_placeholder(t: Option<NaiveTime>) -> String {
    t.map(format_time)
        .unwrap_or_else(|| TIME_PLACEHOLDER.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn countdown_floors_minutes() {
        assert_eq!(format_countdown(Duration::minutes(105)), "1h 45m");
        assert_eq!(format_countdown(Duration::seconds(59)), "0h 0m");
        assert_eq!(format_countdown(Duration::seconds(3_661)), "1h 1m");
        assert_eq!(format_countdown(Duration::hours(23) + Duration::seconds(3_599)), "23h 59m");
    }

    #[test]
    fn negative_countdown_is_zero() {
        assert_eq!(format_countdown(Duration::minutes(-5)), "0h 0m");
    }

    #[test]
    fn placeholder_for_missing_time() {
        assert_eq!(format_time_or_placeholder(None), "--:--");
        assert_eq!(
            format_time_or_placeholder(NaiveTime::from_hms_opt(4, 7, 0)),
            "04:07"
        );
    }
}
