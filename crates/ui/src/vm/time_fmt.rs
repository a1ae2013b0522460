use chrono::{DateTime, Utc};
use quiz_core::ElapsedTime;

#[must_use]
pub fn format_datetime(value: DateTime<Utc>) -> String {
    value.format("%Y-%m-%d %H:%M UTC").to_string()
}

/// Long calendar date, e.g. `November 14, 2023`.
#[must_use]
pub fn format_date(value: DateTime<Utc>) -> String {
    value.format("%B %-d, %Y").to_string()
}

/// `m:ss`, minutes unbounded.
#[must_use]
pub fn format_elapsed(elapsed: ElapsedTime) -> String {
    elapsed.to_string()
}

#[must_use]
pub fn format_minutes(minutes: u32) -> String {
    if minutes == 1 {
        "1 min".into()
    } else {
        format!("{minutes} min")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::time::fixed_now;

    #[test]
    fn formats_timer_and_timestamps() {
        assert_eq!(format_elapsed(ElapsedTime::from_secs(65)), "1:05");
        assert_eq!(format_datetime(fixed_now()), "2023-11-14 22:13 UTC");
        assert_eq!(format_date(fixed_now()), "November 14, 2023");
        assert_eq!(format_minutes(1), "1 min");
        assert_eq!(format_minutes(12), "12 min");
    }
}
