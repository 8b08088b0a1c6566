//! Conversions between tracker timestamps and human readable dates.
use chrono::{DateTime, Utc};
use swarm_tracker_primitives::DurationSinceUnixEpoch;

/// Converts a timestamp into a UTC date time.
///
/// It returns `None` when the timestamp is out of the range `chrono`
/// supports.
#[must_use]
pub fn convert_from_timestamp_to_datetime_utc(duration: DurationSinceUnixEpoch) -> Option<DateTime<Utc>> {
    let seconds = i64::try_from(duration.as_secs()).ok()?;

    DateTime::from_timestamp(seconds, duration.subsec_nanos())
}

/// Formats a number of seconds as `"<d> days, <hh>:<mm>:<ss>"`.
#[must_use]
pub fn format_uptime(seconds: u64) -> String {
    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3_600;
    let minutes = (seconds % 3_600) / 60;
    let seconds = seconds % 60;

    format!("{days} days, {hours:02}:{minutes:02}:{seconds:02}")
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{convert_from_timestamp_to_datetime_utc, format_uptime};

    #[test]
    fn it_should_convert_a_timestamp_into_a_utc_date_time() {
        let date = convert_from_timestamp_to_datetime_utc(Duration::from_secs(1_669_397_478)).unwrap();

        assert_eq!(date.to_rfc3339(), "2022-11-25T17:31:18+00:00");
    }

    #[test]
    fn it_should_format_an_uptime() {
        assert_eq!(format_uptime(90_061), "1 days, 01:01:01");
        assert_eq!(format_uptime(59), "0 days, 00:00:59");
    }
}
