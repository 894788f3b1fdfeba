use jiff::{Timestamp, civil::DateTime, tz::TimeZone};
use thiserror::Error;

const MINUTE: i64 = 60;
const HOUR: i64 = MINUTE * 60;
const DAY: i64 = HOUR * 24;
const WEEK: i64 = DAY * 7;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TimeErr {
    #[error("invalid timestamp \"{0}\"")]
    Invalid(String),
}

/// Accepts RFC 3339 timestamps and offset-less datetimes, the latter are read as UTC.
pub fn parse_timestamp(raw: impl AsRef<str>) -> Result<Timestamp, TimeErr> {
    let raw = raw.as_ref().trim();
    if let Ok(ts) = raw.parse::<Timestamp>() {
        return Ok(ts);
    }
    raw.parse::<DateTime>()
        .and_then(|dt| dt.to_zoned(TimeZone::UTC))
        .map(|zoned| zoned.timestamp())
        .map_err(|_| TimeErr::Invalid(raw.to_string()))
}

pub fn format_relative(time: Timestamp, now: Timestamp) -> String {
    let diff = now.as_second() - time.as_second();
    if diff < MINUTE {
        "just now".to_string()
    } else if diff < HOUR {
        format!("{}m ago", diff / MINUTE)
    } else if diff < DAY {
        format!("{}h ago", diff / HOUR)
    } else if diff < WEEK {
        format!("{}d ago", diff / DAY)
    } else {
        format_short_date(time)
    }
}

pub fn format_short_date(time: Timestamp) -> String {
    time.strftime("%b %-d, %Y").to_string()
}

pub mod lenient {
    use jiff::Timestamp;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &Timestamp, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(time)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Timestamp, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_timestamp(raw).map_err(serde::de::Error::custom)
    }
}

pub mod lenient_opt {
    use jiff::Timestamp;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        time: &Option<Timestamp>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match time {
            Some(time) => serializer.collect_str(time),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Timestamp>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        raw.map(super::parse_timestamp)
            .transpose()
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod time_tests {
    use crate::time::{format_relative, parse_timestamp};
    use jiff::{Timestamp, ToSpan};
    use pretty_assertions::assert_eq;
    use test_log::test;

    #[test]
    fn test_parse_timestamp() {
        let with_offset = parse_timestamp("2024-01-05T10:00:00Z").unwrap();
        let naive = parse_timestamp("2024-01-05T10:00:00").unwrap();
        let fractional = parse_timestamp("2024-01-05T10:00:00.250000").unwrap();
        assert_eq!(with_offset, naive);
        assert_eq!(fractional.as_millisecond() - naive.as_millisecond(), 250);
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_format_relative() {
        let now: Timestamp = "2024-03-20T12:00:00Z".parse().unwrap();
        let ago = |span: jiff::Span| now.checked_sub(span).unwrap();

        assert_eq!(format_relative(ago(30.seconds()), now), "just now");
        assert_eq!(format_relative(ago(59.seconds()), now), "just now");
        assert_eq!(format_relative(ago(60.seconds()), now), "1m ago");
        assert_eq!(format_relative(ago(59.minutes()), now), "59m ago");
        assert_eq!(format_relative(ago(60.minutes()), now), "1h ago");
        assert_eq!(format_relative(ago(23.hours()), now), "23h ago");
        assert_eq!(format_relative(ago(24.hours()), now), "1d ago");
        assert_eq!(format_relative(ago(167.hours()), now), "6d ago");
        assert_eq!(format_relative(ago(168.hours()), now), "Mar 13, 2024");
        assert_eq!(
            format_relative("2024-01-05T08:00:00Z".parse().unwrap(), now),
            "Jan 5, 2024"
        );
        // clock skew
        assert_eq!(format_relative(now.checked_add(5.minutes()).unwrap(), now), "just now");
    }
}
