//! Time normalization
//!
//! Drive-test exports carry either full calendar timestamps
//! (`2025-12-23T23:00:01.250Z`) or bare time-of-day values (`23:00:01.25`).
//! Both are mapped onto a millisecond offset so records can be ordered and
//! windowed. Calendar timestamps become Unix epoch milliseconds; time-of-day
//! values become milliseconds since midnight. The two scales are not
//! reconciled; a single capture is expected to use one of them.
//!
//! An unparseable time is `None`, never zero.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;

/// Milliseconds on the normalized time axis.
pub type TimeMs = i64;

static TIME_OF_DAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2}):(\d{2}):(\d{2})(?:\.(\d{1,3}))?$").expect("valid time-of-day regex")
});

/// Naive (offset-less) calendar formats, read as UTC.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parses a record time into milliseconds.
///
/// Calendar forms are tried first; otherwise `H:MM:SS[.mmm]` is accepted with
/// the fraction right-padded to milliseconds (`.5` is 500 ms).
///
/// # Example
///
/// ```
/// use callscope_common::time::parse_time_ms;
///
/// assert_eq!(parse_time_ms("00:00:01.5"), Some(1_500));
/// assert_eq!(parse_time_ms("1970-01-01T00:00:02Z"), Some(2_000));
/// assert_eq!(parse_time_ms("yesterday"), None);
/// ```
pub fn parse_time_ms(value: &str) -> Option<TimeMs> {
    let txt = value.trim();
    if txt.is_empty() {
        return None;
    }
    parse_calendar_ms(txt).or_else(|| parse_time_of_day_ms(txt))
}

fn parse_calendar_ms(txt: &str) -> Option<TimeMs> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(txt) {
        return Some(dt.timestamp_millis());
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(txt, format) {
            return Some(naive.and_utc().timestamp_millis());
        }
    }
    NaiveDate::parse_from_str(txt, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc().timestamp_millis())
}

fn parse_time_of_day_ms(txt: &str) -> Option<TimeMs> {
    let caps = TIME_OF_DAY.captures(txt)?;
    let hours: i64 = caps[1].parse().ok()?;
    let minutes: i64 = caps[2].parse().ok()?;
    let seconds: i64 = caps[3].parse().ok()?;
    let millis: i64 = match caps.get(4) {
        Some(frac) => format!("{:0<3}", frac.as_str()).parse().ok()?,
        None => 0,
    };
    Some(((hours * 60 + minutes) * 60 + seconds) * 1000 + millis)
}

/// Difference `end - start` when both ends are known and not reversed.
pub fn non_negative_span(start: Option<TimeMs>, end: Option<TimeMs>) -> Option<TimeMs> {
    match (start, end) {
        (Some(s), Some(e)) if e >= s => Some(e - s),
        _ => None,
    }
}
