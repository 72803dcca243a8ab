//! Date/time expressions for the date built-ins.
//!
//! Inputs are read as one of:
//! - nothing, `now` or `today`: the current moment
//! - `tomorrow` / `yesterday`: midnight of that day
//! - `@<seconds>`: a unix timestamp
//! - RFC 3339 / RFC 2822 timestamps with an offset
//! - common date and datetime layouts without an offset
//!
//! Slash dates are month first (`01/05/2021` is January 5th); dash and
//! dot dates with the year last are day first (`05-01-2021`, `05.01.2021`).

use chrono::{DateTime, Duration, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

use crate::error::{FunctionError, FunctionResult};

const DATETIME_LAYOUTS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d.%m.%Y %H:%M:%S",
];

const DATE_LAYOUTS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%d %B %Y",
    "%d %b %Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
];

/// A parsed date/time expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Moment {
    /// The current moment, taken from the registry clock.
    Now,
    /// Wall-clock time without an offset.
    Naive(NaiveDateTime),
    /// A point in time with an explicit offset.
    Zoned(DateTime<FixedOffset>),
}

impl Moment {
    /// Local wall-clock time of this moment.
    pub(crate) fn local(&self, now: DateTime<Utc>) -> NaiveDateTime {
        match self {
            Moment::Now => now.with_timezone(&Local).naive_local(),
            Moment::Naive(naive) => *naive,
            Moment::Zoned(zoned) => zoned.with_timezone(&Local).naive_local(),
        }
    }

    /// UTC time of this moment. Naive inputs are taken as already UTC.
    pub(crate) fn utc(&self, now: DateTime<Utc>) -> NaiveDateTime {
        match self {
            Moment::Now => now.naive_utc(),
            Moment::Naive(naive) => *naive,
            Moment::Zoned(zoned) => zoned.naive_utc(),
        }
    }
}

/// Parse a date/time expression.
///
/// `now` is needed to resolve the relative words.
pub(crate) fn parse_moment(input: Option<&str>, now: DateTime<Utc>) -> FunctionResult<Moment> {
    let text = input.map(str::trim).unwrap_or_default();
    let lower = text.to_lowercase();

    match lower.as_str() {
        "" | "now" | "today" => return Ok(Moment::Now),
        "tomorrow" => return Ok(Moment::Naive(local_midnight(now, 1))),
        "yesterday" => return Ok(Moment::Naive(local_midnight(now, -1))),
        _ => {}
    }

    if let Some(seconds) = text.strip_prefix('@') {
        return seconds
            .parse::<i64>()
            .ok()
            .and_then(|s| Utc.timestamp_opt(s, 0).single())
            .map(|dt| Moment::Zoned(dt.fixed_offset()))
            .ok_or_else(|| FunctionError::InvalidDate(text.to_string()));
    }

    if let Ok(zoned) = DateTime::parse_from_rfc3339(text) {
        return Ok(Moment::Zoned(zoned));
    }
    if let Ok(zoned) = DateTime::parse_from_rfc2822(text) {
        return Ok(Moment::Zoned(zoned));
    }

    for layout in DATETIME_LAYOUTS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, layout) {
            return Ok(Moment::Naive(naive));
        }
    }

    for layout in DATE_LAYOUTS {
        if let Ok(date) = NaiveDate::parse_from_str(text, layout) {
            return Ok(Moment::Naive(date.and_time(NaiveTime::MIN)));
        }
    }

    Err(FunctionError::InvalidDate(text.to_string()))
}

fn local_midnight(now: DateTime<Utc>, days: i64) -> NaiveDateTime {
    let today = now.with_timezone(&Local).date_naive();
    (today + Duration::days(days)).and_time(NaiveTime::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 12, 30, 0).unwrap()
    }

    fn naive(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, min, s).unwrap()
    }

    #[test]
    fn test_now_words() {
        for input in [None, Some(""), Some("now"), Some("today"), Some(" Today ")] {
            assert_eq!(parse_moment(input, fixed_now()).unwrap(), Moment::Now);
        }
    }

    #[test]
    fn test_iso_dates() {
        assert_eq!(
            parse_moment(Some("2021-01-05"), fixed_now()).unwrap(),
            Moment::Naive(naive(2021, 1, 5, 0, 0, 0))
        );
        assert_eq!(
            parse_moment(Some("2021-01-05 10:11:12"), fixed_now()).unwrap(),
            Moment::Naive(naive(2021, 1, 5, 10, 11, 12))
        );
        assert_eq!(
            parse_moment(Some("2021-01-05T10:11"), fixed_now()).unwrap(),
            Moment::Naive(naive(2021, 1, 5, 10, 11, 0))
        );
    }

    #[test]
    fn test_slash_is_month_first_dash_is_day_first() {
        assert_eq!(
            parse_moment(Some("01/05/2021"), fixed_now()).unwrap(),
            Moment::Naive(naive(2021, 1, 5, 0, 0, 0))
        );
        assert_eq!(
            parse_moment(Some("05-01-2021"), fixed_now()).unwrap(),
            Moment::Naive(naive(2021, 1, 5, 0, 0, 0))
        );
    }

    #[test]
    fn test_month_names() {
        assert_eq!(
            parse_moment(Some("5 January 2021"), fixed_now()).unwrap(),
            Moment::Naive(naive(2021, 1, 5, 0, 0, 0))
        );
        assert_eq!(
            parse_moment(Some("Jan 5, 2021"), fixed_now()).unwrap(),
            Moment::Naive(naive(2021, 1, 5, 0, 0, 0))
        );
    }

    #[test]
    fn test_zoned_to_utc() {
        let moment = parse_moment(Some("2021-01-05T10:00:00+02:00"), fixed_now()).unwrap();
        assert_eq!(moment.utc(fixed_now()), naive(2021, 1, 5, 8, 0, 0));
    }

    #[test]
    fn test_unix_timestamp() {
        let moment = parse_moment(Some("@0"), fixed_now()).unwrap();
        assert_eq!(moment.utc(fixed_now()), naive(1970, 1, 1, 0, 0, 0));
    }

    #[test]
    fn test_now_uses_clock() {
        assert_eq!(Moment::Now.utc(fixed_now()), naive(2024, 3, 15, 12, 30, 0));
    }

    #[test]
    fn test_invalid_date() {
        let err = parse_moment(Some("not a date"), fixed_now()).unwrap_err();
        assert!(matches!(err, FunctionError::InvalidDate(ref s) if s == "not a date"));
    }
}
