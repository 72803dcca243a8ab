//! Built-in computed functions.
//!
//! All built-ins work on a single value. Called as `~name~` they receive
//! no value: the string functions then return an empty string and the
//! date functions use the current moment.

use std::sync::Arc;

use super::dates::{parse_moment, Moment};
use super::{Argument, Clock, FunctionRegistry};
use crate::error::FunctionResult;
use crate::logs::log_info_indent;
use crate::models::ConversionModel;

/// Names of the built-in functions.
pub const BUILTIN_FUNCTIONS: &[&str] = &[
    "upper",
    "lower",
    "usfirst",
    "titlecase",
    "date_ymd",
    "date_dmy",
    "datetime",
    "dmydatetime",
    "timestamp",
    "iso8601",
    "locale_2_to_5_char",
];

/// Country code → language prefix for `locale_2_to_5_char`.
const LANGUAGE_MAP: &[(&str, &str)] = &[
    ("FR", "fr"),
    ("DE", "de"),
    ("ES", "es"),
    ("IT", "it"),
    ("RU", "ru"),
    ("SE", "sv"),
];

/// Output layouts of the date functions. `utc` marks layouts rendered in UTC.
struct DateFormat {
    name: &'static str,
    layout: &'static str,
    utc: bool,
}

const DATE_FORMATS: &[DateFormat] = &[
    DateFormat { name: "date_ymd", layout: "%Y-%m-%d", utc: false },
    DateFormat { name: "date_dmy", layout: "%d/%m/%Y", utc: false },
    DateFormat { name: "datetime", layout: "%Y-%m-%d %H:%M:%S", utc: false },
    DateFormat { name: "dmydatetime", layout: "%d/%m/%Y %H:%M:%S", utc: false },
    DateFormat { name: "timestamp", layout: "%Y-%m-%dT%H:%M:%S.00", utc: false },
    DateFormat { name: "iso8601", layout: "%Y-%m-%dT%H:%M:%S.000Z", utc: true },
];

pub(super) fn register_builtins(registry: &mut FunctionRegistry, clock: Clock) {
    let string_functions: [(&str, fn(&str) -> String); 4] = [
        ("upper", upper),
        ("lower", lower),
        ("usfirst", usfirst),
        ("titlecase", titlecase),
    ];

    let mut functions: Vec<(&str, super::Computation)> = string_functions
        .into_iter()
        .map(|(name, f)| {
            let computation: super::Computation =
                Arc::new(move |arg: Argument<'_>| -> FunctionResult<String> {
                    Ok(f(arg.value().unwrap_or_default()))
                });
            (name, computation)
        })
        .collect();

    let locale: super::Computation = Arc::new(|arg: Argument<'_>| -> FunctionResult<String> {
        Ok(locale_2_to_5_char(arg.value().unwrap_or_default()))
    });
    functions.push(("locale_2_to_5_char", locale));

    for date_format in DATE_FORMATS {
        let clock = Arc::clone(&clock);
        let computation: super::Computation = Arc::new(move |arg: Argument<'_>| {
            format_date(arg.value(), date_format.layout, date_format.utc, &clock)
        });
        functions.push((date_format.name, computation));
    }

    for (name, computation) in functions {
        // The registry is fresh, names cannot collide
        let _ = registry.register_computation(name, computation);
    }

    let _ = registry.register_hook("log_headers", log_headers);
}

fn format_date(input: Option<&str>, layout: &str, utc: bool, clock: &Clock) -> FunctionResult<String> {
    let now = clock();
    let moment: Moment = parse_moment(input, now)?;
    let wall = if utc { moment.utc(now) } else { moment.local(now) };
    Ok(wall.format(layout).to_string())
}

pub(crate) fn upper(value: &str) -> String {
    value.to_uppercase()
}

pub(crate) fn lower(value: &str) -> String {
    value.to_lowercase()
}

/// Lowercase, then capitalise the first letter.
pub(crate) fn usfirst(value: &str) -> String {
    let lowered = value.to_lowercase();
    let mut chars = lowered.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Lowercase, then capitalise every whitespace-separated word.
pub(crate) fn titlecase(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut at_word_start = true;
    for c in value.to_lowercase().chars() {
        if at_word_start {
            result.extend(c.to_uppercase());
        } else {
            result.push(c);
        }
        at_word_start = c.is_whitespace();
    }
    result
}

/// `se` → `sv_SE`, unmapped countries get `en`.
pub(crate) fn locale_2_to_5_char(value: &str) -> String {
    let country = value.to_uppercase();
    let language = LANGUAGE_MAP
        .iter()
        .find(|(code, _)| *code == country)
        .map(|(_, lang)| *lang)
        .unwrap_or("en");
    format!("{}_{}", language, country)
}

fn log_headers(headers: &[String], _model: &ConversionModel) -> FunctionResult<()> {
    log_info_indent(format!("Columns: {}", headers.join(", ")), 1);
    Ok(())
}

/// One-line descriptions of the built-ins, for `csvfill functions`.
pub fn builtin_descriptions() -> Vec<(&'static str, &'static str)> {
    vec![
        ("upper", "Uppercase the value"),
        ("lower", "Lowercase the value"),
        ("usfirst", "Lowercase, then capitalise the first letter"),
        ("titlecase", "Lowercase, then capitalise each word"),
        ("date_ymd", "Date as YYYY-MM-DD (default: today)"),
        ("date_dmy", "Date as DD/MM/YYYY (default: today)"),
        ("datetime", "Date and time as YYYY-MM-DD HH:MM:SS (default: now)"),
        ("dmydatetime", "Date and time as DD/MM/YYYY HH:MM:SS (default: now)"),
        ("timestamp", "Date and time as YYYY-MM-DDTHH:MM:SS.00 (default: now)"),
        ("iso8601", "UTC date and time as YYYY-MM-DDTHH:MM:SS.000Z (default: now)"),
        ("locale_2_to_5_char", "Country code to locale, e.g. se -> sv_SE"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Row;
    use chrono::{DateTime, Local, TimeZone, Utc};

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 12, 30, 45).unwrap()
    }

    fn registry() -> FunctionRegistry {
        FunctionRegistry::with_clock(Arc::new(fixed_now))
    }

    fn call(name: &str, value: Option<&str>) -> String {
        registry().call(name, Argument::Value(value)).unwrap().unwrap()
    }

    #[test]
    fn test_case_functions() {
        assert_eq!(call("upper", Some("uk")), "UK");
        assert_eq!(call("lower", Some("MiXeD")), "mixed");
        assert_eq!(call("usfirst", Some("hELLO wORLD")), "Hello world");
        assert_eq!(call("titlecase", Some("hELLO wORLD\tagain")), "Hello World\tAgain");
        assert_eq!(call("upper", None), "");
    }

    #[test]
    fn test_locale_mapping() {
        assert_eq!(call("locale_2_to_5_char", Some("se")), "sv_SE");
        assert_eq!(call("locale_2_to_5_char", Some("FR")), "fr_FR");
        assert_eq!(call("locale_2_to_5_char", Some("xx")), "en_XX");
    }

    #[test]
    fn test_date_defaults_to_today() {
        let today = fixed_now().with_timezone(&Local).format("%Y-%m-%d").to_string();
        assert_eq!(call("date_ymd", None), today);
        assert_eq!(call("date_ymd", Some("")), today);
        assert_eq!(call("date_ymd", Some("today")), today);

        let row = Row::from_pairs([("a", "b")]);
        let from_row = registry().call("date_ymd", Argument::Row(&row)).unwrap().unwrap();
        assert_eq!(from_row, today);
    }

    #[test]
    fn test_date_with_input() {
        assert_eq!(call("date_ymd", Some("2021-01-05")), "2021-01-05");
        assert_eq!(call("date_dmy", Some("2021-01-05")), "05/01/2021");
        assert_eq!(call("datetime", Some("2021-01-05 10:11:12")), "2021-01-05 10:11:12");
        assert_eq!(call("dmydatetime", Some("2021-01-05 10:11:12")), "05/01/2021 10:11:12");
        assert_eq!(call("timestamp", Some("2021-01-05 10:11:12")), "2021-01-05T10:11:12.00");
        assert_eq!(call("iso8601", Some("2021-01-05 10:11:12")), "2021-01-05T10:11:12.000Z");
    }

    #[test]
    fn test_iso8601_now_is_utc() {
        assert_eq!(call("iso8601", Some("now")), "2024-03-15T12:30:45.000Z");
        assert_eq!(call("iso8601", Some("2021-01-05T10:00:00+02:00")), "2021-01-05T08:00:00.000Z");
    }

    #[test]
    fn test_invalid_date_is_error() {
        let result = registry().call("date_ymd", Argument::Value(Some("garbage"))).unwrap();
        assert!(result.is_err());
    }

    #[test]
    fn test_descriptions_cover_builtins() {
        let described: Vec<&str> = builtin_descriptions().into_iter().map(|(n, _)| n).collect();
        assert_eq!(described, BUILTIN_FUNCTIONS);
    }
}
