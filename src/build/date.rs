//! Date resolution and display formatting for front matter dates.
//!
//! Parsing is deliberately lenient: a value that matches none of the
//! accepted formats is treated as absent, and the caller decides whether to
//! surface a warning.

use std::fmt::Write as _;

use chrono::format::{Item, StrftimeItems};
use chrono::{NaiveDate, NaiveDateTime};

use super::front_matter::{FrontMatter, MetaValue};

/// Accepted front matter date formats, tried in order.
pub const DATE_TIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M", "%Y-%m-%d %H:%M:%S"];

/// The display format used when `date_format` is absent or unusable.
pub const DEFAULT_DISPLAY_FORMAT: &str = "%Y-%m-%d";

/// Outcome of looking up a date-like front matter key.
#[derive(Debug, Clone, PartialEq)]
pub enum DateLookup {
    Absent,
    Found(NaiveDateTime),
    /// A value was present but could not be parsed.
    Unparsable(String),
}

impl DateLookup {
    pub fn date(&self) -> Option<NaiveDateTime> {
        match self {
            DateLookup::Found(date) => Some(*date),
            _ => None,
        }
    }
}

/// Resolve a date-like front matter key.
pub fn lookup(front_matter: &FrontMatter, key: &str) -> DateLookup {
    match front_matter.get(key) {
        None | Some(MetaValue::Null) => DateLookup::Absent,
        Some(MetaValue::Date(date)) => DateLookup::Found(*date),
        Some(other) => {
            let text = other.to_plain_string().unwrap_or_default();
            match parse_date_time(&text) {
                Some(date) => DateLookup::Found(date),
                None => DateLookup::Unparsable(text),
            }
        }
    }
}

/// Parse `yyyy-MM-dd HH:mm`, falling back to `yyyy-MM-dd HH:mm:ss`.
pub fn parse_date_time(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
}

/// Split a `YYYY-MM-DD-` prefix off a file stem.
///
/// "2021-03-01-hello-world" -> (2021-03-01 00:00, "hello-world")
pub fn split_dated_stem(stem: &str) -> Option<(NaiveDateTime, &str)> {
    let prefix = stem.get(..10)?;
    let rest = stem.get(10..)?.strip_prefix('-')?;
    let date = NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()?;
    Some((date.and_hms_opt(0, 0, 0)?, rest))
}

/// Translate the configured `date_format` into a strftime pattern.
///
/// - `ordinal` means "MMM d yyyy"
/// - a value containing `%` is taken as strftime verbatim
/// - anything else is read as a Java-style pattern (`yyyy-MM-dd HH:mm`)
///
/// Patterns chrono cannot parse, or cannot apply to a date without a time
/// zone (`%z`, `%Z`, `%+`), fall back to [`DEFAULT_DISPLAY_FORMAT`].
pub fn display_pattern(date_format: &str) -> String {
    let pattern = match date_format.trim() {
        "" => return DEFAULT_DISPLAY_FORMAT.to_string(),
        "ordinal" => java_to_strftime("MMM d yyyy"),
        f if f.contains('%') => f.to_string(),
        f => java_to_strftime(f),
    };

    let parses = !StrftimeItems::new(&pattern).any(|item| matches!(item, Item::Error));
    let sample = NaiveDate::from_ymd_opt(2000, 1, 1).and_then(|d| d.and_hms_opt(0, 0, 0));
    let formats = sample.is_some_and(|d| try_format(&d, &pattern).is_some());
    if !parses || !formats {
        tracing::warn!(date_format, "unusable date_format, using default");
        return DEFAULT_DISPLAY_FORMAT.to_string();
    }
    pattern
}

/// Format a date with a pattern produced by [`display_pattern`].
///
/// A pattern that cannot be applied formats with the default instead.
pub fn format_date(date: &NaiveDateTime, pattern: &str) -> String {
    try_format(date, pattern)
        .unwrap_or_else(|| date.format(DEFAULT_DISPLAY_FORMAT).to_string())
}

fn try_format(date: &NaiveDateTime, pattern: &str) -> Option<String> {
    let mut out = String::new();
    write!(out, "{}", date.format(pattern)).ok()?;
    Some(out)
}

fn java_to_strftime(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        // Quoted literal text: 'at' -> at, '' -> '
        if c == '\'' {
            let mut j = i + 1;
            if chars.get(j) == Some(&'\'') {
                out.push('\'');
                i = j + 1;
                continue;
            }
            while j < chars.len() && chars[j] != '\'' {
                push_literal(&mut out, chars[j]);
                j += 1;
            }
            i = j + 1;
            continue;
        }

        let mut run = 1;
        while i + run < chars.len() && chars[i + run] == c {
            run += 1;
        }

        let spec = match (c, run) {
            ('y', 2) => Some("%y"),
            ('y', _) => Some("%Y"),
            ('M', 1) => Some("%-m"),
            ('M', 2) => Some("%m"),
            ('M', 3) => Some("%b"),
            ('M', _) => Some("%B"),
            ('d', 1) => Some("%-d"),
            ('d', _) => Some("%d"),
            ('H', 1) => Some("%-H"),
            ('H', _) => Some("%H"),
            ('h', 1) => Some("%-I"),
            ('h', _) => Some("%I"),
            ('m', 1) => Some("%-M"),
            ('m', _) => Some("%M"),
            ('s', 1) => Some("%-S"),
            ('s', _) => Some("%S"),
            ('a', _) => Some("%p"),
            ('E', 1..=3) => Some("%a"),
            ('E', _) => Some("%A"),
            _ => None,
        };

        match spec {
            Some(spec) => out.push_str(spec),
            None => (0..run).for_each(|_| push_literal(&mut out, c)),
        }
        i += run;
    }

    out
}

fn push_literal(out: &mut String, c: char) {
    if c == '%' {
        out.push_str("%%");
    } else {
        out.push(c);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fm(key: &str, value: MetaValue) -> FrontMatter {
        let mut fm = FrontMatter::new();
        fm.insert(key.to_string(), value);
        fm
    }

    #[test]
    fn test_minute_and_second_formats_agree() {
        let a = parse_date_time("2020-01-02 03:04").unwrap();
        let b = parse_date_time("2020-01-02 03:04:00").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_lookup_unparsable_is_not_a_date() {
        let lookup = lookup(&fm("date", MetaValue::from("next tuesday")), "date");
        assert_eq!(lookup, DateLookup::Unparsable("next tuesday".to_string()));
        assert_eq!(lookup.date(), None);
    }

    #[test]
    fn test_lookup_absent_and_structured() {
        assert_eq!(lookup(&FrontMatter::new(), "date"), DateLookup::Absent);
        assert_eq!(lookup(&fm("date", MetaValue::Null), "date"), DateLookup::Absent);

        let date = parse_date_time("2021-03-01 10:00").unwrap();
        assert_eq!(
            lookup(&fm("updated", MetaValue::Date(date)), "updated"),
            DateLookup::Found(date)
        );
    }

    #[test]
    fn test_split_dated_stem() {
        let (date, rest) = split_dated_stem("2021-03-01-hello-world").unwrap();
        assert_eq!(date, parse_date_time("2021-03-01 00:00").unwrap());
        assert_eq!(rest, "hello-world");

        assert!(split_dated_stem("hello-world").is_none());
        assert!(split_dated_stem("2021-13-01-bad-month").is_none());
    }

    #[test]
    fn test_display_pattern() {
        assert_eq!(display_pattern("yyyy-MM-dd"), "%Y-%m-%d");
        assert_eq!(display_pattern("ordinal"), "%b %-d %Y");
        assert_eq!(display_pattern("yyyy-MM-dd HH:mm:ss"), "%Y-%m-%d %H:%M:%S");
        assert_eq!(display_pattern("%d/%m/%Y"), "%d/%m/%Y");
        assert_eq!(display_pattern("d 'of' MMMM"), "%-d of %B");
        assert_eq!(display_pattern(""), DEFAULT_DISPLAY_FORMAT);
    }

    #[test]
    fn test_display_pattern_rejects_zone_specifiers() {
        assert_eq!(display_pattern("%Y-%m-%d %z"), DEFAULT_DISPLAY_FORMAT);
        assert_eq!(display_pattern("%H:%M %Z"), DEFAULT_DISPLAY_FORMAT);
        assert_eq!(display_pattern("%+"), DEFAULT_DISPLAY_FORMAT);
        assert_eq!(display_pattern("%Q"), DEFAULT_DISPLAY_FORMAT);
    }

    #[test]
    fn test_format_date_with_zone_pattern_does_not_panic() {
        let date = parse_date_time("2021-03-01 10:00").unwrap();
        assert_eq!(format_date(&date, "%Y-%m-%d %z"), "2021-03-01");
    }

    #[test]
    fn test_format_date_ordinal() {
        let date = parse_date_time("2021-03-01 10:00").unwrap();
        assert_eq!(format_date(&date, &display_pattern("ordinal")), "Mar 1 2021");
        assert_eq!(format_date(&date, &display_pattern("yyyy-MM-dd")), "2021-03-01");
    }
}
