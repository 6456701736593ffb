//! The cookie-date parser of [RFC 6265
//! §5.1.1](https://tools.ietf.org/html/rfc6265#section-5.1.1), and an RFC 1123
//! formatter for the `Expires` attribute.

use chrono::{DateTime, TimeZone, Utc};

/// Is `byte` a cookie-date delimiter?
///
/// ```text
/// delimiter = %x09 / %x20-2F / %x3B-40 / %x5B-60 / %x7B-7E
/// ```
fn is_delimiter(byte: u8) -> bool {
    byte == 0x09
        || (0x20..=0x2F).contains(&byte)
        || (0x3B..=0x40).contains(&byte)
        || (0x5B..=0x60).contains(&byte)
        || (0x7B..=0x7E).contains(&byte)
}

/// Split `s` into the maximal runs of non-delimiter bytes.
fn tokenize(s: &str) -> Vec<&str> {
    let bytes = s.as_bytes();
    let mut tokens = Vec::new();
    let mut start = None;

    for (i, &byte) in bytes.iter().enumerate() {
        if is_delimiter(byte) {
            if let Some(s0) = start.take() {
                tokens.push(&s[s0..i]);
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }

    if let Some(s0) = start {
        tokens.push(&s[s0..]);
    }

    tokens
}

enum FieldMatch<T> {
    NoMatch,
    Invalid,
    Valid(T),
}

fn match_time(token: &str) -> FieldMatch<(u32, u32, u32)> {
    let parts: Vec<&str> = token.split(':').collect();

    if parts.len() != 3 || parts.iter().any(|p| p.is_empty() || p.len() > 2 || !p.bytes().all(|b| b.is_ascii_digit())) {
        return FieldMatch::NoMatch;
    }

    let hour: u32 = parts[0].parse().unwrap();
    let min: u32 = parts[1].parse().unwrap();
    let sec: u32 = parts[2].parse().unwrap();

    if hour <= 23 && min <= 59 && sec <= 59 {
        FieldMatch::Valid((hour, min, sec))
    } else {
        FieldMatch::Invalid
    }
}

fn match_day(token: &str) -> Option<u32> {
    if token.is_empty() || token.len() > 2 || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let day: u32 = token.parse().ok()?;

    if (1..=31).contains(&day) {
        Some(day)
    } else {
        None
    }
}

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

fn match_month(token: &str) -> Option<u32> {
    if token.len() < 3 {
        return None;
    }

    let prefix = &token.as_bytes()[..3];

    MONTHS
        .iter()
        .position(|month| month.as_bytes().eq_ignore_ascii_case(prefix))
        .map(|idx| idx as u32 + 1)
}

fn match_year(token: &str) -> FieldMatch<i32> {
    if !matches!(token.len(), 2 | 4) || !token.bytes().all(|b| b.is_ascii_digit()) {
        return FieldMatch::NoMatch;
    }

    let mut year: i32 = token.parse().unwrap();

    if token.len() == 2 {
        year += if (70..=99).contains(&year) { 1900 } else { 2000 };
    }

    if year >= 1601 {
        FieldMatch::Valid(year)
    } else {
        FieldMatch::Invalid
    }
}

#[derive(Default)]
struct PartialDate {
    time: Option<(u32, u32, u32)>,
    day: Option<u32>,
    month: Option<u32>,
    year: Option<i32>,
}

/// Parse a cookie-date string per RFC 6265 §5.1.1.
///
/// Returns `None` on any parse failure; this function never panics.
pub(crate) fn parse_cookie_date(s: &str) -> Option<DateTime<Utc>> {
    let mut date = PartialDate::default();

    for token in tokenize(s) {
        if date.time.is_none() {
            match match_time(token) {
                FieldMatch::Valid(t) => {
                    date.time = Some(t);
                    continue;
                }
                FieldMatch::Invalid => return None,
                FieldMatch::NoMatch => {}
            }
        }

        if date.day.is_none() {
            if let Some(d) = match_day(token) {
                date.day = Some(d);
                continue;
            }
        }

        if date.month.is_none() {
            if let Some(m) = match_month(token) {
                date.month = Some(m);
                continue;
            }
        }

        if date.year.is_none() {
            match match_year(token) {
                FieldMatch::Valid(y) => {
                    date.year = Some(y);
                    continue;
                }
                FieldMatch::Invalid => return None,
                FieldMatch::NoMatch => {}
            }
        }
    }

    let (hour, min, sec) = date.time?;
    let day = date.day?;
    let month = date.month?;
    let year = date.year?;

    Utc.with_ymd_and_hms(year, month, day, hour, min, sec).single()
}

/// Format `date` as an RFC 1123 HTTP-date (`Thu, 01 Jan 1970 00:00:00 GMT`),
/// as used for the `Expires` attribute.
pub(crate) fn format_rfc1123(date: DateTime<Utc>) -> String {
    httpdate::fmt_http_date(date.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn parses_rfc1123_dates() {
        assert_eq!(
            parse_cookie_date("Sun, 06 Nov 1994 08:49:37 GMT"),
            Some(ts(1994, 11, 6, 8, 49, 37))
        );
    }

    #[test]
    fn parses_rfc850_and_asctime_dates() {
        assert_eq!(
            parse_cookie_date("Sunday, 06-Nov-94 08:49:37 GMT"),
            Some(ts(1994, 11, 6, 8, 49, 37))
        );
        assert_eq!(
            parse_cookie_date("Sun Nov  6 08:49:37 1994"),
            Some(ts(1994, 11, 6, 8, 49, 37))
        );
    }

    #[test]
    fn ignores_token_order_and_prose() {
        assert_eq!(
            parse_cookie_date(
                "This cookie shall perish on day 14 of January in the year 2032, \
                 precisely when the clock strikes 12:52:13"
            ),
            Some(ts(2032, 1, 14, 12, 52, 13))
        );
    }

    #[test]
    fn rejects_year_below_1601() {
        assert_eq!(parse_cookie_date("06 Nov 1600 08:49:37"), None);
        assert!(parse_cookie_date("06 Nov 1601 08:49:37").is_some());
    }

    #[test]
    fn rejects_out_of_range_time() {
        assert_eq!(parse_cookie_date("06 Nov 1994 24:00:00"), None);
        assert_eq!(parse_cookie_date("06 Nov 1994 08:60:00"), None);
    }

    #[test]
    fn rejects_incomplete_dates() {
        assert_eq!(parse_cookie_date("Nov 1994 08:49:37"), None);
        assert_eq!(parse_cookie_date(""), None);
    }

    #[test]
    fn formats_rfc1123() {
        assert_eq!(
            format_rfc1123(ts(1970, 1, 1, 0, 0, 0)),
            "Thu, 01 Jan 1970 00:00:00 GMT"
        );
    }
}
