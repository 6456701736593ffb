//! `Set-Cookie` line parsing, per [RFC 6265
//! §5.2](https://tools.ietf.org/html/rfc6265#section-5.2), into a [`Cookie`]
//! record.

use std::error::Error as StdError;
use std::fmt;

use crate::cookie::Cookie;
use crate::date;

/// A `Set-Cookie` string that could not be parsed.
#[derive(Debug, Clone)]
pub struct ParseError {
    input: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid Set-Cookie string: {:?}", self.input)
    }
}

impl StdError for ParseError {}

fn is_control(byte: u8) -> bool {
    byte <= 0x1F
}

/// Parse a single `Set-Cookie` header value into a [`Cookie`].
///
/// In `loose` mode, a pair with no name (`=value`) is accepted and produces
/// an empty-string key, to tolerate real-world non-compliant servers.
pub(crate) fn parse(input: &str, loose: bool) -> Result<Cookie, ParseError> {
    let input = input.trim();
    let err = || ParseError { input: input.to_owned() };

    let (head, rest) = match input.find(';') {
        Some(idx) => (&input[..idx], Some(&input[idx + 1..])),
        None => (input, None),
    };

    let eq = head.find('=').ok_or_else(err)?;
    let (key, value) = (&head[..eq], &head[eq + 1..]);

    if key.trim().is_empty() && !loose {
        return Err(err());
    }

    let key = key.trim();
    let value = value.trim();

    if key.bytes().any(is_control) || value.bytes().any(is_control) {
        return Err(err());
    }

    let mut cookie = Cookie::new(key, value);

    let Some(rest) = rest else {
        return Ok(cookie);
    };

    for attr in rest.split(';') {
        let attr = attr.trim();

        if attr.is_empty() {
            continue;
        }

        let (name, value) = match attr.find('=') {
            Some(idx) => (attr[..idx].trim(), Some(attr[idx + 1..].trim())),
            None => (attr, None),
        };

        match name.to_ascii_lowercase().as_str() {
            "expires" => {
                if let Some(value) = value {
                    if let Some(t) = date::parse_cookie_date(value) {
                        cookie.set_expires(t);
                    }
                }
            }
            "max-age" => {
                if let Some(value) = value {
                    if is_max_age(value) {
                        if let Ok(n) = value.parse::<i64>() {
                            cookie.set_max_age(n);
                        }
                    }
                }
            }
            "domain" => {
                if let Some(value) = value {
                    let value = value.strip_prefix('.').unwrap_or(value);
                    if !value.is_empty() {
                        cookie.domain = Some(value.to_ascii_lowercase());
                    }
                }
            }
            "path" => {
                cookie.path = match value {
                    Some(value) if value.starts_with('/') => Some(value.to_owned()),
                    _ => None,
                };
            }
            "secure" => cookie.secure = true,
            "httponly" => cookie.http_only = true,
            _ => cookie.extensions.push(attr.to_owned()),
        }
    }

    Ok(cookie)
}

fn is_max_age(s: &str) -> bool {
    let s = s.strip_prefix('-').unwrap_or(s);
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_pair() {
        let c = parse("a=1", false).unwrap();
        assert_eq!(c.name(), "a");
        assert_eq!(c.value(), "1");
    }

    #[test]
    fn parses_attributes_last_wins() {
        let c = parse("a=1; Path=/x; Path=/y; Secure; HttpOnly", false).unwrap();
        assert_eq!(c.path(), Some("/y"));
        assert!(c.is_secure());
        assert!(c.is_http_only());
    }

    #[test]
    fn domain_attribute_strips_leading_dot_and_lowercases() {
        let c = parse("a=1; Domain=.Example.COM", false).unwrap();
        assert_eq!(c.domain(), Some("example.com"));
    }

    #[test]
    fn invalid_path_attribute_is_ignored() {
        let c = parse("a=1; Path=nope", false).unwrap();
        assert_eq!(c.path(), None);
    }

    #[test]
    fn unrecognized_attribute_becomes_extension() {
        let c = parse("a=1; SameSite=Lax", false).unwrap();
        assert_eq!(c.extensions(), &["SameSite=Lax".to_owned()]);
    }

    #[test]
    fn max_age_parses_signed_integer() {
        let c = parse("a=1; Max-Age=-5", false).unwrap();
        assert_eq!(c.max_age(), Some(crate::cookie::MaxAge::Finite(-5)));
    }

    #[test]
    fn invalid_max_age_is_ignored() {
        let c = parse("a=1; Max-Age=abc", false).unwrap();
        assert_eq!(c.max_age(), None);
    }

    #[test]
    fn expires_attribute_parses_via_date_codec() {
        let c = parse("a=1; Expires=Thu, 01 Jan 1970 00:00:00 GMT", false).unwrap();
        assert!(c.is_persistent());
    }

    #[test]
    fn missing_equals_fails_in_strict_mode() {
        assert!(parse("justaname", false).is_err());
    }

    #[test]
    fn empty_name_rejected_in_strict_accepted_in_loose() {
        assert!(parse("=onlyvalue", false).is_err());

        let c = parse("=onlyvalue", true).unwrap();
        assert_eq!(c.name(), "");
        assert_eq!(c.value(), "onlyvalue");
    }

    #[test]
    fn control_character_in_value_fails() {
        assert!(parse("a=has\x01control", false).is_err());
    }
}
