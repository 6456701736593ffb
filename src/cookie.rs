//! The [`Cookie`] record: validation, TTL/expiry computation, string forms,
//! and the JSON record used for persistence.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::date;
use crate::psl::PublicSuffixList;

/// The latest instant a `DateTime<Utc>` can represent while staying within
/// the 32-bit Unix time range, used as the clamp target for an infinite
/// expiry (see [`Cookie::expiry_date`]).
const MAX_TIME: i64 = 2_147_483_647;

fn creation_counter() -> &'static AtomicU64 {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    &COUNTER
}

/// Mint the next monotonically increasing creation index.
///
/// This is the process's one piece of global state: every [`Cookie`]
/// construction writes to it exactly once.
fn next_creation_index() -> u64 {
    creation_counter().fetch_add(1, Ordering::Relaxed)
}

/// A cookie's `Expires` attribute: either a concrete instant, or the sentinel
/// meaning "session cookie, no explicit expiry".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiration {
    /// No explicit expiry was set; the cookie expires with the session.
    Forever,
    /// The cookie expires at this instant.
    At(DateTime<Utc>),
}

/// A cookie's `Max-Age` attribute.
///
/// `Max-Age` takes precedence over `Expires` wherever both are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxAge {
    /// A finite number of seconds. A value `<= 0` means "already expired".
    Finite(i64),
    /// `Max-Age` was set to an unbounded future value.
    PositiveInfinity,
    /// `Max-Age` was set to an unbounded past value (always expired).
    NegativeInfinity,
}

impl From<i64> for MaxAge {
    fn from(seconds: i64) -> Self {
        MaxAge::Finite(seconds)
    }
}

/// The remaining time-to-live of a cookie, as computed by [`Cookie::ttl`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    /// The cookie has this many milliseconds left to live. `0` means expired.
    Millis(i64),
    /// The cookie never expires (a session cookie with no `Max-Age`).
    Forever,
}

/// The absolute expiry instant of a cookie, as computed by
/// [`Cookie::expiry_time`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryTime {
    /// Always in the past; the cookie is expired.
    NegInfinity,
    /// A concrete expiry instant.
    Finite(DateTime<Utc>),
    /// Never expires.
    PosInfinity,
}

/// The `SameSite` attribute value, read back from [`Cookie::extensions`] for
/// convenience.
///
/// This crate does not enforce SameSite tracking policy -- that is an
/// explicit non-goal -- it merely exposes the value the server sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    /// `SameSite=Strict`
    Strict,
    /// `SameSite=Lax`
    Lax,
    /// `SameSite=None`
    None,
}

/// A single HTTP cookie, and everything known about it.
///
/// See the crate documentation for the cookie lifecycle. A cookie is
/// uniquely identified, once stored in a [`Jar`](crate::Jar), by the triple
/// `(domain, path, key)`.
#[derive(Debug, Clone)]
pub struct Cookie {
    pub(crate) key: String,
    pub(crate) value: String,
    pub(crate) expires: Expiration,
    pub(crate) max_age: Option<MaxAge>,
    pub(crate) domain: Option<String>,
    pub(crate) path: Option<String>,
    pub(crate) secure: bool,
    pub(crate) http_only: bool,
    pub(crate) host_only: Option<bool>,
    pub(crate) path_is_default: bool,
    pub(crate) creation: DateTime<Utc>,
    pub(crate) last_accessed: DateTime<Utc>,
    pub(crate) creation_index: u64,
    pub(crate) extensions: Vec<String>,
}

impl Cookie {
    /// Construct a new cookie with the given name and value. All other
    /// fields take on their defaults (session cookie, no domain/path yet,
    /// not secure, not host-only).
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        let now = Utc::now();

        Self {
            key: key.into(),
            value: value.into(),
            expires: Expiration::Forever,
            max_age: None,
            domain: None,
            path: None,
            secure: false,
            http_only: false,
            host_only: None,
            path_is_default: false,
            creation: now,
            last_accessed: now,
            creation_index: next_creation_index(),
            extensions: Vec::new(),
        }
    }

    /// The name of the cookie. May be empty for a bare-value cookie.
    pub fn name(&self) -> &str {
        &self.key
    }

    /// The value of the cookie.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The canonical domain this cookie is scoped to, if the jar has
    /// accepted it (or it was parsed with an explicit `Domain` attribute).
    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    /// The path this cookie is scoped to.
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// True if this cookie is marked `Secure`.
    pub fn is_secure(&self) -> bool {
        self.secure
    }

    /// True if this cookie is marked `HttpOnly`.
    pub fn is_http_only(&self) -> bool {
        self.http_only
    }

    /// `Some(true)` if this cookie is host-only (had no `Domain` attribute
    /// when accepted), `Some(false)` if it domain-matches, `None` if it has
    /// not yet been accepted by a jar.
    pub fn host_only(&self) -> Option<bool> {
        self.host_only
    }

    /// True if `path` was computed from the request rather than given
    /// explicitly.
    pub fn path_is_default(&self) -> bool {
        self.path_is_default
    }

    /// When this cookie identity was first created.
    pub fn creation(&self) -> DateTime<Utc> {
        self.creation
    }

    /// When this cookie was last successfully retrieved.
    pub fn last_accessed(&self) -> DateTime<Utc> {
        self.last_accessed
    }

    /// The monotonic tiebreaker assigned once per construction.
    pub fn creation_index(&self) -> u64 {
        self.creation_index
    }

    /// Unrecognized attributes, preserved verbatim for round-tripping.
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Read the `SameSite` extension back as a typed value, if present and
    /// recognized. This does not gate any jar decision; SameSite enforcement
    /// is outside this crate's scope.
    pub fn same_site(&self) -> Option<SameSite> {
        self.extensions.iter().find_map(|ext| {
            let (name, value) = ext.split_once('=')?;

            if !name.eq_ignore_ascii_case("samesite") {
                return None;
            }

            match value.trim().to_ascii_lowercase().as_str() {
                "strict" => Some(SameSite::Strict),
                "lax" => Some(SameSite::Lax),
                "none" => Some(SameSite::None),
                _ => None,
            }
        })
    }

    /// Set the `Expires` attribute. Accepts either a [`DateTime<Utc>`]
    /// directly or a string to be parsed by the cookie-date codec; a string
    /// that fails to parse results in [`Expiration::Forever`].
    pub fn set_expires(&mut self, expires: impl Into<ExpiresInput>) {
        self.expires = match expires.into() {
            ExpiresInput::At(t) => Expiration::At(t),
            ExpiresInput::Str(s) => date::parse_cookie_date(&s)
                .map(Expiration::At)
                .unwrap_or(Expiration::Forever),
        };
    }

    /// The current `Expires` value.
    pub fn expires(&self) -> Expiration {
        self.expires
    }

    /// Set the `Max-Age` attribute, distinguishing finite values from the
    /// `+Forever`/`-Forever` sentinels.
    pub fn set_max_age(&mut self, max_age: impl Into<MaxAge>) {
        self.max_age = Some(max_age.into());
    }

    /// The current `Max-Age` value, if set.
    pub fn max_age(&self) -> Option<MaxAge> {
        self.max_age
    }

    /// The remaining time-to-live.
    ///
    /// `Max-Age` takes precedence over `Expires` when present.
    pub fn ttl(&self, now: DateTime<Utc>) -> Ttl {
        if let Some(max_age) = self.max_age {
            return match max_age {
                MaxAge::Finite(seconds) if seconds <= 0 => Ttl::Millis(0),
                MaxAge::Finite(seconds) => Ttl::Millis(seconds.saturating_mul(1000)),
                MaxAge::NegativeInfinity => Ttl::Millis(0),
                MaxAge::PositiveInfinity => Ttl::Forever,
            };
        }

        match self.expires {
            Expiration::Forever => Ttl::Forever,
            Expiration::At(t) => Ttl::Millis((t - now).num_milliseconds()),
        }
    }

    /// The absolute instant this cookie expires at, as a (possibly infinite)
    /// [`ExpiryTime`].
    ///
    /// `now` defaults to the cookie's `creation` time if not given, matching
    /// RFC 6265's treatment of `Max-Age` relative to acceptance time.
    pub fn expiry_time(&self, now: Option<DateTime<Utc>>) -> ExpiryTime {
        if let Some(max_age) = self.max_age {
            return match max_age {
                MaxAge::Finite(seconds) if seconds <= 0 => ExpiryTime::NegInfinity,
                MaxAge::NegativeInfinity => ExpiryTime::NegInfinity,
                MaxAge::PositiveInfinity => ExpiryTime::PosInfinity,
                MaxAge::Finite(seconds) => {
                    let base = now.unwrap_or(self.creation);
                    ExpiryTime::Finite(base + chrono::Duration::seconds(seconds))
                }
            };
        }

        match self.expires {
            Expiration::Forever => ExpiryTime::PosInfinity,
            Expiration::At(t) => ExpiryTime::Finite(t),
        }
    }

    /// [`expiry_time`](Self::expiry_time), clamped to a concrete instant:
    /// `PosInfinity` becomes the largest representable 32-bit Unix time, and
    /// `NegInfinity` becomes the Unix epoch.
    pub fn expiry_date(&self, now: Option<DateTime<Utc>>) -> DateTime<Utc> {
        match self.expiry_time(now) {
            ExpiryTime::PosInfinity => Utc.timestamp_opt(MAX_TIME, 0).unwrap(),
            ExpiryTime::NegInfinity => Utc.timestamp_opt(0, 0).unwrap(),
            ExpiryTime::Finite(t) => t,
        }
    }

    /// True if this cookie persists beyond the current session (it has a
    /// `Max-Age` or an `Expires` other than [`Expiration::Forever`]).
    pub fn is_persistent(&self) -> bool {
        self.max_age.is_some() || self.expires != Expiration::Forever
    }

    /// `true` iff every byte of `value` is a permitted cookie-octet.
    fn value_is_valid(&self) -> bool {
        self.value.bytes().all(is_cookie_octet)
    }

    /// Run the validation checks of RFC 6265 §4.1.2.2 and this crate's own
    /// public-suffix rule. Parsing never calls this automatically; it is a
    /// conscious opt-in check a caller can run before using a hand-built
    /// [`Cookie`].
    pub fn validate(&self, psl: &dyn PublicSuffixList) -> bool {
        if !self.value_is_valid() {
            return false;
        }

        if let Some(MaxAge::Finite(seconds)) = self.max_age {
            if seconds <= 0 {
                return false;
            }
        }

        if let Some(path) = &self.path {
            if !path.bytes().all(is_valid_path_byte) {
                return false;
            }
        }

        if let Some(domain) = &self.domain {
            if domain.ends_with('.') || psl.is_public_suffix(domain) {
                return false;
            }
        }

        true
    }

    /// The unprefixed `key=value` (or bare `value`) form, with no
    /// attributes. This is what gets joined into an outgoing `Cookie:`
    /// header.
    pub fn cookie_string(&self) -> String {
        if self.key.is_empty() {
            self.value.clone()
        } else {
            format!("{}={}", self.key, self.value)
        }
    }

    /// The full `Set-Cookie`-style string form, including attributes.
    pub fn to_set_cookie_string(&self) -> String {
        let mut s = self.cookie_string();

        if let Expiration::At(t) = self.expires {
            s.push_str("; Expires=");
            s.push_str(&date::format_rfc1123(t));
        }

        if let Some(MaxAge::Finite(seconds)) = self.max_age {
            s.push_str("; Max-Age=");
            s.push_str(&seconds.to_string());
        }

        if let Some(domain) = &self.domain {
            if self.host_only != Some(true) {
                s.push_str("; Domain=");
                s.push_str(domain);
            }
        }

        if let Some(path) = &self.path {
            s.push_str("; Path=");
            s.push_str(path);
        }

        if self.secure {
            s.push_str("; Secure");
        }

        if self.http_only {
            s.push_str("; HttpOnly");
        }

        for ext in &self.extensions {
            s.push_str("; ");
            s.push_str(ext);
        }

        s
    }

    /// Serialize this cookie to its JSON record form (see the crate's
    /// `Jar::serialize` documentation for the wire shape).
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(CookieWire::from(self)).expect("Cookie -> JSON is infallible")
    }

    /// Parse a cookie back out of its JSON record form.
    pub fn from_json(value: serde_json::Value) -> Option<Self> {
        let wire: CookieWire = serde_json::from_value(value).ok()?;
        wire.try_into().ok()
    }
}

impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_set_cookie_string())
    }
}

/// The character class accepted by [`Cookie::set_expires`]: a concrete
/// instant, or a string for the date codec to try.
pub enum ExpiresInput {
    /// A concrete instant.
    At(DateTime<Utc>),
    /// A string to be parsed per RFC 6265 §5.1.1.
    Str(String),
}

impl From<DateTime<Utc>> for ExpiresInput {
    fn from(t: DateTime<Utc>) -> Self {
        ExpiresInput::At(t)
    }
}

impl From<&str> for ExpiresInput {
    fn from(s: &str) -> Self {
        ExpiresInput::Str(s.to_owned())
    }
}

impl From<String> for ExpiresInput {
    fn from(s: String) -> Self {
        ExpiresInput::Str(s)
    }
}

/// RFC 6265 §4.1.1 cookie-octet: visible US-ASCII minus `"`, `,`, `;`, `\`.
pub(crate) fn is_cookie_octet(byte: u8) -> bool {
    matches!(byte, 0x21 | 0x23..=0x2B | 0x2D..=0x3A | 0x3C..=0x5B | 0x5D..=0x7E)
}

fn is_valid_path_byte(byte: u8) -> bool {
    matches!(byte, 0x20..=0x3A | 0x3C..=0x7E)
}

fn to_rfc3339(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn from_rfc3339(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s).ok().map(|t| t.with_timezone(&Utc))
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum MaxAgeWire {
    Finite(i64),
    Sentinel(String),
}

impl From<MaxAge> for MaxAgeWire {
    fn from(max_age: MaxAge) -> Self {
        match max_age {
            MaxAge::Finite(n) => MaxAgeWire::Finite(n),
            MaxAge::PositiveInfinity => MaxAgeWire::Sentinel("Infinity".to_owned()),
            MaxAge::NegativeInfinity => MaxAgeWire::Sentinel("-Infinity".to_owned()),
        }
    }
}

impl TryFrom<MaxAgeWire> for MaxAge {
    type Error = ();

    fn try_from(wire: MaxAgeWire) -> Result<Self, ()> {
        match wire {
            MaxAgeWire::Finite(n) => Ok(MaxAge::Finite(n)),
            MaxAgeWire::Sentinel(s) if s == "Infinity" => Ok(MaxAge::PositiveInfinity),
            MaxAgeWire::Sentinel(s) if s == "-Infinity" => Ok(MaxAge::NegativeInfinity),
            MaxAgeWire::Sentinel(_) => Err(()),
        }
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// The on-the-wire JSON shape of a [`Cookie`] record (§6). Fields equal to
/// their defaults are omitted from serialized output.
#[derive(Debug, Serialize, Deserialize)]
struct CookieWire {
    key: String,
    value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    expires: Option<String>,
    #[serde(rename = "maxAge", skip_serializing_if = "Option::is_none")]
    max_age: Option<MaxAgeWire>,
    #[serde(skip_serializing_if = "Option::is_none")]
    domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    #[serde(skip_serializing_if = "is_false", default)]
    secure: bool,
    #[serde(rename = "httpOnly", skip_serializing_if = "is_false", default)]
    http_only: bool,
    #[serde(rename = "hostOnly", skip_serializing_if = "Option::is_none")]
    host_only: Option<bool>,
    #[serde(rename = "pathIsDefault", skip_serializing_if = "is_false", default)]
    path_is_default: bool,
    creation: String,
    #[serde(rename = "lastAccessed")]
    last_accessed: String,
    #[serde(rename = "creationIndex", skip_serializing_if = "Option::is_none")]
    creation_index: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    extensions: Vec<String>,
}

impl From<&Cookie> for CookieWire {
    fn from(c: &Cookie) -> Self {
        Self {
            key: c.key.clone(),
            value: c.value.clone(),
            expires: match c.expires {
                Expiration::Forever => None,
                Expiration::At(t) => Some(to_rfc3339(t)),
            },
            max_age: c.max_age.map(MaxAgeWire::from),
            domain: c.domain.clone(),
            path: c.path.clone(),
            secure: c.secure,
            http_only: c.http_only,
            host_only: c.host_only,
            path_is_default: c.path_is_default,
            creation: to_rfc3339(c.creation),
            last_accessed: to_rfc3339(c.last_accessed),
            creation_index: Some(c.creation_index),
            extensions: c.extensions.clone(),
        }
    }
}

impl TryFrom<CookieWire> for Cookie {
    type Error = ();

    fn try_from(wire: CookieWire) -> Result<Self, ()> {
        let max_age = wire.max_age.map(MaxAge::try_from).transpose()?;

        Ok(Cookie {
            key: wire.key,
            value: wire.value,
            expires: match wire.expires {
                None => Expiration::Forever,
                Some(s) => Expiration::At(from_rfc3339(&s).ok_or(())?),
            },
            max_age,
            domain: wire.domain,
            path: wire.path,
            secure: wire.secure,
            http_only: wire.http_only,
            host_only: wire.host_only,
            path_is_default: wire.path_is_default,
            creation: from_rfc3339(&wire.creation).ok_or(())?,
            last_accessed: from_rfc3339(&wire.last_accessed).ok_or(())?,
            creation_index: wire.creation_index.unwrap_or_else(next_creation_index),
            extensions: wire.extensions,
        })
    }
}
