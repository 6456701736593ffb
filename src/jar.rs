//! The [`Jar`] policy engine: the `set`/`get` state machine of [RFC 6265
//! §5.3](https://tools.ietf.org/html/rfc6265#section-5.3) and
//! [§5.4](https://tools.ietf.org/html/rfc6265#section-5.4), plus
//! serialization.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use url::Url;

use crate::canon;
use crate::cookie::{Cookie, ExpiryTime};
use crate::error::{Error, Result};
use crate::parse;
use crate::psl::{BundledList, PublicSuffixList};
use crate::store::{MemoryStore, Store};

/// Configuration a [`Jar`] is built with.
#[derive(Debug, Clone, Copy)]
pub struct JarConfig {
    /// Refuse to store a cookie whose domain is itself a public suffix.
    pub reject_public_suffixes: bool,
    /// Accept the non-compliant `=value` (empty name) form when parsing.
    pub loose_mode: bool,
}

impl Default for JarConfig {
    fn default() -> Self {
        Self {
            reject_public_suffixes: true,
            loose_mode: false,
        }
    }
}

/// Options accepted by [`Jar::set`].
#[derive(Debug, Clone)]
pub struct CookieResponseOptions {
    /// Whether the cookie is being set from an HTTP context. When `false`,
    /// an `HttpOnly` cookie is rejected.
    pub http: bool,
    /// When `true`, a policy failure is swallowed (returns `Ok(None)`)
    /// instead of returned as an error.
    pub ignore_error: bool,
    /// Overrides the jar's `loose_mode` for this call only, when parsing a
    /// raw header string.
    pub loose: Option<bool>,
    /// The instant to treat as "now". Defaults to the current time.
    pub now: Option<DateTime<Utc>>,
}

impl Default for CookieResponseOptions {
    fn default() -> Self {
        Self {
            http: true,
            ignore_error: false,
            loose: None,
            now: None,
        }
    }
}

/// Options accepted by [`Jar::get`], [`Jar::get_cookie_string`], and
/// [`Jar::get_set_cookie_strings`].
#[derive(Debug, Clone)]
pub struct CookieRequestOptions {
    /// Whether the request context is secure. Defaults to the URL's scheme
    /// being `https` or `wss`.
    pub secure: Option<bool>,
    /// Whether the request is from an HTTP context. Defaults to `true`.
    pub http: bool,
    /// Disables the path filter, returning cookies for every path.
    pub all_paths: bool,
    /// Evict and drop expired cookies. Defaults to `true`.
    pub expire: bool,
    /// The instant to treat as "now". Defaults to the current time.
    pub now: Option<DateTime<Utc>>,
    /// Apply `cookieCompare` ordering to the result. Defaults to `true`.
    pub sort: bool,
}

impl Default for CookieRequestOptions {
    fn default() -> Self {
        Self {
            secure: None,
            http: true,
            all_paths: false,
            expire: true,
            now: None,
            sort: true,
        }
    }
}

/// Anything that can be handed to [`Jar::set`]: either a raw `Set-Cookie`
/// header value, or an already-built [`Cookie`].
pub enum CookieInput {
    /// A raw `Set-Cookie` header value, to be run through the parser.
    Str(String),
    /// An already-parsed or hand-built cookie.
    Cookie(Cookie),
}

impl From<&str> for CookieInput {
    fn from(s: &str) -> Self {
        CookieInput::Str(s.to_owned())
    }
}

impl From<String> for CookieInput {
    fn from(s: String) -> Self {
        CookieInput::Str(s)
    }
}

impl From<Cookie> for CookieInput {
    fn from(c: Cookie) -> Self {
        CookieInput::Cookie(c)
    }
}

/// A builder for [`Jar`], for swapping out the store or public suffix list.
pub struct JarBuilder {
    store: Box<dyn Store>,
    psl: Box<dyn PublicSuffixList>,
    config: JarConfig,
}

impl JarBuilder {
    /// Use this store instead of the default in-memory one.
    pub fn store(mut self, store: impl Store + 'static) -> Self {
        self.store = Box::new(store);
        self
    }

    /// Use this public suffix list instead of the bundled one.
    pub fn public_suffix_list(mut self, psl: impl PublicSuffixList + 'static) -> Self {
        self.psl = Box::new(psl);
        self
    }

    /// Set the jar's configuration.
    pub fn config(mut self, config: JarConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the jar.
    pub fn build(self) -> Jar {
        Jar {
            store: self.store,
            psl: self.psl,
            config: self.config,
        }
    }
}

impl Default for JarBuilder {
    fn default() -> Self {
        Self {
            store: Box::new(MemoryStore::new()),
            psl: Box::new(BundledList::new()),
            config: JarConfig::default(),
        }
    }
}

/// The cookie policy engine: stores cookies accepted from responses,
/// enforces RFC 6265 scoping rules, and emits the `Cookie:` header for
/// requests.
pub struct Jar {
    store: Box<dyn Store>,
    psl: Box<dyn PublicSuffixList>,
    config: JarConfig,
}

impl Jar {
    /// An empty jar with an in-memory store, the bundled public suffix
    /// list, and default configuration.
    pub fn new() -> Self {
        JarBuilder::default().build()
    }

    /// Start building a jar with a custom store and/or public suffix list.
    pub fn builder() -> JarBuilder {
        JarBuilder::default()
    }

    fn fail(&self, ignore_error: bool, error: Error) -> Result<Option<Cookie>> {
        if ignore_error {
            debug!("cookie rejected, ignoring: {}", error);
            Ok(None)
        } else {
            error!("cookie rejected: {}", error);
            Err(error)
        }
    }

    /// Accept a cookie from a response to `url`.
    ///
    /// `input` may be a raw `Set-Cookie` header string or an already-built
    /// [`Cookie`]. Returns `Ok(None)` only when `options.ignore_error` is
    /// set and a policy check failed.
    pub fn set(
        &self,
        input: impl Into<CookieInput>,
        url: &Url,
        options: CookieResponseOptions,
    ) -> Result<Option<Cookie>> {
        let host = canon::canonical_domain(url.host_str().unwrap_or_default()).unwrap_or_default();
        let loose = options.loose.unwrap_or(self.config.loose_mode);

        let mut cookie = match input.into() {
            CookieInput::Cookie(c) => c,
            CookieInput::Str(s) => match parse::parse(&s, loose) {
                Ok(c) => c,
                Err(e) => return self.fail(options.ignore_error, Error::from(e)),
            },
        };

        if self.config.reject_public_suffixes {
            if let Some(domain) = cookie.domain.clone() {
                if self.psl.is_public_suffix(&domain) {
                    return self.fail(options.ignore_error, Error::PublicSuffix { domain });
                }
            }
        }

        match cookie.domain.clone() {
            Some(domain) => {
                if !canon::domain_match(&host, &domain) {
                    return self.fail(
                        options.ignore_error,
                        Error::DomainMismatch { host, domain },
                    );
                }

                if cookie.host_only.is_none() {
                    cookie.host_only = Some(false);
                }
            }
            None => {
                cookie.host_only = Some(true);
                cookie.domain = Some(host.clone());
            }
        }

        if !cookie.path.as_deref().is_some_and(|p| p.starts_with('/')) {
            cookie.path = Some(canon::default_path(url.path()));
            cookie.path_is_default = true;
        }

        if !options.http && cookie.http_only {
            return self.fail(options.ignore_error, Error::HttpOnlyRejected);
        }

        let domain = cookie.domain.clone().unwrap();
        let path = cookie.path.clone().unwrap();
        let now = options.now.unwrap_or_else(Utc::now);

        let existing = self.store.find(&domain, &path, &cookie.key)?;

        match existing {
            Some(old) => {
                if !options.http && old.http_only {
                    return self.fail(options.ignore_error, Error::HttpOnlyRejected);
                }

                cookie.creation = old.creation;
                cookie.creation_index = old.creation_index;
                cookie.last_accessed = now;
                trace!("replacing cookie {}:{}:{}", domain, path, cookie.key);
                self.store.update(old, cookie.clone())?;
            }
            None => {
                cookie.creation = now;
                cookie.last_accessed = now;
                info!("storing new cookie {}:{}:{}", domain, path, cookie.key);
                self.store.put(cookie.clone())?;
            }
        }

        Ok(Some(cookie))
    }

    /// Retrieve every cookie that applies to a request against `url`,
    /// ordered by `cookieCompare` unless `options.sort` is `false`.
    pub fn get(&self, url: &Url, options: CookieRequestOptions) -> Result<Vec<Cookie>> {
        let host = canon::canonical_domain(url.host_str().unwrap_or_default()).unwrap_or_default();
        let request_path = match url.path() {
            "" => "/".to_owned(),
            p => p.to_owned(),
        };

        let secure = options
            .secure
            .unwrap_or_else(|| matches!(url.scheme(), "https" | "wss"));
        let now = options.now.unwrap_or_else(Utc::now);

        let path_filter = if options.all_paths {
            None
        } else {
            Some(request_path.as_str())
        };

        let candidates = self.store.find_cookies(&host, path_filter, self.psl.as_ref())?;
        let mut result = Vec::with_capacity(candidates.len());

        for cookie in candidates {
            let domain = cookie.domain.clone().unwrap_or_default();

            let host_ok = if cookie.host_only == Some(true) {
                domain == host
            } else {
                canon::domain_match(&host, &domain)
            };

            if !host_ok {
                continue;
            }

            if !options.all_paths {
                let cookie_path = cookie.path.as_deref().unwrap_or("/");
                if !canon::path_match(&request_path, cookie_path) {
                    continue;
                }
            }

            if cookie.secure && !secure {
                continue;
            }

            if cookie.http_only && !options.http {
                continue;
            }

            if options.expire {
                let expired = match cookie.expiry_time(None) {
                    ExpiryTime::NegInfinity => true,
                    ExpiryTime::Finite(t) => t <= now,
                    ExpiryTime::PosInfinity => false,
                };

                if expired {
                    let path = cookie.path.as_deref().unwrap_or("/");
                    let _ = self.store.remove(&domain, path, &cookie.key);
                    continue;
                }
            }

            let mut touched = cookie.clone();
            touched.last_accessed = now;
            let _ = self.store.update(cookie, touched.clone());

            result.push(touched);
        }

        if options.sort {
            result.sort_by(cookie_compare);
        }

        Ok(result)
    }

    /// The `Cookie:` header value for a request, or `None` if no cookie
    /// applies.
    pub fn get_cookie_string(&self, url: &Url, options: CookieRequestOptions) -> Result<Option<String>> {
        let cookies = self.get(url, options)?;

        if cookies.is_empty() {
            Ok(None)
        } else {
            Ok(Some(
                cookies
                    .iter()
                    .map(Cookie::cookie_string)
                    .collect::<Vec<_>>()
                    .join("; "),
            ))
        }
    }

    /// Every applicable cookie rendered in its full `Set-Cookie` string
    /// form, e.g. for re-emitting as request cookies in a proxy.
    pub fn get_set_cookie_strings(&self, url: &Url, options: CookieRequestOptions) -> Result<Vec<String>> {
        Ok(self
            .get(url, options)?
            .iter()
            .map(Cookie::to_set_cookie_string)
            .collect())
    }

    /// Serialize the jar's contents to the JSON record form (see the crate
    /// documentation for the wire shape). `creationIndex` is stripped from
    /// each record; it is re-assigned on [`Jar::deserialize`].
    pub fn serialize(&self) -> Result<Value> {
        let cookies = self
            .store
            .get_all()
            .map_err(|e| Error::Serialization(e.to_string()))?;

        let records: Vec<Value> = cookies
            .iter()
            .map(|c| {
                let mut record = c.to_json();
                if let Some(obj) = record.as_object_mut() {
                    obj.remove("creationIndex");
                }
                record
            })
            .collect();

        Ok(json!({
            "storeType": self.store.store_type(),
            "rejectPublicSuffixes": self.config.reject_public_suffixes,
            "cookies": records,
        }))
    }

    /// Build a fresh jar from a serialized blob, using a new in-memory
    /// store. Records that fail to decode are skipped.
    pub fn deserialize(blob: &Value) -> Result<Self> {
        Self::deserialize_into(blob, MemoryStore::new())
    }

    /// Like [`Jar::deserialize`], but into a caller-supplied store.
    pub fn deserialize_into(blob: &Value, store: impl Store + 'static) -> Result<Self> {
        let reject_public_suffixes = blob
            .get("rejectPublicSuffixes")
            .and_then(Value::as_bool)
            .unwrap_or(true);

        let jar = Jar {
            store: Box::new(store),
            psl: Box::new(BundledList::new()),
            config: JarConfig {
                reject_public_suffixes,
                ..JarConfig::default()
            },
        };

        if let Some(records) = blob.get("cookies").and_then(Value::as_array) {
            for record in records {
                match Cookie::from_json(record.clone()) {
                    Some(cookie) => jar.store.put(cookie)?,
                    None => debug!("skipping cookie record that failed to decode"),
                }
            }
        }

        Ok(jar)
    }

    /// A deep copy of this jar into a fresh in-memory store.
    pub fn try_clone(&self) -> Result<Self> {
        Self::deserialize(&self.serialize()?)
    }
}

impl Default for Jar {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
static_assertions::assert_impl_all!(Jar: Send, Sync);

/// The total order used to sort a [`Jar::get`] result: longer paths first,
/// then earlier creation, then ascending `creationIndex`.
fn cookie_compare(a: &Cookie, b: &Cookie) -> Ordering {
    let a_len = a.path.as_deref().unwrap_or("/").len();
    let b_len = b.path.as_deref().unwrap_or("/").len();

    b_len
        .cmp(&a_len)
        .then_with(|| a.creation.cmp(&b.creation))
        .then_with(|| a.creation_index.cmp(&b.creation_index))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn sets_and_gets_a_simple_cookie() {
        let jar = Jar::new();
        jar.set("a=1", &url("http://example.com/"), Default::default())
            .unwrap();

        assert_eq!(
            jar.get_cookie_string(&url("http://example.com/"), Default::default())
                .unwrap()
                .as_deref(),
            Some("a=1")
        );
    }

    #[test]
    fn longer_path_sorts_first() {
        let jar = Jar::new();
        let origin = url("http://example.com/");
        jar.set("a=1; Path=/x", &origin, Default::default()).unwrap();
        jar.set("a=2; Path=/", &origin, Default::default()).unwrap();

        assert_eq!(
            jar.get_cookie_string(&url("http://example.com/x/y"), Default::default())
                .unwrap()
                .as_deref(),
            Some("a=1; a=2")
        );
    }

    #[test]
    fn secure_cookie_is_withheld_from_plain_http() {
        let jar = Jar::new();
        jar.set("s=1; Secure", &url("https://example.com/"), Default::default())
            .unwrap();

        assert_eq!(
            jar.get_cookie_string(&url("http://example.com/"), Default::default())
                .unwrap(),
            None
        );
    }

    #[test]
    fn http_only_cookie_is_withheld_from_non_http_context() {
        let jar = Jar::new();
        jar.set("h=1; HttpOnly", &url("http://example.com/"), Default::default())
            .unwrap();

        let options = CookieRequestOptions {
            http: false,
            ..Default::default()
        };

        assert_eq!(
            jar.get_cookie_string(&url("http://example.com/"), options).unwrap(),
            None
        );
    }

    #[test]
    fn domain_attribute_permits_parent_lookup() {
        let jar = Jar::new();
        jar.set(
            "a=1; Domain=example.com",
            &url("http://sub.example.com/"),
            Default::default(),
        )
        .unwrap();

        assert_eq!(
            jar.get_cookie_string(&url("http://example.com/"), Default::default())
                .unwrap()
                .as_deref(),
            Some("a=1")
        );
    }

    #[test]
    fn expired_cookie_is_evicted_on_get() {
        let jar = Jar::new();
        jar.set(
            "a=1; Expires=Thu, 01 Jan 1970 00:00:00 GMT",
            &url("http://example.com/"),
            Default::default(),
        )
        .unwrap();

        assert_eq!(
            jar.get_cookie_string(&url("http://example.com/"), Default::default())
                .unwrap(),
            None
        );

        let blob = jar.serialize().unwrap();
        assert_eq!(blob["cookies"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn positive_max_age_cookie_is_evicted_once_it_elapses() {
        let jar = Jar::new();
        let origin = url("http://example.com/");
        jar.set("a=1; Max-Age=60", &origin, Default::default()).unwrap();

        let cookies = jar.get(&origin, Default::default()).unwrap();
        let creation = cookies[0].creation();

        let still_fresh = CookieRequestOptions {
            now: Some(creation + chrono::Duration::seconds(30)),
            ..Default::default()
        };
        assert_eq!(
            jar.get_cookie_string(&origin, still_fresh).unwrap().as_deref(),
            Some("a=1")
        );

        let elapsed = CookieRequestOptions {
            now: Some(creation + chrono::Duration::seconds(120)),
            ..Default::default()
        };
        assert_eq!(jar.get_cookie_string(&origin, elapsed).unwrap(), None);
    }

    #[test]
    fn public_suffix_domain_is_rejected() {
        let jar = Jar::new();
        let result = jar.set(
            "a=1; Domain=co.uk",
            &url("http://example.co.uk/"),
            Default::default(),
        );

        assert!(matches!(result, Err(Error::PublicSuffix { .. })));
    }

    #[test]
    fn ignore_error_swallows_policy_failure() {
        let jar = Jar::new();
        let options = CookieResponseOptions {
            ignore_error: true,
            ..Default::default()
        };

        let result = jar
            .set("a=1; Domain=co.uk", &url("http://example.co.uk/"), options)
            .unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn replacing_a_cookie_preserves_creation() {
        let jar = Jar::new();
        let origin = url("http://example.com/");

        let first = jar.set("a=1", &origin, Default::default()).unwrap().unwrap();
        let second = jar.set("a=2", &origin, Default::default()).unwrap().unwrap();

        assert_eq!(first.creation(), second.creation());
        assert_eq!(first.creation_index(), second.creation_index());
        assert_eq!(second.value(), "2");
    }

    #[test]
    fn serialize_then_deserialize_round_trips_cookies() {
        let jar = Jar::new();
        jar.set("a=1; Path=/x", &url("http://example.com/"), Default::default())
            .unwrap();

        let blob = jar.serialize().unwrap();
        let restored = Jar::deserialize(&blob).unwrap();

        assert_eq!(
            restored
                .get_cookie_string(&url("http://example.com/x"), Default::default())
                .unwrap()
                .as_deref(),
            Some("a=1")
        );
    }
}
