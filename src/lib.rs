#![deny(missing_docs)]

//! An RFC 6265 cookie engine.
//!
//! This crate parses `Set-Cookie` header values, validates and stores the
//! resulting cookies in a [`Jar`] with policy enforcement, and emits the
//! correct `Cookie` header for outgoing requests. It implements the
//! processing model of [RFC 6265] (with the commonly-adopted public suffix
//! extension) with enough fidelity to serve as the cookie subsystem of an
//! HTTP client.
//!
//! ```
//! use cookiejar::Jar;
//! use url::Url;
//!
//! # fn run() -> Result<(), cookiejar::Error> {
//! let jar = Jar::new();
//! let url = Url::parse("https://example.com/").unwrap();
//!
//! jar.set("session=abc123; Path=/; Secure", &url, Default::default())?;
//!
//! assert_eq!(
//!     jar.get_cookie_string(&url, Default::default())?.as_deref(),
//!     Some("session=abc123")
//! );
//! # Ok(())
//! # }
//! ```
//!
//! Fetching HTTP, maintaining a TLS session, and SameSite tracking policy
//! beyond what the RFC specifies are all out of scope for this crate; it only
//! implements the cookie processing model itself.
//!
//! ## Logging
//!
//! This crate logs parse failures, policy rejections, and store churn using
//! the [log] crate (or [tracing], if the `tracing` feature is enabled).
//!
//! [RFC 6265]: https://tools.ietf.org/html/rfc6265
//! [log]: https://docs.rs/log
//! [tracing]: https://docs.rs/tracing

#[macro_use]
mod log;

mod canon;
mod cookie;
mod date;
mod error;
mod parse;
mod psl;
mod store;

pub mod jar;

pub use crate::{
    cookie::{Cookie, Expiration, ExpiryTime, MaxAge, SameSite, Ttl},
    error::{Error, Result},
    jar::{CookieInput, CookieRequestOptions, CookieResponseOptions, Jar, JarBuilder, JarConfig},
    parse::ParseError,
    psl::{BundledList, PublicSuffixList},
    store::{MemoryStore, Store, StoreError},
};

pub use url::Url;
