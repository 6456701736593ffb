//! Types for error handling.

use std::error::Error as StdError;
use std::fmt;

use crate::parse::ParseError;
use crate::store::StoreError;

/// A convenient alias for a `Result` with [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// All possible types of errors that can be returned by this crate.
#[derive(Debug)]
pub enum Error {
    /// A `Set-Cookie` string could not be parsed.
    Parse(ParseError),
    /// The cookie's domain has no registrable parent; it is itself a public
    /// suffix and `reject_public_suffixes` is enabled.
    PublicSuffix {
        /// The canonical domain that was rejected.
        domain: String,
    },
    /// The cookie's `Domain` attribute does not domain-match the request
    /// host it was received from.
    DomainMismatch {
        /// The request host the cookie arrived from.
        host: String,
        /// The `Domain` attribute of the rejected cookie.
        domain: String,
    },
    /// An `HttpOnly` cookie was set or replaced from a non-HTTP context.
    HttpOnlyRejected,
    /// An error was propagated verbatim from the backing [`Store`](crate::Store).
    Store(Box<dyn StdError + Send + Sync>),
    /// The backing store does not support the operation needed to serialize
    /// the jar (i.e. it has no working `get_all`).
    Serialization(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Parse(e) => write!(f, "could not parse Set-Cookie header: {}", e),
            Error::PublicSuffix { domain } => {
                write!(f, "refusing to store cookie for public suffix '{}'", domain)
            }
            Error::DomainMismatch { host, domain } => write!(
                f,
                "host '{}' is not allowed to set cookies for domain '{}'",
                host, domain
            ),
            Error::HttpOnlyRejected => {
                write!(f, "an HttpOnly cookie cannot be set or read from a non-HTTP context")
            }
            Error::Store(e) => write!(f, "cookie store error: {}", e),
            Error::Serialization(reason) => write!(f, "could not serialize cookie jar: {}", reason),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Parse(e) => Some(e),
            Error::Store(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Error::Parse(e)
    }
}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        Error::Store(Box::new(e))
    }
}
