//! This module provides access to the [Public Suffix
//! List](https://publicsuffix.org), a community-supported database of domain
//! "public suffixes". This list is used to prevent cookies from being set for
//! a high-level domain name suffix, which could be exploited maliciously.
//!
//! Unlike a full HTTP client, this crate never reaches out to the network to
//! refresh the list -- fetching HTTP is explicitly out of scope for a cookie
//! engine. Instead, a real offline copy of the list is embedded at compile
//! time and used for the lifetime of the process. Callers who need a fresher
//! list can implement [`PublicSuffixList`] themselves and hand it to
//! [`JarBuilder::public_suffix_list`](crate::JarBuilder::public_suffix_list).

use once_cell::sync::Lazy;
use publicsuffix::Psl;

/// A real, offline copy of the Public Suffix List, embedded at compile time.
static BUNDLED_LIST: &str = include_str!("psl/list/public_suffix_list.dat");

/// The bundled list, parsed once and shared by every [`BundledList`].
/// Parsing ~14,000 lines on every jar construction would be wasteful.
static PARSED_LIST: Lazy<publicsuffix::List> = Lazy::new(|| {
    BUNDLED_LIST
        .parse()
        .expect("could not parse bundled public suffix list")
});

/// An oracle that knows which domains are public suffixes.
///
/// This is the `publicsuffix.registrable_parent` external collaborator:
/// implementations answer "what is the registrable parent of this domain?",
/// returning `None` iff the domain is itself a public suffix.
pub trait PublicSuffixList: Send + Sync {
    /// The registrable parent of `domain`, or `None` if `domain` is itself a
    /// public suffix (and therefore has no registrable parent).
    fn registrable_parent(&self, domain: &str) -> Option<String>;

    /// True iff `domain` is itself a public suffix.
    fn is_public_suffix(&self, domain: &str) -> bool {
        self.registrable_parent(domain).is_none()
    }
}

/// The default [`PublicSuffixList`], backed by a bundled copy of the official
/// list. Cheap to construct: the list itself is parsed once per process.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledList;

impl BundledList {
    /// Reference the bundled, lazily-parsed copy of the list.
    pub fn new() -> Self {
        Self
    }
}

impl PublicSuffixList for BundledList {
    fn registrable_parent(&self, domain: &str) -> Option<String> {
        PARSED_LIST
            .domain(domain.as_bytes())
            .map(|d| String::from_utf8_lossy(d.as_bytes()).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_public_suffixes() {
        let psl = BundledList::new();

        assert!(psl.is_public_suffix("co.uk"));
        assert!(psl.is_public_suffix("com"));
        assert!(!psl.is_public_suffix("example.com"));
        assert!(!psl.is_public_suffix("example.co.uk"));
    }

    #[test]
    fn finds_registrable_parent() {
        let psl = BundledList::new();

        assert_eq!(
            psl.registrable_parent("www.example.co.uk").as_deref(),
            Some("example.co.uk")
        );
        assert_eq!(psl.registrable_parent("co.uk"), None);
    }
}
