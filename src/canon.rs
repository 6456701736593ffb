//! Host canonicalization and the domain/path matching primitives of
//! [RFC 6265 §5.1](https://tools.ietf.org/html/rfc6265#section-5.1).

use std::net::IpAddr;
use std::str::FromStr;

use crate::psl::PublicSuffixList;

/// Canonicalize a host per RFC 6265 §5.1.2.
///
/// Trims whitespace, strips a single leading `.`, transcodes to ASCII via IDNA
/// if the host contains any non-ASCII code points, and lower-cases the
/// result. Returns `None` if the input cannot be transcoded.
pub(crate) fn canonical_domain(host: &str) -> Option<String> {
    let host = host.trim();
    let host = host.strip_prefix('.').unwrap_or(host);

    if host.is_empty() {
        return None;
    }

    if host.is_ascii() {
        Some(host.to_ascii_lowercase())
    } else {
        idna::domain_to_ascii(host).ok()
    }
}

/// True if `host` is a valid IPv4 or IPv6 literal.
pub(crate) fn is_ip(host: &str) -> bool {
    IpAddr::from_str(host).is_ok()
}

/// RFC 6265 §5.1.3 domain-match.
///
/// `host` and `domain` are assumed already canonicalized.
pub(crate) fn domain_match(host: &str, domain: &str) -> bool {
    if domain.is_empty() {
        return false;
    }

    if host == domain {
        return true;
    }

    if is_ip(host) {
        return false;
    }

    host.ends_with(domain) && host.as_bytes()[host.len() - domain.len() - 1] == b'.'
}

/// RFC 6265 §5.1.4 default-path.
pub(crate) fn default_path(uri_path: &str) -> String {
    if uri_path.is_empty() || !uri_path.starts_with('/') {
        return "/".to_owned();
    }

    if uri_path.matches('/').count() == 1 {
        return "/".to_owned();
    }

    match uri_path.rfind('/') {
        Some(0) | None => "/".to_owned(),
        Some(idx) => uri_path[..idx].to_owned(),
    }
}

/// RFC 6265 §5.1.4 path-match.
pub(crate) fn path_match(request_path: &str, cookie_path: &str) -> bool {
    if request_path == cookie_path {
        return true;
    }

    if let Some(rest) = request_path.strip_prefix(cookie_path) {
        if cookie_path.ends_with('/') || rest.starts_with('/') {
            return true;
        }
    }

    false
}

/// The longest-to-shortest list of path prefixes used by the store's
/// path-permutation-assisted lookup.
pub(crate) fn permute_path(path: &str) -> Vec<String> {
    if path == "/" {
        return vec!["/".to_owned()];
    }

    let mut current = path.strip_suffix('/').unwrap_or(path).to_owned();
    let mut permutations = vec![current.clone()];

    while let Some(idx) = current.rfind('/') {
        if idx == 0 {
            break;
        }

        current.truncate(idx);
        permutations.push(current.clone());
    }

    permutations.push("/".to_owned());
    permutations
}

/// The list of `domain` and every parent domain up to (but not including) the
/// public suffix, used by the store's domain-permutation-assisted lookup.
pub(crate) fn permute_domain(domain: &str, psl: &dyn PublicSuffixList) -> Vec<String> {
    let mut permutations = vec![domain.to_owned()];

    let mut rest = domain;
    while let Some(idx) = rest.find('.') {
        rest = &rest[idx + 1..];

        if psl.is_public_suffix(rest) || rest.is_empty() {
            break;
        }

        permutations.push(rest.to_owned());
    }

    permutations
}
