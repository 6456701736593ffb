//! The [`Store`] trait and its in-memory implementation.

use std::collections::HashMap;
use std::error::Error as StdError;

use crate::canon::{permute_domain, permute_path};
use crate::cookie::Cookie;
use crate::psl::PublicSuffixList;

/// A keyed bag of cookies.
///
/// A store is queried and mutated by identity triple `(domain, path, key)`.
/// All operations here are synchronous; see the crate documentation for why
/// an asynchronous store is out of scope.
pub trait Store: Send + Sync {
    /// The cookie at this exact identity, if any.
    fn find(&self, domain: &str, path: &str, key: &str) -> Result<Option<Cookie>, StoreError>;

    /// Candidate cookies for a request against `host`.
    ///
    /// Must include every cookie stored under a domain in
    /// `permute_domain(host, psl)`, and, when `path` is `Some`, every cookie
    /// whose stored path is in `permute_path(path)`. The jar applies the
    /// precise RFC 6265 filters afterwards; a store may over-return.
    fn find_cookies(
        &self,
        host: &str,
        path: Option<&str>,
        psl: &dyn PublicSuffixList,
    ) -> Result<Vec<Cookie>, StoreError>;

    /// Insert a brand-new cookie. Calling this for an identity that already
    /// exists is a caller error; the jar always uses [`Store::update`] for
    /// the replace case.
    fn put(&self, cookie: Cookie) -> Result<(), StoreError>;

    /// Replace `old` with `new` at the same identity. The default
    /// implementation just calls [`Store::put`].
    fn update(&self, _old: Cookie, new: Cookie) -> Result<(), StoreError> {
        self.put(new)
    }

    /// Delete the cookie at this identity, if present.
    fn remove(&self, domain: &str, path: &str, key: &str) -> Result<(), StoreError>;

    /// Drop every stored cookie.
    fn remove_all(&self) -> Result<(), StoreError>;

    /// Every stored cookie, used by `Jar::serialize`. Stores that cannot
    /// enumerate their contents should return `Err`.
    fn get_all(&self) -> Result<Vec<Cookie>, StoreError>;

    /// Whether every operation on this store completes before returning.
    /// The in-memory store is always synchronous; this exists so future,
    /// out-of-process stores have somewhere to report otherwise.
    fn is_synchronous(&self) -> bool {
        true
    }

    /// The store's name, used as the informational `storeType` field of a
    /// serialized jar.
    fn store_type(&self) -> &'static str;
}

/// An error propagated verbatim from a [`Store`] implementation.
#[derive(Debug)]
pub struct StoreError(Box<dyn StdError + Send + Sync>);

impl StoreError {
    /// Wrap an arbitrary error as a [`StoreError`].
    pub fn new(error: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self(error.into())
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl StdError for StoreError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(self.0.as_ref())
    }
}

type Index = HashMap<String, HashMap<String, HashMap<String, Cookie>>>;

/// The default [`Store`]: an in-memory three-level index `domain -> path ->
/// key -> Cookie`, guarded by a mutex so it can be shared across threads.
#[derive(Default)]
pub struct MemoryStore {
    index: std::sync::Mutex<Index>,
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn find(&self, domain: &str, path: &str, key: &str) -> Result<Option<Cookie>, StoreError> {
        let index = self.index.lock().unwrap();

        Ok(index
            .get(domain)
            .and_then(|paths| paths.get(path))
            .and_then(|keys| keys.get(key))
            .cloned())
    }

    fn find_cookies(
        &self,
        host: &str,
        path: Option<&str>,
        psl: &dyn PublicSuffixList,
    ) -> Result<Vec<Cookie>, StoreError> {
        let index = self.index.lock().unwrap();
        let mut found = Vec::new();

        for domain in permute_domain(host, psl) {
            let Some(paths) = index.get(&domain) else {
                continue;
            };

            match path {
                None => {
                    for keys in paths.values() {
                        found.extend(keys.values().cloned());
                    }
                }
                Some(request_path) => {
                    for candidate in permute_path(request_path) {
                        if let Some(keys) = paths.get(&candidate) {
                            found.extend(keys.values().cloned());
                        }
                    }
                }
            }
        }

        Ok(found)
    }

    fn put(&self, cookie: Cookie) -> Result<(), StoreError> {
        let domain = cookie.domain().unwrap_or_default().to_owned();
        let path = cookie.path().unwrap_or("/").to_owned();
        let key = cookie.name().to_owned();

        let mut index = self.index.lock().unwrap();
        index
            .entry(domain)
            .or_default()
            .entry(path)
            .or_default()
            .insert(key, cookie);

        Ok(())
    }

    fn remove(&self, domain: &str, path: &str, key: &str) -> Result<(), StoreError> {
        let mut index = self.index.lock().unwrap();

        if let Some(paths) = index.get_mut(domain) {
            if let Some(keys) = paths.get_mut(path) {
                keys.remove(key);
            }
        }

        Ok(())
    }

    fn remove_all(&self) -> Result<(), StoreError> {
        self.index.lock().unwrap().clear();
        Ok(())
    }

    fn get_all(&self) -> Result<Vec<Cookie>, StoreError> {
        let index = self.index.lock().unwrap();

        Ok(index
            .values()
            .flat_map(|paths| paths.values())
            .flat_map(|keys| keys.values())
            .cloned()
            .collect())
    }

    fn store_type(&self) -> &'static str {
        "MemoryStore"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::psl::BundledList;

    fn cookie(domain: &str, path: &str, key: &str) -> Cookie {
        let mut c = Cookie::new(key, "v");
        c.domain = Some(domain.to_owned());
        c.path = Some(path.to_owned());
        c
    }

    #[test]
    fn put_then_find() {
        let store = MemoryStore::new();
        store.put(cookie("example.com", "/", "a")).unwrap();

        let found = store.find("example.com", "/", "a").unwrap();
        assert_eq!(found.unwrap().name(), "a");
        assert!(store.find("example.com", "/", "b").unwrap().is_none());
    }

    #[test]
    fn update_replaces_in_place() {
        let store = MemoryStore::new();
        store.put(cookie("example.com", "/", "a")).unwrap();

        let mut updated = cookie("example.com", "/", "a");
        updated.value = "new".to_owned();
        store.update(cookie("example.com", "/", "a"), updated).unwrap();

        assert_eq!(store.find("example.com", "/", "a").unwrap().unwrap().value(), "new");
    }

    #[test]
    fn find_cookies_uses_domain_and_path_permutation() {
        let store = MemoryStore::new();
        let psl = BundledList::new();

        store.put(cookie("example.com", "/", "a")).unwrap();
        store.put(cookie("example.com", "/sub", "b")).unwrap();

        let found = store
            .find_cookies("www.example.com", Some("/sub/page"), &psl)
            .unwrap();
        let names: Vec<&str> = found.iter().map(Cookie::name).collect();

        assert!(names.contains(&"a"));
        assert!(names.contains(&"b"));
    }

    #[test]
    fn remove_all_clears_store() {
        let store = MemoryStore::new();
        store.put(cookie("example.com", "/", "a")).unwrap();
        store.remove_all().unwrap();
        assert!(store.get_all().unwrap().is_empty());
    }
}
