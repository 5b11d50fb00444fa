//! Caching hooks a backend may plug into an [`super::AbstractFetcher`].
//!
//! Grounded on `_cache_access.py`'s abstract `CacheAccess` (the clean ABC), not `_cache.py`'s
//! pickle/filesystem-backed duplicate — persistence is backend-specific and out of scope here.
//! [`CacheMetadata`]'s comparison logic is ported from `_cache.py::CacheMetadata._is_equivalent`;
//! its filesystem path construction is not.

use super::FetchInstruction;
use crate::format::PlaceholderTranslations;

/// Backend-pluggable cache for fetch results, keyed by [`FetchInstruction`].
pub trait CacheAccess: Send + Sync {
    /// `true` if this cache is currently usable. `false` by default disables caching without
    /// requiring callers to special-case an absent cache.
    fn enabled(&self) -> bool {
        true
    }

    /// Returns previously-cached translations for `instr`, if any and still valid.
    fn load(&self, instr: &FetchInstruction) -> Option<PlaceholderTranslations>;

    /// Persists `translations` for later retrieval via [`CacheAccess::load`].
    fn store(&self, instr: &FetchInstruction, translations: &PlaceholderTranslations);
}

/// Identifies a cache's configuration so a stale cache (produced by a fetcher with different
/// cache keys or sources) can be detected rather than silently reused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheMetadata {
    /// Hierarchical keys identifying the cache: element zero picks the storage location, the
    /// rest detect configuration drift (e.g. `[config_file_name, config_file_sha]`).
    pub cache_keys: Vec<String>,
    /// Sources this cache was built for, in the order they were enumerated.
    pub sources: Vec<String>,
}

impl CacheMetadata {
    pub fn new(cache_keys: Vec<String>, sources: Vec<String>) -> Self {
        Self { cache_keys, sources }
    }

    /// Returns `Ok(())` if `other` was built under the same configuration as `self`, or an
    /// explanation of the first mismatch found.
    pub fn is_equivalent(&self, other: &CacheMetadata) -> Result<(), String> {
        if self.cache_keys != other.cache_keys {
            return Err(format!(
                "expected cache_keys={:?} but got {:?}",
                self.cache_keys, other.cache_keys
            ));
        }
        if self.sources != other.sources {
            return Err(format!("expected sources={:?} but got {:?}", self.sources, other.sources));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equivalent_metadata_matches() {
        let a = CacheMetadata::new(vec!["k".into()], vec!["people".into()]);
        let b = a.clone();
        assert!(a.is_equivalent(&b).is_ok());
    }

    #[test]
    fn differing_cache_keys_are_reported() {
        let a = CacheMetadata::new(vec!["k1".into()], vec!["people".into()]);
        let b = CacheMetadata::new(vec!["k2".into()], vec!["people".into()]);
        assert!(a.is_equivalent(&b).is_err());
    }

    #[test]
    fn differing_sources_are_reported() {
        let a = CacheMetadata::new(vec!["k".into()], vec!["people".into()]);
        let b = CacheMetadata::new(vec!["k".into()], vec!["animals".into()]);
        assert!(a.is_equivalent(&b).is_err());
    }
}
