//! The minimal interface every source of translations implements.
//!
//! Grounded on `_fetcher.py`. Sources are fixed to `String` here (every concrete use in this
//! crate is string-keyed), unlike the original's `SourceType` type parameter.

use std::collections::HashSet;

use indexmap::IndexMap;

use super::{FetchingError, IdsToFetch};
use crate::format::PlaceholderTranslations;

/// A source of placeholder translations, online or offline.
pub trait Fetcher: Send + Sync {
    /// `true` if this fetcher (and, for a [`super::MultiFetcher`], all of its children) permits
    /// [`Fetcher::fetch_all`].
    fn allow_fetch_all(&self) -> bool;

    /// Releases any held resources (connections, handles). No-op by default.
    fn close(&self) {}

    /// `true` if this fetcher can currently reach its backend.
    fn online(&self) -> bool;

    /// `true` if this fetcher may be silently discarded (by a [`super::MultiFetcher`]) when
    /// source discovery fails.
    fn optional(&self) -> bool {
        false
    }

    /// Discovers sources and placeholders, forcing rediscovery when `force`. Fetchers with
    /// nothing to discover (e.g. an offline stub) may keep the no-op default. Errors here are
    /// what let a [`super::MultiFetcher`] distinguish "backend unreachable" from "reachable, zero
    /// sources" when deciding whether to discard an optional child.
    fn initialize_sources(&self, task_id: u64, force: bool) -> Result<(), FetchingError> {
        let _ = (task_id, force);
        Ok(())
    }

    /// Sources known to this fetcher, in priority/rank order.
    fn sources(&self) -> Vec<String>;

    /// Placeholders available per known source.
    fn placeholders(&self) -> IndexMap<String, Vec<String>>;

    /// Retrieves translations for specific ids, grouped by source.
    fn fetch(
        &self,
        ids_to_fetch: &[IdsToFetch],
        placeholders: &[String],
        required: &[String],
        task_id: u64,
        enable_uuid_heuristics: bool,
    ) -> Result<IndexMap<String, PlaceholderTranslations>, FetchingError>;

    /// Retrieves every translation available, optionally restricted to `sources`.
    fn fetch_all(
        &self,
        placeholders: &[String],
        required: &[String],
        sources: Option<&HashSet<String>>,
        task_id: u64,
        enable_uuid_heuristics: bool,
    ) -> Result<IndexMap<String, PlaceholderTranslations>, FetchingError>;
}
