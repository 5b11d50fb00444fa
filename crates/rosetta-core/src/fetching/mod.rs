//! Retrieval of placeholder translations from external sources.
//!
//! Grounded on the `fetching/` package: `_fetcher.py`, `_abstract_fetcher.py`,
//! `_multi_fetcher.py`, `_cache_access.py`, `types.py`, `exceptions.py`. Dataframe-specific
//! backends (SQL, pandas) are out of scope; this module covers the trait surface and the
//! generic `AbstractFetcher`/`MultiFetcher` orchestration every concrete backend plugs into.

mod abstract_fetcher;
mod cache;
mod fetcher;
mod multi_fetcher;
mod types;

pub use abstract_fetcher::{AbstractFetcher, FetcherBackend};
pub use cache::{CacheAccess, CacheMetadata};
pub use fetcher::Fetcher;
pub use multi_fetcher::{MultiFetcher, OnSourceConflict};
pub use types::{FetchInstruction, IdsToFetch};

use thiserror::Error;

use crate::format::FormatError;
use crate::mapping::MappingError;

#[derive(Debug, Error)]
pub enum FetchingError {
    #[error("operation '{operation}' {reason}")]
    ForbiddenOperation { operation: String, reason: String },

    #[error("underlying fetcher implementation error: {0}")]
    Implementation(String),

    #[error("unknown placeholder(s): {0}")]
    UnknownPlaceholder(String),

    #[error("unknown id(s): {0}")]
    UnknownId(String),

    #[error("sources {unknown:?} not recognized; known sources: {known:?}")]
    UnknownSource { unknown: Vec<String>, known: Vec<String> },

    #[error("multiple fetchers claimed source '{0}'")]
    DuplicateSource(String),

    #[error("cache access requested on a fetcher without caching enabled")]
    CacheAccessNotAvailable,

    #[error("operation '{attempted}' requested while '{active}' is still in progress ({param_info})")]
    ConcurrentOperation {
        attempted: String,
        active: String,
        param_info: String,
    },

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Mapping(#[from] MappingError),
}
