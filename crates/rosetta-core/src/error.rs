//! Crate-level error aggregate.
//!
//! Each component owns its own `thiserror`-derived error enum (see `format::FormatError`,
//! `mapping::MappingError`, `fetching::FetchingError`, `dio::DioError`,
//! `translator::TranslatorError`); this type exists so callers driving a `Translator` end to
//! end can propagate a single error type with `?` without naming every component.

use thiserror::Error;

use crate::dio::DioError;
use crate::fetching::FetchingError;
use crate::format::FormatError;
use crate::mapping::MappingError;
use crate::translator::TranslatorError;

/// Crate-level result alias.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error(transparent)]
    Fetching(#[from] FetchingError),

    #[error(transparent)]
    Dio(#[from] DioError),

    #[error(transparent)]
    Translator(#[from] TranslatorError),
}
