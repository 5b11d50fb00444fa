//! Value-to-candidate mapping: scoring, filtering, heuristics, and cardinality-constrained
//! selection.
//!
//! Grounded on the `mapping/` package: `_mapper.py`, `_heuristic_score.py`, `score_functions.py`,
//! `filter_functions.py`, `heuristic_functions.py`, `matrix/_score_matrix.py`,
//! `matrix/_score_helper.py`, `exceptions.py`.

pub mod functions;
mod heuristic;
mod mapper;
mod matrix;
mod selection;
mod types;

pub use heuristic::{HeuristicScore, DEFAULT_POSITION_PENALTY};
pub use mapper::{Mapper, Overrides};
pub use matrix::ScoreMatrix;
pub use selection::Record;
pub use types::{
    AliasFn, Cardinality, DirectionalMapping, FilterFn, OnUnknownUserOverride, OnUnmapped, ScoreFn,
    SharedAliasFn, SharedFilterFn, SharedScoreFn, SharedUserOverrideFn, UserOverrideFn,
};

use thiserror::Error;

use crate::types::Context;

#[derive(Debug, Error)]
pub enum MappingError {
    #[error("unknown cardinality literal '{0}' (expected one of 1:1, 1:N, N:1, N:M)")]
    BadCardinality(String),

    #[error("bad value for '{field}': {value}")]
    BadLiteral { field: String, value: String },

    #[error("{0}")]
    Cardinality(String),

    #[error(
        "ambiguous mapping of {kind}={key}; matches ({match0}) and ({match1}) are in conflict since cardinality={cardinality}"
    )]
    AmbiguousScore {
        kind: String,
        key: String,
        match0: String,
        match1: String,
        cardinality: String,
    },

    #[error("scoring disabled: value={value:?} in context={context:?} cannot be mapped to any of {candidates:?}")]
    ScoringDisabled {
        value: String,
        candidates: Vec<String>,
        context: Context,
    },

    #[error("invalid filter: {0}")]
    BadFilter(String),

    #[error("a context-sensitive override requires a context, but none was given")]
    ContextRequired,

    #[error("{0}")]
    Unmapped(String),

    #[error("user-defined mapping function error: {0}")]
    UserMapping(String),
}
