//! Shared mapping types: cardinality, directional mappings, and the function-signature aliases
//! used to plug in scoring/filtering/aliasing behavior.
//!
//! Grounded on `mapping/types.py` for the function signatures. `Cardinality` and
//! `DirectionalMapping` have no direct source file in the retrieved pack (`_cardinality.py` /
//! `_directional_mapping.py` were not part of it); they are reconstructed here from their usage
//! in `_mapper.py` and `matrix/_score_helper.py` (`Cardinality.{OneToOne,OneToMany,ManyToOne}`,
//! `.name`, `DirectionalMapping(left_to_right=..., cardinality=..., _verify=False)`, `.flatten()`).

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;

use super::MappingError;
use crate::types::{Context, MapKey};

/// Upper bound on how many candidates a value may match (and vice versa).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    OneToOne,
    OneToMany,
    ManyToOne,
    ManyToMany,
}

impl Cardinality {
    /// Parses any of the short tokens (`1:1`, `1:N`, `N:1`, `N:M`) or a variant name, ignoring
    /// case.
    pub fn parse(s: &str) -> Result<Self, MappingError> {
        match s.to_ascii_uppercase().as_str() {
            "1:1" | "ONETOONE" | "ONE-TO-ONE" => Ok(Cardinality::OneToOne),
            "1:N" | "ONETOMANY" | "ONE-TO-MANY" => Ok(Cardinality::OneToMany),
            "N:1" | "MANYTOONE" | "MANY-TO-ONE" => Ok(Cardinality::ManyToOne),
            "N:M" | "MANYTOMANY" | "MANY-TO-MANY" => Ok(Cardinality::ManyToMany),
            other => Err(MappingError::BadCardinality(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Cardinality::OneToOne => "OneToOne",
            Cardinality::OneToMany => "OneToMany",
            Cardinality::ManyToOne => "ManyToOne",
            Cardinality::ManyToMany => "ManyToMany",
        }
    }

    /// `true` if a single value may be matched to more than one candidate.
    pub fn many_right(&self) -> bool {
        matches!(self, Cardinality::OneToMany | Cardinality::ManyToMany)
    }

    /// `true` if a single candidate may be matched by more than one value.
    pub fn many_left(&self) -> bool {
        matches!(self, Cardinality::ManyToOne | Cardinality::ManyToMany)
    }
}

impl Default for Cardinality {
    fn default() -> Self {
        Cardinality::ManyToOne
    }
}

/// Result of a mapping operation: `value -> [matched candidates...]`, insertion-ordered.
#[derive(Debug, Clone)]
pub struct DirectionalMapping<V: MapKey, C: MapKey> {
    left_to_right: IndexMap<V, Vec<C>>,
    cardinality: Option<Cardinality>,
}

impl<V: MapKey, C: MapKey> DirectionalMapping<V, C> {
    /// Builds a mapping from an already-computed `left_to_right` relation.
    ///
    /// Mirrors the Python constructor's `_verify=False` fast path: callers (the score-matrix
    /// selection algorithm) have already guaranteed the cardinality invariant holds.
    pub fn new(left_to_right: IndexMap<V, Vec<C>>, cardinality: Option<Cardinality>) -> Self {
        Self { left_to_right, cardinality }
    }

    pub fn empty(cardinality: Option<Cardinality>) -> Self {
        Self::new(IndexMap::new(), cardinality)
    }

    pub fn cardinality(&self) -> Option<Cardinality> {
        self.cardinality
    }

    pub fn left_to_right(&self) -> &IndexMap<V, Vec<C>> {
        &self.left_to_right
    }

    /// Matched values, in insertion order.
    pub fn left(&self) -> Vec<V> {
        self.left_to_right.keys().cloned().collect()
    }

    /// Unique matched candidates, in first-seen order.
    pub fn right(&self) -> Vec<C> {
        let mut seen = Vec::new();
        for candidates in self.left_to_right.values() {
            for c in candidates {
                if !seen.contains(c) {
                    seen.push(c.clone());
                }
            }
        }
        seen
    }

    pub fn is_empty(&self) -> bool {
        self.left_to_right.is_empty()
    }

    pub fn get(&self, value: &V) -> Option<&[C]> {
        self.left_to_right.get(value).map(|v| v.as_slice())
    }

    /// Collapses to a plain `value -> candidate` map. Fails if any value matched more than one
    /// candidate — this is a property of the actual result, not of the declared `cardinality`.
    pub fn flatten(&self) -> Result<HashMap<V, C>, MappingError> {
        let mut out = HashMap::with_capacity(self.left_to_right.len());
        for (value, candidates) in &self.left_to_right {
            if candidates.len() != 1 {
                return Err(MappingError::Cardinality(format!(
                    "cannot flatten: value {value:?} matched {} candidates, expected exactly 1",
                    candidates.len()
                )));
            }
            out.insert(value.clone(), candidates[0].clone());
        }
        Ok(out)
    }
}

/// Action to take when one or more values could not be mapped to any candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnUnmapped {
    Raise,
    Warn,
    #[default]
    Ignore,
}

impl OnUnmapped {
    pub fn parse(s: &str) -> Result<Self, MappingError> {
        match s {
            "raise" => Ok(OnUnmapped::Raise),
            "warn" => Ok(OnUnmapped::Warn),
            "ignore" => Ok(OnUnmapped::Ignore),
            other => Err(MappingError::BadLiteral {
                field: "on_unmapped".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// Action to take when a user-supplied override function returns a candidate outside the input
/// set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnUnknownUserOverride {
    #[default]
    Raise,
    Warn,
    Keep,
}

impl OnUnknownUserOverride {
    pub fn parse(s: &str) -> Result<Self, MappingError> {
        match s {
            "raise" => Ok(OnUnknownUserOverride::Raise),
            "warn" => Ok(OnUnknownUserOverride::Warn),
            "keep" => Ok(OnUnknownUserOverride::Keep),
            other => Err(MappingError::BadLiteral {
                field: "on_unknown_user_override".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// A likeness score function: one score per candidate, higher is better. `-inf`/`+inf` are
/// sentinels meaning "filtered out" / "short-circuit to this candidate".
pub type ScoreFn<V, C> = dyn Fn(&V, &[C], &Context) -> Vec<f64> + Send + Sync;

/// A filter: keeps a subset of `candidates` for `value`. An empty set removes `value` from
/// consideration entirely for this round.
pub type FilterFn<V, C> = dyn Fn(&V, &[C], &Context) -> std::collections::HashSet<C> + Send + Sync;

/// An alias: transforms `(value, candidates)` before scoring, e.g. case-folding both sides.
pub type AliasFn<V, C> = dyn Fn(&V, &[C], &Context) -> (V, Vec<C>) + Send + Sync;

/// A user-defined override: returns `Some(candidate)` to force a match, or `None` to defer to
/// the regular scoring logic.
pub type UserOverrideFn<V, C> = dyn Fn(&V, &std::collections::HashSet<C>, &Context) -> Option<C> + Send + Sync;

pub type SharedScoreFn<V, C> = Arc<ScoreFn<V, C>>;
pub type SharedFilterFn<V, C> = Arc<FilterFn<V, C>>;
pub type SharedAliasFn<V, C> = Arc<AliasFn<V, C>>;
pub type SharedUserOverrideFn<V, C> = Arc<UserOverrideFn<V, C>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cardinality_parses_short_tokens_case_insensitively() {
        assert_eq!(Cardinality::parse("1:1").unwrap(), Cardinality::OneToOne);
        assert_eq!(Cardinality::parse("n:m").unwrap(), Cardinality::ManyToMany);
        assert!(Cardinality::parse("bogus").is_err());
    }

    #[test]
    fn flatten_fails_when_a_value_has_more_than_one_candidate() {
        let mut l2r = IndexMap::new();
        l2r.insert("a".to_string(), vec!["x".to_string(), "y".to_string()]);
        let dm: DirectionalMapping<String, String> = DirectionalMapping::new(l2r, None);
        assert!(dm.flatten().is_err());
    }

    #[test]
    fn flatten_succeeds_for_one_to_one_results() {
        let mut l2r = IndexMap::new();
        l2r.insert("a".to_string(), vec!["x".to_string()]);
        let dm: DirectionalMapping<String, String> = DirectionalMapping::new(l2r, Some(Cardinality::OneToOne));
        let flat = dm.flatten().unwrap();
        assert_eq!(flat.get("a").unwrap(), "x");
    }
}
