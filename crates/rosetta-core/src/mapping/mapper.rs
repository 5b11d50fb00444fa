//! Value-to-candidate mapping orchestration: overrides, filters, identity short-circuit, scoring,
//! cardinality-constrained selection, then unmapped-value reporting.
//!
//! Grounded on `mapping/_mapper.py`. Simplified from the original in one respect: values and
//! candidates share one type `V` here (every concrete use in this crate — name-to-source,
//! name-to-placeholder mapping — maps strings to strings), rather than two independently generic
//! `ValueType`/`CandidateType` parameters.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use indexmap::IndexSet;

use super::matrix::ScoreMatrix;
use super::selection;
use super::types::{Cardinality, DirectionalMapping, OnUnknownUserOverride, OnUnmapped, SharedFilterFn, SharedScoreFn, SharedUserOverrideFn};
use super::MappingError;
use crate::types::{Context, MapKey};

/// Static or context-sensitive overrides, checked before any scoring happens.
pub enum Overrides<V: MapKey> {
    None,
    Static(HashMap<V, V>),
    /// Keyed by context name; a lookup with `context = None` is an error.
    ContextSensitive(HashMap<String, HashMap<V, V>>),
}

impl<V: MapKey> Default for Overrides<V> {
    fn default() -> Self {
        Overrides::None
    }
}

pub struct Mapper<V: MapKey> {
    score: SharedScoreFn<V, V>,
    filters: Vec<SharedFilterFn<V, V>>,
    min_score: f64,
    overrides: Overrides<V>,
    on_unmapped: OnUnmapped,
    on_unknown_user_override: OnUnknownUserOverride,
    cardinality: Option<Cardinality>,
}

impl<V: MapKey> Mapper<V> {
    pub fn new(score: SharedScoreFn<V, V>) -> Result<Self, MappingError> {
        Ok(Self {
            score,
            filters: Vec::new(),
            min_score: 0.90,
            overrides: Overrides::None,
            on_unmapped: OnUnmapped::Ignore,
            on_unknown_user_override: OnUnknownUserOverride::Raise,
            cardinality: Some(Cardinality::ManyToOne),
        })
    }

    pub fn with_min_score(mut self, min_score: f64) -> Result<Self, MappingError> {
        if min_score <= 0.0 || !min_score.is_finite() {
            return Err(MappingError::BadLiteral {
                field: "min_score".to_string(),
                value: min_score.to_string(),
            });
        }
        self.min_score = min_score;
        Ok(self)
    }

    pub fn with_cardinality(mut self, cardinality: Option<Cardinality>) -> Self {
        self.cardinality = cardinality;
        self
    }

    pub fn with_on_unmapped(mut self, on_unmapped: OnUnmapped) -> Self {
        self.on_unmapped = on_unmapped;
        self
    }

    pub fn with_on_unknown_user_override(mut self, policy: OnUnknownUserOverride) -> Self {
        self.on_unknown_user_override = policy;
        self
    }

    pub fn with_overrides(mut self, overrides: Overrides<V>) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn add_filter(mut self, filter: SharedFilterFn<V, V>) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn cardinality(&self) -> Option<Cardinality> {
        self.cardinality
    }

    pub fn on_unmapped(&self) -> OnUnmapped {
        self.on_unmapped
    }

    pub fn on_unknown_user_override(&self) -> OnUnknownUserOverride {
        self.on_unknown_user_override
    }

    /// Maps `values` to `candidates`, returning a [`DirectionalMapping`].
    pub fn apply(
        &self,
        values: impl IntoIterator<Item = V>,
        candidates: impl IntoIterator<Item = V>,
        context: Context,
        override_function: Option<SharedUserOverrideFn<V, V>>,
    ) -> Result<DirectionalMapping<V, V>, MappingError> {
        let values: IndexSet<V> = values.into_iter().collect();
        let candidates: IndexSet<V> = candidates.into_iter().collect();

        if values.is_empty() || candidates.is_empty() {
            return Ok(DirectionalMapping::empty(self.cardinality));
        }

        let candidate_vec: Vec<V> = candidates.iter().cloned().collect();
        let mut matrix: ScoreMatrix<V, V> = ScoreMatrix::new(values.iter().cloned(), candidate_vec.iter().cloned());

        let mut unmapped: Vec<V> = values.iter().cloned().collect();

        if let Some(func) = &override_function {
            let candidate_set: HashSet<V> = candidates.iter().cloned().collect();
            let mut next_unmapped = Vec::new();
            for value in unmapped {
                match func(&value, &candidate_set, &context) {
                    Some(candidate) => {
                        self.apply_override(&mut matrix, &value, &candidate, &candidate_set)?;
                    }
                    None => next_unmapped.push(value),
                }
            }
            unmapped = next_unmapped;
        }

        let static_overrides = self.static_overrides(&context)?;
        if !static_overrides.is_empty() {
            let candidate_set: HashSet<V> = candidates.iter().cloned().collect();
            let mut next_unmapped = Vec::new();
            for value in unmapped {
                if let Some(candidate) = static_overrides.get(&value) {
                    matrix.set_row(&value, f64::NEG_INFINITY);
                    matrix.set(&value, candidate, f64::INFINITY);
                } else {
                    next_unmapped.push(value);
                }
            }
            unmapped = next_unmapped;
        }

        for value in &unmapped {
            let filtered = self.apply_filters(value, &candidate_vec, &context)?;
            if filtered.is_empty() {
                continue;
            }
            let filtered_vec: Vec<V> = candidate_vec.iter().filter(|c| filtered.contains(c)).cloned().collect();

            if filtered.contains(value) {
                for candidate in &filtered_vec {
                    let score = if candidate == value { f64::INFINITY } else { f64::NEG_INFINITY };
                    matrix.set(value, candidate, score);
                }
            } else {
                let scores = (self.score)(value, &filtered_vec, &context);
                for (candidate, score) in filtered_vec.iter().zip(scores) {
                    matrix.set(value, candidate, score);
                }
            }
        }

        let attempted = matrix.partially_finite_values();
        let dm = selection::select(&matrix, self.min_score, self.cardinality)?;

        let mapped: HashSet<V> = dm.left().into_iter().collect();
        let still_unmapped: Vec<&V> = attempted.iter().filter(|v| !mapped.contains(*v)).collect();
        if !still_unmapped.is_empty() {
            self.report_unmapped(&still_unmapped, &context)?;
        }

        Ok(dm)
    }

    fn apply_override(&self, matrix: &mut ScoreMatrix<V, V>, value: &V, candidate: &V, candidate_set: &HashSet<V>) -> Result<(), MappingError> {
        if !candidate_set.contains(candidate) && self.on_unknown_user_override != OnUnknownUserOverride::Keep {
            let msg = format!("override function returned an unknown candidate {candidate:?} for value {value:?}");
            match self.on_unknown_user_override {
                OnUnknownUserOverride::Raise => {
                    return Err(MappingError::UserMapping(msg));
                }
                OnUnknownUserOverride::Warn => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!("{msg}");
                }
                OnUnknownUserOverride::Keep => unreachable!(),
            }
            return Ok(());
        }
        matrix.set_row(value, f64::NEG_INFINITY);
        matrix.set(value, candidate, f64::INFINITY);
        Ok(())
    }

    fn static_overrides(&self, context: &Context) -> Result<HashMap<V, V>, MappingError> {
        match &self.overrides {
            Overrides::None => Ok(HashMap::new()),
            Overrides::Static(map) => Ok(map.clone()),
            Overrides::ContextSensitive(by_context) => {
                let Some(ctx) = context else {
                    return Err(MappingError::ContextRequired);
                };
                Ok(by_context.get(ctx).cloned().unwrap_or_default())
            }
        }
    }

    fn apply_filters(&self, value: &V, candidates: &[V], context: &Context) -> Result<HashSet<V>, MappingError> {
        let original: HashSet<V> = candidates.iter().cloned().collect();
        let mut filtered = original.clone();
        for filter in &self.filters {
            filtered = filter(value, candidates, context);
            let invented: HashSet<&V> = filtered.difference(&original).collect();
            if !invented.is_empty() {
                return Err(MappingError::BadFilter(format!(
                    "filter invented new candidates not in the original set: {invented:?}"
                )));
            }
            if filtered.is_empty() {
                break;
            }
        }
        Ok(filtered)
    }

    fn report_unmapped(&self, unmapped: &[&V], context: &Context) -> Result<(), MappingError> {
        let extra = context.as_deref().map(|c| format!(" in context={c:?}")).unwrap_or_default();
        let msg = format!("could not map {unmapped:?}{extra} to any candidate");
        match self.on_unmapped {
            OnUnmapped::Raise => Err(MappingError::Unmapped(msg)),
            OnUnmapped::Warn => {
                #[cfg(feature = "tracing")]
                tracing::warn!("{msg}");
                Ok(())
            }
            OnUnmapped::Ignore => Ok(()),
        }
    }
}

impl Mapper<String> {
    /// The default mapper: equality scoring, many-to-one cardinality, silent on unmapped values —
    /// matching `Mapper()`'s defaults in the original.
    pub fn default_string_mapper() -> Self {
        let score: SharedScoreFn<String, String> = Arc::new(|v: &String, c: &[String], ctx: &Context| super::functions::equality(v, c, ctx));
        Self::new(score).expect("equality score function is always constructible")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn equality_mapper() -> Mapper<String> {
        let score: SharedScoreFn<String, String> = Arc::new(|v: &String, c: &[String], ctx: &Context| super::super::functions::equality(v, c, ctx));
        Mapper::new(score).unwrap().with_cardinality(Some(Cardinality::OneToOne))
    }

    #[test]
    fn exact_matches_are_mapped_one_to_one() {
        let mapper = equality_mapper();
        let dm = mapper
            .apply(["a".to_string(), "b".to_string()], ["a".to_string(), "b".to_string(), "c".to_string()], None, None)
            .unwrap();
        assert_eq!(dm.get(&"a".to_string()), Some(["a".to_string()].as_slice()));
        assert_eq!(dm.get(&"b".to_string()), Some(["b".to_string()].as_slice()));
    }

    #[test]
    fn static_override_wins_over_scoring() {
        let mut overrides = HashMap::new();
        overrides.insert("a".to_string(), "z".to_string());
        let mapper = equality_mapper().with_overrides(Overrides::Static(overrides));
        let dm = mapper
            .apply(["a".to_string()], ["a".to_string(), "z".to_string()], None, None)
            .unwrap();
        assert_eq!(dm.get(&"a".to_string()), Some(["z".to_string()].as_slice()));
    }

    #[test]
    fn on_unmapped_raise_surfaces_an_error() {
        let mapper = equality_mapper().with_on_unmapped(OnUnmapped::Raise);
        let err = mapper.apply(["a".to_string()], ["b".to_string()], None, None).unwrap_err();
        assert!(matches!(err, MappingError::Unmapped(_)));
    }

    #[test]
    fn context_sensitive_overrides_require_a_context() {
        let mut by_context = HashMap::new();
        by_context.insert("ctx".to_string(), HashMap::from([("a".to_string(), "z".to_string())]));
        let mapper = equality_mapper().with_overrides(Overrides::ContextSensitive(by_context));
        let err = mapper.apply(["a".to_string()], ["a".to_string(), "z".to_string()], None, None).unwrap_err();
        assert!(matches!(err, MappingError::ContextRequired));
    }
}
