//! Cardinality-constrained greedy selection over a [`ScoreMatrix`].
//!
//! Grounded on `mapping/matrix/_score_helper.py`. Records are sorted by descending score and
//! accepted greedily subject to the target [`Cardinality`]; a tie at a finite score between two
//! records that would both have to be accepted is an [`MappingError::AmbiguousScore`] — except
//! when the tied score is `+inf`, since overrides/short-circuits are allowed to collide and the
//! first one wins.

use std::collections::HashMap;

use indexmap::IndexMap;

use super::matrix::ScoreMatrix;
use super::types::{Cardinality, DirectionalMapping};
use super::MappingError;
use crate::types::MapKey;

/// One candidate `value -> candidate` match with its score.
#[derive(Debug, Clone, PartialEq)]
pub struct Record<V, C> {
    pub value: V,
    pub candidate: C,
    pub score: f64,
}

/// Runs the full selection pipeline: gather records at or above `min_score`, sort by descending
/// score, then greedily accept matches under the given cardinality constraint.
pub fn select<V: MapKey, C: MapKey>(
    matrix: &ScoreMatrix<V, C>,
    min_score: f64,
    cardinality: Option<Cardinality>,
) -> Result<DirectionalMapping<V, C>, MappingError> {
    let mut records: Vec<Record<V, C>> = matrix
        .to_vec()
        .into_iter()
        .filter(|(_, _, score)| *score >= min_score)
        .map(|(value, candidate, score)| Record { value, candidate, score })
        .collect();
    records.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    let accepted = match cardinality {
        Some(Cardinality::OneToOne) => select_one_to_one(records)?,
        Some(Cardinality::OneToMany) => select_one_to_many(records)?,
        Some(Cardinality::ManyToOne) => select_many_to_one(records)?,
        _ => select_many_to_many(records),
    };

    let mut left_to_right: IndexMap<V, Vec<C>> = IndexMap::new();
    for record in accepted {
        left_to_right.entry(record.value).or_default().push(record.candidate);
    }
    Ok(DirectionalMapping::new(left_to_right, cardinality))
}

fn check_ambiguous<K: MapKey + std::fmt::Debug, V: MapKey + std::fmt::Debug, C: MapKey + std::fmt::Debug>(
    record: &Record<V, C>,
    matches: &HashMap<K, Record<V, C>>,
    key: &K,
    kind: &str,
    cardinality: Cardinality,
) -> Result<(), MappingError> {
    if record.score == f64::INFINITY {
        return Ok(());
    }
    let Some(old) = matches.get(key) else {
        return Ok(());
    };
    if old.score == f64::INFINITY {
        return Ok(());
    }
    if record.score == old.score {
        return Err(MappingError::AmbiguousScore {
            kind: kind.to_string(),
            key: format!("{key:?}"),
            match0: format!("{:?} -> {:?} ({:.3})", record.value, record.candidate, record.score),
            match1: format!("{:?} -> {:?} ({:.3})", old.value, old.candidate, old.score),
            cardinality: cardinality.name().to_string(),
        });
    }
    Ok(())
}

fn select_one_to_one<V: MapKey, C: MapKey>(records: Vec<Record<V, C>>) -> Result<Vec<Record<V, C>>, MappingError> {
    let mut by_value: HashMap<V, Record<V, C>> = HashMap::new();
    let mut by_candidate: HashMap<C, Record<V, C>> = HashMap::new();
    let mut accepted = Vec::new();

    for record in records {
        check_ambiguous(&record, &by_candidate, &record.candidate, "candidate", Cardinality::OneToOne)?;
        check_ambiguous(&record, &by_value, &record.value, "value", Cardinality::OneToOne)?;

        if by_value.contains_key(&record.value) || by_candidate.contains_key(&record.candidate) {
            continue;
        }
        by_value.insert(record.value.clone(), record.clone());
        by_candidate.insert(record.candidate.clone(), record.clone());
        accepted.push(record);
    }
    Ok(accepted)
}

fn select_one_to_many<V: MapKey, C: MapKey>(records: Vec<Record<V, C>>) -> Result<Vec<Record<V, C>>, MappingError> {
    let mut by_candidate: HashMap<C, Record<V, C>> = HashMap::new();
    let mut accepted = Vec::new();

    for record in records {
        check_ambiguous(&record, &by_candidate, &record.candidate, "candidate", Cardinality::OneToMany)?;
        if by_candidate.contains_key(&record.candidate) {
            continue;
        }
        by_candidate.insert(record.candidate.clone(), record.clone());
        accepted.push(record);
    }
    Ok(accepted)
}

fn select_many_to_one<V: MapKey, C: MapKey>(records: Vec<Record<V, C>>) -> Result<Vec<Record<V, C>>, MappingError> {
    let mut by_value: HashMap<V, Record<V, C>> = HashMap::new();
    let mut accepted = Vec::new();

    for record in records {
        check_ambiguous(&record, &by_value, &record.value, "value", Cardinality::ManyToOne)?;
        if by_value.contains_key(&record.value) {
            continue;
        }
        by_value.insert(record.value.clone(), record.clone());
        accepted.push(record);
    }
    Ok(accepted)
}

fn select_many_to_many<V: MapKey, C: MapKey>(records: Vec<Record<V, C>>) -> Vec<Record<V, C>> {
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix() -> ScoreMatrix<String, String> {
        let mut m = ScoreMatrix::new(
            ["alice".to_string(), "bob".to_string()],
            ["alice_tbl".to_string(), "bob_tbl".to_string()],
        );
        m.set(&"alice".to_string(), &"alice_tbl".to_string(), 0.9);
        m.set(&"bob".to_string(), &"bob_tbl".to_string(), 0.8);
        m
    }

    #[test]
    fn one_to_one_selects_best_match_per_value_and_candidate() {
        let dm = select(&matrix(), 0.5, Some(Cardinality::OneToOne)).unwrap();
        assert_eq!(dm.get(&"alice".to_string()), Some(["alice_tbl".to_string()].as_slice()));
        assert_eq!(dm.get(&"bob".to_string()), Some(["bob_tbl".to_string()].as_slice()));
    }

    #[test]
    fn ambiguous_equal_scores_raise() {
        let mut m: ScoreMatrix<String, String> = ScoreMatrix::new(
            ["a".to_string()],
            ["x".to_string(), "y".to_string()],
        );
        m.set(&"a".to_string(), &"x".to_string(), 0.5);
        m.set(&"a".to_string(), &"y".to_string(), 0.5);
        let err = select(&m, 0.1, Some(Cardinality::OneToOne)).unwrap_err();
        assert!(matches!(err, MappingError::AmbiguousScore { .. }));
    }

    #[test]
    fn infinite_ties_do_not_raise_first_wins() {
        let mut m: ScoreMatrix<String, String> = ScoreMatrix::new(
            ["a".to_string()],
            ["x".to_string(), "y".to_string()],
        );
        m.set(&"a".to_string(), &"x".to_string(), f64::INFINITY);
        m.set(&"a".to_string(), &"y".to_string(), f64::INFINITY);
        let dm = select(&m, 0.1, Some(Cardinality::OneToOne)).unwrap();
        assert_eq!(dm.get(&"a".to_string()).unwrap().len(), 1);
    }

    #[test]
    fn many_to_many_keeps_every_match_above_threshold() {
        let mut m: ScoreMatrix<String, String> = ScoreMatrix::new(
            ["a".to_string()],
            ["x".to_string(), "y".to_string()],
        );
        m.set(&"a".to_string(), &"x".to_string(), 0.9);
        m.set(&"a".to_string(), &"y".to_string(), 0.8);
        let dm = select(&m, 0.5, Some(Cardinality::ManyToMany)).unwrap();
        assert_eq!(dm.get(&"a".to_string()).unwrap().len(), 2);
    }
}
