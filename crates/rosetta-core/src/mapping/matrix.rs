//! Dense value-by-candidate score grid.
//!
//! Grounded on `mapping/matrix/_score_matrix.py`. Indices grow automatically when an
//! out-of-range value/candidate is assigned; duplicate values/candidates are deduplicated on
//! construction, first occurrence wins.

use indexmap::IndexMap;

use crate::types::MapKey;

const NEG_INF: f64 = f64::NEG_INFINITY;

/// A `values x candidates` grid of likeness scores, defaulting to `-inf` (no match).
#[derive(Debug, Clone)]
pub struct ScoreMatrix<V: MapKey, C: MapKey> {
    values: IndexMap<V, usize>,
    candidates: IndexMap<C, usize>,
    grid: Vec<Vec<f64>>,
}

impl<V: MapKey, C: MapKey> ScoreMatrix<V, C> {
    /// Builds an all-`-inf` matrix over the given (deduplicated) values and candidates.
    pub fn new(values: impl IntoIterator<Item = V>, candidates: impl IntoIterator<Item = C>) -> Self {
        let values: IndexMap<V, usize> = dedup_index(values);
        let candidates: IndexMap<C, usize> = dedup_index(candidates);
        let grid = vec![vec![NEG_INF; candidates.len()]; values.len()];
        Self { values, candidates, grid }
    }

    pub fn size(&self) -> usize {
        self.values.len() * self.candidates.len()
    }

    pub fn values(&self) -> Vec<V> {
        self.values.keys().cloned().collect()
    }

    pub fn candidates(&self) -> Vec<C> {
        self.candidates.keys().cloned().collect()
    }

    fn value_index(&mut self, value: &V) -> usize {
        if let Some(&i) = self.values.get(value) {
            return i;
        }
        let i = self.values.len();
        self.values.insert(value.clone(), i);
        self.grid.push(vec![NEG_INF; self.candidates.len()]);
        i
    }

    fn candidate_index(&mut self, candidate: &C) -> usize {
        if let Some(&j) = self.candidates.get(candidate) {
            return j;
        }
        let j = self.candidates.len();
        self.candidates.insert(candidate.clone(), j);
        for row in &mut self.grid {
            row.push(NEG_INF);
        }
        j
    }

    /// Sets a single `(value, candidate)` score, growing the grid if either is new.
    pub fn set(&mut self, value: &V, candidate: &C, score: f64) {
        let i = self.value_index(value);
        let j = self.candidate_index(candidate);
        self.grid[i][j] = score;
    }

    /// Sets every score in `value`'s row at once (e.g. to `-inf` before applying an override).
    pub fn set_row(&mut self, value: &V, score: f64) {
        let i = self.value_index(value);
        self.grid[i] = vec![score; self.candidates.len()];
    }

    pub fn get(&self, value: &V, candidate: &C) -> f64 {
        match (self.values.get(value), self.candidates.get(candidate)) {
            (Some(&i), Some(&j)) => self.grid[i][j],
            _ => NEG_INF,
        }
    }

    /// Values whose entire row is finite (matched every candidate, none filtered or
    /// short-circuited).
    pub fn finite_values(&self) -> std::collections::HashSet<V> {
        self.values
            .iter()
            .filter(|(_, &i)| self.grid[i].iter().all(|s| s.is_finite()))
            .map(|(v, _)| v.clone())
            .collect()
    }

    /// Values with at least one finite score — i.e. scoring was actually attempted for them, as
    /// opposed to being filtered out of consideration entirely (every candidate `-inf` by
    /// default, never assigned).
    pub fn partially_finite_values(&self) -> std::collections::HashSet<V> {
        self.values
            .iter()
            .filter(|(_, &i)| self.grid[i].iter().any(|s| s.is_finite()))
            .map(|(v, _)| v.clone())
            .collect()
    }

    /// Flattens the grid to `(value, candidate) -> score` triples.
    pub fn to_vec(&self) -> Vec<(V, C, f64)> {
        let mut out = Vec::with_capacity(self.size());
        for (value, &i) in &self.values {
            for (candidate, &j) in &self.candidates {
                out.push((value.clone(), candidate.clone(), self.grid[i][j]));
            }
        }
        out
    }

    /// Diagnostic table, used in ambiguous-score error messages.
    pub fn to_string_table(&self, decimals: usize) -> String
    where
        V: std::fmt::Debug,
        C: std::fmt::Debug,
    {
        let mut out = String::from("v/c");
        for c in self.candidates.keys() {
            out.push_str(&format!(" | {c:?}"));
        }
        for (value, &i) in &self.values {
            out.push('\n');
            out.push_str(&format!("{value:?}"));
            for &s in &self.grid[i] {
                out.push_str(&format!(" | {s:.decimals$}"));
            }
        }
        out
    }
}

fn dedup_index<T: MapKey>(items: impl IntoIterator<Item = T>) -> IndexMap<T, usize> {
    let mut out = IndexMap::new();
    for item in items {
        let next = out.len();
        out.entry(item).or_insert(next);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_negative_infinity() {
        let m: ScoreMatrix<String, String> = ScoreMatrix::new(["a".to_string()], ["x".to_string()]);
        assert_eq!(m.get(&"a".to_string(), &"x".to_string()), NEG_INF);
    }

    #[test]
    fn set_grows_the_grid_for_unseen_value_or_candidate() {
        let mut m: ScoreMatrix<String, String> = ScoreMatrix::new([], []);
        m.set(&"a".to_string(), &"x".to_string(), 1.0);
        assert_eq!(m.get(&"a".to_string(), &"x".to_string()), 1.0);
        assert_eq!(m.values(), vec!["a".to_string()]);
        assert_eq!(m.candidates(), vec!["x".to_string()]);
    }

    #[test]
    fn duplicate_values_are_deduplicated_first_wins() {
        let m: ScoreMatrix<String, String> =
            ScoreMatrix::new(["a".to_string(), "a".to_string()], ["x".to_string()]);
        assert_eq!(m.values(), vec!["a".to_string()]);
    }

    #[test]
    fn finite_values_excludes_rows_with_any_infinite_score() {
        let mut m: ScoreMatrix<String, String> =
            ScoreMatrix::new(["a".to_string(), "b".to_string()], ["x".to_string()]);
        m.set(&"a".to_string(), &"x".to_string(), 0.5);
        m.set(&"b".to_string(), &"x".to_string(), NEG_INF);
        let finite = m.finite_values();
        assert!(finite.contains(&"a".to_string()));
        assert!(!finite.contains(&"b".to_string()));
    }
}
