//! Composable wrapper that layers alias/filter heuristics on top of a base score function.
//!
//! Grounded on `mapping/_heuristic_score.py`. Procedure: short-circuit on exact match is handled
//! upstream by the [`super::mapper::Mapper`] itself; here, each heuristic in order either (a)
//! transforms `(value, candidates)` and re-scores, keeping the best of base vs. heuristic score
//! minus a small per-position penalty, or (b) filters down to a forced subset, which
//! short-circuits (`+inf`/`-inf`) immediately.
//!
//! [Open Question] the per-position penalty is exposed as `position_penalty` (default `0.005`,
//! matching the Python literal) rather than hardcoded, so callers can tune or disable it.

use crate::types::Context;

use super::types::{SharedScoreFn, ScoreFn};

/// A heuristic step: either re-scores via an alias transform, or forces a subset via a filter.
pub enum Heuristic {
    Alias {
        f: Box<dyn Fn(&str, &[String], &Context) -> (String, Vec<String>) + Send + Sync>,
        /// If true, later heuristics see this heuristic's transformed `(value, candidates)`
        /// instead of the original.
        mutate: bool,
    },
    Filter {
        f: Box<dyn Fn(&str, &[String], &Context) -> std::collections::HashSet<String> + Send + Sync>,
    },
}

/// Default per-position penalty applied to alias-heuristic scores, matching the original's
/// literal `0.005` step.
pub const DEFAULT_POSITION_PENALTY: f64 = 0.005;

pub struct HeuristicScore {
    score: SharedScoreFn<String, String>,
    heuristics: Vec<Heuristic>,
    pub position_penalty: f64,
}

impl HeuristicScore {
    pub fn new(score: SharedScoreFn<String, String>) -> Self {
        Self {
            score,
            heuristics: Vec::new(),
            position_penalty: DEFAULT_POSITION_PENALTY,
        }
    }

    pub fn score_function(&self) -> &ScoreFn<String, String> {
        &*self.score
    }

    pub fn add_alias(
        &mut self,
        f: impl Fn(&str, &[String], &Context) -> (String, Vec<String>) + Send + Sync + 'static,
        mutate: bool,
    ) {
        self.heuristics.push(Heuristic::Alias { f: Box::new(f), mutate });
    }

    pub fn add_filter(&mut self, f: impl Fn(&str, &[String], &Context) -> std::collections::HashSet<String> + Send + Sync + 'static) {
        self.heuristics.push(Heuristic::Filter { f: Box::new(f) });
    }

    /// Computes scores for `value` against `candidates`, applying heuristics in registration
    /// order.
    pub fn call(&self, value: &str, candidates: &[String], context: &Context) -> Vec<f64> {
        let base_score = (self.score)(&value.to_string(), candidates, context);
        let mut best = base_score;

        let mut penalty = 0.0;
        let mut h_value = value.to_string();
        let mut h_candidates = candidates.to_vec();

        for heuristic in &self.heuristics {
            match heuristic {
                Heuristic::Alias { f, mutate } => {
                    let (res_value, res_candidates) = f(&h_value, &h_candidates, context);
                    let res_scores = (self.score)(&res_value, &res_candidates, context);
                    for (i, s) in res_scores.into_iter().enumerate() {
                        let adjusted = s - penalty;
                        if i < best.len() && adjusted > best[i] {
                            best[i] = adjusted;
                        }
                    }
                    if *mutate {
                        h_value = res_value;
                        h_candidates = res_candidates;
                    }
                    penalty += self.position_penalty;
                }
                Heuristic::Filter { f } => {
                    let res = f(&h_value, &h_candidates, context);
                    if !res.is_empty() {
                        return h_candidates
                            .iter()
                            .map(|c| if res.contains(c) { f64::INFINITY } else { f64::NEG_INFINITY })
                            .collect();
                    }
                }
            }
        }

        best
    }
}
