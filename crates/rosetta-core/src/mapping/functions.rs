//! Built-in score, filter, and heuristic functions.
//!
//! Grounded on `mapping/score_functions.py`, `mapping/filter_functions.py`, and
//! `mapping/heuristic_functions.py`. These operate on `String` values/candidates, which is what
//! every concrete use in this crate (name-to-source, name-to-placeholder mapping) needs; unlike
//! the Python originals they are not generic over arbitrary hashables.

use std::collections::HashSet;

use regex::Regex;

use super::MappingError;
use crate::types::{Context, ID};

/// `1.0` if `value == candidate`, `0.0` otherwise.
pub fn equality(value: &str, candidates: &[String], _context: &Context) -> Vec<f64> {
    candidates.iter().map(|c| if c == value { 1.0 } else { 0.0 }).collect()
}

/// Back-aligned character match ratio, optionally scaled by a length-ratio term, minus a small
/// per-position penalty that prefers earlier candidates on ties.
pub fn modified_hamming(
    value: &str,
    candidates: &[String],
    _context: &Context,
    add_length_ratio_term: bool,
    positional_penalty: f64,
) -> Vec<f64> {
    let name: Vec<char> = value.chars().collect();
    candidates
        .iter()
        .enumerate()
        .map(|(i, candidate)| {
            let cand: Vec<char> = candidate.chars().collect();
            let sz = name.len().min(cand.len());
            let same = if sz == 0 {
                0
            } else {
                (0..sz).filter(|&k| name[name.len() - sz + k] == cand[cand.len() - sz + k]).count()
            };
            let ratio = if add_length_ratio_term {
                1.0 / (1.0 + (cand.len() as f64 - name.len() as f64).abs())
            } else {
                1.0
            };
            let normalized_hamming = if sz == 0 { 0.0 } else { same as f64 / sz as f64 };
            ratio * normalized_hamming - i as f64 * positional_penalty
        })
        .collect()
}

/// Raises [`MappingError::ScoringDisabled`] in strict mode; otherwise returns `-inf` for every
/// candidate, acting as a catch-all removal filter so only overrides can match.
pub fn disabled(value: &str, candidates: &[String], context: &Context, strict: bool) -> Result<Vec<f64>, MappingError> {
    if strict {
        return Err(MappingError::ScoringDisabled {
            value: value.to_string(),
            candidates: candidates.to_vec(),
            context: context.clone(),
        });
    }
    Ok(vec![f64::NEG_INFINITY; candidates.len()])
}

/// Keeps all candidates if `value` matches `regex` (or doesn't, if `remove`), an empty set
/// otherwise. Intended for name-to-source mapping (`context` must be `None`).
pub fn filter_names(value: &str, candidates: &HashSet<String>, context: &Context, regex: &Regex, remove: bool) -> Result<HashSet<String>, MappingError> {
    if context.is_some() {
        return Err(MappingError::BadFilter(
            "filter_names should only be used for name-to-source mapping".to_string(),
        ));
    }
    let matches = regex.is_match(value);
    let keep = matches == remove;
    Ok(if keep { candidates.clone() } else { HashSet::new() })
}

/// Keeps all candidates if `context` (the source) does *not* match `regex` (or does, if
/// `remove`). A no-op unless `value == "id"`.
pub fn filter_sources(value: &str, candidates: &HashSet<String>, context: &Context, regex: &Regex, remove: bool) -> Result<HashSet<String>, MappingError> {
    if value != ID {
        return Ok(candidates.clone());
    }
    let Some(source) = context.as_deref() else {
        return Err(MappingError::BadFilter("filter_sources requires a source context".to_string()));
    };
    let matches = regex.is_match(source);
    let keep = matches == remove;
    Ok(if keep { candidates.clone() } else { HashSet::new() })
}

/// Keeps placeholders that match `regex` (or don't, if `remove`).
pub fn filter_placeholders(_value: &str, candidates: &HashSet<String>, context: &Context, regex: &Regex, remove: bool) -> Result<HashSet<String>, MappingError> {
    if context.is_none() {
        return Err(MappingError::BadFilter("filter_placeholders requires a source context".to_string()));
    }
    Ok(candidates
        .iter()
        .filter(|c| regex.is_match(c) != remove)
        .cloned()
        .collect())
}

/// Lower-cases both `value` and `candidates`.
pub fn force_lower_case(value: &str, candidates: &[String], _context: &Context) -> (String, Vec<String>) {
    (value.to_lowercase(), candidates.iter().map(|c| c.to_lowercase()).collect())
}

/// Makes `value`/`candidates` look like database table names: lower-case, `id`-suffix stripped,
/// separators removed, naively pluralized.
pub fn like_database_table(value: &str, candidates: &[String], _context: &Context) -> (String, Vec<String>) {
    (pluralize_like_table(value), candidates.iter().map(|c| pluralize_like_table(c)).collect())
}

fn pluralize_like_table(s: &str) -> String {
    let mut s = s.to_lowercase();
    if s == "id" {
        return s;
    }
    if let Some(stripped) = s.strip_suffix("id") {
        s = stripped.to_string();
    }
    s = s.replace(['_', '.'], "");
    let last = s.chars().last();
    let second_last = {
        let mut it = s.chars().rev();
        it.next();
        it.next()
    };
    match last {
        Some('s') => s,
        Some('x') | Some('z') => {
            s.push_str("es");
            s
        }
        Some('h') if matches!(second_last, Some('s') | Some('c')) => {
            s.push_str("es");
            s
        }
        _ => {
            s.push('s');
            s
        }
    }
}

/// Forces `value` to `target_candidate` (short-circuiting the mapper) iff `target_candidate` is
/// present in `candidates` and `value` matches `value_regex`; an empty set otherwise.
pub fn short_circuit(value: &str, candidates: &HashSet<String>, _context: &Context, value_regex: &Regex, target_candidate: &str) -> HashSet<String> {
    if !candidates.contains(target_candidate) || !value_regex.is_match(value) {
        return HashSet::new();
    }
    std::iter::once(target_candidate.to_string()).collect()
}

/// Formats `value` using `fstring`, which may reference `{value}`. `candidates` pass through
/// unchanged.
pub fn value_fstring_alias(value: &str, candidates: &[String], _context: &Context, fstring: &str) -> Result<(String, Vec<String>), MappingError> {
    if !fstring.contains("{value}") {
        return Err(MappingError::BadFilter(format!(
            "invalid fstring '{fstring}' passed to value_fstring_alias: does not contain {{value}}"
        )));
    }
    Ok((fstring.replace("{value}", value), candidates.to_vec()))
}

/// Formats each candidate using `fstring`, which may reference `{candidate}` and `{value}`.
pub fn candidate_fstring_alias(value: &str, candidates: &[String], _context: &Context, fstring: &str) -> Result<(String, Vec<String>), MappingError> {
    if !fstring.contains("{candidate}") {
        return Err(MappingError::BadFilter(format!(
            "invalid fstring '{fstring}' passed to candidate_fstring_alias: does not contain {{candidate}}"
        )));
    }
    let rendered = candidates
        .iter()
        .map(|c| fstring.replace("{value}", value).replace("{candidate}", c))
        .collect();
    Ok((value.to_string(), rendered))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_matches_single_candidate() {
        let scores = equality("a", &["a".to_string(), "b".to_string()], &None);
        assert_eq!(scores, vec![1.0, 0.0]);
    }

    #[test]
    fn modified_hamming_matches_documented_examples() {
        let candidates = vec!["aa".to_string(), "a".to_string(), "ab".to_string(), "aa".to_string()];
        let scores = modified_hamming("aa", &candidates, &None, true, 0.001);
        let rounded: Vec<f64> = scores.iter().map(|s| (s * 1000.0).round() / 1000.0).collect();
        assert_eq!(rounded, vec![1.0, 0.499, 0.498, 0.997]);
    }

    #[test]
    fn disabled_raises_when_strict() {
        assert!(disabled("a", &["b".to_string()], &None, true).is_err());
    }

    #[test]
    fn disabled_returns_negative_infinity_when_lenient() {
        let scores = disabled("a", &["b".to_string(), "c".to_string()], &None, false).unwrap();
        assert_eq!(scores, vec![f64::NEG_INFINITY, f64::NEG_INFINITY]);
    }

    #[test]
    fn like_database_table_strips_id_suffix_and_pluralizes() {
        assert_eq!(pluralize_like_table("employee_id"), "employees");
        assert_eq!(pluralize_like_table("id"), "id");
        assert_eq!(pluralize_like_table("box"), "boxes");
    }

    #[test]
    fn short_circuit_requires_both_conditions() {
        let candidates: HashSet<String> = ["humans".to_string(), "animals".to_string()].into_iter().collect();
        let regex = Regex::new("(?i).*_bite_victim$").unwrap();
        let result = short_circuit("first_bite_victim", &candidates, &None, &regex, "humans");
        assert_eq!(result, std::iter::once("humans".to_string()).collect());

        let narrow: HashSet<String> = ["animals".to_string()].into_iter().collect();
        assert!(short_circuit("first_bite_victim", &narrow, &None, &regex, "humans").is_empty());
    }

    #[test]
    fn value_fstring_alias_requires_value_placeholder() {
        assert!(value_fstring_alias("a", &[], &None, "no placeholder here").is_err());
        let (v, _) = value_fstring_alias("a", &[], &None, "prefix_{value}").unwrap();
        assert_eq!(v, "prefix_a");
    }
}
