//! Translated-id lookup with optional template-based fallback for ids that have no real match.
//!
//! Grounded on `offline/_magic_dict.py`. UUID canonicalization (`enable_uuid_heuristics`) is
//! all-or-nothing over the whole key set, matching `_try_stringify_many`: if any key fails to
//! parse as a UUID the original keys are kept unchanged.
//!
//! Deviates from the original in one respect: the default-value fallback is a [`CompiledFormat`]
//! rendered per missing key rather than a pre-baked `str.format`-style template string, since this
//! crate's [`FormatApplier::compile_default`] already produces exactly that. The
//! `transformer`/`try_add_missing_key` lazy-fetch-on-miss hook from the original is not ported:
//! it depends on a separate bitmask-transform subsystem outside this crate's scope.

use std::collections::HashMap;

use super::super::format::{CompiledFormat, FormatError};
use crate::types::{Identifier, Value, ID};
use crate::uuid_utils;

/// A compiled default-value template plus the static placeholder values it needs beyond `id`
/// (which is supplied per lookup).
#[derive(Debug, Clone)]
pub struct DefaultTemplate {
    pub compiled: CompiledFormat,
    pub placeholders: HashMap<String, Value>,
}

/// A `{id: translation}` map that optionally answers for ids it was never given, by rendering a
/// default template instead of returning `None`.
#[derive(Debug, Clone)]
pub struct MagicDict {
    real: HashMap<Identifier, String>,
    default: Option<DefaultTemplate>,
    cast_key: bool,
}

impl MagicDict {
    /// Builds a `MagicDict` from already-rendered translations plus an optional compiled default
    /// template (see [`FormatApplier::compile_default`]).
    ///
    /// Errors if `enable_uuid_heuristics` is set and canonicalizing keys to their UUID form would
    /// collapse two distinct keys onto the same value.
    pub fn new(
        real_translations: HashMap<Identifier, String>,
        default: Option<DefaultTemplate>,
        enable_uuid_heuristics: bool,
    ) -> Result<Self, FormatError> {
        let (real, cast_key) = if enable_uuid_heuristics && !real_translations.is_empty() {
            try_stringify_many(real_translations)?
        } else {
            (real_translations, false)
        };
        Ok(Self { real, default, cast_key })
    }

    fn cast(&self, key: &Identifier) -> Identifier {
        if self.cast_key {
            uuid_utils::try_cast_one(key)
        } else {
            key.clone()
        }
    }

    /// Returns the translation for `key`, falling back to the rendered default template if `key`
    /// has no real translation and a default was configured.
    pub fn get(&self, key: &Identifier) -> Option<String> {
        let key = self.cast(key);
        if let Some(v) = self.real.get(&key) {
            return Some(v.clone());
        }
        self.default.as_ref().and_then(|d| {
            d.compiled
                .render(|p| if p == ID { Some(Value::from(key.clone())) } else { d.placeholders.get(p).cloned() })
                .ok()
        })
    }

    /// A `MagicDict` with a default template claims to contain every key.
    pub fn contains(&self, key: &Identifier) -> bool {
        self.default.is_some() || self.real.contains_key(&self.cast(key))
    }

    pub fn insert(&mut self, key: Identifier, value: String) -> Option<String> {
        let key = self.cast(&key);
        self.real.insert(key, value)
    }

    pub fn remove(&mut self, key: &Identifier) -> Option<String> {
        let key = self.cast(key);
        self.real.remove(&key)
    }

    pub fn len(&self) -> usize {
        self.real.len()
    }

    pub fn is_empty(&self) -> bool {
        self.real.is_empty()
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Identifier, &String)> {
        self.real.iter()
    }

    pub fn into_inner(self) -> HashMap<Identifier, String> {
        self.real
    }
}

/// Canonicalizes every key to its UUID string form, all-or-nothing. Returns the translations
/// unchanged (and `cast_key = false`) if any key does not parse as a UUID.
fn try_stringify_many(real: HashMap<Identifier, String>) -> Result<(HashMap<Identifier, String>, bool), FormatError> {
    let keys: Vec<Identifier> = real.keys().cloned().collect();
    let Ok(new_keys) = uuid_utils::cast_many(&keys) else {
        return Ok((real, false));
    };

    let mut out = HashMap::with_capacity(real.len());
    for (new_key, old_key) in new_keys.into_iter().zip(keys.iter()) {
        if out.insert(new_key.clone(), real[old_key].clone()).is_some() {
            return Err(FormatError::DuplicateKey(new_key.display()));
        }
    }
    Ok((out, true))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translations() -> HashMap<Identifier, String> {
        HashMap::from([
            (Identifier::Int(1999), "1999:Sofia".to_string()),
            (Identifier::Int(1991), "1991:Richard".to_string()),
        ])
    }

    #[test]
    fn returns_real_translation() {
        let magic = MagicDict::new(translations(), None, true).unwrap();
        assert_eq!(magic.get(&Identifier::Int(1999)), Some("1999:Sofia".to_string()));
        assert!(magic.contains(&Identifier::Int(1999)));
    }

    #[test]
    fn without_default_unknown_keys_return_none_and_are_absent() {
        let magic = MagicDict::new(translations(), None, true).unwrap();
        assert_eq!(magic.get(&Identifier::Int(1)), None);
        assert!(!magic.contains(&Identifier::Int(1)));
    }

    #[test]
    fn with_default_every_key_is_contained() {
        let fmt = crate::format::Format::parse("<Failed: id={id}>").unwrap();
        let compiled = fmt.compile(&["id".to_string()]).unwrap();
        let default = DefaultTemplate { compiled, placeholders: HashMap::new() };
        let magic = MagicDict::new(translations(), Some(default), true).unwrap();
        assert!(magic.contains(&Identifier::Int(404)));
        assert_eq!(magic.get(&Identifier::Int(404)), Some("<Failed: id=404>".to_string()));
    }

    #[test]
    fn differently_cased_uuid_keys_canonicalize_to_the_same_entry() {
        let mut real = HashMap::new();
        real.insert(
            Identifier::Str("550E8400-E29B-41D4-A716-446655440000".to_string()),
            "Found!".to_string(),
        );
        let magic = MagicDict::new(real, None, true).unwrap();
        let lower = Identifier::Str("550e8400-e29b-41d4-a716-446655440000".to_string());
        assert_eq!(magic.get(&lower), Some("Found!".to_string()));
    }

    #[test]
    fn duplicate_keys_after_canonicalization_is_an_error() {
        let mut real = HashMap::new();
        real.insert(
            Identifier::Str("550E8400-E29B-41D4-A716-446655440000".to_string()),
            "a".to_string(),
        );
        real.insert(
            Identifier::Str("550e8400-e29b-41d4-a716-446655440000".to_string()),
            "b".to_string(),
        );
        assert!(MagicDict::new(real, None, true).is_err());
    }
}
