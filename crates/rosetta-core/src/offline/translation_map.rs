//! Storage for translations already fetched for every known source, with per-source default
//! placeholder values and name-to-source aliasing.
//!
//! Grounded on `offline/_translation_map.py`. `InheritedKeysDict` (an arbitrary two-level dict
//! with a shared-default fallback, from the `rics` dependency) is replaced by
//! [`DefaultPlaceholders`], a small purpose-built struct covering the one shape this crate
//! actually needs: a default placeholder set, optionally overridden per source.

use std::collections::HashMap;

use indexmap::IndexMap;

use super::magic_dict::{DefaultTemplate, MagicDict};
use crate::format::{Format, FormatApplier, FormatError, PlaceholderTranslations};
use crate::types::{Identifier, Value};

/// Per-source default placeholder values, with a shared fallback for sources that don't
/// override it.
#[derive(Debug, Clone, Default)]
pub struct DefaultPlaceholders {
    default: HashMap<String, Value>,
    per_source: HashMap<String, HashMap<String, Value>>,
}

impl DefaultPlaceholders {
    pub fn new(default: HashMap<String, Value>) -> Self {
        Self { default, per_source: HashMap::new() }
    }

    pub fn with_source(mut self, source: impl Into<String>, values: HashMap<String, Value>) -> Self {
        self.per_source.insert(source.into(), values);
        self
    }

    /// Default values for `source`: the shared defaults, overridden key-by-key by whatever
    /// `source` specifies.
    pub fn get(&self, source: &str) -> HashMap<String, Value> {
        let mut out = self.default.clone();
        if let Some(overrides) = self.per_source.get(source) {
            out.extend(overrides.clone());
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.default.is_empty() && self.per_source.is_empty()
    }
}

/// Translations produced by [`TranslationMap::apply`]: the normal `id -> translation` direction,
/// or (in [`TranslationMap::reverse_mode`]) the inverse `translation -> id` direction used to
/// translate names back to ids. The reverse direction has no default-value fallback — an unknown
/// translated string simply isn't present.
#[derive(Debug, Clone)]
pub enum Translations {
    Forward(MagicDict),
    Reverse(HashMap<String, Identifier>),
}

/// Storage for per-source [`PlaceholderTranslations`], exposing them as [`MagicDict`]s rendered
/// through a configured [`Format`].
pub struct TranslationMap {
    source_translations: IndexMap<String, PlaceholderTranslations>,
    name_to_source: HashMap<String, String>,
    fmt: Option<Format>,
    default_fmt: Option<Format>,
    default_fmt_placeholders: DefaultPlaceholders,
    reverse_mode: bool,
    enable_uuid_heuristics: bool,
}

impl TranslationMap {
    pub fn new(
        source_translations: impl IntoIterator<Item = (String, PlaceholderTranslations)>,
        name_to_source: HashMap<String, String>,
        fmt: Option<Format>,
        default_fmt: Option<Format>,
        default_fmt_placeholders: DefaultPlaceholders,
        enable_uuid_heuristics: bool,
    ) -> Self {
        Self {
            source_translations: source_translations.into_iter().collect(),
            name_to_source,
            fmt,
            default_fmt,
            default_fmt_placeholders,
            reverse_mode: false,
            enable_uuid_heuristics,
        }
    }

    /// Names that resolve to a known source via `name_to_source`, plus the sources themselves
    /// (a name identical to its own source resolves to itself).
    pub fn names_and_sources(&self) -> Vec<String> {
        let mut seen: Vec<String> = self.name_to_source.keys().cloned().collect();
        for source in self.source_translations.keys() {
            if !seen.contains(source) {
                seen.push(source.clone());
            }
        }
        seen
    }

    pub fn sources(&self) -> Vec<String> {
        self.source_translations.keys().cloned().collect()
    }

    pub fn placeholders(&self) -> HashMap<String, Vec<String>> {
        self.source_translations
            .iter()
            .map(|(source, t)| (source.clone(), t.placeholders.clone()))
            .collect()
    }

    pub fn reverse_mode(&self) -> bool {
        self.reverse_mode
    }

    pub fn set_reverse_mode(&mut self, value: bool) {
        self.reverse_mode = value;
    }

    pub fn is_empty(&self) -> bool {
        self.source_translations.is_empty()
    }

    /// Clones this map with additional name-to-source aliases layered on top, for a single
    /// `translate` call that supplies its own explicit name/source resolution on top of an
    /// already-fetched (offline) map.
    pub fn rebind(&self, extra_name_to_source: HashMap<String, String>) -> TranslationMap {
        let mut name_to_source = self.name_to_source.clone();
        name_to_source.extend(extra_name_to_source);
        TranslationMap {
            source_translations: self.source_translations.clone(),
            name_to_source,
            fmt: self.fmt.clone(),
            default_fmt: self.default_fmt.clone(),
            default_fmt_placeholders: self.default_fmt_placeholders.clone(),
            reverse_mode: self.reverse_mode,
            enable_uuid_heuristics: self.enable_uuid_heuristics,
        }
    }

    /// Creates translations for `name_or_source`, falling back to the format given at
    /// construction when `fmt`/`default_fmt` are `None`.
    pub fn apply(
        &self,
        name_or_source: &str,
        fmt: Option<&Format>,
        default_fmt: Option<&Format>,
    ) -> Result<Translations, FormatError> {
        let fmt = fmt.or(self.fmt.as_ref()).ok_or(FormatError::NoFormat)?;
        let default_fmt = default_fmt.or(self.default_fmt.as_ref());

        let source = self
            .name_to_source
            .get(name_or_source)
            .cloned()
            .unwrap_or_else(|| name_or_source.to_string());
        let translations = self
            .source_translations
            .get(&source)
            .ok_or_else(|| FormatError::UnknownSource(name_or_source.to_string()))?;

        let applier = FormatApplier::new(fmt);
        let real = applier.apply(translations, None)?;

        let defaults = self.default_fmt_placeholders.get(&source);
        let default_compiled = if default_fmt.is_some() || !defaults.is_empty() {
            let default_applier = default_fmt.map(FormatApplier::new).unwrap_or_else(|| FormatApplier::new(fmt));
            let compiled = default_applier.compile_default(&defaults)?;
            Some(DefaultTemplate { compiled, placeholders: defaults })
        } else {
            None
        };

        if self.reverse_mode {
            let reversed: HashMap<String, Identifier> = real.into_iter().map(|(id, s)| (s, id)).collect();
            return Ok(Translations::Reverse(reversed));
        }

        let magic = MagicDict::new(real, default_compiled, self.enable_uuid_heuristics)?;
        Ok(Translations::Forward(magic))
    }
}
