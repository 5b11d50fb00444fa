//! Serializable configuration types consumed (not loaded) by the core.
//!
//! A caller's own TOML/JSON/YAML loader is responsible for producing these from a file;
//! this crate only accepts the parsed structure (see SPEC_FULL.md §6).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Named score/filter/heuristic function reference plus its keyword arguments, as it would
/// appear in a configuration document (e.g. `{name: "modified_hamming", kwargs: {...}}`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FunctionRef {
    pub name: String,
    #[serde(default)]
    pub kwargs: HashMap<String, serde_json::Value>,
}

/// Configuration for a single [`crate::mapping::Mapper`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MapperConfig {
    #[serde(default)]
    pub score_function: Option<FunctionRef>,
    #[serde(default)]
    pub min_score: Option<f64>,
    #[serde(default)]
    pub filters: Vec<FunctionRef>,
    #[serde(default)]
    pub overrides: HashMap<String, String>,
    #[serde(default)]
    pub context_sensitive_overrides: HashMap<String, HashMap<String, String>>,
    #[serde(default)]
    pub cardinality: Option<String>,
    #[serde(default)]
    pub on_unmapped: Option<String>,
    #[serde(default)]
    pub on_unknown_user_override: Option<String>,
}

/// Wiring for a single child fetcher inside a `MultiFetcher` (identifier, optionality, and
/// whatever backend-specific parameters the caller's loader attaches as free-form JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherDescriptor {
    pub identifier: String,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub params: HashMap<String, serde_json::Value>,
}

/// Top-level configuration for a [`crate::translator::Translator`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranslatorConfig {
    pub fmt: String,
    #[serde(default)]
    pub default_fmt: Option<String>,
    #[serde(default)]
    pub default_placeholders: HashMap<String, HashMap<String, String>>,
    #[serde(default)]
    pub mapper: MapperConfig,
    #[serde(default)]
    pub fetchers: Vec<FetcherDescriptor>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translator_config_round_trips_through_json() {
        let cfg = TranslatorConfig {
            fmt: "{id}:{name}".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_string(&cfg).unwrap();
        let back: TranslatorConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.fmt, "{id}:{name}");
    }
}
