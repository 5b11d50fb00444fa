//! The `Translator` façade: wires name mapping, fetching, and data-structure insertion into the
//! single `translate` entry point, plus `map`/`fetch`/`store`/`restore`.
//!
//! Grounded on `_translator.py::Translator`. Scope is the in-core orchestration described in
//! SPEC_FULL.md §4.7; config-file loading, transformers, and the pandas/SQL-specific code paths
//! of the original are out of scope.

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::path::Path;

use indexmap::IndexMap;
use thiserror::Error;

use crate::dio::{self, DioError};
use crate::fetching::{Fetcher, FetchingError, IdsToFetch};
use crate::format::{Format, FormatError, PlaceholderTranslations};
use crate::mapping::MappingError;
use crate::mapping::Mapper;
use crate::offline::{DefaultPlaceholders, TranslationMap, Translations};
use crate::settings;
use crate::types::Identifier;

#[derive(Debug, Error)]
pub enum TranslatorError {
    #[error("translator is offline and has no fetcher configured")]
    Offline,

    #[error("translator is already offline; restore from storage or construct a new online Translator")]
    AlreadyOffline,

    #[error("could not derive names from the input value; pass explicit names")]
    CannotDeriveNames,

    #[error("explicit name '{0}' could not be mapped to any known source")]
    ExplicitNameUnmapped(String),

    #[error("too many untranslated ids for name '{name}' (failed {failed}/{total}, max allowed fraction {max_allowed}); samples: {sample_ids:?}")]
    TooManyFailedTranslations {
        name: String,
        failed: usize,
        total: usize,
        max_allowed: f64,
        sample_ids: Vec<String>,
    },

    #[error("underlying adapter returned an unexpected type for this call")]
    Implementation,

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error(transparent)]
    Fetching(#[from] FetchingError),

    #[error(transparent)]
    Dio(#[from] DioError),

    #[error("I/O error persisting offline translations: {0}")]
    Io(String),

    #[error("serialization error persisting offline translations: {0}")]
    Serde(String),
}

impl From<std::io::Error> for TranslatorError {
    fn from(e: std::io::Error) -> Self {
        TranslatorError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for TranslatorError {
    fn from(e: serde_json::Error) -> Self {
        TranslatorError::Serde(e.to_string())
    }
}

/// How the set of names to translate, and their source, is determined for one `translate` call.
pub enum NameSpec {
    /// Names the caller asserts exist; a name that fails to map to a source is fatal.
    Explicit(Vec<String>),
    /// Explicit `name -> source` pairs, bypassing the name-to-source mapper entirely.
    Mapping(HashMap<String, String>),
}

#[derive(serde::Serialize, serde::Deserialize)]
struct StoredTranslations {
    fmt: String,
    default_fmt: Option<String>,
    enable_uuid_heuristics: bool,
    source_translations: IndexMap<String, PlaceholderTranslations>,
}

/// Coordinates name mapping, fetching, and data-structure translation.
///
/// Online (has a [`Fetcher`]) until [`Translator::store`] discards it in favor of a cached
/// [`TranslationMap`]; [`Translator::restore`] rebuilds an offline instance directly from a
/// previously stored snapshot.
pub struct Translator {
    fmt: Format,
    default_fmt: Option<Format>,
    default_placeholders: DefaultPlaceholders,
    source_mapper: Mapper<String>,
    enable_uuid_heuristics: bool,
    fetcher: Option<Box<dyn Fetcher>>,
    offline: Option<TranslationMap>,
}

impl Translator {
    pub fn new(fmt: &str, fetcher: Box<dyn Fetcher>) -> Result<Self, TranslatorError> {
        Ok(Self {
            fmt: Format::parse(fmt)?,
            default_fmt: None,
            default_placeholders: DefaultPlaceholders::default(),
            source_mapper: Mapper::default_string_mapper(),
            enable_uuid_heuristics: false,
            fetcher: Some(fetcher),
            offline: None,
        })
    }

    pub fn with_default_fmt(mut self, fmt: &str) -> Result<Self, TranslatorError> {
        self.default_fmt = Some(Format::parse(fmt)?);
        Ok(self)
    }

    pub fn with_default_placeholders(mut self, placeholders: DefaultPlaceholders) -> Self {
        self.default_placeholders = placeholders;
        self
    }

    pub fn with_mapper(mut self, mapper: Mapper<String>) -> Self {
        self.source_mapper = mapper;
        self
    }

    pub fn with_uuid_heuristics(mut self, enable: bool) -> Self {
        self.enable_uuid_heuristics = enable;
        self
    }

    pub fn is_online(&self) -> bool {
        self.fetcher.is_some()
    }

    fn known_sources(&self) -> Vec<String> {
        if let Some(offline) = &self.offline {
            offline.sources()
        } else if let Some(fetcher) = &self.fetcher {
            fetcher.sources()
        } else {
            Vec::new()
        }
    }

    /// Maps `names` (minus `ignore_names`) to this translator's known sources.
    pub fn map(
        &self,
        names: &[String],
        ignore_names: &[String],
    ) -> Result<crate::mapping::DirectionalMapping<String, String>, TranslatorError> {
        let candidates: Vec<String> = names.iter().filter(|n| !ignore_names.contains(n)).cloned().collect();
        let sources = self.known_sources();
        self.source_mapper.apply(candidates, sources, None, None).map_err(TranslatorError::from)
    }

    /// Fetches translations for specific ids directly, bypassing name derivation.
    pub fn fetch(
        &self,
        ids_to_fetch: &[IdsToFetch],
        placeholders: &[String],
        required: &[String],
    ) -> Result<TranslationMap, TranslatorError> {
        let fetcher = self.fetcher.as_deref().ok_or(TranslatorError::Offline)?;
        let task_id = settings::next_task_id();
        let _guard = settings::TaskIdGuard::enter(task_id);
        let source_translations =
            fetcher.fetch(ids_to_fetch, placeholders, required, task_id, self.enable_uuid_heuristics)?;
        let name_to_source = ids_to_fetch.iter().map(|i| (i.source.clone(), i.source.clone())).collect();
        Ok(TranslationMap::new(
            source_translations,
            name_to_source,
            Some(self.fmt.clone()),
            self.default_fmt.clone(),
            self.default_placeholders.clone(),
            self.enable_uuid_heuristics,
        ))
    }

    fn build_translation_map(
        &self,
        extracted: &IndexMap<String, Vec<Identifier>>,
        name_to_source: &HashMap<String, String>,
        fmt: &Format,
        task_id: u64,
    ) -> Result<TranslationMap, TranslatorError> {
        if let Some(offline) = &self.offline {
            return Ok(offline.rebind(name_to_source.clone()));
        }

        let fetcher = self.fetcher.as_deref().ok_or(TranslatorError::Offline)?;

        let mut ids_by_source: HashMap<String, HashSet<Identifier>> = HashMap::new();
        for (name, ids) in extracted {
            let source = name_to_source.get(name).cloned().unwrap_or_else(|| name.clone());
            ids_by_source.entry(source).or_default().extend(ids.iter().cloned());
        }
        let ids_to_fetch: Vec<IdsToFetch> =
            ids_by_source.into_iter().map(|(source, ids)| IdsToFetch::new(source, ids)).collect();

        let placeholders = fmt.placeholders();
        let required = fmt.required_placeholders();
        let source_translations =
            fetcher.fetch(&ids_to_fetch, &placeholders, &required, task_id, self.enable_uuid_heuristics)?;

        Ok(TranslationMap::new(
            source_translations,
            name_to_source.clone(),
            Some(fmt.clone()),
            self.default_fmt.clone(),
            self.default_placeholders.clone(),
            self.enable_uuid_heuristics,
        ))
    }

    fn verify(
        &self,
        extracted: &IndexMap<String, Vec<Identifier>>,
        tmap: &TranslationMap,
        maximal_untranslated_fraction: f64,
    ) -> Result<(), TranslatorError> {
        for (name, ids) in extracted {
            let translations = tmap.apply(name, None, None)?;
            let magic = match &translations {
                Translations::Forward(magic) => magic,
                Translations::Reverse(_) => continue,
            };

            let mut sample_ids = Vec::new();
            let mut failed = 0usize;
            for id in ids {
                if magic.get(id).is_none() {
                    failed += 1;
                    if sample_ids.len() < 10 && !sample_ids.contains(&id.display()) {
                        sample_ids.push(id.display());
                    }
                }
            }

            let total = ids.len().max(1);
            let fraction = failed as f64 / total as f64;
            if fraction > maximal_untranslated_fraction {
                return Err(TranslatorError::TooManyFailedTranslations {
                    name: name.clone(),
                    failed,
                    total: ids.len(),
                    max_allowed: maximal_untranslated_fraction,
                    sample_ids,
                });
            }
        }
        Ok(())
    }

    /// Translates `data` into a new, differently-typed value (ids become their rendered format
    /// string, so e.g. `Identifier -> String` or `Vec<Identifier> -> Vec<String>`), deriving or
    /// resolving the relevant names per `names`.
    ///
    /// Unlike the original's duck-typed in-place translation, the output container here is a
    /// genuinely different static type from the input (see `dio` module docs), so the caller must
    /// name it: `translator.translate::<Identifier, String>(id, ...)`.
    ///
    /// When [`settings::translation_disabled`] is set, the original returns `data` unchanged;
    /// here that is only representable when `Out` happens to equal `In` (the value is boxed and
    /// downcast directly, with no translation logic run) — any other `Out` fails with
    /// [`TranslatorError::Implementation`], since there is no general way to produce an unrelated
    /// static type from `data` without actually translating it.
    ///
    /// `reverse` is accepted for API-shape parity with the original but always fails through
    /// this generic path: every [`crate::dio::DataStructureIO`] adapter in this crate operates on
    /// a container of [`Identifier`]s, so there is no statically-typed container here that could
    /// hold the *other* direction's values (translated strings) to turn back into ids. Use
    /// [`Translator::translate_reverse`] for that direction instead.
    pub fn translate<In: Any + Send + Sync + 'static, Out: Any + Send + Sync + 'static>(
        &self,
        data: In,
        names: Option<NameSpec>,
        ignore_names: &[String],
        reverse: bool,
        fmt_override: Option<&str>,
        maximal_untranslated_fraction: f64,
    ) -> Result<Out, TranslatorError> {
        if settings::translation_disabled() {
            #[cfg(feature = "tracing")]
            tracing::warn!(env = settings::DISABLE_ENV_VAR, "translation disabled; returning input unchanged");
            let boxed: Box<dyn Any> = Box::new(data);
            return boxed.downcast::<Out>().map(|b| *b).map_err(|_| TranslatorError::Implementation);
        }

        let task_id = settings::next_task_id();
        let _guard = settings::TaskIdGuard::enter(task_id);

        let fmt = match fmt_override {
            Some(s) => Format::parse(s)?,
            None => self.fmt.clone(),
        };

        let type_name = std::any::type_name::<In>();
        let io = dio::resolve_io(&data as &dyn Any, type_name)?;

        let explicit = matches!(names, Some(NameSpec::Explicit(_)));
        let (raw_names, mut name_to_source): (Vec<String>, HashMap<String, String>) = match names {
            Some(NameSpec::Mapping(map)) => (map.keys().cloned().collect(), map),
            Some(NameSpec::Explicit(list)) => (list, HashMap::new()),
            None => {
                let derived = io.names(&data).ok_or(TranslatorError::CannotDeriveNames)?;
                (derived, HashMap::new())
            }
        };

        let candidate_names: Vec<String> = raw_names.into_iter().filter(|n| !ignore_names.contains(n)).collect();
        if candidate_names.is_empty() {
            return Err(TranslatorError::CannotDeriveNames);
        }

        if name_to_source.is_empty() {
            let sources = self.known_sources();
            let dm = self.source_mapper.apply(candidate_names.clone(), sources, None, None)?;
            if explicit {
                for n in &candidate_names {
                    if dm.get(n).is_none() {
                        return Err(TranslatorError::ExplicitNameUnmapped(n.clone()));
                    }
                }
            }
            name_to_source = dm.flatten()?;
        }

        let names_to_use: Vec<String> =
            candidate_names.into_iter().filter(|n| name_to_source.contains_key(n)).collect();
        if names_to_use.is_empty() {
            return Err(TranslatorError::CannotDeriveNames);
        }

        let extracted = io.extract(&data, &names_to_use)?;

        let tmap = self.build_translation_map(&extracted, &name_to_source, &fmt, task_id)?;

        if maximal_untranslated_fraction < 1.0 {
            self.verify(&extracted, &tmap, maximal_untranslated_fraction)?;
        }

        let mut tmap = tmap;
        tmap.set_reverse_mode(reverse);

        let translated = io.insert(&data, &names_to_use, &tmap, true)?;
        translated.downcast::<Out>().map(|b| *b).map_err(|_| TranslatorError::Implementation)
    }

    /// Translates a single already-rendered string back to the id that produced it, the
    /// practical reverse-translation entry point (see [`Translator::translate`]'s docs for why
    /// the generic adapter path cannot do this).
    pub fn translate_reverse(&self, name_or_source: &str, value: &str) -> Result<Option<Identifier>, TranslatorError> {
        let task_id = settings::next_task_id();
        let _guard = settings::TaskIdGuard::enter(task_id);

        let mut tmap = if let Some(offline) = &self.offline {
            offline.rebind(HashMap::new())
        } else {
            let fetcher = self.fetcher.as_deref().ok_or(TranslatorError::Offline)?;
            let placeholders = self.fmt.placeholders();
            let required = self.fmt.required_placeholders();
            let sources: HashSet<String> = HashSet::from([name_or_source.to_string()]);
            let source_translations =
                fetcher.fetch_all(&placeholders, &required, Some(&sources), task_id, self.enable_uuid_heuristics)?;
            TranslationMap::new(
                source_translations,
                HashMap::new(),
                Some(self.fmt.clone()),
                self.default_fmt.clone(),
                self.default_placeholders.clone(),
                self.enable_uuid_heuristics,
            )
        };

        tmap.set_reverse_mode(true);
        let translations = tmap.apply(name_or_source, None, None)?;
        match translations {
            Translations::Reverse(reversed) => Ok(reversed.get(value).cloned()),
            Translations::Forward(_) => unreachable!("set_reverse_mode(true) always yields Translations::Reverse"),
        }
    }

    /// Fetches every translation available (optionally restricted by a prior online fetch) and
    /// discards the fetcher, optionally persisting a snapshot at `path` so a later process can
    /// [`Translator::restore`] it without ever going online.
    pub fn store(&mut self, path: Option<&Path>) -> Result<(), TranslatorError> {
        let fetcher = self.fetcher.take().ok_or(TranslatorError::AlreadyOffline)?;

        let placeholders = self.fmt.placeholders();
        let required = self.fmt.required_placeholders();
        let task_id = settings::next_task_id();
        let source_translations = fetcher.fetch_all(&placeholders, &required, None, task_id, self.enable_uuid_heuristics)?;
        fetcher.close();

        if let Some(path) = path {
            let snapshot = StoredTranslations {
                fmt: self.fmt.source().to_string(),
                default_fmt: self.default_fmt.as_ref().map(|f| f.source().to_string()),
                enable_uuid_heuristics: self.enable_uuid_heuristics,
                source_translations: source_translations.clone(),
            };
            let json = serde_json::to_string_pretty(&snapshot)?;
            std::fs::write(path, json)?;
        }

        self.offline = Some(TranslationMap::new(
            source_translations,
            HashMap::new(),
            Some(self.fmt.clone()),
            self.default_fmt.clone(),
            self.default_placeholders.clone(),
            self.enable_uuid_heuristics,
        ));
        Ok(())
    }

    /// Rebuilds an offline `Translator` from a snapshot written by [`Translator::store`].
    pub fn restore(path: &Path, default_placeholders: DefaultPlaceholders) -> Result<Self, TranslatorError> {
        let json = std::fs::read_to_string(path)?;
        let snapshot: StoredTranslations = serde_json::from_str(&json)?;
        let fmt = Format::parse(&snapshot.fmt)?;
        let default_fmt = snapshot.default_fmt.as_deref().map(Format::parse).transpose()?;

        let offline = TranslationMap::new(
            snapshot.source_translations,
            HashMap::new(),
            Some(fmt.clone()),
            default_fmt.clone(),
            default_placeholders.clone(),
            snapshot.enable_uuid_heuristics,
        );

        Ok(Self {
            fmt,
            default_fmt,
            default_placeholders,
            source_mapper: Mapper::default_string_mapper(),
            enable_uuid_heuristics: snapshot.enable_uuid_heuristics,
            fetcher: None,
            offline: Some(offline),
        })
    }
}
