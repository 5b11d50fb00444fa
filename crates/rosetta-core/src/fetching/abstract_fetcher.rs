//! Generic scaffolding shared by every concrete fetcher: placeholder name mapping (with
//! caching), required-placeholder verification, optional result caching, and `fetch`/`fetch_all`
//! dispatch onto a single backend method.
//!
//! Grounded on `_abstract_fetcher.py::AbstractFetcher`. Rust has no abstract base class, so the
//! original's `fetch_translations`/`_initialize_sources` abstract methods become the
//! [`FetcherBackend`] trait, and `AbstractFetcher<B>` wraps a concrete `B` by composition instead
//! of inheritance.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use indexmap::IndexMap;

use super::cache::CacheAccess;
use super::fetcher::Fetcher;
use super::types::{FetchInstruction, IdsToFetch};
use super::FetchingError;
use crate::format::PlaceholderTranslations;
use crate::mapping::Mapper;
use crate::types::Identifier;

/// The backend-specific half of a fetcher: where placeholders actually come from.
pub trait FetcherBackend: Send + Sync {
    /// Discovers sources and their available placeholder names, actual-name space.
    fn initialize_sources(&self, task_id: u64) -> Result<IndexMap<String, Vec<String>>, FetchingError>;

    /// Retrieves translations for one source per `instr`. `instr.placeholders` are already in
    /// the backend's own actual-name space (remapped by [`AbstractFetcher`]).
    fn fetch_translations(&self, instr: &FetchInstruction) -> Result<PlaceholderTranslations, FetchingError>;

    /// `true` if this backend can currently reach its data.
    fn online(&self) -> bool {
        true
    }
}

const OP_NONE: u8 = 0;
const OP_FETCH: u8 = 1;
const OP_FETCH_ALL: u8 = 2;

fn op_name(op: u8) -> &'static str {
    match op {
        OP_FETCH => "FETCH",
        OP_FETCH_ALL => "FETCH_ALL",
        _ => "none",
    }
}

/// RAII release of the concurrent-operation gate. Thread-safe fetchers never acquire the gate, so
/// `fetcher` is `None` for them and the drop is a no-op.
struct OperationGuard<'a, B: FetcherBackend> {
    fetcher: Option<&'a AbstractFetcher<B>>,
}

impl<'a, B: FetcherBackend> Drop for OperationGuard<'a, B> {
    fn drop(&mut self) {
        if let Some(f) = self.fetcher {
            f.active_operation.store(OP_NONE, Ordering::Release);
            f.busy.store(false, Ordering::Release);
        }
    }
}

/// Wraps a [`FetcherBackend`] with the placeholder-mapping, caching, and dispatch logic every
/// concrete fetcher needs.
pub struct AbstractFetcher<B: FetcherBackend> {
    backend: B,
    mapper: Mapper<String>,
    allow_fetch_all: bool,
    selective_fetch_all: bool,
    optional: bool,
    thread_safe: bool,
    cache: Option<Arc<dyn CacheAccess>>,
    placeholders: RwLock<Option<IndexMap<String, Vec<String>>>>,
    mapping_cache: Mutex<HashMap<String, HashMap<String, Option<String>>>>,
    busy: AtomicBool,
    active_operation: AtomicU8,
}

impl<B: FetcherBackend> AbstractFetcher<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            mapper: Mapper::default_string_mapper(),
            allow_fetch_all: true,
            selective_fetch_all: true,
            optional: false,
            thread_safe: false,
            cache: None,
            placeholders: RwLock::new(None),
            mapping_cache: Mutex::new(HashMap::new()),
            busy: AtomicBool::new(false),
            active_operation: AtomicU8::new(OP_NONE),
        }
    }

    pub fn with_mapper(mut self, mapper: Mapper<String>) -> Self {
        self.mapper = mapper;
        self
    }

    pub fn with_allow_fetch_all(mut self, allow: bool) -> Self {
        self.allow_fetch_all = allow;
        self
    }

    pub fn with_selective_fetch_all(mut self, selective: bool) -> Self {
        self.selective_fetch_all = selective;
        self
    }

    pub fn with_optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    /// Declares the backend safe to call concurrently, disabling the concurrent-operation gate
    /// entirely. Leave `false` (the default) unless `fetch_translations`/`initialize_sources` are
    /// actually reentrant.
    pub fn with_thread_safe(mut self, thread_safe: bool) -> Self {
        self.thread_safe = thread_safe;
        self
    }

    /// Acquires the single-flight gate for `op`, unless this fetcher is declared thread-safe.
    fn enter_operation(&self, op: u8) -> Result<OperationGuard<'_, B>, FetchingError> {
        if self.thread_safe {
            return Ok(OperationGuard { fetcher: None });
        }
        if self.busy.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).is_err() {
            let active = self.active_operation.load(Ordering::Acquire);
            return Err(FetchingError::ConcurrentOperation {
                attempted: op_name(op).to_string(),
                active: op_name(active).to_string(),
                param_info: "thread_safe=false".to_string(),
            });
        }
        self.active_operation.store(op, Ordering::Release);
        Ok(OperationGuard { fetcher: Some(self) })
    }

    pub fn with_cache(mut self, cache: Arc<dyn CacheAccess>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn ensure_sources(&self, task_id: u64, force: bool) -> Result<(), FetchingError> {
        if !force && self.placeholders.read().expect("lock poisoned").is_some() {
            return Ok(());
        }
        let discovered = self.backend.initialize_sources(task_id)?;
        *self.placeholders.write().expect("lock poisoned") = Some(discovered);
        Ok(())
    }

    /// Maps wanted placeholder names to the actual names present in `source`, caching the result
    /// until `clear_cache` is set or the fetcher is recreated.
    pub fn map_placeholders(
        &self,
        source: &str,
        wanted: &[String],
        clear_cache: bool,
    ) -> Result<HashMap<String, Option<String>>, FetchingError> {
        let mut cache = self.mapping_cache.lock().expect("lock poisoned");
        if clear_cache {
            cache.remove(source);
        }
        let entry = cache.entry(source.to_string()).or_default();

        let unmapped: Vec<String> = wanted.iter().filter(|p| !entry.contains_key(*p)).cloned().collect();
        if unmapped.is_empty() {
            return Ok(entry.clone());
        }

        let candidates = self.get_placeholders(source)?;
        let dm = self
            .mapper
            .apply(unmapped.clone(), candidates, Some(source.to_string()), None)
            .map_err(FetchingError::from)?;

        for value in &unmapped {
            entry.insert(value.clone(), dm.get(value).and_then(|c| c.first().cloned()));
        }

        Ok(entry.clone())
    }

    fn get_placeholders(&self, source: &str) -> Result<Vec<String>, FetchingError> {
        self.ensure_sources(0, false)?;
        let guard = self.placeholders.read().expect("lock poisoned");
        guard
            .as_ref()
            .and_then(|p| p.get(source))
            .cloned()
            .ok_or_else(|| FetchingError::UnknownSource {
                unknown: vec![source.to_string()],
                known: guard.as_ref().map(|p| p.keys().cloned().collect()).unwrap_or_default(),
            })
    }

    fn fetch_one(
        &self,
        source: &str,
        wanted_placeholders: &[String],
        required: &HashSet<String>,
        ids: Option<HashSet<Identifier>>,
        task_id: u64,
        enable_uuid_heuristics: bool,
    ) -> Result<PlaceholderTranslations, FetchingError> {
        let wanted = if wanted_placeholders.is_empty() {
            self.get_placeholders(source)?
        } else {
            wanted_placeholders.to_vec()
        };

        let name_map = self.map_placeholders(source, &wanted, false)?;
        let mut reverse = HashMap::new();
        let actual_placeholders: Vec<String> = wanted
            .iter()
            .map(|w| {
                let actual = name_map.get(w).cloned().flatten().unwrap_or_else(|| w.clone());
                reverse.insert(actual.clone(), w.clone());
                actual
            })
            .collect();

        let instr = FetchInstruction {
            source: source.to_string(),
            placeholders: actual_placeholders,
            required: required.clone(),
            ids,
            task_id,
            enable_uuid_heuristics,
        };

        let cached = self.cache.as_ref().filter(|c| c.enabled()).and_then(|c| c.load(&instr));
        let (mut translations, from_cache) = match cached {
            Some(t) => (t, true),
            None => (self.backend.fetch_translations(&instr)?, false),
        };

        translations.placeholders = translations
            .placeholders
            .iter()
            .map(|p| reverse.get(p).cloned().unwrap_or_else(|| p.clone()))
            .collect();

        let missing: Vec<String> = required
            .iter()
            .filter(|r| !translations.placeholders.contains(*r))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(FetchingError::UnknownPlaceholder(missing.join(", ")));
        }

        if !from_cache {
            if let Some(cache) = self.cache.as_ref().filter(|c| c.enabled()) {
                cache.store(&instr, &translations);
            }
        }

        Ok(translations)
    }
}

impl<B: FetcherBackend> Fetcher for AbstractFetcher<B> {
    fn allow_fetch_all(&self) -> bool {
        self.allow_fetch_all
    }

    fn online(&self) -> bool {
        self.backend.online()
    }

    fn optional(&self) -> bool {
        self.optional
    }

    fn initialize_sources(&self, task_id: u64, force: bool) -> Result<(), FetchingError> {
        self.ensure_sources(task_id, force)
    }

    fn sources(&self) -> Vec<String> {
        let _ = self.ensure_sources(0, false);
        self.placeholders
            .read()
            .expect("lock poisoned")
            .as_ref()
            .map(|p| p.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn placeholders(&self) -> IndexMap<String, Vec<String>> {
        let _ = self.ensure_sources(0, false);
        self.placeholders.read().expect("lock poisoned").clone().unwrap_or_default()
    }

    fn fetch(
        &self,
        ids_to_fetch: &[IdsToFetch],
        placeholders: &[String],
        required: &[String],
        task_id: u64,
        enable_uuid_heuristics: bool,
    ) -> Result<IndexMap<String, PlaceholderTranslations>, FetchingError> {
        let _guard = self.enter_operation(OP_FETCH)?;
        let required: HashSet<String> = required.iter().cloned().collect();
        let mut out = IndexMap::with_capacity(ids_to_fetch.len());
        for itf in ids_to_fetch {
            let translations = self.fetch_one(
                &itf.source,
                placeholders,
                &required,
                Some(itf.ids.clone()),
                task_id,
                enable_uuid_heuristics,
            )?;
            out.insert(itf.source.clone(), translations);
        }
        Ok(out)
    }

    fn fetch_all(
        &self,
        placeholders: &[String],
        required: &[String],
        sources: Option<&HashSet<String>>,
        task_id: u64,
        enable_uuid_heuristics: bool,
    ) -> Result<IndexMap<String, PlaceholderTranslations>, FetchingError> {
        let _guard = self.enter_operation(OP_FETCH_ALL)?;
        if !self.allow_fetch_all {
            return Err(FetchingError::ForbiddenOperation {
                operation: "FETCH_ALL".to_string(),
                reason: "is not allowed by this fetcher".to_string(),
            });
        }

        let required: HashSet<String> = required.iter().cloned().collect();
        let all_sources = self.sources();
        let wanted_sources: Vec<String> = match sources {
            Some(s) => all_sources.into_iter().filter(|src| s.contains(src)).collect(),
            None => all_sources,
        };

        let candidate_sources: Vec<String> = if self.selective_fetch_all {
            wanted_sources
                .into_iter()
                .filter(|source| {
                    let mapped = self.map_placeholders(source, &required.iter().cloned().collect::<Vec<_>>(), false);
                    matches!(mapped, Ok(m) if required.iter().all(|r| m.get(r).map(Option::is_some).unwrap_or(false)))
                })
                .collect()
        } else {
            wanted_sources
        };

        let mut out = IndexMap::with_capacity(candidate_sources.len());
        for source in candidate_sources {
            let translations =
                self.fetch_one(&source, placeholders, &required, None, task_id, enable_uuid_heuristics)?;
            out.insert(source, translations);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Value, ID};

    struct MemoryBackend {
        rows: HashMap<String, (Vec<String>, Vec<Vec<Value>>)>,
    }

    impl FetcherBackend for MemoryBackend {
        fn initialize_sources(&self, _task_id: u64) -> Result<IndexMap<String, Vec<String>>, FetchingError> {
            Ok(self.rows.iter().map(|(s, (ph, _))| (s.clone(), ph.clone())).collect())
        }

        fn fetch_translations(&self, instr: &FetchInstruction) -> Result<PlaceholderTranslations, FetchingError> {
            let (placeholders, records) =
                self.rows.get(&instr.source).cloned().ok_or_else(|| FetchingError::UnknownSource {
                    unknown: vec![instr.source.clone()],
                    known: self.rows.keys().cloned().collect(),
                })?;
            Ok(PlaceholderTranslations::new(instr.source.clone(), placeholders, records))
        }
    }

    fn fetcher() -> AbstractFetcher<MemoryBackend> {
        let mut rows = HashMap::new();
        rows.insert(
            "people".to_string(),
            (
                vec![ID.to_string(), "name".to_string()],
                vec![vec![Value::Int(1), Value::Str("sofia".to_string())]],
            ),
        );
        AbstractFetcher::new(MemoryBackend { rows })
    }

    #[test]
    fn fetch_returns_requested_source() {
        let f = fetcher();
        let ids = vec![IdsToFetch::new("people", HashSet::from([Identifier::Int(1)]))];
        let out = f.fetch(&ids, &[], &[], 1, false).unwrap();
        assert_eq!(out["people"].records.len(), 1);
    }

    #[test]
    fn fetch_all_is_forbidden_when_disabled() {
        let f = fetcher().with_allow_fetch_all(false);
        assert!(f.fetch_all(&[], &[], None, 1, false).is_err());
    }

    #[test]
    fn fetch_all_selective_keeps_sources_with_required_placeholders() {
        let f = fetcher();
        let out = f.fetch_all(&[], &["name".to_string()], None, 1, false).unwrap();
        assert!(out.contains_key("people"));
    }

    #[test]
    fn fetch_unknown_source_errors() {
        let f = fetcher();
        let ids = vec![IdsToFetch::new("nowhere", HashSet::new())];
        assert!(f.fetch(&ids, &[], &[], 1, false).is_err());
    }

    #[test]
    fn overlapping_operations_are_rejected_by_the_gate() {
        let f = fetcher();
        let _held = f.enter_operation(OP_FETCH).unwrap();
        let err = f.enter_operation(OP_FETCH_ALL).unwrap_err();
        match err {
            FetchingError::ConcurrentOperation { attempted, active, .. } => {
                assert_eq!(attempted, "FETCH_ALL");
                assert_eq!(active, "FETCH");
            }
            other => panic!("expected ConcurrentOperation, got {other:?}"),
        }
    }

    #[test]
    fn gate_reopens_once_the_guard_is_dropped() {
        let f = fetcher();
        {
            let _held = f.enter_operation(OP_FETCH).unwrap();
        }
        assert!(f.enter_operation(OP_FETCH).is_ok());
    }

    #[test]
    fn thread_safe_fetcher_never_engages_the_gate() {
        let f = fetcher().with_thread_safe(true);
        let _first = f.enter_operation(OP_FETCH).unwrap();
        assert!(f.enter_operation(OP_FETCH_ALL).is_ok());
    }
}
