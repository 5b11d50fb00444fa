//! Combines several [`Fetcher`]s into one, dispatching by source ownership.
//!
//! Grounded on `_multi_fetcher.py::MultiFetcher`. Source ownership is rank-based: the first
//! child (in construction order) to claim a source keeps it, later claims are rejected per
//! [`OnSourceConflict`]. The original dispatches fetch jobs on a `ThreadPoolExecutor`; this
//! crate uses a bounded `rayon` thread pool instead, matching the crate-wide dependency stack
//! (`SPEC_FULL.md` Design Notes).
//!
//! Conflict-resolution policy is user-configurable only at construction/`initialize_sources`
//! time. Once sources are owned, `fetch_all` always treats an accidental overlap as `ignore`
//! (there is nothing to warn about, every source is only ever dispatched to its owner) and a
//! plain `fetch` call always treats an accidental duplicate result key as `warn` (it should never
//! happen given unique ownership, but silently dropping data would hide a backend bug).

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use indexmap::IndexMap;

use super::fetcher::Fetcher;
use super::types::IdsToFetch;
use super::FetchingError;
use crate::format::PlaceholderTranslations;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnSourceConflict {
    #[default]
    Raise,
    Warn,
    Ignore,
}

struct SourceOwnership {
    source_to_child: HashMap<String, usize>,
    placeholders: IndexMap<String, Vec<String>>,
}

pub struct MultiFetcher {
    children: Vec<Arc<dyn Fetcher>>,
    max_workers: usize,
    on_source_conflict: OnSourceConflict,
    ownership: RwLock<Option<SourceOwnership>>,
}

impl MultiFetcher {
    pub fn new(children: Vec<Arc<dyn Fetcher>>) -> Self {
        Self {
            children,
            max_workers: 1,
            on_source_conflict: OnSourceConflict::Raise,
            ownership: RwLock::new(None),
        }
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    pub fn with_on_source_conflict(mut self, policy: OnSourceConflict) -> Self {
        self.on_source_conflict = policy;
        self
    }

    pub fn children(&self) -> &[Arc<dyn Fetcher>] {
        &self.children
    }

    pub fn get_child(&self, source: &str) -> Result<Arc<dyn Fetcher>, FetchingError> {
        self.ensure_sources(0, false)?;
        let guard = self.ownership.read().expect("lock poisoned");
        let ownership = guard.as_ref().expect("ensure_sources just populated this");
        let idx = ownership
            .source_to_child
            .get(source)
            .ok_or_else(|| FetchingError::UnknownSource {
                unknown: vec![source.to_string()],
                known: ownership.source_to_child.keys().cloned().collect(),
            })?;
        Ok(self.children[*idx].clone())
    }

    /// Discovers every child's sources, in parallel if `max_workers > 1`. Optional children that
    /// fail to initialize or report zero sources are discarded (and closed); required children
    /// that fail propagate an error annotated with the child's index, and required children
    /// reporting zero sources are kept but logged at WARNING.
    fn ensure_sources(&self, task_id: u64, force: bool) -> Result<(), FetchingError> {
        if !force && self.ownership.read().expect("lock poisoned").is_some() {
            return Ok(());
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.max_workers)
            .build()
            .map_err(|e| FetchingError::Implementation(e.to_string()))?;
        let init_results: Vec<(usize, Result<(), FetchingError>)> = pool.install(|| {
            use rayon::iter::{IntoParallelIterator, ParallelIterator};
            self.children
                .iter()
                .enumerate()
                .collect::<Vec<_>>()
                .into_par_iter()
                .map(|(idx, child)| (idx, child.initialize_sources(task_id, force)))
                .collect()
        });

        let mut source_to_child: HashMap<String, usize> = HashMap::new();
        let mut placeholders = IndexMap::new();
        let mut rejections: Vec<(String, usize, usize)> = Vec::new();

        for (idx, init_result) in init_results {
            let child = &self.children[idx];
            if let Err(e) = init_result {
                if child.optional() {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(child = idx, error = %e, "optional fetcher failed to initialize; discarding");
                    child.close();
                    continue;
                }
                return Err(FetchingError::Implementation(format!(
                    "fetcher #{idx} failed to initialize sources: {e}"
                )));
            }

            let sources = child.sources();
            if sources.is_empty() {
                if child.optional() {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(child = idx, "optional fetcher reported no sources; discarding");
                    child.close();
                    continue;
                }
                #[cfg(feature = "tracing")]
                tracing::warn!(child = idx, "required fetcher reported no sources");
            }

            for source in sources {
                if let Some(&owner) = source_to_child.get(&source) {
                    rejections.push((source.clone(), owner, idx));
                    continue;
                }
                source_to_child.insert(source.clone(), idx);
                if let Some(ph) = child.placeholders().get(&source) {
                    placeholders.insert(source, ph.clone());
                }
            }
        }

        for (source, owner, rejected) in &rejections {
            let msg = format!(
                "source '{source}' claimed by fetcher #{owner} and fetcher #{rejected}; keeping #{owner}"
            );
            match self.on_source_conflict {
                OnSourceConflict::Raise => {
                    return Err(FetchingError::DuplicateSource(msg));
                }
                OnSourceConflict::Warn => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!("{msg}");
                }
                OnSourceConflict::Ignore => {}
            }
        }

        *self.ownership.write().expect("lock poisoned") = Some(SourceOwnership { source_to_child, placeholders });
        Ok(())
    }

    fn run_dispatched<T: Send>(
        &self,
        jobs: Vec<impl FnOnce() -> Result<T, FetchingError> + Send>,
    ) -> Result<Vec<T>, FetchingError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.max_workers)
            .build()
            .map_err(|e| FetchingError::Implementation(e.to_string()))?;
        pool.install(|| {
            use rayon::iter::{IntoParallelIterator, ParallelIterator};
            jobs.into_par_iter().map(|job| job()).collect()
        })
    }
}

impl Fetcher for MultiFetcher {
    fn allow_fetch_all(&self) -> bool {
        self.children.iter().all(|c| c.allow_fetch_all())
    }

    fn close(&self) {
        for child in &self.children {
            child.close();
        }
    }

    fn online(&self) -> bool {
        self.children.iter().all(|c| c.online())
    }

    fn initialize_sources(&self, task_id: u64, force: bool) -> Result<(), FetchingError> {
        self.ensure_sources(task_id, force)
    }

    fn sources(&self) -> Vec<String> {
        let _ = self.ensure_sources(0, false);
        self.ownership
            .read()
            .expect("lock poisoned")
            .as_ref()
            .map(|o| o.source_to_child.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn placeholders(&self) -> IndexMap<String, Vec<String>> {
        let _ = self.ensure_sources(0, false);
        self.ownership
            .read()
            .expect("lock poisoned")
            .as_ref()
            .map(|o| o.placeholders.clone())
            .unwrap_or_default()
    }

    fn fetch(
        &self,
        ids_to_fetch: &[IdsToFetch],
        placeholders: &[String],
        required: &[String],
        task_id: u64,
        enable_uuid_heuristics: bool,
    ) -> Result<IndexMap<String, PlaceholderTranslations>, FetchingError> {
        self.ensure_sources(task_id, false)?;

        let mut by_child: HashMap<usize, Vec<IdsToFetch>> = HashMap::new();
        let mut unknown = Vec::new();
        {
            let guard = self.ownership.read().expect("lock poisoned");
            let ownership = guard.as_ref().expect("just ensured");
            for itf in ids_to_fetch {
                match ownership.source_to_child.get(&itf.source) {
                    Some(&idx) => by_child.entry(idx).or_default().push(itf.clone()),
                    None => unknown.push(itf.source.clone()),
                }
            }
        }
        if !unknown.is_empty() {
            return Err(FetchingError::UnknownSource { unknown, known: self.sources() });
        }

        let placeholders = placeholders.to_vec();
        let required = required.to_vec();
        let jobs: Vec<_> = by_child
            .into_iter()
            .map(|(idx, items)| {
                let child = self.children[idx].clone();
                let placeholders = placeholders.clone();
                let required = required.clone();
                move || child.fetch(&items, &placeholders, &required, task_id, enable_uuid_heuristics)
            })
            .collect();

        let results = self.run_dispatched(jobs)?;
        let mut out = IndexMap::new();
        for partial in results {
            for (source, translations) in partial {
                if out.contains_key(&source) {
                    #[cfg(feature = "tracing")]
                    tracing::warn!("source '{source}' returned by more than one child fetcher; keeping the first result");
                    continue;
                }
                out.insert(source, translations);
            }
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
        if !self.allow_fetch_all() {
            return Err(FetchingError::ForbiddenOperation {
                operation: "FETCH_ALL".to_string(),
                reason: "is not allowed by one or more child fetchers".to_string(),
            });
        }
        self.ensure_sources(task_id, false)?;

        let wanted: Vec<String> = match sources {
            Some(s) => self.sources().into_iter().filter(|src| s.contains(src)).collect(),
            None => self.sources(),
        };

        let mut by_child: HashMap<usize, HashSet<String>> = HashMap::new();
        {
            let guard = self.ownership.read().expect("lock poisoned");
            let ownership = guard.as_ref().expect("just ensured");
            for source in wanted {
                if let Some(&idx) = ownership.source_to_child.get(&source) {
                    by_child.entry(idx).or_default().insert(source);
                }
            }
        }

        let placeholders = placeholders.to_vec();
        let required = required.to_vec();
        let jobs: Vec<_> = by_child
            .into_iter()
            .map(|(idx, owned_sources)| {
                let child = self.children[idx].clone();
                let placeholders = placeholders.clone();
                let required = required.clone();
                move || child.fetch_all(&placeholders, &required, Some(&owned_sources), task_id, enable_uuid_heuristics)
            })
            .collect();

        let results = self.run_dispatched(jobs)?;
        let mut out = IndexMap::new();
        for partial in results {
            for (source, translations) in partial {
                out.entry(source).or_insert(translations);
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Identifier, Value, ID};

    struct StubFetcher {
        sources: Vec<String>,
    }

    impl Fetcher for StubFetcher {
        fn allow_fetch_all(&self) -> bool {
            true
        }
        fn online(&self) -> bool {
            true
        }
        fn sources(&self) -> Vec<String> {
            self.sources.clone()
        }
        fn placeholders(&self) -> IndexMap<String, Vec<String>> {
            self.sources.iter().map(|s| (s.clone(), vec![ID.to_string()])).collect()
        }
        fn fetch(
            &self,
            ids_to_fetch: &[IdsToFetch],
            _placeholders: &[String],
            _required: &[String],
            _task_id: u64,
            _enable_uuid_heuristics: bool,
        ) -> Result<IndexMap<String, PlaceholderTranslations>, FetchingError> {
            let mut out = IndexMap::new();
            for itf in ids_to_fetch {
                out.insert(
                    itf.source.clone(),
                    PlaceholderTranslations::new(itf.source.clone(), vec![ID.to_string()], vec![vec![Value::Int(1)]]),
                );
            }
            Ok(out)
        }
        fn fetch_all(
            &self,
            _placeholders: &[String],
            _required: &[String],
            sources: Option<&HashSet<String>>,
            _task_id: u64,
            _enable_uuid_heuristics: bool,
        ) -> Result<IndexMap<String, PlaceholderTranslations>, FetchingError> {
            let mut out = IndexMap::new();
            let wanted = sources.cloned().unwrap_or_else(|| self.sources.iter().cloned().collect());
            for source in wanted {
                out.insert(source.clone(), PlaceholderTranslations::new(source, vec![ID.to_string()], vec![]));
            }
            Ok(out)
        }
    }

    /// A child whose `initialize_sources` either fails or succeeds with an empty source list,
    /// used to exercise the optional/required discard-and-warn paths.
    struct FlakyFetcher {
        sources: Vec<String>,
        fail_init: bool,
        optional: bool,
        closed: std::sync::atomic::AtomicBool,
    }

    impl Fetcher for FlakyFetcher {
        fn allow_fetch_all(&self) -> bool {
            true
        }
        fn close(&self) {
            self.closed.store(true, std::sync::atomic::Ordering::SeqCst);
        }
        fn online(&self) -> bool {
            true
        }
        fn optional(&self) -> bool {
            self.optional
        }
        fn initialize_sources(&self, _task_id: u64, _force: bool) -> Result<(), FetchingError> {
            if self.fail_init {
                Err(FetchingError::Implementation("backend unreachable".to_string()))
            } else {
                Ok(())
            }
        }
        fn sources(&self) -> Vec<String> {
            self.sources.clone()
        }
        fn placeholders(&self) -> IndexMap<String, Vec<String>> {
            self.sources.iter().map(|s| (s.clone(), vec![ID.to_string()])).collect()
        }
        fn fetch(
            &self,
            _ids_to_fetch: &[IdsToFetch],
            _placeholders: &[String],
            _required: &[String],
            _task_id: u64,
            _enable_uuid_heuristics: bool,
        ) -> Result<IndexMap<String, PlaceholderTranslations>, FetchingError> {
            Ok(IndexMap::new())
        }
        fn fetch_all(
            &self,
            _placeholders: &[String],
            _required: &[String],
            _sources: Option<&HashSet<String>>,
            _task_id: u64,
            _enable_uuid_heuristics: bool,
        ) -> Result<IndexMap<String, PlaceholderTranslations>, FetchingError> {
            Ok(IndexMap::new())
        }
    }

    fn multi() -> MultiFetcher {
        let a: Arc<dyn Fetcher> = Arc::new(StubFetcher { sources: vec!["people".to_string()] });
        let b: Arc<dyn Fetcher> = Arc::new(StubFetcher { sources: vec!["animals".to_string()] });
        MultiFetcher::new(vec![a, b])
    }

    #[test]
    fn first_child_owns_a_source_no_conflict() {
        let m = multi();
        assert_eq!(m.sources().len(), 2);
    }

    #[test]
    fn duplicate_source_claim_raises_by_default() {
        let a: Arc<dyn Fetcher> = Arc::new(StubFetcher { sources: vec!["people".to_string()] });
        let b: Arc<dyn Fetcher> = Arc::new(StubFetcher { sources: vec!["people".to_string()] });
        let m = MultiFetcher::new(vec![a, b]);
        assert!(m.get_child("people").is_err());
    }

    #[test]
    fn duplicate_source_claim_ignored_when_configured() {
        let a: Arc<dyn Fetcher> = Arc::new(StubFetcher { sources: vec!["people".to_string()] });
        let b: Arc<dyn Fetcher> = Arc::new(StubFetcher { sources: vec!["people".to_string()] });
        let m = MultiFetcher::new(vec![a, b]).with_on_source_conflict(OnSourceConflict::Ignore);
        assert!(m.get_child("people").is_ok());
    }

    #[test]
    fn fetch_dispatches_to_owning_children() {
        let m = multi();
        let ids = vec![
            IdsToFetch::new("people", HashSet::from([Identifier::Int(1)])),
            IdsToFetch::new("animals", HashSet::from([Identifier::Int(2)])),
        ];
        let out = m.fetch(&ids, &[], &[], 1, false).unwrap();
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn fetch_unknown_source_errors() {
        let m = multi();
        let ids = vec![IdsToFetch::new("nowhere", HashSet::new())];
        assert!(m.fetch(&ids, &[], &[], 1, false).is_err());
    }

    #[test]
    fn fetch_all_restricts_to_requested_sources() {
        let m = multi();
        let wanted: HashSet<String> = ["people".to_string()].into_iter().collect();
        let out = m.fetch_all(&[], &[], Some(&wanted), 1, false).unwrap();
        assert_eq!(out.len(), 1);
        assert!(out.contains_key("people"));
    }

    #[test]
    fn close_is_forwarded_to_children_without_panicking() {
        let m = multi();
        m.close();
    }

    #[test]
    fn optional_child_failing_to_initialize_is_discarded_and_closed() {
        let good: Arc<dyn Fetcher> = Arc::new(StubFetcher { sources: vec!["people".to_string()] });
        let flaky = Arc::new(FlakyFetcher {
            sources: vec!["ghost".to_string()],
            fail_init: true,
            optional: true,
            closed: std::sync::atomic::AtomicBool::new(false),
        });
        let m = MultiFetcher::new(vec![good, flaky.clone()]);
        let sources = m.sources();
        assert_eq!(sources, vec!["people".to_string()]);
        assert!(flaky.closed.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[test]
    fn required_child_failing_to_initialize_propagates_an_annotated_error() {
        let good: Arc<dyn Fetcher> = Arc::new(StubFetcher { sources: vec!["people".to_string()] });
        let flaky: Arc<dyn Fetcher> = Arc::new(FlakyFetcher {
            sources: vec![],
            fail_init: true,
            optional: false,
            closed: std::sync::atomic::AtomicBool::new(false),
        });
        let m = MultiFetcher::new(vec![good, flaky]);
        let err = m.get_child("people").unwrap_err();
        match err {
            FetchingError::Implementation(msg) => assert!(msg.contains("fetcher #1")),
            other => panic!("expected Implementation error, got {other:?}"),
        }
    }

    #[test]
    fn optional_child_with_zero_sources_is_discarded_and_closed() {
        let good: Arc<dyn Fetcher> = Arc::new(StubFetcher { sources: vec!["people".to_string()] });
        let empty = Arc::new(FlakyFetcher {
            sources: vec![],
            fail_init: false,
            optional: true,
            closed: std::sync::atomic::AtomicBool::new(false),
        });
        let m = MultiFetcher::new(vec![good, empty.clone()]);
        assert_eq!(m.sources(), vec!["people".to_string()]);
        assert!(empty.closed.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[test]
    fn required_child_with_zero_sources_is_kept_without_error() {
        let good: Arc<dyn Fetcher> = Arc::new(StubFetcher { sources: vec!["people".to_string()] });
        let empty: Arc<dyn Fetcher> = Arc::new(FlakyFetcher {
            sources: vec![],
            fail_init: false,
            optional: false,
            closed: std::sync::atomic::AtomicBool::new(false),
        });
        let m = MultiFetcher::new(vec![good, empty]);
        assert_eq!(m.sources(), vec!["people".to_string()]);
        assert!(m.get_child("people").is_ok());
    }
}
