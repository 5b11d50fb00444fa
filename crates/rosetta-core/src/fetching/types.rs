//! Request/instruction shapes passed between a [`super::MultiFetcher`] and its children.
//!
//! Grounded on `fetching/types.py`.

use std::collections::HashSet;

use crate::types::Identifier;

/// A request for specific ids from one source, as handed to [`super::Fetcher::fetch`].
#[derive(Debug, Clone)]
pub struct IdsToFetch {
    pub source: String,
    pub ids: HashSet<Identifier>,
}

impl IdsToFetch {
    pub fn new(source: impl Into<String>, ids: HashSet<Identifier>) -> Self {
        Self { source: source.into(), ids }
    }
}

/// A fully-resolved instruction for a single backend fetch call.
///
/// `ids = None` means "fetch everything available for this source" (a `fetch_all` call);
/// `required` are placeholders the backend must be able to provide or the call fails.
#[derive(Debug, Clone)]
pub struct FetchInstruction {
    pub source: String,
    pub placeholders: Vec<String>,
    pub required: HashSet<String>,
    pub ids: Option<HashSet<Identifier>>,
    pub task_id: u64,
    pub enable_uuid_heuristics: bool,
}

impl FetchInstruction {
    /// `true` if this instruction asks for every id available in the source.
    pub fn fetch_all(&self) -> bool {
        self.ids.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_all_is_true_only_without_explicit_ids() {
        let with_ids = FetchInstruction {
            source: "people".to_string(),
            placeholders: vec![],
            required: HashSet::new(),
            ids: Some(HashSet::from([Identifier::Int(1)])),
            task_id: 1,
            enable_uuid_heuristics: false,
        };
        assert!(!with_ids.fetch_all());

        let all = FetchInstruction { ids: None, ..with_ids };
        assert!(all.fetch_all());
    }
}
