//! Insertion and extraction of IDs and translations to and from concrete Rust data structures.
//!
//! Grounded on the `dio/` package: `_data_structure_io.py`, `_resolve.py`, `exceptions.py`.
//! Dataframe adapters (`_pandas.py`) are out of scope; this crate covers the single-value, set,
//! sequence, and ordered-map shapes the spec calls out as core.
//!
//! Python resolves an adapter for an arbitrary dynamically-typed object via `isinstance` checks
//! over an open, entrypoint-loadable registry. Rust has no structural `isinstance`, so adapters
//! here dispatch on [`std::any::Any::downcast_ref`] instead; the registry and reverse-registration
//! priority order are otherwise preserved so a caller can still register a custom adapter ahead of
//! the built-ins. In-place translation (`copy = false`) is never actually possible for the
//! composite adapters here, unlike in Python: translating a container always changes its element
//! type from [`crate::types::Identifier`] to `String`, so there is no statically-typed container
//! to mutate in place. All adapters therefore raise [`DioError::NotInplaceTranslatable`] when
//! `copy` is false — this is a genuine static/dynamic-typing divergence from the original, not an
//! oversight, and is recorded in `DESIGN.md`.

mod dict;
mod sequence;
mod set;
mod single_value;

pub use dict::MapIO;
pub use sequence::SequenceIO;
pub use set::SetIO;
pub use single_value::SingleValueIO;

use std::any::Any;
use std::sync::{Arc, OnceLock, RwLock};

use indexmap::IndexMap;
use thiserror::Error;

use crate::format::FormatError;
use crate::offline::TranslationMap;
use crate::types::Identifier;

#[derive(Debug, Error)]
pub enum DioError {
    #[error("type '{0}' cannot be translated: no registered adapter handles it")]
    Untranslatable(String),

    #[error("in-place translation not possible for type '{0}'")]
    NotInplaceTranslatable(String),

    #[error("number of names ({given}) must be 1 or equal to the data length ({data_len})")]
    BadNames { given: usize, data_len: usize },

    #[error("no translation found for id {0} and no default value is configured")]
    NoTranslation(String),

    #[error(transparent)]
    Format(#[from] FormatError),
}

/// Adapter for one concrete translatable shape.
pub trait DataStructureIO: Send + Sync {
    /// `true` if this adapter knows how to handle `arg`'s concrete type.
    fn handles_type(&self, arg: &dyn Any) -> bool;

    /// Names `arg` carries intrinsically (e.g. a dict's keys), if any can be derived without the
    /// caller supplying them explicitly.
    fn names(&self, arg: &dyn Any) -> Option<Vec<String>> {
        let _ = arg;
        None
    }

    /// Extracts `{name: [ids...]}` from `arg` for the given `names`.
    fn extract(&self, arg: &dyn Any, names: &[String]) -> Result<IndexMap<String, Vec<Identifier>>, DioError>;

    /// Inserts translations from `tmap` into `arg`, returning the translated copy.
    ///
    /// `copy` must be `true` for every adapter in this crate (see module docs);
    /// passing `false` always raises [`DioError::NotInplaceTranslatable`].
    fn insert(
        &self,
        arg: &dyn Any,
        names: &[String],
        tmap: &TranslationMap,
        copy: bool,
    ) -> Result<Box<dyn Any>, DioError>;
}

static REGISTRY: OnceLock<RwLock<Vec<Arc<dyn DataStructureIO>>>> = OnceLock::new();

fn registry() -> &'static RwLock<Vec<Arc<dyn DataStructureIO>>> {
    REGISTRY.get_or_init(|| {
        RwLock::new(vec![
            Arc::new(MapIO) as Arc<dyn DataStructureIO>,
            Arc::new(SetIO),
            Arc::new(SequenceIO),
            Arc::new(SingleValueIO),
        ])
    })
}

/// Registers a custom adapter ahead of everything already registered (including the built-ins),
/// mirroring `register_io`'s "move to the first position" semantics.
pub fn register_io(io: Arc<dyn DataStructureIO>) {
    registry().write().expect("dio registry lock poisoned").insert(0, io);
}

/// Resolves the first-matching adapter for `arg`, most-recently-registered first.
///
/// `type_name` is used only for the error message (Rust has no reliable runtime type name for an
/// arbitrary `&dyn Any`'s erased type); pass `std::any::type_name::<T>()` at the call site.
pub fn resolve_io(arg: &dyn Any, type_name: &str) -> Result<Arc<dyn DataStructureIO>, DioError> {
    registry()
        .read()
        .expect("dio registry lock poisoned")
        .iter()
        .find(|io| io.handles_type(arg))
        .cloned()
        .ok_or_else(|| DioError::Untranslatable(type_name.to_string()))
}

/// Current resolution order (most-recently-registered first), for inspection/testing.
pub fn resolution_order_len() -> usize {
    registry().read().expect("dio registry lock poisoned").len()
}
