//! Shared data model: identifiers, placeholder record values, and the generic
//! key bound used throughout the mapping and translation engines.

use std::fmt::Debug;
use std::hash::Hash;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Canonical name of the `id` placeholder, always present in a source's records.
pub const ID: &str = "id";

/// Bound satisfied by anything usable as a mapping "value" or "candidate": names, sources,
/// and placeholder strings are all plain, cheaply-cloned, orderable keys.
pub trait MapKey: Eq + Hash + Ord + Clone + Debug + Send + Sync + 'static {}
impl<T> MapKey for T where T: Eq + Hash + Ord + Clone + Debug + Send + Sync + 'static {}

/// Context in which a mapping operation runs — in practice the source a value is
/// being matched against. `None` means "no context", used for e.g. name-to-source
/// mapping where the value itself has no natural container.
pub type Context = Option<String>;

/// Opaque identifier being translated: an integer, a string, or a UUID.
///
/// Equality is exact for [`Identifier::Int`]/[`Identifier::Str`]; two [`Identifier::Uuid`]
/// values compare equal iff their canonical (lower-case, hyphenated) string forms match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Identifier {
    Int(i64),
    Str(String),
    Uuid(Uuid),
}

impl Identifier {
    /// Renders the identifier the way it would appear formatted into a template.
    pub fn display(&self) -> String {
        match self {
            Identifier::Int(i) => i.to_string(),
            Identifier::Str(s) => s.clone(),
            Identifier::Uuid(u) => u.to_string(),
        }
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display())
    }
}

impl From<i64> for Identifier {
    fn from(v: i64) -> Self {
        Identifier::Int(v)
    }
}

impl From<String> for Identifier {
    fn from(v: String) -> Self {
        Identifier::Str(v)
    }
}

impl From<&str> for Identifier {
    fn from(v: &str) -> Self {
        Identifier::Str(v.to_string())
    }
}

impl From<Uuid> for Identifier {
    fn from(v: Uuid) -> Self {
        Identifier::Uuid(v)
    }
}

/// A single cell in a placeholder record: an `id`/`name`/... column value.
///
/// Distinct from [`Identifier`] because non-id placeholders may be numeric with fractional
/// parts, booleans, or absent (`Null`), none of which an opaque id may be.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Null,
}

impl Value {
    /// Formats the value the way `{}` would in the applier: the empty string for `Null`.
    pub fn display(&self) -> String {
        match self {
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Str(s) => s.clone(),
            Value::Bool(b) => b.to_string(),
            Value::Null => String::new(),
        }
    }

    /// `true` for everything except `Null` — used by optional-block satisfaction checks.
    pub fn is_present(&self) -> bool {
        !matches!(self, Value::Null)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display())
    }
}

impl From<Identifier> for Value {
    fn from(id: Identifier) -> Self {
        match id {
            Identifier::Int(i) => Value::Int(i),
            Identifier::Str(s) => Value::Str(s),
            Identifier::Uuid(u) => Value::Str(u.to_string()),
        }
    }
}

/// Implemented by anything that owns a fixed set of sources (fetchers, multi-fetchers).
pub trait HasSources<S> {
    /// Sources this instance knows about, in rank order where applicable.
    fn sources(&self) -> Vec<S>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuid_identifiers_compare_by_value() {
        let u = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        assert_eq!(Identifier::Uuid(u), Identifier::Uuid(u));
    }

    #[test]
    fn value_null_is_not_present() {
        assert!(!Value::Null.is_present());
        assert!(Value::Int(0).is_present());
    }

    #[test]
    fn identifier_display_matches_format_rendering() {
        assert_eq!(Identifier::Int(5).display(), "5");
        assert_eq!(Identifier::Str("x".into()).display(), "x");
    }
}
