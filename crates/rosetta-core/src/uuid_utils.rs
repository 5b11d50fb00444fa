//! UUID canonicalization heuristics, used by [`crate::offline::MagicDict`] and the translation
//! task's id extraction step when `enable_uuid_heuristics` is on.
//!
//! Grounded on `_uuid_utils.py`: strings that parse as UUIDs (and `Uuid` values) are rewritten
//! to their canonical, lower-case, hyphenated string form so that differently-cased or
//! differently-formatted spellings of the same UUID collide to one key.

use uuid::Uuid;

use crate::types::Identifier;

/// Casts a single identifier to its canonical UUID string form, falling back to the original
/// value unchanged if it does not parse as a UUID.
pub fn try_cast_one(id: &Identifier) -> Identifier {
    match id {
        Identifier::Str(s) => match Uuid::parse_str(s) {
            Ok(u) => Identifier::Str(u.to_string()),
            Err(_) => id.clone(),
        },
        Identifier::Uuid(u) => Identifier::Str(u.to_string()),
        Identifier::Int(_) => id.clone(),
    }
}

/// Casts every id to canonical UUID string form. Returns `Err` (the *first* id that fails to
/// parse) if any id is not UUID-like — callers use this to decide all-or-nothing, mirroring
/// `cast_many`'s "fail the whole batch" semantics.
pub fn cast_many(ids: &[Identifier]) -> Result<Vec<Identifier>, ()> {
    ids.iter()
        .map(|id| match id {
            Identifier::Str(s) => Uuid::parse_str(s).map(|u| Identifier::Str(u.to_string())).map_err(|_| ()),
            Identifier::Uuid(u) => Ok(Identifier::Str(u.to_string())),
            Identifier::Int(_) => Err(()),
        })
        .collect()
}

/// Tries to cast every id to canonical UUID string form; falls back to the original slice,
/// unchanged, if *any* id fails to parse (the batch is all-or-nothing, as in the original).
pub fn try_cast_many(ids: &[Identifier]) -> Vec<Identifier> {
    if ids.is_empty() {
        return ids.to_vec();
    }
    cast_many(ids).unwrap_or_else(|_| ids.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn differently_cased_uuid_strings_canonicalize_equal() {
        let a = Identifier::Str("550E8400-E29B-41D4-A716-446655440000".to_string());
        let b = Identifier::Str("550e8400-e29b-41d4-a716-446655440000".to_string());
        assert_eq!(try_cast_one(&a), try_cast_one(&b));
    }

    #[test]
    fn non_uuid_string_is_unchanged() {
        let a = Identifier::Str("not-a-uuid".to_string());
        assert_eq!(try_cast_one(&a), a);
    }

    #[test]
    fn try_cast_many_falls_back_on_any_non_uuid() {
        let ids = vec![
            Identifier::Str("550e8400-e29b-41d4-a716-446655440000".to_string()),
            Identifier::Int(5),
        ];
        let out = try_cast_many(&ids);
        assert_eq!(out, ids);
    }

    #[test]
    fn try_cast_many_canonicalizes_when_all_uuid_like() {
        let ids = vec![Identifier::Str("550E8400-E29B-41D4-A716-446655440000".to_string())];
        let out = try_cast_many(&ids);
        assert_eq!(out, vec![Identifier::Str("550e8400-e29b-41d4-a716-446655440000".to_string())]);
    }
}
