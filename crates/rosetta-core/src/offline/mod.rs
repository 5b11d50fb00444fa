//! Offline translation storage: translated-id lookup ([`MagicDict`]) and per-source translation
//! storage with name aliasing ([`TranslationMap`]).
//!
//! Grounded on the `offline/` package: `_magic_dict.py`, `_translation_map.py`. Errors from this
//! module surface as [`crate::format::FormatError`] rather than a separate error type, since every
//! failure mode here (duplicate UUID-canonicalized key, unknown source, missing format) is a
//! format-application concern.

mod magic_dict;
mod translation_map;

pub use magic_dict::{DefaultTemplate, MagicDict};
pub use translation_map::{DefaultPlaceholders, TranslationMap, Translations};
