//! Configurable translation of opaque ids (database keys, enum codes, UUIDs) into
//! human-readable strings, fetched from one or more sources and optionally cached offline.
//!
//! See [`Translator`] for the main entry point.

pub mod config;
pub mod dio;
pub mod error;
pub mod fetching;
pub mod format;
pub mod mapping;
pub mod offline;
pub mod settings;
pub mod translator;
pub mod types;
pub mod uuid_utils;

pub use error::{Error, Result};
pub use translator::{NameSpec, Translator, TranslatorError};
pub use types::{Identifier, Value, ID};
