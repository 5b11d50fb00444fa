//! Adapter for a single [`Identifier`] — a scalar id, translated to a single `String`.
//!
//! Grounded on `dio/_single_value.py`. Like the original, never in-place translatable (a scalar
//! has no container to mutate).

use std::any::Any;

use indexmap::IndexMap;

use super::{DataStructureIO, DioError};
use crate::offline::{TranslationMap, Translations};
use crate::types::Identifier;

pub struct SingleValueIO;

impl DataStructureIO for SingleValueIO {
    fn handles_type(&self, arg: &dyn Any) -> bool {
        arg.is::<Identifier>()
    }

    fn extract(&self, arg: &dyn Any, names: &[String]) -> Result<IndexMap<String, Vec<Identifier>>, DioError> {
        if names.len() != 1 {
            return Err(DioError::BadNames { given: names.len(), data_len: 1 });
        }
        let id = arg.downcast_ref::<Identifier>().expect("handles_type checked this");
        let mut out = IndexMap::with_capacity(1);
        out.insert(names[0].clone(), vec![id.clone()]);
        Ok(out)
    }

    fn insert(
        &self,
        arg: &dyn Any,
        names: &[String],
        tmap: &TranslationMap,
        copy: bool,
    ) -> Result<Box<dyn Any>, DioError> {
        if !copy {
            return Err(DioError::NotInplaceTranslatable("Identifier".to_string()));
        }
        let id = arg.downcast_ref::<Identifier>().expect("handles_type checked this");
        let translations = tmap.apply(&names[0], None, None)?;
        let translated = match translations {
            Translations::Forward(magic) => {
                magic.get(id).ok_or_else(|| DioError::NoTranslation(id.display()))?
            }
            Translations::Reverse(_) => {
                return Err(DioError::NotInplaceTranslatable("reverse-mode single value".to_string()))
            }
        };
        Ok(Box::new(translated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{Format, PlaceholderTranslations};
    use crate::offline::DefaultPlaceholders;
    use crate::types::{Value, ID};
    use std::collections::HashMap;

    fn tmap() -> TranslationMap {
        let translations = PlaceholderTranslations::new(
            "people",
            vec![ID.to_string(), "name".to_string()],
            vec![vec![Value::Int(1), Value::Str("sofia".to_string())]],
        );
        TranslationMap::new(
            [("people".to_string(), translations)],
            HashMap::new(),
            Some(Format::parse("{id}:{name}").unwrap()),
            None,
            DefaultPlaceholders::default(),
            true,
        )
    }

    #[test]
    fn handles_only_identifier() {
        assert!(SingleValueIO.handles_type(&Identifier::Int(1)));
        assert!(!SingleValueIO.handles_type(&"not an id".to_string()));
    }

    #[test]
    fn extracts_single_name_to_id_pair() {
        let names = vec!["people".to_string()];
        let out = SingleValueIO.extract(&Identifier::Int(1), &names).unwrap();
        assert_eq!(out.get("people").unwrap(), &vec![Identifier::Int(1)]);
    }

    #[test]
    fn insert_requires_copy() {
        let names = vec!["people".to_string()];
        let err = SingleValueIO.insert(&Identifier::Int(1), &names, &tmap(), false).unwrap_err();
        assert!(matches!(err, DioError::NotInplaceTranslatable(_)));
    }

    #[test]
    fn insert_translates_the_value() {
        let names = vec!["people".to_string()];
        let out = SingleValueIO.insert(&Identifier::Int(1), &names, &tmap(), true).unwrap();
        assert_eq!(*out.downcast::<String>().unwrap(), "1:sofia".to_string());
    }

    #[test]
    fn insert_fails_for_untranslated_id_with_no_default() {
        let names = vec!["people".to_string()];
        let err = SingleValueIO.insert(&Identifier::Int(999), &names, &tmap(), true).unwrap_err();
        assert!(matches!(err, DioError::NoTranslation(_)));
    }
}
